//! Flat knowledge-base document behind a read-through TTL cache
//!
//! The document is a single JSON file holding solutions, contexts and
//! success/error patterns. Reads go through [`TtlCache`]; writes are a
//! whole-document read-modify-write that clears the cache afterwards.
//! Nothing here returns an error: an unreadable file is an empty document
//! and a failed write is logged and dropped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::bounded::BoundedLog;
use crate::cache::config::CacheConfig;
use crate::cache::key::CacheKeyBuilder;
use crate::cache::store::TtlCache;
use crate::cache::types::CacheStats;
use crate::error::{KgError, Result};
use crate::text::token_set;

const DOCUMENT_KEY: &str = "knowledge_base:document";

/// A problem and the fix that worked for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: Uuid,
    pub problem: String,
    pub solution: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A recurring success or failure pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A working context seen before, with what came of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: Uuid,
    pub context: String,
    #[serde(default)]
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSets {
    pub success: BoundedLog<Pattern>,
    pub error: BoundedLog<Pattern>,
}

/// On-disk layout of the knowledge base
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseDocument {
    pub solutions: BoundedLog<Solution>,
    pub contexts: BoundedLog<ContextRecord>,
    pub patterns: PatternSets,
}

impl KnowledgeBaseDocument {
    /// Trim every section to its retention cap, returning how many records
    /// were dropped in total
    fn enforce_retention(&mut self, config: &KnowledgeBaseConfig) -> usize {
        self.solutions.enforce(config.max_solutions)
            + self.contexts.enforce(config.max_contexts)
            + self.patterns.success.enforce(config.max_patterns)
            + self.patterns.error.enforce(config.max_patterns)
    }
}

/// Everything in the knowledge base that overlaps a given context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub solutions: Vec<Solution>,
    pub success_patterns: Vec<Pattern>,
    pub error_patterns: Vec<Pattern>,
    pub similar_contexts: Vec<ContextRecord>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
            && self.success_patterns.is_empty()
            && self.error_patterns.is_empty()
            && self.similar_contexts.is_empty()
    }
}

/// Knowledge base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// Location of the JSON document
    pub path: PathBuf,
    pub max_solutions: usize,
    pub max_contexts: usize,
    /// Cap applied to each pattern list separately
    pub max_patterns: usize,
    /// Results per section returned by `recommendations`
    pub max_results: usize,
    pub cache: CacheConfig,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("knowledge_base.json"),
            max_solutions: 500,
            max_contexts: 100,
            max_patterns: 1_000,
            max_results: 10,
            cache: CacheConfig::default(),
        }
    }
}

impl KnowledgeBaseConfig {
    /// Default configuration stored at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_solutions == 0 || self.max_contexts == 0 || self.max_patterns == 0 {
            return Err(KgError::ConfigError(
                "retention caps must be greater than 0".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(KgError::ConfigError(
                "max_results must be greater than 0".to_string(),
            ));
        }
        self.cache.validate()
    }
}

/// Read-through cached access to the knowledge-base document
pub struct KnowledgeBase {
    config: KnowledgeBaseConfig,
    documents: TtlCache<KnowledgeBaseDocument>,
    recommendations: TtlCache<Recommendations>,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
    /// Bumped on every invalidation; a miss only fills the cache if it is unchanged
    generation: AtomicU64,
}

impl KnowledgeBase {
    pub fn new(config: KnowledgeBaseConfig) -> Result<Self> {
        config.validate()?;
        info!("Opening knowledge base at {}", config.path.display());

        Ok(Self {
            documents: TtlCache::new(config.cache.clone()),
            recommendations: TtlCache::new(config.cache.clone()),
            config,
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &KnowledgeBaseConfig {
        &self.config
    }

    /// Return the document, from cache when fresh, otherwise from disk
    pub async fn load(&self) -> KnowledgeBaseDocument {
        if let Some(doc) = self.documents.get(DOCUMENT_KEY).await {
            return doc;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let doc = self.read_document().await;

        let _guard = self.write_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            self.documents.set(DOCUMENT_KEY, doc.clone()).await;
        } else {
            debug!("Knowledge base changed during read, not caching it");
        }
        doc
    }

    /// Records overlapping `context` by at least one word, best first
    pub async fn recommendations(&self, context: &str) -> Recommendations {
        let key = CacheKeyBuilder::new("knowledge_base:recommendations")
            .param("context", context)
            .build();

        if let Some(cached) = self.recommendations.get(&key).await {
            return cached;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let doc = self.load().await;
        let limit = self.config.max_results;
        let recs = Recommendations {
            solutions: rank(context, doc.solutions.iter(), limit, |s| {
                format!("{} {} {}", s.problem, s.solution, s.tags.join(" "))
            }),
            success_patterns: rank(context, doc.patterns.success.iter(), limit, pattern_text),
            error_patterns: rank(context, doc.patterns.error.iter(), limit, pattern_text),
            similar_contexts: rank(context, doc.contexts.iter(), limit, |c| c.context.clone()),
        };

        debug!(
            "Computed recommendations for {:?}: {} solutions, {} success, {} error, {} contexts",
            key,
            recs.solutions.len(),
            recs.success_patterns.len(),
            recs.error_patterns.len(),
            recs.similar_contexts.len()
        );

        let _guard = self.write_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            self.recommendations.set(key, recs.clone()).await;
        }
        recs
    }

    /// Append a solution; returns whether it was persisted
    pub async fn add_solution(
        &self,
        problem: impl Into<String>,
        solution: impl Into<String>,
        tags: Vec<String>,
    ) -> bool {
        let record = Solution {
            id: Uuid::new_v4(),
            problem: problem.into(),
            solution: solution.into(),
            tags,
            created_at: Utc::now(),
        };
        let cap = self.config.max_solutions;
        self.update("solutions", |doc| doc.solutions.push(record, cap))
            .await
    }

    pub async fn add_success_pattern(
        &self,
        description: impl Into<String>,
        context: Option<String>,
    ) -> bool {
        let record = new_pattern(description.into(), context);
        let cap = self.config.max_patterns;
        self.update("success patterns", |doc| doc.patterns.success.push(record, cap))
            .await
    }

    pub async fn add_error_pattern(
        &self,
        description: impl Into<String>,
        context: Option<String>,
    ) -> bool {
        let record = new_pattern(description.into(), context);
        let cap = self.config.max_patterns;
        self.update("error patterns", |doc| doc.patterns.error.push(record, cap))
            .await
    }

    pub async fn record_context(
        &self,
        context: impl Into<String>,
        outcome: Option<String>,
    ) -> bool {
        let record = ContextRecord {
            id: Uuid::new_v4(),
            context: context.into(),
            outcome,
            created_at: Utc::now(),
        };
        let cap = self.config.max_contexts;
        self.update("contexts", |doc| doc.contexts.push(record, cap))
            .await
    }

    /// Statistics of the document cache
    pub async fn cache_stats(&self) -> CacheStats {
        self.documents.stats().await
    }

    /// Drop every cached read, including reads still in flight
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.documents.clear().await;
        self.recommendations.clear().await;
    }

    /// Read the document from disk, apply `mutate`, write it back.
    ///
    /// `mutate` returns how many records retention dropped.
    async fn update<F>(&self, section: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut KnowledgeBaseDocument) -> usize,
    {
        let _guard = self.write_lock.lock().await;

        let mut doc = self.read_document().await;
        let evicted = mutate(&mut doc);
        if evicted > 0 {
            info!("Retention dropped {} oldest record(s) from {}", evicted, section);
        }

        match write_document(&self.config.path, &doc).await {
            Ok(()) => {
                self.invalidate().await;
                debug!("Updated {} in {}", section, self.config.path.display());
                true
            }
            Err(e) => {
                warn!("Failed to write knowledge base: {}", e);
                false
            }
        }
    }

    async fn read_document(&self) -> KnowledgeBaseDocument {
        let path = &self.config.path;
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No knowledge base at {}, starting empty", path.display());
                return KnowledgeBaseDocument::default();
            }
            Err(e) => {
                warn!("Failed to read knowledge base {}: {}", path.display(), e);
                return KnowledgeBaseDocument::default();
            }
        };

        match serde_json::from_str::<KnowledgeBaseDocument>(&raw) {
            Ok(mut doc) => {
                let dropped = doc.enforce_retention(&self.config);
                if dropped > 0 {
                    info!("Loaded knowledge base over retention caps, dropped {}", dropped);
                }
                doc
            }
            Err(e) => {
                warn!("Corrupt knowledge base {}: {}", path.display(), e);
                KnowledgeBaseDocument::default()
            }
        }
    }
}

fn new_pattern(description: String, context: Option<String>) -> Pattern {
    Pattern {
        id: Uuid::new_v4(),
        description,
        context,
        created_at: Utc::now(),
    }
}

fn pattern_text(pattern: &Pattern) -> String {
    match &pattern.context {
        Some(context) => format!("{} {}", pattern.description, context),
        None => pattern.description.clone(),
    }
}

/// Keep records sharing at least one word with `context`, ordered by
/// overlap descending then newest first, at most `limit`.
fn rank<'a, T, I, F>(context: &str, records: I, limit: usize, text: F) -> Vec<T>
where
    T: Clone + 'a,
    I: DoubleEndedIterator<Item = &'a T>,
    F: Fn(&T) -> String,
{
    let wanted = token_set(context);
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &T)> = records
        .rev()
        .filter_map(|record| {
            let overlap = token_set(&text(record)).intersection(&wanted).count();
            (overlap > 0).then_some((overlap, record))
        })
        .collect();

    // stable: equal overlap keeps newest first
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, record)| record.clone())
        .collect()
}

async fn write_document(path: &Path, doc: &KnowledgeBaseDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| KgError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(doc)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| KgError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| KgError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kb_in(dir: &TempDir) -> KnowledgeBase {
        KnowledgeBase::new(KnowledgeBaseConfig::at(dir.path().join("kb.json"))).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_document() {
        let dir = TempDir::new().unwrap();
        let kb = kb_in(&dir);

        let doc = kb.load().await;
        assert_eq!(doc, KnowledgeBaseDocument::default());
        assert!(kb.recommendations("anything").await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_document() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("kb.json"), "{ not json").unwrap();
        let kb = kb_in(&dir);

        assert_eq!(kb.load().await, KnowledgeBaseDocument::default());
    }

    #[tokio::test]
    async fn test_recommendations_rank_by_overlap() {
        let dir = TempDir::new().unwrap();
        let kb = kb_in(&dir);

        assert!(kb.add_solution("login fails", "refresh token", vec![]).await);
        assert!(
            kb.add_solution("react login form fails", "fix form state", vec!["react".into()])
                .await
        );
        assert!(kb.add_solution("slow build", "enable caching", vec![]).await);
        assert!(kb.add_error_pattern("login retried forever", None).await);

        let recs = kb.recommendations("React login fails").await;
        assert_eq!(recs.solutions.len(), 2);
        assert_eq!(recs.solutions[0].problem, "react login form fails");
        assert_eq!(recs.solutions[1].problem, "login fails");
        assert_eq!(recs.error_patterns.len(), 1);
        assert!(recs.success_patterns.is_empty());
    }

    #[tokio::test]
    async fn test_recommendations_respect_max_results() {
        let dir = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            max_results: 2,
            ..KnowledgeBaseConfig::at(dir.path().join("kb.json"))
        };
        let kb = KnowledgeBase::new(config).unwrap();

        for i in 0..5 {
            kb.record_context(format!("deploy attempt {}", i), None).await;
        }

        let recs = kb.recommendations("deploy").await;
        assert_eq!(recs.similar_contexts.len(), 2);
        assert_eq!(recs.similar_contexts[0].context, "deploy attempt 4");
    }

    #[tokio::test]
    async fn test_write_clears_cached_reads() {
        let dir = TempDir::new().unwrap();
        let kb = kb_in(&dir);

        assert!(kb.load().await.solutions.is_empty());
        assert!(kb.recommendations("cache").await.is_empty());

        kb.add_solution("cache misses", "warm on start", vec![]).await;

        assert_eq!(kb.load().await.solutions.len(), 1);
        assert_eq!(kb.recommendations("cache").await.solutions.len(), 1);
    }

    #[tokio::test]
    async fn test_retention_caps_each_section() {
        let dir = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            max_contexts: 3,
            max_patterns: 2,
            ..KnowledgeBaseConfig::at(dir.path().join("kb.json"))
        };
        let kb = KnowledgeBase::new(config).unwrap();

        for i in 0..5 {
            kb.record_context(format!("ctx {}", i), None).await;
            kb.add_success_pattern(format!("worked {}", i), None).await;
        }

        let doc = kb.load().await;
        let contexts: Vec<_> = doc.contexts.iter().map(|c| c.context.as_str()).collect();
        assert_eq!(contexts, vec!["ctx 2", "ctx 3", "ctx 4"]);
        assert_eq!(doc.patterns.success.len(), 2);
        assert!(doc.patterns.error.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = KnowledgeBaseConfig::default();
        assert!(config.validate().is_ok());
        config.max_results = 0;
        assert!(config.validate().is_err());
    }
}
