//! Configuration for the knowledge graph store

use crate::error::{KgError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for [`KnowledgeGraph`](crate::graph::KnowledgeGraph)
///
/// Defaults:
/// - 50 entities per document bounds the O(n²) relationship pass
/// - 0.3 minimum relationship score
/// - path search depth 3, at most 100 paths, 250ms budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Root directory holding `entities/` and `relationships/`
    pub storage_dir: PathBuf,

    /// Maximum number of entities kept from a single `extract_entities` call
    pub max_entities_per_document: usize,

    /// Relationships scoring below this are discarded at creation
    pub min_relationship_score: f64,

    /// Default maximum number of edges in a path query
    pub max_path_depth: usize,

    /// Upper bound on the number of paths a single query enumerates
    pub max_paths: usize,

    /// Wall-clock budget for one path search
    pub path_search_timeout: Duration,

    /// Maximum length (in chars) of the content snippet stored on an entity
    pub snippet_length: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".knowledge-graph"),
            max_entities_per_document: 50,
            min_relationship_score: 0.3,
            max_path_depth: 3,
            max_paths: 100,
            path_search_timeout: Duration::from_millis(250),
            snippet_length: 200,
        }
    }
}

impl GraphConfig {
    /// Create a new builder for graph configuration
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::default()
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| KgError::io(path, e))?;
        let config: GraphConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_entities_per_document == 0 {
            return Err(KgError::ConfigError(
                "max_entities_per_document must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_relationship_score) {
            return Err(KgError::ConfigError(
                "min_relationship_score must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.max_path_depth == 0 {
            return Err(KgError::ConfigError(
                "max_path_depth must be greater than 0".to_string(),
            ));
        }

        if self.max_paths == 0 {
            return Err(KgError::ConfigError(
                "max_paths must be greater than 0".to_string(),
            ));
        }

        if self.path_search_timeout.is_zero() {
            return Err(KgError::ConfigError(
                "path_search_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory holding one JSON file per entity
    pub fn entities_dir(&self) -> PathBuf {
        self.storage_dir.join("entities")
    }

    /// Directory holding one JSON file per relationship
    pub fn relationships_dir(&self) -> PathBuf {
        self.storage_dir.join("relationships")
    }
}

/// Builder for graph configuration
#[derive(Debug, Default)]
pub struct GraphConfigBuilder {
    storage_dir: Option<PathBuf>,
    max_entities_per_document: Option<usize>,
    min_relationship_score: Option<f64>,
    max_path_depth: Option<usize>,
    max_paths: Option<usize>,
    path_search_timeout: Option<Duration>,
    snippet_length: Option<usize>,
}

impl GraphConfigBuilder {
    /// Set the storage root
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Set the per-document entity cap
    pub fn max_entities_per_document(mut self, max: usize) -> Self {
        self.max_entities_per_document = Some(max);
        self
    }

    /// Set the minimum relationship score
    pub fn min_relationship_score(mut self, score: f64) -> Self {
        self.min_relationship_score = Some(score);
        self
    }

    /// Set the default path depth
    pub fn max_path_depth(mut self, depth: usize) -> Self {
        self.max_path_depth = Some(depth);
        self
    }

    /// Set the maximum number of paths per query
    pub fn max_paths(mut self, max: usize) -> Self {
        self.max_paths = Some(max);
        self
    }

    /// Set the path search time budget
    pub fn path_search_timeout(mut self, timeout: Duration) -> Self {
        self.path_search_timeout = Some(timeout);
        self
    }

    /// Set the stored snippet length
    pub fn snippet_length(mut self, len: usize) -> Self {
        self.snippet_length = Some(len);
        self
    }

    /// Build the graph configuration
    pub fn build(self) -> GraphConfig {
        let defaults = GraphConfig::default();

        GraphConfig {
            storage_dir: self.storage_dir.unwrap_or(defaults.storage_dir),
            max_entities_per_document: self
                .max_entities_per_document
                .unwrap_or(defaults.max_entities_per_document),
            min_relationship_score: self
                .min_relationship_score
                .unwrap_or(defaults.min_relationship_score),
            max_path_depth: self.max_path_depth.unwrap_or(defaults.max_path_depth),
            max_paths: self.max_paths.unwrap_or(defaults.max_paths),
            path_search_timeout: self
                .path_search_timeout
                .unwrap_or(defaults.path_search_timeout),
            snippet_length: self.snippet_length.unwrap_or(defaults.snippet_length),
        }
    }
}
