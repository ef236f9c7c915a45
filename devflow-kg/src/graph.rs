//! Knowledge graph store: extraction, relationship scoring, persistence
//! and queries over one in-memory index
//!
//! Writes update the index first and persist afterwards. A failed write is
//! logged and counted but never fails the call; use
//! [`KnowledgeGraph::check_persistence`] to surface it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::GraphConfig;
use crate::error::{KgError, Result};
use crate::extract::ExtractionPipeline;
use crate::index::GraphIndex;
use crate::query::{self, GraphQuery, PathLimits, QueryMetrics, QueryOptions, QueryResult};
use crate::relate::build_relationships;
use crate::schema::{Entity, EntityType, Relationship};
use crate::storage::GraphStorage;

/// Outcome of [`KnowledgeGraph::ingest`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    /// Writes that failed during this call
    pub persistence_failures: u64,
}

/// Outcome of [`KnowledgeGraph::load_existing_graph`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub entities: usize,
    pub relationships: usize,
    /// Entity files that could not be parsed
    pub skipped_entities: usize,
    /// Relationship files that could not be parsed
    pub skipped_relationships: usize,
    pub elapsed: Duration,
}

/// Point-in-time summary of the store
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub entity_count: usize,
    pub relationship_count: usize,
    pub entities_by_type: HashMap<EntityType, usize>,
    /// Writes that failed since this store was created
    pub persistence_failures: u64,
    pub query_metrics: QueryMetrics,
}

/// Entity/relationship store with file-per-record persistence
pub struct KnowledgeGraph {
    config: GraphConfig,
    index: RwLock<GraphIndex>,
    storage: GraphStorage,
    pipeline: ExtractionPipeline,
    metrics: RwLock<QueryMetrics>,
    persistence_failures: AtomicU64,
}

impl KnowledgeGraph {
    /// Create a store with the default extraction pipeline.
    ///
    /// Nothing is read from disk until
    /// [`load_existing_graph`](Self::load_existing_graph).
    pub fn new(config: GraphConfig) -> Result<Self> {
        Self::with_pipeline(config, ExtractionPipeline::default())
    }

    /// Create a store with a custom extraction pipeline
    pub fn with_pipeline(config: GraphConfig, pipeline: ExtractionPipeline) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing knowledge graph at {}",
            config.storage_dir.display()
        );

        Ok(Self {
            storage: GraphStorage::new(&config),
            config,
            index: RwLock::new(GraphIndex::new()),
            pipeline,
            metrics: RwLock::new(QueryMetrics::default()),
            persistence_failures: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Extract entities from `content`, index them and persist them.
    ///
    /// Blank content yields nothing. At most
    /// `max_entities_per_document` entities are returned.
    pub async fn extract_entities(&self, content: &str, context: Option<&str>) -> Vec<Entity> {
        self.extract_and_store(content, context).await.0
    }

    /// Score every pair of `entities`, then index and persist the
    /// relationships at or above `min_relationship_score`
    pub async fn create_relationships(
        &self,
        entities: &[Entity],
        context: Option<&str>,
    ) -> Vec<Relationship> {
        self.relate_and_store(entities, context).await.0
    }

    /// Extract entities from `content` and relate them in one step
    pub async fn ingest(&self, content: &str, context: Option<&str>) -> IngestReport {
        let (entities, entity_failures) = self.extract_and_store(content, context).await;
        let (relationships, relationship_failures) =
            self.relate_and_store(&entities, context).await;

        info!(
            "Ingested {} entities and {} relationships",
            entities.len(),
            relationships.len()
        );

        IngestReport {
            entities,
            relationships,
            persistence_failures: entity_failures + relationship_failures,
        }
    }

    /// Read every persisted record into the index.
    ///
    /// Missing directories and unreadable files are tolerated; records
    /// already in memory are kept.
    pub async fn load_existing_graph(&self) -> LoadReport {
        let started = Instant::now();

        let entities = self.storage.load_entities().await;
        let relationships = self.storage.load_relationships().await;

        let report = LoadReport {
            entities: entities.records.len(),
            relationships: relationships.records.len(),
            skipped_entities: entities.skipped,
            skipped_relationships: relationships.skipped,
            elapsed: started.elapsed(),
        };

        {
            let mut index = self.index.write().await;
            for entity in entities.records {
                index.insert_entity(entity);
            }
            for relationship in relationships.records {
                index.insert_relationship(relationship);
            }
        }

        if report.skipped_entities + report.skipped_relationships > 0 {
            warn!(
                "Skipped {} entity and {} relationship files while loading",
                report.skipped_entities, report.skipped_relationships
            );
        }
        info!(
            "Loaded {} entities and {} relationships in {:?}",
            report.entities, report.relationships, report.elapsed
        );

        report
    }

    /// Answer `query` from the in-memory index
    pub async fn query_graph(&self, query: &GraphQuery, options: QueryOptions) -> QueryResult {
        let limits = self.path_limits(options);
        let result = {
            let index = self.index.read().await;
            query::execute(&index, query, limits)
        };

        self.metrics.write().await.record(result.elapsed);
        debug!(
            "Query returned {} entities, {} relationships, {} paths in {:?}",
            result.entities.len(),
            result.relationships.len(),
            result.paths.len(),
            result.elapsed
        );

        result
    }

    /// Like [`query_graph`](Self::query_graph), but a path search that ran
    /// out of time is an error instead of a partial result
    pub async fn query_graph_strict(
        &self,
        query: &GraphQuery,
        options: QueryOptions,
    ) -> Result<QueryResult> {
        let result = self.query_graph(query, options).await;
        if result.timed_out {
            let timeout = self.path_limits(options).timeout;
            return Err(KgError::TimeoutError {
                timeout_ms: timeout.as_millis() as u64,
                context: format!("path search returned {} partial paths", result.paths.len()),
            });
        }
        Ok(result)
    }

    pub async fn query_metrics(&self) -> QueryMetrics {
        *self.metrics.read().await
    }

    pub async fn stats(&self) -> GraphStats {
        let index = self.index.read().await;
        GraphStats {
            entity_count: index.entity_count(),
            relationship_count: index.relationship_count(),
            entities_by_type: index.entity_type_counts(),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            query_metrics: *self.metrics.read().await,
        }
    }

    /// `Err(PersistenceDegraded)` once any write has failed
    pub fn check_persistence(&self) -> Result<()> {
        match self.persistence_failures.load(Ordering::Relaxed) {
            0 => Ok(()),
            failures => Err(KgError::PersistenceDegraded { failures }),
        }
    }

    fn path_limits(&self, options: QueryOptions) -> PathLimits {
        PathLimits {
            max_depth: options.max_depth.unwrap_or(self.config.max_path_depth),
            max_paths: options.max_paths.unwrap_or(self.config.max_paths),
            timeout: options.timeout.unwrap_or(self.config.path_search_timeout),
        }
    }

    async fn extract_and_store(&self, content: &str, context: Option<&str>) -> (Vec<Entity>, u64) {
        let entities = self.pipeline.run(
            content,
            context,
            self.config.max_entities_per_document,
            self.config.snippet_length,
        );
        if entities.is_empty() {
            return (entities, 0);
        }

        {
            let mut index = self.index.write().await;
            for entity in &entities {
                index.insert_entity(entity.clone());
            }
        }

        let mut failures = 0;
        for entity in &entities {
            if let Err(e) = self.storage.save_entity(entity).await {
                warn!("Failed to persist entity {}: {}", entity.id, e);
                failures += 1;
            }
        }
        self.note_failures(failures);

        debug!("Extracted {} entities", entities.len());
        (entities, failures)
    }

    async fn relate_and_store(
        &self,
        entities: &[Entity],
        context: Option<&str>,
    ) -> (Vec<Relationship>, u64) {
        let relationships =
            build_relationships(entities, context, self.config.min_relationship_score);
        if relationships.is_empty() {
            return (relationships, 0);
        }

        {
            let mut index = self.index.write().await;
            for relationship in &relationships {
                index.insert_relationship(relationship.clone());
            }
        }

        let mut failures = 0;
        for relationship in &relationships {
            if let Err(e) = self.storage.save_relationship(relationship).await {
                warn!("Failed to persist relationship {}: {}", relationship.id, e);
                failures += 1;
            }
        }
        self.note_failures(failures);

        (relationships, failures)
    }

    fn note_failures(&self, failures: u64) {
        if failures > 0 {
            self.persistence_failures
                .fetch_add(failures, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn graph_in(tmp: &TempDir) -> KnowledgeGraph {
        let config = GraphConfig::builder().storage_dir(tmp.path()).build();
        KnowledgeGraph::new(config).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GraphConfig::builder().max_entities_per_document(0).build();
        assert!(matches!(
            KnowledgeGraph::new(config),
            Err(KgError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_content_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let graph = graph_in(&tmp);

        assert!(graph.extract_entities("   \n\t", None).await.is_empty());
        assert!(!tmp.path().join("entities").exists());
        assert_eq!(graph.stats().await.entity_count, 0);
    }

    #[tokio::test]
    async fn test_entities_are_indexed_and_persisted() {
        let tmp = TempDir::new().unwrap();
        let graph = graph_in(&tmp);

        let entities = graph
            .extract_entities("class SessionStore {}", Some("unit"))
            .await;
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].context.as_deref(), Some("unit"));

        let path = tmp
            .path()
            .join("entities")
            .join(format!("{}.json", entities[0].id));
        assert!(path.exists());
        assert_eq!(graph.stats().await.entity_count, 1);
        assert!(graph.check_persistence().is_ok());
    }

    #[tokio::test]
    async fn test_write_failures_are_counted_not_raised() {
        let tmp = TempDir::new().unwrap();
        // a regular file where the storage root should be makes every write fail
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, "not a directory").unwrap();
        let config = GraphConfig::builder().storage_dir(&blocker).build();
        let graph = KnowledgeGraph::new(config).unwrap();

        let report = graph
            .ingest("class Cache {}\nfunction warmCache() {}", None)
            .await;

        assert_eq!(report.entities.len(), 2);
        assert!(report.persistence_failures >= 2);
        assert_eq!(graph.stats().await.entity_count, 2);
        assert!(matches!(
            graph.check_persistence(),
            Err(KgError::PersistenceDegraded { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_metrics_are_recorded() {
        let tmp = TempDir::new().unwrap();
        let graph = graph_in(&tmp);

        graph.ingest("class Cache {}", None).await;
        let query = GraphQuery::new().entity_type(EntityType::Class);
        graph.query_graph(&query, QueryOptions::default()).await;
        graph.query_graph(&query, QueryOptions::default()).await;

        let metrics = graph.query_metrics().await;
        assert_eq!(metrics.total_queries, 2);
        assert!(metrics.slowest_query_time >= metrics.last_query_time);
    }
}
