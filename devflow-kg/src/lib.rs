//! # DevFlow Knowledge Graph (devflow-kg)
//!
//! An in-process knowledge graph for AI developer workflows, persisted as
//! one JSON file per record.
//!
//! ## Features
//!
//! - Entity extraction from free text: code declarations, a fixed
//!   vocabulary of concepts and technologies, and process steps
//! - Pairwise relationship typing and scoring with a minimum-score floor
//! - Deterministic, content-derived ids so re-ingesting is idempotent
//! - Structured queries with bounded depth-first path search
//! - A short-TTL read-through cache in front of a flat knowledge-base
//!   document
//! - Async-first design using tokio
//!
//! ## Building the Graph
//!
//! ```no_run
//! use devflow_kg::{GraphConfig, KnowledgeGraph};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let graph = KnowledgeGraph::new(GraphConfig::default())?;
//!     graph.load_existing_graph().await;
//!
//!     let report = graph
//!         .ingest(
//!             "class AuthService {}\nfunction login() {}\nUses React and Redis for caching.",
//!             Some("auth-feature"),
//!         )
//!         .await;
//!     println!(
//!         "{} entities, {} relationships",
//!         report.entities.len(),
//!         report.relationships.len()
//!     );
//!
//!     graph.check_persistence()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Querying
//!
//! Each query dimension is independent; an unrequested one comes back
//! empty.
//!
//! ```no_run
//! use devflow_kg::{EntityType, GraphConfig, GraphQuery, KnowledgeGraph, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let graph = KnowledgeGraph::new(GraphConfig::default())?;
//!     graph.load_existing_graph().await;
//!
//!     let classes = graph
//!         .query_graph(
//!             &GraphQuery::new().entity_type(EntityType::Class).entity_name("auth"),
//!             QueryOptions::default(),
//!         )
//!         .await;
//!     for entity in &classes.entities {
//!         println!("{} ({:.2})", entity.name, entity.confidence);
//!     }
//!
//!     let paths = graph
//!         .query_graph(
//!             &GraphQuery::new()
//!                 .source_entity("ent_a")
//!                 .target_entity("ent_b")
//!                 .find_path(true),
//!             QueryOptions::default().with_max_depth(4),
//!         )
//!         .await;
//!     if paths.truncated {
//!         println!("path search stopped early");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod index;
pub mod query;
pub mod relate;
pub mod schema;
pub mod storage;
pub mod text;

// Re-export main types for convenience
pub use cache::{
    normalize_cache_key, CacheConfig, CacheKeyBuilder, CacheStats, KnowledgeBase,
    KnowledgeBaseConfig, Recommendations, TtlCache,
};
pub use config::{GraphConfig, GraphConfigBuilder};
pub use error::{KgError, Result};
pub use extract::{ExtractionPipeline, Extractor};
pub use graph::{GraphStats, IngestReport, KnowledgeGraph, LoadReport};
pub use query::{GraphQuery, QueryMetrics, QueryOptions, QueryResult};
pub use schema::{Entity, EntityType, Relationship, RelationshipType};
