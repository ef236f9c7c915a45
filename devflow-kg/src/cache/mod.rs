//! # Knowledge-Base Caching Layer
//!
//! A short-TTL, read-through cache in front of the flat knowledge-base
//! document.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: a read is fresh while `now - written_at < ttl`;
//!   expired entries read as misses and stay until overwritten or purged
//! - **LRU Eviction**: bounded entry count with least-recently-used eviction
//! - **Normalized Keys**: word-order-insensitive keys so equivalent lookups
//!   share a slot
//! - **Bounded Retention**: each knowledge-base section is a ring buffer
//!   that reports what it drops
//!
//! ## Example
//!
//! ```rust,no_run
//! use devflow_kg::cache::{KnowledgeBase, KnowledgeBaseConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let kb = KnowledgeBase::new(KnowledgeBaseConfig::at(".knowledge-graph/knowledge_base.json"))?;
//!
//! kb.add_solution("login fails after deploy", "rotate the session key", vec![]).await;
//!
//! let recs = kb.recommendations("deploy broke login").await;
//! for solution in &recs.solutions {
//!     println!("{} -> {}", solution.problem, solution.solution);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bounded;
pub mod config;
pub mod entry;
pub mod key;
pub mod knowledge_base;
pub mod store;
pub mod types;

pub use bounded::BoundedLog;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use key::{normalize_cache_key, CacheKeyBuilder};
pub use knowledge_base::{
    ContextRecord, KnowledgeBase, KnowledgeBaseConfig, KnowledgeBaseDocument, Pattern,
    PatternSets, Recommendations, Solution,
};
pub use store::TtlCache;
pub use types::{CacheKey, CacheState, CacheStats};
