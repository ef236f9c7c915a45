//! Structured queries over the graph index
//!
//! A [`GraphQuery`] has three independent dimensions:
//!
//! - entity filter: `entity_type` and/or `entity_name` (case-insensitive
//!   substring), sorted by descending confidence
//! - relationship filter: any of `relationship_type`, `source_entity`,
//!   `target_entity`, all supplied filters must match, sorted by
//!   descending score
//! - path search: `find_path` with both endpoints, depth-first along
//!   outgoing edges
//!
//! A dimension that is not requested yields an empty vector.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::index::GraphIndex;
use crate::schema::{Entity, EntityType, Relationship, RelationshipType};

/// Query over entities, relationships and paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphQuery {
    pub entity_type: Option<EntityType>,
    pub entity_name: Option<String>,
    pub relationship_type: Option<RelationshipType>,
    pub source_entity: Option<String>,
    pub target_entity: Option<String>,
    pub find_path: bool,

    /// An entity type was supplied but not recognised
    #[serde(skip)]
    unknown_entity_type: bool,

    /// A relationship type was supplied but not recognised
    #[serde(skip)]
    unknown_relationship_type: bool,
}

impl GraphQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter entities by type
    pub fn entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    /// Filter entities by case-insensitive name substring
    pub fn entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    /// Filter relationships by type
    pub fn relationship_type(mut self, relationship_type: RelationshipType) -> Self {
        self.relationship_type = Some(relationship_type);
        self
    }

    /// Filter relationships by source id
    pub fn source_entity(mut self, id: impl Into<String>) -> Self {
        self.source_entity = Some(id.into());
        self
    }

    /// Filter relationships by target id
    pub fn target_entity(mut self, id: impl Into<String>) -> Self {
        self.target_entity = Some(id.into());
        self
    }

    /// Request path search between `source_entity` and `target_entity`
    pub fn find_path(mut self, find_path: bool) -> Self {
        self.find_path = find_path;
        self
    }

    /// Build a query from loosely-shaped JSON.
    ///
    /// Missing or mistyped fields mean "no filter". A type name that does
    /// not parse makes its dimension match nothing.
    pub fn from_json(value: &JsonValue) -> Self {
        let mut query = GraphQuery::default();
        let Some(obj) = value.as_object() else {
            return query;
        };

        let text = |key: &str| obj.get(key).and_then(JsonValue::as_str).map(str::to_string);

        if let Some(raw) = text("entityType") {
            query.entity_type = EntityType::from_str(&raw);
            query.unknown_entity_type = query.entity_type.is_none();
        }
        if let Some(raw) = text("relationshipType") {
            query.relationship_type = RelationshipType::from_str(&raw);
            query.unknown_relationship_type = query.relationship_type.is_none();
        }
        query.entity_name = text("entityName");
        query.source_entity = text("sourceEntity");
        query.target_entity = text("targetEntity");
        query.find_path = obj
            .get("findPath")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

        query
    }

    fn wants_entities(&self) -> bool {
        self.entity_type.is_some() || self.entity_name.is_some() || self.unknown_entity_type
    }

    fn wants_relationships(&self) -> bool {
        self.relationship_type.is_some()
            || self.source_entity.is_some()
            || self.target_entity.is_some()
            || self.unknown_relationship_type
    }

    fn path_endpoints(&self) -> Option<(&str, &str)> {
        if !self.find_path {
            return None;
        }
        Some((self.source_entity.as_deref()?, self.target_entity.as_deref()?))
    }
}

/// Per-call overrides of the configured path search limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum number of edges in a path (default from config, 3)
    pub max_depth: Option<usize>,
    /// Maximum number of paths to enumerate
    pub max_paths: Option<usize>,
    /// Wall-clock budget for path search
    pub timeout: Option<Duration>,
}

impl QueryOptions {
    /// Override the path depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Override the path count cap
    pub fn with_max_paths(mut self, max: usize) -> Self {
        self.max_paths = Some(max);
        self
    }

    /// Override the path search budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of [`KnowledgeGraph::query_graph`](crate::graph::KnowledgeGraph::query_graph)
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    /// Each path is an ordered list of entity ids, source first
    pub paths: Vec<Vec<String>>,
    /// Path search stopped early on the path cap or time budget
    pub truncated: bool,
    /// Path search ran out of its time budget
    pub timed_out: bool,
    /// Time spent answering the query
    pub elapsed: Duration,
}

/// Running query latency metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QueryMetrics {
    pub total_queries: u64,
    pub total_time: Duration,
    pub last_query_time: Duration,
    pub slowest_query_time: Duration,
}

impl QueryMetrics {
    /// Record one query's latency
    pub fn record(&mut self, elapsed: Duration) {
        self.total_queries += 1;
        self.total_time += elapsed;
        self.last_query_time = elapsed;
        self.slowest_query_time = self.slowest_query_time.max(elapsed);
    }

    /// Mean latency over all recorded queries
    pub fn average_query_time(&self) -> Duration {
        if self.total_queries == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total_time.as_nanos() / u128::from(self.total_queries);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }
}

/// Resolved limits for one path search
#[derive(Debug, Clone, Copy)]
pub struct PathLimits {
    pub max_depth: usize,
    pub max_paths: usize,
    pub timeout: Duration,
}

/// Entities matching the query's entity dimension
pub fn filter_entities(index: &GraphIndex, query: &GraphQuery) -> Vec<Entity> {
    if !query.wants_entities() || query.unknown_entity_type {
        return Vec::new();
    }

    let needle = query.entity_name.as_deref().map(str::to_lowercase);
    let name_matches = |e: &Entity| {
        needle
            .as_deref()
            .map_or(true, |n| e.name.to_lowercase().contains(n))
    };

    let mut entities: Vec<Entity> = match query.entity_type {
        Some(entity_type) => index
            .entities_of_type(entity_type)
            .filter(|e| name_matches(e))
            .cloned()
            .collect(),
        None => index.entities().filter(|e| name_matches(e)).cloned().collect(),
    };

    entities.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.name.cmp(&b.name))
    });
    entities
}

/// Relationships matching the query's relationship dimension
pub fn filter_relationships(index: &GraphIndex, query: &GraphQuery) -> Vec<Relationship> {
    if !query.wants_relationships() || query.unknown_relationship_type {
        return Vec::new();
    }

    let matches = |r: &Relationship| {
        query.source_entity.as_deref().map_or(true, |s| r.source == s)
            && query.target_entity.as_deref().map_or(true, |t| r.target == t)
    };

    let mut relationships: Vec<Relationship> = match query.relationship_type {
        Some(relationship_type) => index
            .relationships_of_type(relationship_type)
            .filter(|r| matches(r))
            .cloned()
            .collect(),
        None => index.relationships().filter(|r| matches(r)).cloned().collect(),
    };

    relationships.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.id.cmp(&b.id))
    });
    relationships
}

/// Outcome of a bounded path search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSearch {
    pub paths: Vec<Vec<String>>,
    /// Stopped because `max_paths` was reached
    pub hit_path_cap: bool,
    /// Stopped because the time budget ran out
    pub timed_out: bool,
}

impl PathSearch {
    /// Whether the search stopped before exhausting the graph
    pub fn truncated(&self) -> bool {
        self.hit_path_cap || self.timed_out
    }
}

struct PathWalker<'a> {
    index: &'a GraphIndex,
    target: &'a str,
    limits: PathLimits,
    started: Instant,
    path: Vec<String>,
    on_path: HashSet<String>,
    seen: HashSet<Vec<String>>,
    result: PathSearch,
}

impl PathWalker<'_> {
    fn should_stop(&mut self) -> bool {
        if self.result.paths.len() >= self.limits.max_paths {
            self.result.hit_path_cap = true;
        }
        if self.started.elapsed() >= self.limits.timeout {
            self.result.timed_out = true;
        }
        self.result.truncated()
    }

    fn walk(&mut self, node: &str, depth: usize) {
        if self.should_stop() {
            return;
        }

        if node == self.target {
            if self.seen.insert(self.path.clone()) {
                self.result.paths.push(self.path.clone());
            }
            return;
        }

        if depth >= self.limits.max_depth {
            return;
        }

        let index = self.index;
        for edge in index.outgoing(node) {
            if self.on_path.contains(&edge.target) {
                continue;
            }

            self.path.push(edge.target.clone());
            self.on_path.insert(edge.target.clone());
            self.walk(&edge.target, depth + 1);
            self.on_path.remove(&edge.target);
            self.path.pop();

            if self.result.truncated() {
                return;
            }
        }
    }
}

/// Every distinct path from `source` to `target` along outgoing edges with
/// at most `limits.max_depth` edges.
///
/// A node is never revisited within one path, so cycles terminate; the
/// same node may appear in several returned paths.
pub fn find_paths(
    index: &GraphIndex,
    source: &str,
    target: &str,
    limits: PathLimits,
) -> PathSearch {
    if source == target {
        let paths = if index.entity(source).is_some() {
            vec![vec![source.to_string()]]
        } else {
            Vec::new()
        };
        return PathSearch {
            paths,
            ..Default::default()
        };
    }

    let mut walker = PathWalker {
        index,
        target,
        limits,
        started: Instant::now(),
        path: vec![source.to_string()],
        on_path: HashSet::from([source.to_string()]),
        seen: HashSet::new(),
        result: PathSearch::default(),
    };
    walker.walk(source, 0);

    if walker.result.timed_out {
        warn!(
            "Path search {} -> {} exceeded {:?}; returning {} partial paths",
            source,
            target,
            limits.timeout,
            walker.result.paths.len()
        );
    } else if walker.result.hit_path_cap {
        warn!(
            "Path search {} -> {} reached the cap of {} paths",
            source, target, limits.max_paths
        );
    }

    walker.result
}

/// Answer `query` against `index`
pub fn execute(index: &GraphIndex, query: &GraphQuery, limits: PathLimits) -> QueryResult {
    let started = Instant::now();

    let entities = filter_entities(index, query);
    let relationships = filter_relationships(index, query);
    let search = match query.path_endpoints() {
        Some((source, target)) => find_paths(index, source, target, limits),
        None => PathSearch::default(),
    };
    let truncated = search.truncated();

    QueryResult {
        entities,
        relationships,
        paths: search.paths,
        truncated,
        timed_out: search.timed_out,
        elapsed: started.elapsed(),
    }
}
