//! Type definitions for knowledge graph nodes and edges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{generate_entity_id, generate_relationship_id};

/// Entity type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// A function or method declaration
    Function,
    /// A class declaration
    Class,
    /// A UI component
    Component,
    /// A domain concept (authentication, caching, ...)
    Concept,
    /// A named technology (React, PostgreSQL, ...)
    Technology,
    /// A step in a described process
    Process,
}

impl EntityType {
    /// All entity types, in declaration order
    pub const ALL: [EntityType; 6] = [
        EntityType::Function,
        EntityType::Class,
        EntityType::Component,
        EntityType::Concept,
        EntityType::Technology,
        EntityType::Process,
    ];

    /// Convert to the persisted string form
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Function => "FUNCTION",
            EntityType::Class => "CLASS",
            EntityType::Component => "COMPONENT",
            EntityType::Concept => "CONCEPT",
            EntityType::Technology => "TECHNOLOGY",
            EntityType::Process => "PROCESS",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FUNCTION" => Some(EntityType::Function),
            "CLASS" => Some(EntityType::Class),
            "COMPONENT" => Some(EntityType::Component),
            "CONCEPT" => Some(EntityType::Concept),
            "TECHNOLOGY" => Some(EntityType::Technology),
            "PROCESS" => Some(EntityType::Process),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    SimilarTo,
    DependsOn,
    Implements,
    Uses,
    Contains,
    RelatedTo,
    Follows,
    Precedes,
    BelongsTo,
}

impl RelationshipType {
    /// Convert to the persisted string form
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::SimilarTo => "SIMILAR_TO",
            RelationshipType::DependsOn => "DEPENDS_ON",
            RelationshipType::Implements => "IMPLEMENTS",
            RelationshipType::Uses => "USES",
            RelationshipType::Contains => "CONTAINS",
            RelationshipType::RelatedTo => "RELATED_TO",
            RelationshipType::Follows => "FOLLOWS",
            RelationshipType::Precedes => "PRECEDES",
            RelationshipType::BelongsTo => "BELONGS_TO",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SIMILAR_TO" => Some(RelationshipType::SimilarTo),
            "DEPENDS_ON" => Some(RelationshipType::DependsOn),
            "IMPLEMENTS" => Some(RelationshipType::Implements),
            "USES" => Some(RelationshipType::Uses),
            "CONTAINS" => Some(RelationshipType::Contains),
            "RELATED_TO" => Some(RelationshipType::RelatedTo),
            "FOLLOWS" => Some(RelationshipType::Follows),
            "PRECEDES" => Some(RelationshipType::Precedes),
            "BELONGS_TO" => Some(RelationshipType::BelongsTo),
            _ => None,
        }
    }

    /// Type-specific base weight used in relationship scoring
    pub fn base_weight(&self) -> f64 {
        match self {
            RelationshipType::SimilarTo => 0.8,
            RelationshipType::DependsOn => 0.9,
            RelationshipType::Implements => 0.85,
            RelationshipType::Uses => 0.75,
            RelationshipType::Contains => 0.9,
            RelationshipType::RelatedTo => 0.5,
            RelationshipType::Follows => 0.7,
            RelationshipType::Precedes => 0.7,
            RelationshipType::BelongsTo => 0.6,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity node extracted from free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Deterministic identifier derived from `(entity_type, name)`
    pub id: String,
    /// Kind of entity
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Surface string identifying the entity
    pub name: String,
    /// Text fragment the entity was extracted from
    pub content: String,
    /// Extraction confidence in [0, 1]
    pub confidence: f64,
    /// Occurrence count (concepts and technologies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<usize>,
    /// Position among extracted process steps (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    /// Provenance, e.g. a source document identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Timestamp when the entity was extracted
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Create a new entity; the id is derived from type and name
    pub fn new(
        entity_type: EntityType,
        name: impl Into<String>,
        content: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let name = name.into();
        Self {
            id: generate_entity_id(entity_type, &name),
            entity_type,
            name,
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            frequency: None,
            order: None,
            context: None,
            created_at: Utc::now(),
        }
    }

    /// Set the occurrence count
    pub fn with_frequency(mut self, frequency: usize) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Set the process step position
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the provenance string
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }
}

/// Directed, typed, scored edge between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Deterministic identifier derived from `(source, type, target)`
    pub id: String,
    /// Kind of relationship
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    /// Source entity id
    pub source: String,
    /// Target entity id
    pub target: String,
    /// Strength in [0, 1]
    pub score: f64,
    /// Provenance, e.g. a source document identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Timestamp when the relationship was created
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// Create a new relationship; the id is derived from its endpoints and type
    pub fn new(
        source: impl Into<String>,
        relationship_type: RelationshipType,
        target: impl Into<String>,
        score: f64,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: generate_relationship_id(&source, relationship_type, &target),
            relationship_type,
            source,
            target,
            score: score.clamp(0.0, 1.0),
            context: None,
            created_at: Utc::now(),
        }
    }

    /// Set the provenance string
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }
}
