//! Knowledge graph schema module
//!
//! Defines the Entity and Relationship records, their closed type
//! enumerations, and the deterministic id derivation shared by both.

pub mod ids;
pub mod types;

pub use ids::{generate_entity_id, generate_relationship_id};
pub use types::{Entity, EntityType, Relationship, RelationshipType};
