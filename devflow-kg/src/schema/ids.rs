//! Deterministic identifiers for graph records
//!
//! Ids are the first 16 hex chars of a SHA-256 digest, so re-extracting the
//! same entity (or re-creating the same edge) lands on the same record.

use sha2::{Digest, Sha256};

use super::types::{EntityType, RelationshipType};

fn short_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..8])
}

/// Id for an entity of `entity_type` named `name`
pub fn generate_entity_id(entity_type: EntityType, name: &str) -> String {
    format!("ent_{}", short_digest(&format!("{}:{}", entity_type.as_str(), name)))
}

/// Id for the directed edge `source -[relationship_type]-> target`
pub fn generate_relationship_id(
    source: &str,
    relationship_type: RelationshipType,
    target: &str,
) -> String {
    format!(
        "rel_{}",
        short_digest(&format!("{}:{}:{}", source, relationship_type.as_str(), target))
    )
}
