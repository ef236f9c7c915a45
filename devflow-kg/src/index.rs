//! In-memory graph index
//!
//! Holds `id -> record` maps, type-keyed id sets and an outgoing-edge
//! adjacency list. Inserting a record whose id is already present replaces
//! it in place, so re-extraction never duplicates nodes or edges.

use std::collections::{BTreeSet, HashMap};

use crate::schema::{Entity, EntityType, Relationship, RelationshipType};

/// Type-indexed view of every known entity and relationship
#[derive(Debug, Default, Clone)]
pub struct GraphIndex {
    entities: HashMap<String, Entity>,
    relationships: HashMap<String, Relationship>,
    entities_by_type: HashMap<EntityType, BTreeSet<String>>,
    relationships_by_type: HashMap<RelationshipType, BTreeSet<String>>,
    /// entity id -> ids of relationships whose source is that entity
    outgoing: HashMap<String, Vec<String>>,
}

impl GraphIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entity
    pub fn insert_entity(&mut self, entity: Entity) {
        if let Some(previous) = self.entities.get(&entity.id) {
            if previous.entity_type != entity.entity_type {
                if let Some(ids) = self.entities_by_type.get_mut(&previous.entity_type) {
                    ids.remove(&entity.id);
                }
            }
        }

        self.entities_by_type
            .entry(entity.entity_type)
            .or_default()
            .insert(entity.id.clone());
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Add or replace a relationship
    pub fn insert_relationship(&mut self, relationship: Relationship) {
        let id = relationship.id.clone();

        if self.relationships.contains_key(&id) {
            self.relationships.insert(id, relationship);
            return;
        }

        self.relationships_by_type
            .entry(relationship.relationship_type)
            .or_default()
            .insert(id.clone());
        self.outgoing
            .entry(relationship.source.clone())
            .or_default()
            .push(id.clone());
        self.relationships.insert(id, relationship);
    }

    /// Look up an entity by id
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Iterate every entity
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate every relationship
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Entities of one type
    pub fn entities_of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.entities_by_type
            .get(&entity_type)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }

    /// Relationships of one type
    pub fn relationships_of_type(
        &self,
        relationship_type: RelationshipType,
    ) -> impl Iterator<Item = &Relationship> {
        self.relationships_by_type
            .get(&relationship_type)
            .into_iter()
            .flatten()
            .filter_map(|id| self.relationships.get(id))
    }

    /// Relationships leaving `entity_id`, in insertion order
    pub fn outgoing(&self, entity_id: &str) -> impl Iterator<Item = &Relationship> {
        self.outgoing
            .get(entity_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.relationships.get(id))
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of relationships
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Entity counts per type
    pub fn entity_type_counts(&self) -> HashMap<EntityType, usize> {
        self.entities_by_type
            .iter()
            .map(|(t, ids)| (*t, ids.len()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}
