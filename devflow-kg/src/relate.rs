//! Relationship typing and scoring
//!
//! Every unordered pair of entities from one document gets a relationship
//! type from [`classify`] and a score:
//!
//! ```text
//! raw   = base_weight(type) * 0.5 + name_jaccard * 0.3 + content_jaccard * 0.2
//! score = raw * mean(confidence_a, confidence_b)
//! ```
//!
//! Process steps carry confidence 0.6, so a `PRECEDES`/`FOLLOWS` edge
//! between two steps scores 0.21 from its base weight alone. Under the
//! default 0.3 floor, consecutive steps are only linked when their names
//! share words.

use std::collections::BTreeSet;

use tracing::debug;

use crate::schema::{Entity, EntityType, Relationship, RelationshipType};
use crate::text::{jaccard_sets, token_set};

const BASE_WEIGHT_FACTOR: f64 = 0.5;
const NAME_SIMILARITY_FACTOR: f64 = 0.3;
const CONTENT_SIMILARITY_FACTOR: f64 = 0.2;

/// Edge direction relative to the `(a, b)` pair passed to [`classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `a -> b`
    Forward,
    /// `b -> a`
    Reverse,
}

/// Decide the relationship type and direction for a pair of entities.
///
/// Code entities are always the source when paired with concepts or
/// technologies; process steps are the source of `BELONGS_TO` edges.
pub fn classify(a: &Entity, b: &Entity) -> (RelationshipType, Direction) {
    use Direction::*;
    use EntityType::*;
    use RelationshipType::*;

    match (a.entity_type, b.entity_type) {
        (Function, Function)
        | (Class, Class)
        | (Component, Component)
        | (Concept, Concept)
        | (Technology, Technology) => (SimilarTo, Forward),

        (Process, Process) => match (a.order, b.order) {
            (Some(x), Some(y)) if x < y => (Precedes, Forward),
            (Some(x), Some(y)) if x > y => (Follows, Forward),
            _ => (RelatedTo, Forward),
        },

        (Class, Function) => (Contains, Forward),
        (Function, Class) => (Contains, Reverse),

        (Component, Function) => (Uses, Forward),
        (Function, Component) => (Uses, Reverse),

        (Component, Class) => (DependsOn, Forward),
        (Class, Component) => (DependsOn, Reverse),

        (Function | Class | Component, Technology) => (Uses, Forward),
        (Technology, Function | Class | Component) => (Uses, Reverse),

        (Function | Class | Component, Concept) => (Implements, Forward),
        (Concept, Function | Class | Component) => (Implements, Reverse),

        (Technology, Concept) => (Implements, Forward),
        (Concept, Technology) => (Implements, Reverse),

        (Process, _) => (BelongsTo, Forward),
        (_, Process) => (BelongsTo, Reverse),
    }
}

/// Entity plus its precomputed token sets
struct Prepared<'a> {
    entity: &'a Entity,
    name_tokens: BTreeSet<String>,
    content_tokens: BTreeSet<String>,
}

impl<'a> Prepared<'a> {
    fn new(entity: &'a Entity) -> Self {
        Self {
            entity,
            name_tokens: token_set(&entity.name),
            content_tokens: token_set(&entity.content),
        }
    }
}

fn score_prepared(a: &Prepared<'_>, b: &Prepared<'_>, relationship_type: RelationshipType) -> f64 {
    let name_similarity = jaccard_sets(&a.name_tokens, &b.name_tokens);
    let content_similarity = jaccard_sets(&a.content_tokens, &b.content_tokens);
    let raw = relationship_type.base_weight() * BASE_WEIGHT_FACTOR
        + name_similarity * NAME_SIMILARITY_FACTOR
        + content_similarity * CONTENT_SIMILARITY_FACTOR;
    let mean_confidence = (a.entity.confidence + b.entity.confidence) / 2.0;

    (raw * mean_confidence).clamp(0.0, 1.0)
}

/// Score a relationship of `relationship_type` between `a` and `b`
pub fn score_pair(a: &Entity, b: &Entity, relationship_type: RelationshipType) -> f64 {
    score_prepared(&Prepared::new(a), &Prepared::new(b), relationship_type)
}

/// Build every relationship scoring at least `min_score` over all
/// unordered pairs of `entities`.
///
/// Pairs are taken by position, so two entries sharing an id still relate
/// to each other.
pub fn build_relationships(
    entities: &[Entity],
    context: Option<&str>,
    min_score: f64,
) -> Vec<Relationship> {
    let prepared: Vec<Prepared<'_>> = entities.iter().map(Prepared::new).collect();
    let mut relationships = Vec::new();
    let mut discarded = 0usize;

    for (i, a) in prepared.iter().enumerate() {
        for b in &prepared[i + 1..] {
            let (relationship_type, direction) = classify(a.entity, b.entity);
            let score = score_prepared(a, b, relationship_type);

            if score < min_score {
                discarded += 1;
                continue;
            }

            let (source, target) = match direction {
                Direction::Forward => (a.entity, b.entity),
                Direction::Reverse => (b.entity, a.entity),
            };
            relationships.push(
                Relationship::new(&source.id, relationship_type, &target.id, score)
                    .with_context(context.map(str::to_string)),
            );
        }
    }

    debug!(
        "Scored {} entity pairs: kept {}, discarded {} below {}",
        relationships.len() + discarded,
        relationships.len(),
        discarded,
        min_score
    );

    relationships
}
