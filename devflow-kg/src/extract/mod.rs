//! Entity extraction pipeline
//!
//! A fixed sequence of independent [`Extractor`]s runs over the input text
//! and their outputs are concatenated. The pipeline then collapses repeated
//! `(type, name)` pairs (first occurrence wins) and truncates the result to
//! the configured cap, dropping the tail so identical input always yields
//! identical output.

pub mod code;
pub mod process;
pub mod vocabulary;

pub use code::CodeExtractor;
pub use process::ProcessExtractor;
pub use vocabulary::VocabularyExtractor;

use std::collections::HashSet;

use tracing::debug;

use crate::schema::Entity;

/// A single entity extraction strategy
pub trait Extractor: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Extract entities from `content`, storing at most `snippet_length`
    /// chars of originating text on each entity
    fn extract(&self, content: &str, snippet_length: usize) -> Vec<Entity>;
}

/// Ordered set of extractors applied to each content blob
pub struct ExtractionPipeline {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(vec![
            Box::new(CodeExtractor),
            Box::new(VocabularyExtractor),
            Box::new(ProcessExtractor),
        ])
    }
}

impl ExtractionPipeline {
    /// Create a pipeline from an explicit extractor list
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Run every extractor, dedupe, tag with `context`, and keep at most
    /// `max_entities` results
    pub fn run(
        &self,
        content: &str,
        context: Option<&str>,
        max_entities: usize,
        snippet_length: usize,
    ) -> Vec<Entity> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        for extractor in &self.extractors {
            let found = extractor.extract(content, snippet_length);
            debug!("Extractor '{}' found {} entities", extractor.name(), found.len());

            for entity in found {
                if seen.insert(entity.id.clone()) {
                    entities.push(entity.with_context(context.map(str::to_string)));
                }
            }
        }

        if entities.len() > max_entities {
            debug!(
                "Truncating {} extracted entities to {}",
                entities.len(),
                max_entities
            );
            entities.truncate(max_entities);
        }

        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityType;

    #[test]
    fn test_pipeline_concatenates_in_order() {
        let content = "class UserService { }\nfunction authenticateUser() {}\nUses authentication with redis.\n1. Deploy the service";
        let entities = ExtractionPipeline::default().run(content, Some("doc-1"), 50, 200);

        let types: Vec<_> = entities.iter().map(|e| e.entity_type).collect();
        assert_eq!(
            types,
            vec![
                EntityType::Class,
                EntityType::Function,
                EntityType::Concept,
                EntityType::Technology,
                EntityType::Process,
            ]
        );
        assert!(entities.iter().all(|e| e.context.as_deref() == Some("doc-1")));
    }

    #[test]
    fn test_duplicates_collapse() {
        let content = "function save() {}\nfunction save() {}";
        let entities = ExtractionPipeline::default().run(content, None, 50, 200);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_truncation_is_deterministic() {
        let content: String = (0..30).map(|i| format!("function f{}() {{}}\n", i)).collect();
        let pipeline = ExtractionPipeline::default();

        let first = pipeline.run(&content, None, 10, 200);
        let second = pipeline.run(&content, None, 10, 200);

        assert_eq!(first.len(), 10);
        let first_names: Vec<_> = first.iter().map(|e| e.name.clone()).collect();
        let second_names: Vec<_> = second.iter().map(|e| e.name.clone()).collect();
        assert_eq!(first_names, second_names);
        assert_eq!(first_names[0], "f0");
        assert_eq!(first_names[9], "f9");
    }

    #[test]
    fn test_empty_content() {
        assert!(ExtractionPipeline::default().run("", None, 50, 200).is_empty());
        assert!(ExtractionPipeline::default().run("   \n\t", None, 50, 200).is_empty());
    }
}
