//! Fixed-vocabulary extractor for domain concepts and technologies

use once_cell::sync::Lazy;
use regex::Regex;

use super::Extractor;
use crate::schema::{Entity, EntityType};
use crate::text::snippet;

const CONCEPTS: &[&str] = &[
    "authentication",
    "authorization",
    "caching",
    "validation",
    "routing",
    "state management",
    "error handling",
    "logging",
    "testing",
    "deployment",
    "database",
    "api",
    "middleware",
    "security",
    "performance",
    "pagination",
    "session",
    "encryption",
    "migration",
    "monitoring",
    "refactoring",
    "dependency injection",
];

const TECHNOLOGIES: &[&str] = &[
    "react",
    "vue",
    "angular",
    "node.js",
    "express",
    "mongodb",
    "mongoose",
    "postgresql",
    "mysql",
    "sqlite",
    "redis",
    "docker",
    "kubernetes",
    "typescript",
    "javascript",
    "python",
    "rust",
    "graphql",
    "playwright",
    "jest",
    "webpack",
    "aws",
    "git",
    "tokio",
];

struct Term {
    name: &'static str,
    pattern: Regex,
}

fn compile(terms: &[&'static str]) -> Vec<Term> {
    terms
        .iter()
        .map(|&name| Term {
            name,
            pattern: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name)))
                .expect("escaped vocabulary term is a valid regex"),
        })
        .collect()
}

static CONCEPT_TERMS: Lazy<Vec<Term>> = Lazy::new(|| compile(CONCEPTS));
static TECHNOLOGY_TERMS: Lazy<Vec<Term>> = Lazy::new(|| compile(TECHNOLOGIES));

/// Matches a fixed vocabulary of concepts and technologies.
///
/// Confidence grows with the number of occurrences and is capped at 0.9.
#[derive(Debug, Default, Clone, Copy)]
pub struct VocabularyExtractor;

impl VocabularyExtractor {
    fn scan(
        terms: &[Term],
        entity_type: EntityType,
        base_confidence: f64,
        content: &str,
        snippet_length: usize,
        out: &mut Vec<Entity>,
    ) {
        for term in terms {
            let mut matches = term.pattern.find_iter(content);
            let Some(first) = matches.next() else {
                continue;
            };
            let frequency = 1 + matches.count();
            let confidence = (base_confidence + 0.05 * frequency as f64).min(0.9);

            out.push(
                Entity::new(
                    entity_type,
                    term.name,
                    snippet(content, first.start(), snippet_length),
                    confidence,
                )
                .with_frequency(frequency),
            );
        }
    }
}

impl Extractor for VocabularyExtractor {
    fn name(&self) -> &'static str {
        "vocabulary"
    }

    fn extract(&self, content: &str, snippet_length: usize) -> Vec<Entity> {
        let mut entities = Vec::new();
        Self::scan(
            &CONCEPT_TERMS,
            EntityType::Concept,
            0.65,
            content,
            snippet_length,
            &mut entities,
        );
        Self::scan(
            &TECHNOLOGY_TERMS,
            EntityType::Technology,
            0.7,
            content,
            snippet_length,
            &mut entities,
        );
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concepts_with_frequency() {
        let content = "Authentication first. Then caching. Authentication again, and authentication.";
        let entities = VocabularyExtractor.extract(content, 200);

        let auth = entities
            .iter()
            .find(|e| e.name == "authentication")
            .unwrap();
        assert_eq!(auth.entity_type, EntityType::Concept);
        assert_eq!(auth.frequency, Some(3));
        assert!((auth.confidence - 0.8).abs() < 1e-9);

        let caching = entities.iter().find(|e| e.name == "caching").unwrap();
        assert_eq!(caching.frequency, Some(1));
        assert!((caching.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_technologies_and_cap() {
        let content = "react react react react react react with Node.js and Redis";
        let entities = VocabularyExtractor.extract(content, 200);

        let react = entities.iter().find(|e| e.name == "react").unwrap();
        assert_eq!(react.entity_type, EntityType::Technology);
        assert_eq!(react.confidence, 0.9);

        assert!(entities.iter().any(|e| e.name == "node.js"));
        assert!(entities.iter().any(|e| e.name == "redis"));
    }

    #[test]
    fn test_word_boundaries() {
        // "rusty" and "gitignore" must not count as rust / git
        let entities = VocabularyExtractor.extract("a rusty .gitignore file", 200);
        assert!(entities.is_empty());
    }
}
