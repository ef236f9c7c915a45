//! Declaration extractor for functions, classes and UI components

use once_cell::sync::Lazy;
use regex::Regex;

use super::Extractor;
use crate::schema::{Entity, EntityType};
use crate::text::snippet;

const CLASS_CONFIDENCE: f64 = 0.95;
const FUNCTION_CONFIDENCE: f64 = 0.9;
const COMPONENT_CONFIDENCE: f64 = 0.85;

static CLASS_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)").expect("valid class regex"));

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:function\s*\*?|fn|def)\s+([A-Za-z_$][\w$]*)\s*[(<]")
        .expect("valid function regex")
});

static ARROW_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
    )
    .expect("valid arrow function regex")
});

static JSX_USAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Z][A-Za-z0-9]*)[\s/>]").expect("valid jsx regex"));

/// Finds `class`, `function`/`fn`/`def`, arrow-function and JSX component
/// declarations.
///
/// Capitalised function names are treated as components, matching the
/// React naming convention.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeExtractor;

impl CodeExtractor {
    fn callable(name: &str, content: &str, start: usize, snippet_length: usize) -> Entity {
        let starts_upper = name.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        let (entity_type, confidence) = if starts_upper {
            (EntityType::Component, COMPONENT_CONFIDENCE)
        } else {
            (EntityType::Function, FUNCTION_CONFIDENCE)
        };
        Entity::new(
            entity_type,
            name,
            snippet(content, start, snippet_length),
            confidence,
        )
    }
}

impl Extractor for CodeExtractor {
    fn name(&self) -> &'static str {
        "code"
    }

    fn extract(&self, content: &str, snippet_length: usize) -> Vec<Entity> {
        let mut entities = Vec::new();

        for caps in CLASS_DECL.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            entities.push(Entity::new(
                EntityType::Class,
                name.as_str(),
                snippet(content, whole.start(), snippet_length),
                CLASS_CONFIDENCE,
            ));
        }

        for regex in [&*FUNCTION_DECL, &*ARROW_DECL] {
            for caps in regex.captures_iter(content) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                entities.push(Self::callable(
                    name.as_str(),
                    content,
                    whole.start(),
                    snippet_length,
                ));
            }
        }

        for caps in JSX_USAGE.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            entities.push(Entity::new(
                EntityType::Component,
                name.as_str(),
                snippet(content, whole.start(), snippet_length),
                COMPONENT_CONFIDENCE,
            ));
        }

        entities
    }
}
