//! Line-based extractor for process steps

use once_cell::sync::Lazy;
use regex::Regex;

use super::Extractor;
use crate::schema::{Entity, EntityType};

const PROCESS_CONFIDENCE: f64 = 0.6;
const MAX_STEP_NAME_CHARS: usize = 80;

static ENUMERATED_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\d+[.)]|[-*•]|step\s*\d+\s*[:.)-])\s+(\S.*)$")
        .expect("valid step regex")
});

static IMPERATIVE_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:first|then|next|finally|install|create|configure|run|build|deploy|add|update|test|verify|initialize|setup|set up)\b[\s,:]+\S",
    )
    .expect("valid imperative regex")
});

/// Detects numbered, bulleted, `Step N:` and imperative lines.
///
/// Each detected step gets its 1-based position as `order`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExtractor;

impl Extractor for ProcessExtractor {
    fn name(&self) -> &'static str {
        "process"
    }

    fn extract(&self, content: &str, snippet_length: usize) -> Vec<Entity> {
        let mut entities = Vec::new();

        for line in content.lines().map(str::trim) {
            let step = if let Some(caps) = ENUMERATED_STEP.captures(line) {
                caps.get(1).map(|m| m.as_str().trim())
            } else if IMPERATIVE_STEP.is_match(line) {
                Some(line)
            } else {
                None
            };

            let Some(step) = step.filter(|s| s.chars().count() >= 3) else {
                continue;
            };

            let name: String = step.chars().take(MAX_STEP_NAME_CHARS).collect();
            let snippet: String = line.chars().take(snippet_length).collect();
            let order = entities.len() + 1;

            entities.push(
                Entity::new(EntityType::Process, name.trim_end(), snippet, PROCESS_CONFIDENCE)
                    .with_order(order),
            );
        }

        entities
    }
}
