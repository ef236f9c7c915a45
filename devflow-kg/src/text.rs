//! Text helpers shared by extraction, scoring and cache keys

use std::collections::BTreeSet;

/// Split text into lowercase word tokens.
///
/// Splits on any non-alphanumeric character and on camelCase boundaries,
/// so `authenticateUser`, `authenticate_user` and `Authenticate user` all
/// yield `["authenticate", "user"]`.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in text.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }

        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Distinct tokens of `text`
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

/// Jaccard similarity of the word sets of `a` and `b`.
///
/// Two empty sets have similarity 0.
pub fn jaccard(a: &str, b: &str) -> f64 {
    jaccard_sets(&token_set(a), &token_set(b))
}

/// Jaccard similarity of two precomputed token sets
pub fn jaccard_sets(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// At most `max_chars` characters of `text` starting at byte offset `start`.
///
/// `start` must be a char boundary (regex match offsets always are).
pub fn snippet(text: &str, start: usize, max_chars: usize) -> String {
    let tail = text.get(start..).unwrap_or(text);
    tail.chars().take(max_chars).collect::<String>().trim().to_string()
}
