//! Order-insensitive cache key derivation
//!
//! Semantically identical lookups must land on the same slot, so keys are
//! built from normalized parameters: parameter order does not matter and
//! each value is reduced to its sorted, de-duplicated lowercase words.

use std::collections::BTreeMap;

use crate::cache::types::CacheKey;
use crate::text::token_set;

/// Normalize free text into a stable key fragment.
///
/// `"Fix the Login  bug"` and `"bug login fix the"` both yield
/// `"bug|fix|login|the"`.
pub fn normalize_cache_key(text: &str) -> String {
    token_set(text).into_iter().collect::<Vec<_>>().join("|")
}

/// Cache key builder
pub struct CacheKeyBuilder {
    namespace: String,
    params: BTreeMap<String, String>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder for `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter; its value is normalized
    pub fn param(mut self, key: impl Into<String>, value: &str) -> Self {
        self.params
            .insert(key.into().to_lowercase(), normalize_cache_key(value));
        self
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        if self.params.is_empty() {
            return self.namespace;
        }

        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.namespace, params.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_order_insensitive() {
        assert_eq!(normalize_cache_key("Fix the Login  bug"), "bug|fix|login|the");
        assert_eq!(
            normalize_cache_key("bug login fix the"),
            normalize_cache_key("Fix the Login  bug")
        );
        assert_eq!(normalize_cache_key("login login"), "login");
        assert_eq!(normalize_cache_key("  "), "");
    }

    #[test]
    fn test_builder_param_order_does_not_matter() {
        let a = CacheKeyBuilder::new("recommendations")
            .param("context", "React auth flow")
            .param("scope", "frontend")
            .build();
        let b = CacheKeyBuilder::new("recommendations")
            .param("Scope", "FRONTEND")
            .param("context", "flow auth react")
            .build();

        assert_eq!(a, b);
        assert_eq!(a, "recommendations?context=auth|flow|react&scope=frontend");
    }

    #[test]
    fn test_builder_without_params() {
        assert_eq!(CacheKeyBuilder::new("document").build(), "document");
    }
}
