//! Integration tests for the cache module
//!
//! These tests verify:
//! - TTL boundary semantics with an injected clock
//! - Read-through loading of the knowledge-base document
//! - Order-insensitive recommendation keys
//! - Bounded retention per document section
//! - Concurrent cache access
//! - Reads racing a write never cache the pre-write document

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use devflow_kg::cache::{
    normalize_cache_key, BoundedLog, CacheConfig, CacheState, KnowledgeBase, KnowledgeBaseConfig,
    KnowledgeBaseDocument, Solution, TtlCache,
};
use tempfile::TempDir;
use uuid::Uuid;

fn solution(problem: &str, fix: &str) -> Solution {
    Solution {
        id: Uuid::new_v4(),
        problem: problem.to_string(),
        solution: fix.to_string(),
        tags: Vec::new(),
        created_at: Utc::now(),
    }
}

/// Write a document behind the knowledge base's back
fn write_document(path: &std::path::Path, problems: &[(&str, &str)]) {
    let mut doc = KnowledgeBaseDocument::default();
    for (problem, fix) in problems {
        doc.solutions.push(solution(problem, fix), 500);
    }
    std::fs::write(path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
}

#[tokio::test]
async fn test_ttl_boundary() {
    let ttl = Duration::from_secs(300);
    let cache = TtlCache::new(CacheConfig::builder().ttl(ttl).build());
    let t0 = Utc::now();

    cache.set_at("doc", 1u32, t0).await;

    let hit_at = t0 + chrono::Duration::milliseconds(299_999);
    let miss_at = t0 + chrono::Duration::milliseconds(300_001);
    assert_eq!(cache.get_at("doc", hit_at).await, Some(1));
    assert_eq!(cache.get_at("doc", miss_at).await, None);

    // Expiry never deletes; a later write revives the key
    assert_eq!(cache.len().await, 1);
    cache.set_at("doc", 2u32, miss_at).await;
    assert_eq!(cache.state_at("doc", miss_at).await, CacheState::Hit);
}

#[test]
fn test_ttl_expiration_with_real_clock() {
    tokio_test::block_on(async {
        let cache = TtlCache::new(
            CacheConfig::builder()
                .ttl(Duration::from_millis(100))
                .ttl_jitter(0.0)
                .build(),
        );

        cache.set("expiring_key", "expiring_value".to_string()).await;
        assert!(cache.get("expiring_key").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("expiring_key").await.is_none());
        let stats = cache.stats().await;
        assert_eq!(stats.expired_reads, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    });
}

#[tokio::test]
async fn test_load_is_read_through() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("kb.json");
    write_document(&path, &[("first problem", "first fix")]);

    let config = KnowledgeBaseConfig {
        cache: CacheConfig::builder().ttl(Duration::from_millis(200)).build(),
        ..KnowledgeBaseConfig::at(&path)
    };
    let kb = KnowledgeBase::new(config).unwrap();

    assert_eq!(kb.load().await.solutions.len(), 1);

    // A change on disk stays invisible while the cached copy is fresh
    write_document(&path, &[("first problem", "first fix"), ("second", "fix")]);
    assert_eq!(kb.load().await.solutions.len(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(kb.load().await.solutions.len(), 2);

    let stats = kb.cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[tokio::test]
async fn test_recommendation_keys_ignore_word_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("kb.json");
    write_document(&path, &[("login fails on mobile", "reset the cookie domain")]);
    let kb = KnowledgeBase::new(KnowledgeBaseConfig::at(&path)).unwrap();

    let first = kb.recommendations("Login fails").await;
    assert_eq!(first.solutions.len(), 1);

    // Not picked up: the reordered context is served from the same slot
    write_document(&path, &[]);
    let second = kb.recommendations("fails   LOGIN").await;
    assert_eq!(first, second);

    assert_eq!(
        normalize_cache_key("Login fails"),
        normalize_cache_key("fails   LOGIN")
    );
}

#[tokio::test]
async fn test_writes_refresh_recommendations() {
    let tmp = TempDir::new().unwrap();
    let kb = KnowledgeBase::new(KnowledgeBaseConfig::at(tmp.path().join("nested/kb.json"))).unwrap();

    assert!(kb.recommendations("flaky test timeout").await.is_empty());

    assert!(kb.add_success_pattern("raise the test timeout", Some("ci".into())).await);
    assert!(kb.add_error_pattern("sleep-based waits in tests", None).await);
    assert!(kb.record_context("flaky login test", Some("fixed".into())).await);

    let recs = kb.recommendations("flaky test timeout").await;
    assert_eq!(recs.success_patterns.len(), 1);
    assert_eq!(recs.error_patterns.len(), 0);
    assert_eq!(recs.similar_contexts.len(), 1);
    assert_eq!(recs.similar_contexts[0].outcome.as_deref(), Some("fixed"));
}

#[tokio::test]
async fn test_retention_keeps_newest_solutions() {
    let tmp = TempDir::new().unwrap();
    let config = KnowledgeBaseConfig {
        max_solutions: 3,
        ..KnowledgeBaseConfig::at(tmp.path().join("kb.json"))
    };
    let kb = KnowledgeBase::new(config).unwrap();

    for i in 0..6 {
        kb.add_solution(format!("problem {}", i), "fix", Vec::new()).await;
    }

    let doc = kb.load().await;
    let problems: Vec<_> = doc.solutions.iter().map(|s| s.problem.as_str()).collect();
    assert_eq!(problems, vec!["problem 3", "problem 4", "problem 5"]);

    let on_disk: KnowledgeBaseDocument =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join("kb.json")).unwrap())
            .unwrap();
    assert_eq!(on_disk.solutions.len(), 3);
}

#[tokio::test]
async fn test_oversized_file_is_trimmed_on_load() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("kb.json");
    let problems: Vec<(String, String)> = (0..10)
        .map(|i| (format!("problem {}", i), "fix".to_string()))
        .collect();
    let pairs: Vec<(&str, &str)> = problems
        .iter()
        .map(|(p, f)| (p.as_str(), f.as_str()))
        .collect();
    write_document(&path, &pairs);

    let config = KnowledgeBaseConfig {
        max_solutions: 4,
        ..KnowledgeBaseConfig::at(&path)
    };
    let kb = KnowledgeBase::new(config).unwrap();

    let doc = kb.load().await;
    assert_eq!(doc.solutions.len(), 4);
    assert_eq!(doc.solutions.iter().next().map(|s| s.problem.as_str()), Some("problem 6"));
}

#[test]
fn test_bounded_log_reports_evictions() {
    let mut log = BoundedLog::new();
    let dropped: usize = (0..10).map(|i| log.push(i, 4)).sum();
    assert_eq!(dropped, 6);
    assert_eq!(log.len(), 4);
}

#[tokio::test]
async fn test_concurrent_cache_access() {
    let cache = Arc::new(TtlCache::new(CacheConfig::default()));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let key = format!("key_{}", i);
                cache.set(key.clone(), i).await;
                cache.get(&key).await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles).await;
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), Some(i));
    }

    let stats = cache.stats().await;
    assert_eq!(stats.entries, 10);
    assert_eq!(stats.hits, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_during_write_never_cache_old_document() {
    for round in 0..20 {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kb.json");
        let problems: Vec<(String, String)> = (0..20)
            .map(|i| (format!("problem {}", i), "fix".to_string()))
            .collect();
        let pairs: Vec<(&str, &str)> = problems
            .iter()
            .map(|(p, f)| (p.as_str(), f.as_str()))
            .collect();
        write_document(&path, &pairs);

        let kb = Arc::new(KnowledgeBase::new(KnowledgeBaseConfig::at(&path)).unwrap());
        assert_eq!(kb.load().await.solutions.len(), 20);

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let kb = Arc::clone(&kb);
                tokio::spawn(async move {
                    for _ in 0..25 {
                        kb.invalidate().await;
                        kb.load().await;
                        kb.recommendations("problem fix").await;
                    }
                })
            })
            .collect();
        let writer = {
            let kb = Arc::clone(&kb);
            tokio::spawn(async move { kb.add_solution("late problem", "late fix", Vec::new()).await })
        };

        assert!(writer.await.unwrap());
        for result in futures::future::join_all(readers).await {
            result.unwrap();
        }

        // Every task has joined, so the cache must reflect the write
        assert_eq!(kb.load().await.solutions.len(), 21, "round {}", round);
        let recs = kb.recommendations("late problem").await;
        assert!(
            recs.solutions.iter().any(|s| s.problem == "late problem"),
            "round {}",
            round
        );
    }
}
