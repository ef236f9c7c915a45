//! Main cache store implementation with TTL expiry and LRU eviction

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheState, CacheStats},
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Key-value cache whose entries expire purely on elapsed time since write
///
/// - `get` on an expired entry is a miss but leaves the entry in place;
///   it is ignored until overwritten, removed, or swept by
///   [`purge_expired`](Self::purge_expired)
/// - `set` always overwrites and restarts the TTL clock
/// - past `max_entries`, the least recently used key is evicted
///
/// None of the operations fail; this is an optimisation layer.
pub struct TtlCache<V> {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    /// Internal storage
    store: Arc<RwLock<CacheStore<V>>>,
}

/// Internal cache storage
struct CacheStore<V> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<V>>,

    /// LRU tracking: front is least recently used
    lru_queue: VecDeque<CacheKey>,

    /// Current cache statistics
    stats: CacheStats,
}

impl<V> CacheStore<V> {
    fn touch(&mut self, key: &str) {
        self.lru_queue.retain(|k| k != key);
        self.lru_queue.push_back(key.to_string());
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru_queue.retain(|k| k != key);
        self.stats.entries = self.entries.len();
        Some(entry)
    }
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!("Initializing TTL cache with config: {:?}", config);

        let store = CacheStore {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            stats: CacheStats::default(),
        };

        Self {
            config,
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Write `value` under `key` with the current timestamp
    pub async fn set(&self, key: impl Into<CacheKey>, value: V) {
        self.set_at(key, value, Utc::now()).await
    }

    /// Write `value` under `key` as if written at `now`
    pub async fn set_at(&self, key: impl Into<CacheKey>, value: V, now: DateTime<Utc>) {
        let key = key.into();
        let ttl = self.config.ttl_with_jitter();
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        if let Some(existing) = store.entries.get_mut(&key) {
            debug!("Overwriting cache entry: {}", key);
            existing.overwrite(value, ttl, now);
        } else {
            while store.entries.len() >= self.config.max_entries {
                let Some(oldest) = store.lru_queue.pop_front() else {
                    break;
                };
                debug!("Evicting entry due to max_entries limit: {}", oldest);
                store.entries.remove(&oldest);
                store.stats.evictions += 1;
            }

            debug!("Inserting new cache entry: {}", key);
            store
                .entries
                .insert(key.clone(), CacheEntry::new(key.clone(), value, ttl, now));
        }

        store.touch(&key);
        store.stats.entries = store.entries.len();
        if self.config.enable_metrics {
            store.stats.writes += 1;
        }
    }

    /// Read `key`; `None` if absent or expired
    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now()).await
    }

    /// Read `key` as of `now`
    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let fresh = match store.entries.get_mut(key) {
            Some(entry) if entry.is_fresh_at(now) => {
                entry.mark_accessed(now);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("Cache entry expired: {}", key);
                if self.config.enable_metrics {
                    store.stats.expired_reads += 1;
                }
                None
            }
            None => None,
        };

        match fresh {
            Some(value) => {
                if self.config.enable_lru_eviction {
                    store.touch(key);
                }
                if self.config.enable_metrics {
                    store.stats.hits += 1;
                }
                debug!("Cache hit: {}", key);
                Some(value)
            }
            None => {
                if self.config.enable_metrics {
                    store.stats.misses += 1;
                }
                debug!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Observable state of `key` as of `now`, without counting a read
    pub async fn state_at(&self, key: &str, now: DateTime<Utc>) -> CacheState {
        let store = self.store.read().await;
        match store.entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => CacheState::Hit,
            _ => CacheState::Miss,
        }
    }

    /// Remove a specific entry from the cache
    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut store = self.store.write().await;
        let entry = store.remove_entry(key)?;
        store.stats.invalidations += 1;
        debug!("Removed cache entry: {}", key);
        Some(entry.value)
    }

    /// Clear all entries from the cache, returning how many were dropped
    pub async fn clear(&self) -> usize {
        let mut store = self.store.write().await;

        let count = store.entries.len();
        store.entries.clear();
        store.lru_queue.clear();
        store.stats.entries = 0;
        store.stats.invalidations += count as u64;

        if count > 0 {
            info!("Cleared {} entries from cache", count);
        }
        count
    }

    /// Drop every entry that is expired as of now
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut store = self.store.write().await;

        let expired: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            store.remove_entry(key);
        }
        store.stats.invalidations += expired.len() as u64;

        if !expired.is_empty() {
            debug!("Purged {} expired entries", expired.len());
        }
        expired.len()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    /// Get number of entries in cache, expired ones included
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache_with_ttl(ttl: Duration) -> TtlCache<String> {
        TtlCache::new(CacheConfig::builder().ttl(ttl).build())
    }

    #[tokio::test]
    async fn test_basic_set_and_get() {
        let cache = cache_with_ttl(Duration::from_secs(60));

        cache.set("key1", "value1".to_string()).await;

        assert_eq!(cache.get("key1").await, Some("value1".to_string()));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = cache_with_ttl(Duration::from_secs(60));

        assert_eq!(cache.get("nonexistent").await, None);
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let cache = cache_with_ttl(Duration::from_secs(10));
        let t0 = Utc::now();
        cache.set_at("k", "v".to_string(), t0).await;

        let just_before = t0 + chrono::Duration::milliseconds(9_999);
        let just_after = t0 + chrono::Duration::milliseconds(10_001);

        assert_eq!(cache.get_at("k", just_before).await, Some("v".to_string()));
        assert_eq!(cache.get_at("k", just_after).await, None);
        assert_eq!(cache.state_at("k", just_before).await, CacheState::Hit);
        assert_eq!(cache.state_at("k", just_after).await, CacheState::Miss);
    }

    #[tokio::test]
    async fn test_expired_entries_stay_until_overwritten() {
        let cache = cache_with_ttl(Duration::from_secs(10));
        let t0 = Utc::now() - chrono::Duration::seconds(60);
        cache.set_at("k", "stale".to_string(), t0).await;

        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.stats().await.expired_reads, 1);

        cache.set("k", "fresh".to_string()).await;
        assert_eq!(cache.get("k").await, Some("fresh".to_string()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let config = CacheConfig::builder()
            .ttl(Duration::from_secs(60))
            .max_entries(3)
            .enable_lru_eviction(true)
            .build();
        let cache = TtlCache::new(config);

        cache.set("key1", 1).await;
        cache.set("key2", 2).await;
        cache.set("key3", 3).await;

        // key1 becomes most recently used, so key2 is evicted next
        cache.get("key1").await;
        cache.set("key4", 4).await;

        assert!(cache.get("key2").await.is_none());
        assert_eq!(cache.get("key1").await, Some(1));
        assert_eq!(cache.get("key3").await, Some(3));
        assert_eq!(cache.get("key4").await, Some(4));
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = cache_with_ttl(Duration::from_secs(60));

        cache.set("key1", "value1".to_string()).await;
        cache.set("key2", "value2".to_string()).await;

        assert_eq!(cache.remove("key1").await, Some("value1".to_string()));
        assert!(cache.get("key1").await.is_none());

        assert_eq!(cache.clear().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = cache_with_ttl(Duration::from_secs(10));
        let old = Utc::now() - chrono::Duration::seconds(30);

        cache.set_at("old1", "a".to_string(), old).await;
        cache.set_at("old2", "b".to_string(), old).await;
        cache.set("new", "c".to_string()).await;

        assert_eq!(cache.purge_expired().await, 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("new").await, Some("c".to_string()));
    }
}
