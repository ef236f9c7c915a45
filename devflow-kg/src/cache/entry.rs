//! Cache entry management with TTL support

use crate::cache::types::CacheKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value with its write timestamp and TTL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: V,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl<V> CacheEntry<V> {
    /// Create a new entry written at `written_at`
    pub fn new(key: CacheKey, value: V, ttl: Duration, written_at: DateTime<Utc>) -> Self {
        Self {
            key,
            value,
            metadata: CacheMetadata {
                written_at,
                accessed_at: written_at,
                ttl,
                access_count: 0,
                version: 1,
            },
        }
    }

    /// Whether the entry is still fresh at `now`.
    ///
    /// Fresh means `now - written_at < ttl`; a read exactly at the TTL
    /// boundary is already a miss.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(self.metadata.ttl) else {
            return true;
        };
        now - self.metadata.written_at < ttl
    }

    /// Whether the entry has expired as of now
    pub fn is_expired(&self) -> bool {
        !self.is_fresh_at(Utc::now())
    }

    /// Time left before the entry expires, `None` once expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let ttl = chrono::Duration::from_std(self.metadata.ttl).ok()?;
        let expires_at = self.metadata.written_at + ttl;
        (expires_at - Utc::now()).to_std().ok()
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self, now: DateTime<Utc>) {
        self.metadata.accessed_at = now;
        self.metadata.access_count += 1;
    }

    /// Replace the value and restart the TTL clock
    pub fn overwrite(&mut self, value: V, ttl: Duration, written_at: DateTime<Utc>) {
        self.value = value;
        self.metadata.written_at = written_at;
        self.metadata.accessed_at = written_at;
        self.metadata.ttl = ttl;
        self.metadata.version += 1;
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the value was last written
    pub written_at: DateTime<Utc>,

    /// Last successful read (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// TTL the value was written with
    pub ttl: Duration,

    /// Number of fresh reads served
    pub access_count: u64,

    /// Incremented on every overwrite
    pub version: u64,
}
