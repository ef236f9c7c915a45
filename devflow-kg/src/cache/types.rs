//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type
pub type CacheKey = String;

/// Statistics and metrics for cache performance monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a fresh value
    pub hits: u64,

    /// Reads that found nothing or only an expired value
    pub misses: u64,

    /// Subset of misses caused by an expired entry
    pub expired_reads: u64,

    /// Number of entries currently stored (fresh or expired)
    pub entries: usize,

    /// Entries dropped to stay under `max_entries`
    pub evictions: u64,

    /// Entries removed by `remove`, `clear` or `purge_expired`
    pub invalidations: u64,

    /// Number of `set` calls
    pub writes: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, expired_reads: {}, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.expired_reads,
            self.evictions
        )
    }
}

/// Observable state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheState {
    /// Absent or expired
    Miss,
    /// Present and fresh
    Hit,
}
