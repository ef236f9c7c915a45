//! Fixed-capacity record log
//!
//! Appending past capacity drops the oldest records and reports how many
//! were dropped, so callers can log the discard instead of losing data
//! silently.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Ring buffer of records, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundedLog<T> {
    records: VecDeque<T>,
}

impl<T> Default for BoundedLog<T> {
    fn default() -> Self {
        Self {
            records: VecDeque::new(),
        }
    }
}

impl<T> BoundedLog<T> {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record`, then drop the oldest records beyond `capacity`.
    ///
    /// Returns the number of records dropped.
    pub fn push(&mut self, record: T, capacity: usize) -> usize {
        self.records.push_back(record);
        self.enforce(capacity)
    }

    /// Drop the oldest records beyond `capacity`, returning how many
    pub fn enforce(&mut self, capacity: usize) -> usize {
        let excess = self.records.len().saturating_sub(capacity);
        self.records.drain(..excess);
        excess
    }

    /// Iterate records, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.records.iter()
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
