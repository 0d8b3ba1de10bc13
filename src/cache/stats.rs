//! Cache Statistics Module
//!
//! Tracks hits, misses and the number of stored entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// == Cache Stats ==
/// Snapshot of a backend's counters.
///
/// `size` is signed: the shared-store counter is best effort and can drift
/// below zero under concurrent deletes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of live value entries
    pub size: i64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds stats from the fields of the shared counter hash.
    ///
    /// Missing fields count as zero.
    pub fn from_fields(fields: &HashMap<String, i64>) -> Self {
        let field = |name: &str| fields.get(name).copied().unwrap_or(0);
        Self {
            hits: u64::try_from(field("hits")).unwrap_or(0),
            misses: u64::try_from(field("misses")).unwrap_or(0),
            size: field("size"),
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Insert ==
    /// Counts a newly stored key.
    pub fn record_insert(&mut self) {
        self.size += 1;
    }

    // == Record Removals ==
    /// Uncounts `count` removed keys.
    pub fn record_removals(&mut self, count: usize) {
        self.size -= i64::try_from(count).unwrap_or(i64::MAX);
    }

    // == Reset Size ==
    /// Zeroes the entry count, leaving hits and misses alone.
    pub fn reset_size(&mut self) {
        self.size = 0;
    }
}
