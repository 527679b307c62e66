//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of `get` calls that returned a fresh value
    pub hits: u64,
    /// Number of `get` calls on absent or expired keys
    pub misses: u64,
    /// Number of entries removed by capacity eviction or pruning
    pub evictions: u64,
    /// Current number of entries in the cache
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
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
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Adds `count` to the eviction counter.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Reset ==
    /// Zeroes every counter, keeping `max_size`.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_size);
    }
}
