//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and tag support.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Entries are immutable once created. Replacing a key builds a brand-new
/// entry with a fresh insertion time, it never extends the old one.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion timestamp
    pub inserted_at: Instant,
    /// Time-to-live measured from `inserted_at`
    pub ttl: Duration,
    /// Tags used for group invalidation
    pub tags: HashSet<String>,
    /// Position in the store's insertion order
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Freshness window
    /// * `tags` - Tags to associate with the entry
    pub fn new(value: V, ttl: Duration, tags: HashSet<String>) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
            tags,
            seq: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now - inserted_at >= ttl`,
    /// so a zero TTL is expired immediately.
    pub fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }

    // == Has Tag ==
    /// Returns true if the entry carries any of the given tags.
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag.as_ref()))
    }
}
