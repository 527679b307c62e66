//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with insertion-order eviction,
//! TTL expiration and tag-based invalidation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, InsertionOrder, TagIndex};
use crate::config::CacheConfig;

/// Store handle shared between request handlers, loaders and the sweep task.
pub type SharedStore<V> = Arc<RwLock<CacheStore<V>>>;

// == Cache Store ==
/// Bounded, time-limited key-value storage.
///
/// Overflow evicts the oldest insertion, not the least recently read entry.
/// All mutation goes through this type so the tag index and insertion order
/// always mirror `entries`.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order for eviction and pruning
    order: InsertionOrder,
    /// Tag to keys reverse index
    tags: TagIndex,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore from the cache configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.max_size, config.default_ttl)
    }

    /// Creates a new CacheStore with explicit capacity and default TTL.
    pub fn with_limits(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            tags: TagIndex::new(),
            stats: CacheStats::new(max_size),
            max_size,
            default_ttl,
        }
    }

    /// Creates a store already wrapped for sharing across tasks.
    pub fn shared(config: &CacheConfig) -> SharedStore<V> {
        Arc::new(RwLock::new(Self::new(config)))
    }

    // == Set ==
    /// Inserts or replaces the entry for `key`.
    ///
    /// Replacing builds a new entry: tags are not merged and the TTL restarts.
    /// If `key` is new and the store is full, the oldest insertion is evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses `default_ttl` if None)
    /// * `tags` - Tags for group invalidation
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>, tags: &[&str]) {
        let key = key.into();

        if self.max_size == 0 {
            debug!("Cache has zero capacity, dropping set for '{}'", key);
            return;
        }

        // Replacing an existing key never triggers eviction
        if self.remove_entry(&key).is_none() && self.entries.len() >= self.max_size {
            if let Some(evicted) = self.order.pop_oldest() {
                self.remove_entry(&evicted);
                self.stats.record_evictions(1);
                debug!("Evicted oldest entry '{}' to make room for '{}'", evicted, key);
            }
        }

        let tags: HashSet<String> = tags.iter().map(|tag| tag.to_string()).collect();
        let mut entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl), tags);
        entry.seq = self.order.push(&key);
        self.tags.insert(&key, &entry.tags);
        self.entries.insert(key, entry);

        self.check_invariants();
    }

    // == Get ==
    /// Retrieves a fresh value by key.
    ///
    /// Expired entries are removed on sight and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                self.remove_entry(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Get With ==
    /// Retrieves a fresh value by key and converts it with `convert`.
    ///
    /// A value `convert` rejects is removed and counted as a miss.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `convert` - Conversion from the stored value, None to reject it
    pub fn get_with<T, F>(&mut self, key: &str, convert: F) -> Option<T>
    where
        F: FnOnce(&V) -> Option<T>,
    {
        let converted = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => convert(&entry.value),
            _ => None,
        };

        match converted {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.remove_entry(key);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Returns true if a fresh entry exists. Removes it if expired.
    ///
    /// Does not touch hit/miss counters.
    pub fn has(&mut self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.remove_entry(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if something was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes every entry and resets statistics. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.tags.clear();
        self.stats.reset();
        removed
    }

    // == Invalidate Tag ==
    /// Removes every entry carrying `tag`.
    pub fn invalidate_tag(&mut self, tag: &str) -> usize {
        self.invalidate_tags(&[tag])
    }

    // == Invalidate Tags ==
    /// Removes exactly the entries whose tag set intersects `tags`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> usize {
        let mut removed = 0;
        for key in self.tags.keys_for(tags) {
            if self.remove_entry(&key).is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            let names: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
            info!("Invalidated {} entries for tags {:?}", removed, names);
        }

        debug_assert!(!self.entries.values().any(|entry| entry.has_any_tag(tags)));
        self.check_invariants();
        removed
    }

    // == Is Expired ==
    /// Pure freshness predicate. Absent keys count as expired.
    pub fn is_expired(&self, key: &str) -> bool {
        self.entries.get(key).map_or(true, CacheEntry::is_expired)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.size = self.entries.len();
        stats
    }

    // == Cleanup ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed. Statistics are untouched.
    pub fn cleanup(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        expired_keys.len()
    }

    // == Prune ==
    /// Removes the oldest half of all entries by insertion time.
    ///
    /// Meant for manual memory-pressure relief; `set` never calls it.
    pub fn prune(&mut self) -> usize {
        let victims = self.order.oldest(self.entries.len() / 2);
        for key in &victims {
            self.remove_entry(key);
        }

        self.stats.record_evictions(victims.len());
        info!(
            "Pruned {} oldest entries, {} remaining",
            victims.len(),
            self.entries.len()
        );
        victims.len()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Single removal path keeping `order` and `tags` in sync with `entries`.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(entry.seq);
        self.tags.remove(key, &entry.tags);
        Some(entry)
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.entries.len() <= self.max_size,
            "cache size {} exceeds max {}",
            self.entries.len(),
            self.max_size
        );
        debug_assert_eq!(self.entries.len(), self.order.len());
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn store(max_size: usize) -> CacheStore<i32> {
        CacheStore::with_limits(max_size, TTL)
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::<String>::new(&CacheConfig::default());
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.max_size(), 1000);
        assert_eq!(store.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100);

        store.set("key1", 1, None, &[]);

        assert_eq!(store.get("key1"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100);
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_delete() {
        let mut store = store(100);

        store.set("key1", 1, None, &[]);
        assert!(store.delete("key1"));

        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
        assert!(!store.delete("key1"));
    }

    #[test]
    fn test_store_overwrite_replaces_tags() {
        let mut store = store(100);

        store.set("key1", 1, None, &["x"]);
        store.set("key1", 2, None, &["y"]);

        assert_eq!(store.get("key1"), Some(2));
        assert_eq!(store.len(), 1);

        // Old tag no longer reaches the entry
        assert_eq!(store.invalidate_tag("x"), 0);
        assert_eq!(store.invalidate_tag("y"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiration() {
        let mut store = store(100);

        store.set("key1", 1, Some(Duration::from_secs(1)), &[]);
        assert_eq!(store.get("key1"), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;

        assert!(store.is_expired("key1"));
        assert_eq!(store.get("key1"), None);
        assert!(store.is_empty(), "expired entry is removed when observed");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_default_ttl_applies() {
        let mut store = store(100);

        store.set("key1", 1, None, &[]);
        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert!(!store.is_expired("key1"));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(store.is_expired("key1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_restarts_ttl() {
        let mut store = store(100);

        store.set("key1", 1, Some(Duration::from_secs(10)), &[]);
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("key1", 2, Some(Duration::from_secs(10)), &[]);
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(store.get("key1"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_removes_expired_without_stats() {
        let mut store = store(100);

        store.set("key1", 1, Some(Duration::from_secs(1)), &[]);
        assert!(store.has("key1"));

        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!store.has("key1"));
        assert!(store.is_empty());

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_expired_does_not_mutate() {
        let mut store = store(100);

        store.set("key1", 1, Some(Duration::from_secs(1)), &[]);
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(store.is_expired("key1"));
        assert_eq!(store.len(), 1);
        assert!(store.is_expired("missing"));
    }

    #[test]
    fn test_store_oldest_eviction() {
        let mut store = store(2);

        store.set("a", 1, None, &[]);
        store.set("b", 2, None, &[]);
        store.set("c", 3, None, &[]);

        assert_eq!(store.len(), 2);
        assert!(!store.has("a"));
        assert!(store.has("b"));
        assert!(store.has("c"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_reads_do_not_protect_from_eviction() {
        let mut store = store(3);

        store.set("key1", 1, None, &[]);
        store.set("key2", 2, None, &[]);
        store.set("key3", 3, None, &[]);

        // Reading key1 does not make it younger
        store.get("key1");
        store.set("key4", 4, None, &[]);

        assert!(!store.has("key1"));
        assert!(store.has("key2"));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut store = store(2);

        store.set("a", 1, None, &[]);
        store.set("b", 2, None, &[]);
        store.set("a", 10, None, &[]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);

        // "a" was re-inserted, so "b" is now the oldest
        store.set("c", 3, None, &[]);
        assert!(store.has("a"));
        assert!(!store.has("b"));
    }

    #[test]
    fn test_eviction_cleans_tag_index() {
        let mut store = store(1);

        store.set("a", 1, None, &["x"]);
        store.set("b", 2, None, &["y"]);

        assert_eq!(store.invalidate_tag("x"), 0);
        assert!(store.has("b"));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut store = store(0);

        store.set("a", 1, None, &[]);

        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_tag_invalidation_precision() {
        let mut store = store(100);

        store.set("a", 1, None, &["x"]);
        store.set("b", 2, None, &["x", "y"]);
        store.set("c", 3, None, &["y"]);
        store.set("d", 4, None, &[]);

        assert_eq!(store.invalidate_tag("x"), 2);
        assert!(!store.has("a"));
        assert!(!store.has("b"));
        assert!(store.has("c"));
        assert!(store.has("d"));

        assert_eq!(store.invalidate_tag("y"), 1);
        assert!(!store.has("c"));
        assert!(store.has("d"));
    }

    #[test]
    fn test_invalidate_multiple_tags() {
        let mut store = store(100);

        store.set("a", 1, None, &["x"]);
        store.set("b", 2, None, &["y"]);
        store.set("c", 3, None, &["z"]);

        assert_eq!(store.invalidate_tags(&["x", "y", "missing"]), 2);
        assert_eq!(store.len(), 1);
        assert!(store.has("c"));
    }

    #[test]
    fn test_clear_resets_stats() {
        let mut store = store(100);

        store.set("a", 1, None, &["x"]);
        store.set("b", 2, None, &[]);
        store.get("a");
        store.get("missing");

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.max_size, 100);
        assert_eq!(store.invalidate_tag("x"), 0);
    }

    #[test]
    fn test_store_stats() {
        let mut store = store(100);

        store.set("key1", 1, None, &[]);
        store.get("key1"); // hit
        store.get("key1"); // hit
        store.get("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 100);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_cleanup() {
        let mut store = store(100);

        store.set("key1", 1, Some(Duration::from_secs(1)), &["x"]);
        store.set("key2", 2, Some(Duration::from_secs(10)), &["x"]);

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.cleanup(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().misses, 0);
        assert_eq!(store.get("key2"), Some(2));
        assert_eq!(store.invalidate_tag("x"), 1);
    }

    #[test]
    fn test_get_with_rejected_value_is_miss() {
        let mut store = store(100);
        store.set("even", 2, None, &[]);
        store.set("odd", 3, None, &[]);

        let even_only = |v: &i32| (v % 2 == 0).then_some(*v);
        assert_eq!(store.get_with("even", even_only), Some(2));
        assert_eq!(store.get_with("odd", even_only), None);
        assert_eq!(store.get_with("missing", even_only), None);

        // Rejected entries are dropped
        assert!(!store.has("odd"));
        assert!(store.has("even"));

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_writers_keep_capacity_and_tags() {
        const CAPACITY: usize = 16;
        let shared: SharedStore<usize> =
            Arc::new(RwLock::new(CacheStore::with_limits(CAPACITY, TTL)));

        let mut handles = Vec::new();
        for worker in 0..8 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..200usize {
                    let tag = if i % 2 == 0 { "even" } else { "odd" };
                    shared
                        .write()
                        .await
                        .set(format!("w{worker}:{i}"), i, None, &[tag]);

                    if i % 25 == 0 {
                        let mut store = shared.write().await;
                        store.invalidate_tags(&["even"]);
                        assert!(store.entries.values().all(|entry| entry.value % 2 == 1));
                    }
                    assert!(shared.read().await.len() <= CAPACITY);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let mut store = shared.write().await;
        assert!(store.len() <= CAPACITY);
        assert_eq!(store.order.len(), store.len());

        let odd = store.entries.values().filter(|entry| entry.value % 2 == 1).count();
        assert_eq!(store.invalidate_tag("odd"), odd);
        assert!(store.entries.values().all(|entry| entry.value % 2 == 0));
    }

    #[test]
    fn test_prune_removes_oldest_half() {
        let mut store = store(100);

        for (i, key) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            store.set(*key, i as i32, None, &[]);
        }

        assert_eq!(store.prune(), 2);
        assert_eq!(store.len(), 3);
        assert!(!store.has("a"));
        assert!(!store.has("b"));
        assert!(store.has("c"));
        assert!(store.has("e"));
    }

    #[test]
    fn test_prune_single_entry_keeps_it() {
        let mut store = store(100);
        store.set("a", 1, None, &[]);

        assert_eq!(store.prune(), 0);
        assert!(store.has("a"));
    }
}
