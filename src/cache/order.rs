//! Insertion Order Module
//!
//! Tracks the order in which keys were inserted, used for overflow eviction
//! and for pruning. Reads never reorder keys: this is not LRU.

use std::collections::BTreeMap;

// == Insertion Order ==
/// Tracks keys by a monotonically increasing insertion sequence.
///
/// The smallest sequence number is always the oldest live insertion.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    /// Sequence number handed out to the next insertion
    next_seq: u64,
    /// Keys ordered by insertion sequence
    order: BTreeMap<u64, String>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty insertion tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Records a new insertion of `key` and returns its sequence number.
    ///
    /// Callers replacing an existing key must `remove` its previous sequence first.
    pub fn push(&mut self, key: &str) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        seq
    }

    // == Remove ==
    /// Forgets the insertion with the given sequence number.
    pub fn remove(&mut self, seq: u64) {
        self.order.remove(&seq);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest inserted key.
    ///
    /// Returns None if tracker is empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Oldest ==
    /// Returns up to `count` keys, oldest first, without removing them.
    pub fn oldest(&self, count: usize) -> Vec<String> {
        self.order.values().take(count).cloned().collect()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
