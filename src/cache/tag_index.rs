//! Tag Index Module
//!
//! Maps each tag to the set of keys currently carrying it.

use std::collections::{HashMap, HashSet};

// == Tag Index ==
/// Reverse index from tag to keys.
///
/// Must be updated on every insertion and removal performed by the store,
/// otherwise invalidation would miss or over-match entries.
#[derive(Debug, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Associates `key` with every tag in `tags`.
    ///
    /// # Arguments
    /// * `key` - The key being stored
    /// * `tags` - Tags the new entry carries
    pub fn insert(&mut self, key: &str, tags: &HashSet<String>) {
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    // == Remove ==
    /// Drops the association between `key` and `tags`. Tags left with no
    /// keys are removed entirely.
    pub fn remove(&mut self, key: &str, tags: &HashSet<String>) {
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    // == Lookup ==
    /// Returns every key carrying at least one of `tags`.
    pub fn keys_for<S: AsRef<str>>(&self, tags: &[S]) -> HashSet<String> {
        tags.iter()
            .filter_map(|tag| self.by_tag.get(tag.as_ref()))
            .flatten()
            .cloned()
            .collect()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.by_tag.clear();
    }

    /// Number of distinct tags currently in use.
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }
}
