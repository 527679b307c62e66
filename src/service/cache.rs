//! Tag-based service cache.
//!
//! The façade every domain service (notices, services, content) goes through:
//! JSON values in a shared [`CacheStore`], tag invalidation that also reaches
//! the upstream hook, and key generation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::{build_key_with_params, CacheStore, SharedStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::service::{InvalidationHook, NoopHook};

// == Service Cache ==
/// Shared JSON cache with upstream tag propagation.
#[derive(Clone)]
pub struct ServiceCache {
    store: SharedStore<Value>,
    hook: Arc<dyn InvalidationHook>,
}

impl ServiceCache {
    // == Constructor ==
    pub fn new(store: SharedStore<Value>, hook: Arc<dyn InvalidationHook>) -> Self {
        Self { store, hook }
    }

    /// Builds a fresh store from `config` with no upstream hook.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(CacheStore::shared(config), Arc::new(NoopHook))
    }

    pub fn store(&self) -> &SharedStore<Value> {
        &self.store
    }

    // == Get JSON ==
    /// Fetches a fresh value and decodes it as `T`.
    ///
    /// A value that no longer decodes as `T` is dropped from the store and
    /// counted as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.store
            .write()
            .await
            .get_with(key, |value| match T::deserialize(value) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    warn!("Cached value for '{}' failed to decode: {}", key, err);
                    None
                }
            })
    }

    // == Set With Tags ==
    /// Stores `value` under `key` for `ttl_seconds` and tells the upstream
    /// hook which tags it carries.
    ///
    /// Fails only if `value` cannot be serialized. Hook failures are logged.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - Any serializable value
    /// * `ttl_seconds` - Freshness window in seconds
    /// * `tags` - Tags for local and upstream invalidation
    pub async fn set_with_tags<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
        tags: &[&str],
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.store
            .write()
            .await
            .set(key, value, Some(Duration::from_secs(ttl_seconds)), tags);

        if !tags.is_empty() {
            let owned: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
            if let Err(err) = self.hook.associate(key, &owned).await {
                warn!("Upstream tag association failed for '{}': {}", key, err);
            }
        }
        Ok(())
    }

    // == Invalidate By Tags ==
    /// Drops every local entry carrying any of `tags`, then asks the upstream
    /// hook to purge each tag.
    ///
    /// Returns the number of local entries removed. Upstream failures are
    /// logged and never change the result.
    pub async fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let removed = self.store.write().await.invalidate_tags(tags);

        for tag in tags {
            let tag = tag.as_ref();
            if let Err(err) = self.hook.purge_tag(tag).await {
                warn!("Upstream purge failed for tag '{}': {}", tag, err);
            }
        }
        removed
    }

    // == Key Generation ==
    /// Deterministic key from a prefix and parameter map.
    pub fn generate_cache_key(prefix: &str, params: &Map<String, Value>) -> String {
        build_key_with_params(prefix, params)
    }

    // == Get Or Fetch ==
    /// Returns the cached `T` for `key`, or runs `loader`, caches its result
    /// with `tags` and returns it.
    ///
    /// Loader errors propagate and leave the cache untouched. A result that
    /// cannot be serialized is returned uncached.
    pub async fn get_or_fetch<T, F, Fut, E>(
        &self,
        key: &str,
        ttl_seconds: u64,
        tags: &[&str],
        loader: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get_json(key).await {
            return Ok(cached);
        }

        debug!("Service cache miss for '{}'", key);
        let value = loader().await?;
        if let Err(err) = self.set_with_tags(key, &value, ttl_seconds, tags).await {
            warn!("Could not cache '{}': {}", key, err);
        }
        Ok(value)
    }
}
