//! Load-or-compute on top of the shared store.
//!
//! Concurrent misses on the same key are not coalesced: every caller runs its
//! own loader and the last `set` wins.

use std::future::Future;
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, warn};

use crate::cache::SharedStore;

// == Prefetch Items ==
/// Boxed loader used by batch prefetching.
pub type Loader<V> = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<V>> + Send>;

/// One item of a prefetch batch.
pub struct PrefetchItem<V> {
    pub key: String,
    pub loader: Loader<V>,
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
}

impl<V> PrefetchItem<V> {
    pub fn new<F, Fut>(key: impl Into<String>, loader: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        Self {
            key: key.into(),
            loader: Box::new(move || loader().boxed()),
            ttl: None,
            tags: Vec::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }
}

/// Summary of a prefetch batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchOutcome {
    /// Items served from cache or loaded and stored
    pub loaded: usize,
    /// Items whose loader failed
    pub failed: usize,
}

// == Preloader ==
/// Wraps "compute on miss" around a [`SharedStore`].
#[derive(Debug)]
pub struct Preloader<V> {
    store: SharedStore<V>,
}

impl<V> Clone for Preloader<V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<V: Clone + Send + Sync> Preloader<V> {
    pub fn new(store: SharedStore<V>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore<V> {
        &self.store
    }

    // == Preload ==
    /// Returns the cached value for `key`, or runs `loader` and caches its result.
    ///
    /// Loader errors are returned unchanged and nothing is cached. The store
    /// lock is never held while the loader runs.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `loader` - Computes the value on a miss
    /// * `ttl` - Optional TTL (uses the store default if None)
    /// * `tags` - Tags stored with a freshly loaded value
    pub async fn preload<F, Fut, E>(
        &self,
        key: &str,
        loader: F,
        ttl: Option<Duration>,
        tags: &[&str],
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cached = self.store.write().await.get(key);
        if let Some(value) = cached {
            return Ok(value);
        }

        debug!("Cache miss for '{}', running loader", key);
        let value = loader().await?;

        self.store
            .write()
            .await
            .set(key, value.clone(), ttl, tags);
        Ok(value)
    }

    // == Prefetch ==
    /// Runs every item through [`Preloader::preload`] concurrently.
    ///
    /// Never fails: each loader error is logged and counted, and the batch
    /// always runs to completion.
    pub async fn prefetch(&self, items: Vec<PrefetchItem<V>>) -> PrefetchOutcome {
        let tasks = items.into_iter().map(move |item| async move {
            let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
            let result = self.preload(&item.key, item.loader, item.ttl, &tags).await;
            if let Err(err) = &result {
                warn!("Prefetch failed for '{}': {:#}", item.key, err);
            }
            result.is_ok()
        });

        let results = join_all(tasks).await;
        let loaded = results.iter().filter(|ok| **ok).count();

        PrefetchOutcome {
            loaded,
            failed: results.len() - loaded,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use futures::future::{ready, Ready};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn preloader() -> Preloader<String> {
        Preloader::new(Arc::new(tokio::sync::RwLock::new(CacheStore::with_limits(
            100,
            Duration::from_secs(300),
        ))))
    }

    /// Loader yielding `{prefix}{n}` where n is the number of earlier calls.
    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        prefix: &'static str,
    ) -> impl FnOnce() -> Ready<anyhow::Result<String>> {
        let calls = calls.clone();
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            ready(Ok(format!("{prefix}{n}")))
        }
    }

    #[tokio::test]
    async fn test_preload_short_circuits_second_loader() {
        let preloader = preloader();
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));

        let first = preloader
            .preload("k", counting_loader(&calls_a, "a"), None, &[])
            .await;
        let second = preloader
            .preload("k", counting_loader(&calls_b, "b"), None, &[])
            .await;

        assert_eq!(assert_ok!(first), "a0");
        assert_eq!(assert_ok!(second), "a0");
        assert_eq!(calls_a.load(Ordering::SeqCst), 1);
        assert_eq!(calls_b.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preload_error_is_not_cached() {
        let preloader = preloader();

        let result: Result<String, &str> = preloader
            .preload("k", || async { Err("upstream down") }, None, &[])
            .await;

        assert_eq!(assert_err!(result), "upstream down");
        assert!(preloader.store().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_preload_stores_tags_and_ttl() {
        let preloader = preloader();

        let result: Result<String, anyhow::Error> = preloader
            .preload(
                "k",
                || async { Ok("v".to_string()) },
                Some(Duration::from_secs(5)),
                &["notices"],
            )
            .await;
        assert_ok!(result);

        let mut store = preloader.store().write().await;
        assert!(store.has("k"));
        assert_eq!(store.invalidate_tag("notices"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_reloads_after_expiry() {
        let preloader = preloader();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Some(Duration::from_secs(1));

        let first = preloader
            .preload("k", counting_loader(&calls, "v"), ttl, &[])
            .await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = preloader
            .preload("k", counting_loader(&calls, "v"), ttl, &[])
            .await;

        assert_eq!(assert_ok!(first), "v0");
        assert_eq!(assert_ok!(second), "v1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_cold_preloads_all_run() {
        let preloader = preloader();
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_loader = |calls: Arc<AtomicUsize>| {
            move || async move {
                tokio::task::yield_now().await;
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("v".to_string())
            }
        };

        let (a, b) = tokio::join!(
            preloader.preload("k", slow_loader(calls.clone()), None, &[]),
            preloader.preload("k", slow_loader(calls.clone()), None, &[]),
        );

        assert_ok!(a);
        assert_ok!(b);
        // No coalescing: both callers missed and both loaders ran
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(preloader.store().read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_isolates_failures() {
        let preloader = preloader();

        let outcome = preloader
            .prefetch(vec![
                PrefetchItem::new("k1", || async { Ok("one".to_string()) }).with_tags(&["x"]),
                PrefetchItem::new("k2", || async { Err(anyhow::anyhow!("boom")) }),
            ])
            .await;

        assert_eq!(outcome, PrefetchOutcome { loaded: 1, failed: 1 });

        let mut store = preloader.store().write().await;
        assert_eq!(store.get("k1"), Some("one".to_string()));
        assert!(!store.has("k2"));
        assert_eq!(store.invalidate_tag("x"), 1);
    }

    #[tokio::test]
    async fn test_prefetch_empty_batch() {
        let preloader = preloader();
        assert_eq!(preloader.prefetch(Vec::new()).await, PrefetchOutcome::default());
    }
}
