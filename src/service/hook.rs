//! Upstream Invalidation Hooks
//!
//! Best-effort notification of an edge/CDN cache that shares our tag vocabulary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::error::{CacheError, Result};

// == Invalidation Hook ==
/// Receives tag events after the local cache has acted.
///
/// Failures are reported to the caller, who logs and discards them: local
/// invalidation stays authoritative.
#[async_trait]
pub trait InvalidationHook: Send + Sync {
    /// Told which tags a freshly stored key carries.
    async fn associate(&self, _key: &str, _tags: &[String]) -> Result<()> {
        Ok(())
    }

    /// Asked to drop everything it holds under `tag`.
    async fn purge_tag(&self, tag: &str) -> Result<()>;
}

// == Noop Hook ==
/// Hook for deployments without an edge cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

#[async_trait]
impl InvalidationHook for NoopHook {
    async fn purge_tag(&self, _tag: &str) -> Result<()> {
        Ok(())
    }
}

// == HTTP Purge Hook ==
/// Purges tags through an HTTP endpoint by POSTing `{"tags": [tag]}`.
///
/// Edge caches learn tag associations from response headers, so `associate`
/// keeps the default no-op.
#[derive(Debug, Clone)]
pub struct HttpPurgeHook {
    client: Client,
    purge_url: String,
}

impl HttpPurgeHook {
    // == Constructor ==
    /// Creates a hook whose purge requests give up after `timeout`.
    ///
    /// A stalled endpoint surfaces as `CacheError::Upstream` once `timeout`
    /// elapses.
    ///
    /// # Arguments
    /// * `purge_url` - Endpoint receiving purge requests
    /// * `timeout` - Time allowed for each request, connect included
    pub fn new(purge_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                CacheError::Internal(format!("failed to build purge client: {}", err))
            })?;
        Ok(Self::with_client(client, purge_url))
    }

    /// Uses a caller-configured client as is.
    pub fn with_client(client: Client, purge_url: impl Into<String>) -> Self {
        Self {
            client,
            purge_url: purge_url.into(),
        }
    }

    pub fn purge_url(&self) -> &str {
        &self.purge_url
    }
}

// == Purge ==
#[async_trait]
impl InvalidationHook for HttpPurgeHook {
    async fn purge_tag(&self, tag: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.purge_url)
            .json(&json!({ "tags": [tag] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Upstream(format!(
                "purge of tag '{}' returned {}",
                tag, status
            )));
        }

        debug!("Purged tag '{}' upstream", tag);
        Ok(())
    }
}
