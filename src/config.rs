//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default freshness window for entries stored without an explicit TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of entries.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default interval between maintenance sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Default time allowed for one upstream purge request.
pub const DEFAULT_PURGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cache engine parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Maximum number of entries the store can hold
    pub max_size: usize,
    /// Interval between maintenance sweeps
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_size: DEFAULT_MAX_SIZE,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Hosting process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache engine parameters
    pub cache: CacheConfig,
    /// Admin HTTP server port
    pub server_port: u16,
    /// Edge purge endpoint notified on tag invalidation, if any
    pub purge_url: Option<String>,
    /// Time allowed for one purge request before it is abandoned
    pub purge_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds, at least 1 (default: 60)
    /// - `SERVER_PORT` - Admin HTTP server port (default: 3000)
    /// - `UPSTREAM_PURGE_URL` - Edge purge endpoint (default: unset)
    /// - `UPSTREAM_PURGE_TIMEOUT` - Purge request timeout in seconds, at least 1 (default: 5)
    pub fn from_env() -> Self {
        let cache = CacheConfig {
            default_ttl: Duration::from_secs(env_or(
                "CACHE_DEFAULT_TTL",
                DEFAULT_TTL.as_secs(),
            )),
            max_size: env_or("CACHE_MAX_SIZE", DEFAULT_MAX_SIZE),
            // A zero interval would spin the sweep task
            cleanup_interval: Duration::from_secs(
                env_or("CACHE_CLEANUP_INTERVAL", DEFAULT_CLEANUP_INTERVAL.as_secs()).max(1),
            ),
        };

        Self {
            cache,
            server_port: env_or("SERVER_PORT", 3000),
            purge_url: env::var("UPSTREAM_PURGE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            purge_timeout: Duration::from_secs(
                env_or("UPSTREAM_PURGE_TIMEOUT", DEFAULT_PURGE_TIMEOUT.as_secs()).max(1),
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            purge_url: None,
            purge_timeout: DEFAULT_PURGE_TIMEOUT,
        }
    }
}

/// Reads and parses an environment variable, falling back to `default`.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
