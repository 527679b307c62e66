//! Portal Cache - an in-process caching engine for remote API data
//!
//! Bounded, time-limited key-value storage with tag-based group invalidation,
//! hit/miss accounting and load-or-compute helpers, plus a small admin HTTP
//! surface for the hosting process.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, Preloader, SharedStore};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use service::{HttpPurgeHook, InvalidationHook, NoopHook, ServiceCache};
pub use tasks::MaintenanceTimer;
