//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, insertion-order eviction,
//! tag invalidation and load-or-compute helpers.

mod entry;
mod keys;
mod order;
mod preload;
mod stats;
mod store;
mod tag_index;


// Re-export public types
pub use entry::CacheEntry;
pub use keys::{build_key, build_key_with_params, KeyPart, PART_SEPARATOR};
pub use order::InsertionOrder;
pub use preload::{Loader, PrefetchItem, PrefetchOutcome, Preloader};
pub use stats::CacheStats;
pub use store::{CacheStore, SharedStore};
pub use tag_index::TagIndex;
