//! Service Module
//!
//! The tag-aware JSON cache used by domain services, plus the upstream
//! invalidation hooks it notifies.

mod cache;
mod hook;

pub use cache::ServiceCache;
pub use hook::{HttpPurgeHook, InvalidationHook, NoopHook};
