//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is hosted.
//!
//! # Tasks
//! - Maintenance sweep: removes expired cache entries at a configured interval

mod maintenance;

pub use maintenance::MaintenanceTimer;
