//! API Module
//!
//! Operator-facing HTTP surface for the hosted cache.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `POST /invalidate` - Invalidate entries by tag
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /cache` - Clear the cache
//! - `POST /prune` - Drop the oldest half of all entries
//! - `POST /cleanup` - Sweep expired entries

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
