//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_handler, delete_handler, health_handler, invalidate_handler,
    prune_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Cache statistics
/// - `POST /invalidate` - Drop entries by tag, locally and upstream
/// - `DELETE /del/:key` - Delete one key
/// - `DELETE /cache` - Clear everything and reset statistics
/// - `POST /prune` - Drop the oldest half of all entries
/// - `POST /cleanup` - Sweep expired entries now
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/cache", delete(clear_handler))
        .route("/prune", post(prune_handler))
        .route("/cleanup", post(cleanup_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
