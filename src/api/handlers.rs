//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, HealthResponse, InvalidateRequest, InvalidateResponse, RemovedResponse,
    StatsResponse,
};
use crate::service::ServiceCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tag-aware cache shared with the domain services
    pub cache: ServiceCache,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: ServiceCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState with a fresh store and no upstream hook.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(ServiceCache::from_config(config))
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.store().read().await.stats();
    Json(stats.into())
}

/// Handler for POST /invalidate
///
/// Drops every entry carrying one of the tags, then notifies upstream.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.invalidate_by_tags(&req.tags).await;

    Ok(Json(InvalidateResponse {
        tags: req.tags,
        removed,
    }))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.store().write().await.delete(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for DELETE /cache
///
/// Removes every entry and resets statistics.
pub async fn clear_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.store().write().await.clear();
    Json(RemovedResponse::new(removed))
}

/// Handler for POST /prune
///
/// Drops the oldest half of all entries.
pub async fn prune_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.store().write().await.prune();
    Json(RemovedResponse::new(removed))
}

/// Handler for POST /cleanup
///
/// Runs an expiration sweep immediately.
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.store().write().await.cleanup();
    Json(RemovedResponse::new(removed))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
