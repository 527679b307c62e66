//! Error types for the cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the façade, upstream hooks and admin API.
///
/// Store operations themselves never fail; absence is reported as `Option`/`bool`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Value could not be converted to or from JSON
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Upstream invalidation hook failed
    #[error("Upstream invalidation failed: {0}")]
    Upstream(String),

    /// Host-side setup failed, e.g. the purge HTTP client could not be built
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Upstream(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
