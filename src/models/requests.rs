//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for tag invalidation (POST /invalidate)
///
/// # Fields
/// - `tags`: Tags whose entries should be dropped locally and upstream
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub tags: Vec<String>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tags.is_empty() {
            return Some("At least one tag is required".to_string());
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Some("Tags cannot be empty".to_string());
        }
        None
    }
}
