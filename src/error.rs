//! Error types for the cache item layer
//!
//! Provides unified error handling using thiserror. A cache miss is never an
//! error; only malformed input and backend failures surface here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for pools, items and backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Malformed key or TTL
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Backend lookup miss. Translated into a cache miss by the item layer.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Redis connectivity or protocol failure, passed through unchanged
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Entity manager failure other than a missing entity
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for the backend-internal not-found outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Storage(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
