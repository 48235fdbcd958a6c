//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::StatsSnapshot;

/// One item as seen by a caller (GET /items/:key, POST /items)
#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    /// The requested key
    pub key: String,
    /// Whether the key was found
    pub hit: bool,
    /// The stored value, null on a miss
    pub value: Option<Value>,
}

impl ItemResponse {
    pub fn new(key: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            hit: value.is_some(),
            value,
        }
    }
}

/// Response body for PUT /items/:key
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /items/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for GET /items/:key/exists
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for POST /items
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    /// Number of hits
    pub count: usize,
    /// Hits in request order
    pub items: Vec<ItemResponse>,
}

impl BatchResponse {
    pub fn new(items: Vec<ItemResponse>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Response body for DELETE /items
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new(backend: &str) -> Self {
        Self {
            message: format!("Cleared {} pool", backend),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Backend the pool runs on
    pub backend: String,
    /// Lazy loads that hit
    pub hits: u64,
    /// Lazy loads that missed
    pub misses: u64,
    /// Writes pushed to the backend
    pub writes: u64,
    /// Deletes pushed to the backend
    pub deletes: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(backend: impl Into<String>, stats: StatsSnapshot) -> Self {
        Self {
            backend: backend.into(),
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            deletes: stats.deletes,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Backend the pool runs on
    pub backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(backend: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            backend: backend.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
