//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Request body for PUT /items/:key
///
/// # Fields
/// - `value`: Any JSON value to store
/// - `ttl`: Optional TTL, seconds or an RFC 3339 timestamp. Kept untyped so
///   malformed values reach the item layer and are rejected there.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: Value,
    /// Optional TTL
    #[serde(default)]
    pub ttl: Option<Value>,
}

/// Request body for POST /items
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    /// Keys to fetch, in the order results should come back
    pub keys: Vec<String>,
}
