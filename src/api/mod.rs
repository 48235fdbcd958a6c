//! API Module
//!
//! HTTP handlers and routing exposing a cache pool over REST.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /items/:key` - Read, write or delete one item
//! - `GET /items/:key/exists` - Existence check
//! - `POST /items` - Multi-key fetch
//! - `DELETE /items` - Clear the pool
//! - `GET /stats` - Pool statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
