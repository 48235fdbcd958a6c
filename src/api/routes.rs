//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_handler, clear_handler, delete_handler, exists_handler, get_handler, health_handler,
    set_handler, stats_handler, AppState,
};
use crate::backend::Backend;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /items/:key` - Fetch one item (hit or miss)
/// - `PUT /items/:key` - Store a value with an optional TTL
/// - `DELETE /items/:key` - Delete one item
/// - `GET /items/:key/exists` - Existence check
/// - `POST /items` - Fetch the hits among several keys
/// - `DELETE /items` - Clear the pool
/// - `GET /stats` - Pool statistics
/// - `GET /health` - Health check endpoint
pub fn create_router<B: Backend>(state: AppState<B>) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/items",
            post(batch_handler::<B>).delete(clear_handler::<B>),
        )
        .route(
            "/items/:key",
            get(get_handler::<B>)
                .put(set_handler::<B>)
                .delete(delete_handler::<B>),
        )
        .route("/items/:key/exists", get(exists_handler::<B>))
        .route("/stats", get(stats_handler::<B>))
        .route("/health", get(health_handler::<B>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
