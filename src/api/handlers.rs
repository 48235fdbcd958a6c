//! API Handlers
//!
//! HTTP request handlers exposing one cache pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::backend::Backend;
use crate::cache::Pool;
use crate::error::Result;
use crate::models::{
    BatchRequest, BatchResponse, ClearResponse, DeleteResponse, ExistsResponse, HealthResponse,
    ItemResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Pools do their own synchronization, so the pool is shared behind a plain
/// Arc.
pub struct AppState<B: Backend> {
    pub pool: Arc<Pool<B>>,
}

impl<B: Backend> AppState<B> {
    /// Creates a new AppState owning the given pool.
    pub fn new(pool: Pool<B>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

/// Handler for GET /items/:key
///
/// A miss is a normal answer, not an error.
pub async fn get_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(key): Path<String>,
) -> Result<Json<ItemResponse>> {
    let item = state.pool.get_item(&key).await?;
    let value = item.get().await?;

    Ok(Json(ItemResponse::new(key, value)))
}

/// Handler for PUT /items/:key
pub async fn set_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(key): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let item = state.pool.get_item(&key).await?;
    item.set_with_ttl(req.value, req.ttl.as_ref()).await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for DELETE /items/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let item = state.pool.get_item(&key).await?;
    item.delete().await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /items/:key/exists
pub async fn exists_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Path(key): Path<String>,
) -> Result<Json<ExistsResponse>> {
    let item = state.pool.get_item(&key).await?;
    let exists = item.exists().await?;

    Ok(Json(ExistsResponse { key, exists }))
}

/// Handler for POST /items
///
/// Returns the hits among the requested keys, in request order.
pub async fn batch_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    let collection = state.pool.get_items(&req.keys).await?;

    let mut items = Vec::with_capacity(collection.count());
    for item in &collection {
        items.push(ItemResponse::new(item.key(), item.get().await?));
    }

    Ok(Json(BatchResponse::new(items)))
}

/// Handler for DELETE /items
pub async fn clear_handler<B: Backend>(
    State(state): State<AppState<B>>,
) -> Result<Json<ClearResponse>> {
    state.pool.clear().await?;

    Ok(Json(ClearResponse::new(state.pool.backend().name())))
}

/// Handler for GET /stats
pub async fn stats_handler<B: Backend>(State(state): State<AppState<B>>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.pool.backend().name(),
        state.pool.stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler<B: Backend>(State(state): State<AppState<B>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.pool.backend().name()))
}
