//! itemcache - Lazy-loading cache items over interchangeable backends
//!
//! A pool hands out items bound to a key. An item reads its backend once,
//! on first observation, and keeps that answer; writes go straight through
//! with the TTL translated to the backend's own expiry mechanism.
//!
//! Backends: an in-process map, Redis, and an ORM entity store.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backend::{Backend, EphemeralBackend, MemoryEntityManager, OrmBackend, RedisBackend};
pub use cache::{Expiry, Item, ItemCollection, Pool};
pub use config::{BackendKind, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
