//! Cache entity and the entity-manager collaborator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Default table holding cache entities. The key column must be sortable
/// without conditions so the pool can be cleared quickly.
pub const DEFAULT_TABLE: &str = "cache";

// == Cache Entity ==
/// One row of the cache table, identified by `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntity {
    pub key: String,
    pub value: Value,
}

impl CacheEntity {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

// == Entity Manager ==
/// The persistence operations the ORM backend needs from an entity store.
///
/// Writes are staged and become visible on [`EntityManager::flush`].
#[async_trait]
pub trait EntityManager: Send + Sync + 'static {
    /// Loads the entity with id `key`, or `CacheError::NotFound`.
    async fn retrieve(&self, table: &str, key: &str) -> Result<CacheEntity>;

    /// Stages an insert-or-replace. `ttl` is seconds from now, `None` for no
    /// expiry.
    async fn persist(&self, table: &str, entity: CacheEntity, ttl: Option<u64>) -> Result<()>;

    /// Stages a delete, or `CacheError::NotFound` when there is nothing to
    /// delete.
    async fn delete(&self, table: &str, key: &str) -> Result<()>;

    /// Applies staged writes.
    async fn flush(&self) -> Result<()>;

    /// Up to `limit` ids in ascending order, strictly after `after`.
    async fn sorted_keys(&self, table: &str, after: Option<&str>, limit: usize)
        -> Result<Vec<String>>;
}
