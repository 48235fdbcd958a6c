//! Backend Module
//!
//! The storage contract that pools and items are written against, plus the
//! three adapters: an in-process map, Redis, and an ORM entity store.

pub mod ephemeral;
pub mod orm;
pub mod redis;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::cache::Expiry;
use crate::error::Result;

pub use self::ephemeral::EphemeralBackend;
pub use self::orm::{CacheEntity, EntityManager, MemoryEntityManager, OrmBackend};
pub use self::redis::RedisBackend;

/// One-shot, non-restartable sequence of every key a backend holds.
pub type KeyStream = BoxStream<'static, Result<String>>;

// == Backend ==
/// Translates generic cache calls into a store's native operations.
///
/// A cache miss is `Ok(None)` from [`Backend::probe`], never an error.
/// Connectivity and protocol failures are returned as-is.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// The pool hands out one shared item per key instead of a fresh view.
    const RETAINS_ITEMS: bool = false;

    /// [`Backend::exists`] is answered by the store directly rather than
    /// through the item's cached load.
    const DIRECT_EXISTS: bool = false;

    /// Short backend name used in logs and responses.
    fn name(&self) -> &'static str;

    /// Combined existence and value fetch. `None` is a miss.
    async fn probe(&self, key: &str) -> Result<Option<Value>>;

    /// Existence check without keeping the value.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.probe(key).await?.is_some())
    }

    /// Stores `value` under `key` with the expiry translated to the store's
    /// native representation.
    async fn write(&self, key: &str, value: &Value, expiry: Expiry) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes a batch of keys and flushes the batch to the store.
    async fn remove_batch(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Enumerates every key currently held, for `clear`.
    async fn list_all_keys(&self) -> Result<KeyStream>;
}
