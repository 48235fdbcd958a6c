//! Cache Pool Module
//!
//! Factory and batch-access point for items over one backend.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tracing::{debug, info};

use crate::backend::{Backend, EntityManager, EphemeralBackend, OrmBackend, RedisBackend};
use crate::cache::item::PoolShared;
use crate::cache::{validate_key, Item, ItemCollection, StatsSnapshot, CLEAR_BATCH_SIZE};
use crate::error::Result;

// == Pool ==
/// Hands out items bound to one backend.
///
/// Backends that retain items give every request for a written key the same
/// shared item until its write expires, is deleted, or the pool is cleared.
/// Unwritten keys, and every key on other backends, get a fresh,
/// independent view per request.
pub struct Pool<B: Backend> {
    shared: Arc<PoolShared<B>>,
}

impl<B: Backend> Pool<B> {
    // == Constructor ==
    pub fn new(backend: B) -> Self {
        Self {
            shared: Arc::new(PoolShared::new(backend)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// Load, write and delete counters for this pool.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Number of written items the pool currently shares between lookups.
    pub async fn retained_count(&self) -> usize {
        self.shared.retained.lock().await.len()
    }

    // == Get Item ==
    /// Returns the item for `key`. Always succeeds for a legal key, hit or
    /// miss; nothing is read from the backend yet.
    pub async fn get_item(&self, key: &str) -> Result<Item<B>> {
        validate_key(key)?;

        if B::RETAINS_ITEMS {
            let mut retained = self.shared.retained.lock().await;
            match retained.get(key) {
                Some(entry) if !entry.is_expired(Utc::now()) => {
                    return Ok(Item::from_retained(key, Arc::clone(&self.shared), entry));
                }
                Some(_) => {
                    retained.remove(key);
                    debug!(key, "released expired retained item");
                }
                None => {}
            }
        }

        Ok(Item::new(key, Arc::clone(&self.shared)))
    }

    // == Get Items ==
    /// Loads each key in order and collects the hits. Misses are left out.
    pub async fn get_items<I, K>(&self, keys: I) -> Result<ItemCollection<B>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut hits = Vec::new();

        for key in keys {
            let key = key.as_ref();
            if !seen.insert(key.to_string()) {
                continue;
            }
            let item = self.get_item(key).await?;
            if item.is_hit().await? {
                hits.push(item);
            }
        }

        debug!(
            backend = self.shared.backend.name(),
            requested = seen.len(),
            hits = hits.len(),
            "fetched cache items"
        );
        Ok(ItemCollection::new(hits))
    }

    // == Clear ==
    /// Removes every key the backend holds, in batches.
    ///
    /// Not atomic: a key written while the clear runs may or may not survive.
    pub async fn clear(&self) -> Result<&Self> {
        let mut keys = self.shared.backend.list_all_keys().await?;
        let mut batch = Vec::with_capacity(CLEAR_BATCH_SIZE);
        let mut removed = 0usize;

        while let Some(key) = keys.next().await {
            batch.push(key?);
            if batch.len() >= CLEAR_BATCH_SIZE {
                self.shared.backend.remove_batch(&batch).await?;
                removed += batch.len();
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.shared.backend.remove_batch(&batch).await?;
            removed += batch.len();
        }

        self.shared.retained.lock().await.clear();

        info!(backend = self.shared.backend.name(), removed, "cleared cache pool");
        Ok(self)
    }
}

impl Pool<EphemeralBackend> {
    pub fn ephemeral() -> Self {
        Self::new(EphemeralBackend::new())
    }

    // == Purge Expired ==
    /// Drops expired entries and forgets their retained items.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let expired = self.shared.backend.purge_expired().await;

        let now = Utc::now();
        let mut retained = self.shared.retained.lock().await;
        for key in &expired {
            retained.remove(key);
        }
        retained.retain(|_, entry| !entry.is_expired(now));

        expired.len()
    }
}

impl Pool<RedisBackend> {
    /// Pool over the Redis server at `url`. Connects on first use.
    pub fn redis(url: &str) -> Result<Self> {
        Ok(Self::new(RedisBackend::open(url)?))
    }
}

impl<M: EntityManager> Pool<OrmBackend<M>> {
    /// Pool over the default cache table of `em`.
    pub fn orm(em: M) -> Self {
        Self::new(OrmBackend::new(em))
    }
}
