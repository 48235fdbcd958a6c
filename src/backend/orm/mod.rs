//! ORM Backend
//!
//! Stores each cache entry as a [`CacheEntity`] through an [`EntityManager`].
//! A not-found lookup is a miss, not an error.

mod entity;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Backend, KeyStream};
use crate::cache::Expiry;
use crate::error::Result;

pub use entity::{CacheEntity, EntityManager, DEFAULT_TABLE};
pub use memory::MemoryEntityManager;

/// Ids fetched per page when walking the sorted key index.
const INDEX_PAGE_SIZE: usize = 100;

// == ORM Backend ==
#[derive(Debug)]
pub struct OrmBackend<M: EntityManager> {
    em: Arc<M>,
    table: String,
}

impl<M: EntityManager> OrmBackend<M> {
    /// Uses the default `cache` table.
    pub fn new(em: M) -> Self {
        Self::with_table(em, DEFAULT_TABLE)
    }

    pub fn with_table(em: M, table: impl Into<String>) -> Self {
        Self {
            em: Arc::new(em),
            table: table.into(),
        }
    }

    pub fn entity_manager(&self) -> &M {
        &self.em
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl<M: EntityManager> Backend for OrmBackend<M> {
    fn name(&self) -> &'static str {
        "orm"
    }

    async fn probe(&self, key: &str) -> Result<Option<Value>> {
        match self.em.retrieve(&self.table, key).await {
            Ok(entity) => Ok(Some(entity.value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn write(&self, key: &str, value: &Value, expiry: Expiry) -> Result<()> {
        let ttl = expiry.seconds_from(Utc::now());
        self.em
            .persist(&self.table, CacheEntity::new(key, value.clone()), ttl)
            .await?;
        self.em.flush().await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self.em.delete(&self.table, key).await {
            Ok(()) => self.em.flush().await,
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn remove_batch(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            match self.em.delete(&self.table, key).await {
                Ok(()) => {}
                // Assume it expired since it was listed
                Err(err) if err.is_not_found() => {
                    warn!(key = %key, "entity vanished before delete");
                }
                Err(err) => return Err(err),
            }
        }
        self.em.flush().await?;
        debug!(table = %self.table, count = keys.len(), "flushed entity delete batch");
        Ok(())
    }

    async fn list_all_keys(&self) -> Result<KeyStream> {
        let state = IndexWalk {
            em: Arc::clone(&self.em),
            table: self.table.clone(),
            after: None,
            page: Vec::new().into_iter(),
            exhausted: false,
        };

        let keys = stream::unfold(state, |mut walk| async move {
            loop {
                if let Some(key) = walk.page.next() {
                    walk.after = Some(key.clone());
                    return Some((Ok(key), walk));
                }
                if walk.exhausted {
                    return None;
                }

                let page = walk
                    .em
                    .sorted_keys(&walk.table, walk.after.as_deref(), INDEX_PAGE_SIZE)
                    .await;
                match page {
                    Ok(keys) => {
                        walk.exhausted = keys.len() < INDEX_PAGE_SIZE;
                        walk.page = keys.into_iter();
                    }
                    Err(err) => {
                        walk.exhausted = true;
                        return Some((Err(err), walk));
                    }
                }
            }
        });

        Ok(keys.boxed())
    }
}

struct IndexWalk<M> {
    em: Arc<M>,
    table: String,
    /// Last id handed out; the next page starts strictly after it
    after: Option<String>,
    page: std::vec::IntoIter<String>,
    exhausted: bool,
}
