//! Cache Item Module
//!
//! A handle on one cache entry. Nothing is read from the backend until the
//! item is first observed; the outcome of that single load is then kept for
//! the life of the item.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::backend::Backend;
use crate::cache::expiry::is_past;
use crate::cache::{Expiry, PoolStats};
use crate::error::Result;

// == Load State ==
/// Where an item is in its lifecycle.
///
/// `Unloaded` moves to `Hit` or `Miss` on the first observation. `set` and
/// `delete` jump straight to `Hit` and `Miss`. Nothing returns to `Unloaded`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Unloaded,
    Hit(Value),
    Miss,
}

/// State of a written item, kept so later lookups of the key share it.
#[derive(Debug, Clone)]
pub(crate) struct RetainedItem {
    pub(crate) state: Arc<Mutex<LoadState>>,
    /// Deadline of the write that retained it
    pub(crate) expires_at: Option<DateTime<Utc>>,
}

impl RetainedItem {
    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_past(self.expires_at, now)
    }
}

/// Backend plus counters, shared between a pool and its items.
#[derive(Debug)]
pub(crate) struct PoolShared<B> {
    pub(crate) backend: B,
    pub(crate) stats: PoolStats,
    /// Written items by key. Only filled for backends that retain items.
    pub(crate) retained: Mutex<HashMap<String, RetainedItem>>,
}

impl<B> PoolShared<B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            stats: PoolStats::new(),
            retained: Mutex::new(HashMap::new()),
        }
    }
}

// == Item ==
/// Lazily loaded view of a single key.
///
/// Clones share state: a value loaded or written through one clone is seen
/// by all of them.
pub struct Item<B: Backend> {
    key: Arc<str>,
    shared: Arc<PoolShared<B>>,
    state: Arc<Mutex<LoadState>>,
}

impl<B: Backend> Item<B> {
    pub(crate) fn new(key: &str, shared: Arc<PoolShared<B>>) -> Self {
        Self {
            key: Arc::from(key),
            shared,
            state: Arc::new(Mutex::new(LoadState::Unloaded)),
        }
    }

    /// An item sharing the state of a previously written one.
    pub(crate) fn from_retained(
        key: &str,
        shared: Arc<PoolShared<B>>,
        retained: &RetainedItem,
    ) -> Self {
        Self {
            key: Arc::from(key),
            shared,
            state: Arc::clone(&retained.state),
        }
    }

    // == Key ==
    /// The key this item was created for. Never touches the backend.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true once a load, `set` or `delete` has happened.
    pub async fn is_loaded(&self) -> bool {
        !matches!(*self.state.lock().await, LoadState::Unloaded)
    }

    /// Current lifecycle state, without loading.
    pub async fn state(&self) -> LoadState {
        self.state.lock().await.clone()
    }

    /// Locks the state, performing the one backend probe if still unloaded.
    async fn loaded(&self) -> Result<MutexGuard<'_, LoadState>> {
        let mut state = self.state.lock().await;
        if matches!(*state, LoadState::Unloaded) {
            let probed = self.shared.backend.probe(&self.key).await?;
            self.shared.stats.record_load(probed.is_some());
            debug!(
                backend = self.shared.backend.name(),
                key = %self.key,
                hit = probed.is_some(),
                "loaded cache item"
            );
            *state = probed.map_or(LoadState::Miss, LoadState::Hit);
        }
        Ok(state)
    }

    // == Is Hit ==
    /// Whether the key existed when the item was loaded.
    pub async fn is_hit(&self) -> Result<bool> {
        Ok(matches!(*self.loaded().await?, LoadState::Hit(_)))
    }

    // == Get ==
    /// The loaded value, or `None` on a miss.
    ///
    /// A stored JSON null comes back as `Some(Value::Null)`; use
    /// [`Item::is_hit`] to tell it apart from a miss when it matters.
    pub async fn get(&self) -> Result<Option<Value>> {
        Ok(match &*self.loaded().await? {
            LoadState::Hit(value) => Some(value.clone()),
            _ => None,
        })
    }

    // == Exists ==
    /// Whether the key is present.
    ///
    /// Backends with a direct existence check answer from the store on every
    /// call and leave the loaded snapshot alone. Others go through the same
    /// cached load as [`Item::is_hit`].
    pub async fn exists(&self) -> Result<bool> {
        if B::DIRECT_EXISTS {
            self.shared.backend.exists(&self.key).await
        } else {
            self.is_hit().await
        }
    }

    // == Set ==
    /// Writes `value` through to the backend and marks the item as a hit.
    ///
    /// On a backend failure the item keeps its previous state.
    pub async fn set(&self, value: impl Into<Value>, expiry: impl Into<Expiry>) -> Result<bool> {
        let value = value.into();
        let expiry = expiry.into();

        let mut state = self.state.lock().await;
        self.shared.backend.write(&self.key, &value, expiry).await?;
        self.shared.stats.record_write();
        debug!(
            backend = self.shared.backend.name(),
            key = %self.key,
            ?expiry,
            "stored cache item"
        );

        *state = LoadState::Hit(value);
        if B::RETAINS_ITEMS {
            let entry = RetainedItem {
                state: Arc::clone(&self.state),
                expires_at: expiry.deadline(Utc::now()),
            };
            self.shared.retained.lock().await.insert(self.key.to_string(), entry);
        }
        Ok(true)
    }

    /// Like [`Item::set`], with an untyped TTL as received from a caller.
    ///
    /// The TTL is validated before anything is written.
    pub async fn set_with_ttl(&self, value: impl Into<Value>, ttl: Option<&Value>) -> Result<bool> {
        let expiry = Expiry::from_ttl(ttl)?;
        self.set(value, expiry).await
    }

    // == Delete ==
    /// Removes the key from the backend and marks the item as a miss.
    ///
    /// Deleting an absent key is not an error.
    pub async fn delete(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.shared.backend.remove(&self.key).await?;
        self.shared.stats.record_delete();
        debug!(backend = self.shared.backend.name(), key = %self.key, "deleted cache item");

        *state = LoadState::Miss;
        if B::RETAINS_ITEMS {
            self.shared.retained.lock().await.remove(&*self.key);
        }
        Ok(())
    }
}

impl<B: Backend> Clone for Item<B> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            shared: Arc::clone(&self.shared),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: Backend> fmt::Debug for Item<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("backend", &self.shared.backend.name())
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EphemeralBackend, KeyStream};
    use crate::error::CacheError;
    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that counts probes and can be told to fail.
    #[derive(Default)]
    struct CountingBackend {
        inner: EphemeralBackend,
        probes: AtomicUsize,
        fail_writes: bool,
    }

    #[async_trait]
    impl Backend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn probe(&self, key: &str) -> Result<Option<Value>> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.inner.probe(key).await
        }

        async fn write(&self, key: &str, value: &Value, expiry: Expiry) -> Result<()> {
            if self.fail_writes {
                return Err(CacheError::Storage("write refused".to_string()));
            }
            self.inner.write(key, value, expiry).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }

        async fn list_all_keys(&self) -> Result<KeyStream> {
            Ok(stream::empty::<Result<String>>().boxed())
        }
    }

    fn item_over(backend: CountingBackend, key: &str) -> Item<CountingBackend> {
        Item::new(key, Arc::new(PoolShared::new(backend)))
    }

    #[tokio::test]
    async fn test_key_needs_no_load() {
        let item = item_over(CountingBackend::default(), "k");
        assert_eq!(item.key(), "k");
        assert!(!item.is_loaded().await);
        assert_eq!(item.shared.backend.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_loads_once() {
        let item = item_over(CountingBackend::default(), "k");

        assert!(!item.is_hit().await.unwrap());
        assert_eq!(item.get().await.unwrap(), None);
        assert!(!item.exists().await.unwrap());

        assert_eq!(item.shared.backend.probes.load(Ordering::SeqCst), 1);
        assert_eq!(item.state().await, LoadState::Miss);
    }

    #[tokio::test]
    async fn test_snapshot_survives_backend_change() {
        let item = item_over(CountingBackend::default(), "k");
        assert!(!item.is_hit().await.unwrap());

        // Written behind the item's back
        item.shared
            .backend
            .inner
            .write("k", &json!("late"), Expiry::Never)
            .await
            .unwrap();

        assert!(!item.is_hit().await.unwrap());
        assert_eq!(item.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_skips_backend_read() {
        let item = item_over(CountingBackend::default(), "k");
        assert!(item.set("value", Expiry::Never).await.unwrap());

        assert!(item.is_hit().await.unwrap());
        assert_eq!(item.get().await.unwrap(), Some(json!("value")));
        assert_eq!(item.shared.backend.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_null_is_a_hit() {
        let item = item_over(CountingBackend::default(), "k");
        item.set(Value::Null, Expiry::Never).await.unwrap();

        assert!(item.is_hit().await.unwrap());
        assert_eq!(item.get().await.unwrap(), Some(Value::Null));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let item = item_over(CountingBackend::default(), "k");
        item.set(1, Expiry::Never).await.unwrap();

        item.delete().await.unwrap();
        assert!(!item.is_hit().await.unwrap());
        item.delete().await.unwrap();
        assert!(!item.is_hit().await.unwrap());
        assert_eq!(item.state().await, LoadState::Miss);
    }

    #[tokio::test]
    async fn test_invalid_ttl_writes_nothing() {
        let item = item_over(CountingBackend::default(), "k");
        let result = item.set_with_ttl("value", Some(&json!("hiya!"))).await;

        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert!(!item.is_loaded().await);
        assert!(!item.is_hit().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_state() {
        let backend = CountingBackend {
            fail_writes: true,
            ..Default::default()
        };
        let item = item_over(backend, "k");
        assert!(!item.is_hit().await.unwrap());

        let result = item.set("value", Expiry::Never).await;
        assert!(matches!(result, Err(CacheError::Storage(_))));
        assert_eq!(item.state().await, LoadState::Miss);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let item = item_over(CountingBackend::default(), "k");
        let other = item.clone();

        item.set("shared", Expiry::Never).await.unwrap();
        assert_eq!(other.get().await.unwrap(), Some(json!("shared")));
    }
}
