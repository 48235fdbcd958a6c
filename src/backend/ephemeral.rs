//! Ephemeral Backend
//!
//! Single-process, non-persistent storage held in a map.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Backend, KeyStream};
use crate::cache::{expiry::is_past, Expiry};
use crate::error::Result;

// == Stored Entry ==
#[derive(Debug, Clone)]
struct StoredEntry {
    value: Value,
    /// None = no expiration
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_past(self.expires_at, now)
    }
}

// == Ephemeral Backend ==
/// In-memory map adapter. Values are returned exactly as written.
#[derive(Debug, Default)]
pub struct EphemeralBackend {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl EphemeralBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Purge Expired ==
    /// Drops every expired entry and returns the removed keys.
    pub async fn purge_expired(&self) -> Vec<String> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.remove(key);
        }
        expired
    }
}

#[async_trait]
impl Backend for EphemeralBackend {
    const RETAINS_ITEMS: bool = true;

    fn name(&self) -> &'static str {
        "ephemeral"
    }

    async fn probe(&self, key: &str) -> Result<Option<Value>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it unless it was rewritten in between
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!(key, "dropped expired ephemeral entry");
        }
        Ok(None)
    }

    async fn write(&self, key: &str, value: &Value, expiry: Expiry) -> Result<()> {
        let entry = StoredEntry {
            value: value.clone(),
            expires_at: expiry.deadline(Utc::now()),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn remove_batch(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn list_all_keys(&self) -> Result<KeyStream> {
        let keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        Ok(stream::iter(keys.into_iter().map(Ok)).boxed())
    }
}
