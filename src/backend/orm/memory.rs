//! In-process entity manager
//!
//! Unit-of-work store with a sorted key index per table. Staged writes are
//! applied in order on flush; expired rows read as absent.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::entity::{CacheEntity, EntityManager};
use crate::cache::expiry::is_past;
use crate::error::{CacheError, Result};

#[derive(Debug, Clone)]
struct Row {
    entity: CacheEntity,
    expires_at: Option<DateTime<Utc>>,
}

impl Row {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        !is_past(self.expires_at, now)
    }
}

#[derive(Debug)]
enum Staged {
    Persist { table: String, row: Row },
    Delete { table: String, key: String },
}

type Table = BTreeMap<String, Row>;

// == Memory Entity Manager ==
#[derive(Debug, Default)]
pub struct MemoryEntityManager {
    tables: RwLock<HashMap<String, Table>>,
    staged: Mutex<Vec<Staged>>,
}

impl MemoryEntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed live rows in `table`.
    pub async fn count(&self, table: &str) -> usize {
        let now = Utc::now();
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |rows| rows.values().filter(|row| row.is_live(now)).count())
    }

    /// Number of writes waiting for a flush.
    pub async fn pending(&self) -> usize {
        self.staged.lock().await.len()
    }
}

fn not_found(table: &str, key: &str) -> CacheError {
    CacheError::NotFound(format!("{}/{}", table, key))
}

#[async_trait]
impl EntityManager for MemoryEntityManager {
    async fn retrieve(&self, table: &str, key: &str) -> Result<CacheEntity> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        tables
            .get(table)
            .and_then(|rows| rows.get(key))
            .filter(|row| row.is_live(now))
            .map(|row| row.entity.clone())
            .ok_or_else(|| not_found(table, key))
    }

    async fn persist(&self, table: &str, entity: CacheEntity, ttl: Option<u64>) -> Result<()> {
        let now = Utc::now();
        let expires_at = ttl.map(|secs| {
            i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });

        self.staged.lock().await.push(Staged::Persist {
            table: table.to_string(),
            row: Row { entity, expires_at },
        });
        Ok(())
    }

    async fn delete(&self, table: &str, key: &str) -> Result<()> {
        let now = Utc::now();
        let exists = self
            .tables
            .read()
            .await
            .get(table)
            .and_then(|rows| rows.get(key))
            .is_some_and(|row| row.is_live(now));
        if !exists {
            return Err(not_found(table, key));
        }

        self.staged.lock().await.push(Staged::Delete {
            table: table.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let staged: Vec<Staged> = std::mem::take(&mut *self.staged.lock().await);
        if staged.is_empty() {
            return Ok(());
        }

        let count = staged.len();
        let mut tables = self.tables.write().await;
        for op in staged {
            match op {
                Staged::Persist { table, row } => {
                    tables
                        .entry(table)
                        .or_default()
                        .insert(row.entity.key.clone(), row);
                }
                Staged::Delete { table, key } => {
                    if let Some(rows) = tables.get_mut(&table) {
                        rows.remove(&key);
                    }
                }
            }
        }
        debug!(count, "flushed staged entity writes");
        Ok(())
    }

    async fn sorted_keys(
        &self,
        table: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let lower = match after {
            Some(key) => Bound::Excluded(key.to_string()),
            None => Bound::Unbounded,
        };
        Ok(rows
            .range((lower, Bound::Unbounded))
            .filter(|(_, row)| row.is_live(now))
            .take(limit)
            .map(|(key, _)| key.clone())
            .collect())
    }
}
