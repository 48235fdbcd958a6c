//! Redis Backend
//!
//! Adapter over a Redis server. Values are stored as strings, so reads come
//! back as `Value::String` whatever type was written.

use std::collections::VecDeque;

use ::redis::{aio::ConnectionManager, Client};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{Backend, KeyStream};
use crate::cache::Expiry;
use crate::error::{CacheError, Result};

/// Keys requested per `SCAN` round trip.
const SCAN_PAGE_SIZE: usize = 100;

// == Redis Backend ==
/// Redis adapter owning a lazily opened, reusable connection.
pub struct RedisBackend {
    client: Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisBackend {
    // == Constructors ==
    /// Creates a backend for `url`. No connection is made until first use.
    pub fn open(url: &str) -> Result<Self> {
        Ok(Self::with_client(Client::open(url)?))
    }

    /// Creates a backend around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            conn: OnceCell::new(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// True once the first command has opened the connection.
    pub fn is_connected(&self) -> bool {
        self.conn.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = ConnectionManager::new(self.client.clone()).await?;
                debug!(addr = ?self.client.get_connection_info().addr, "opened redis connection");
                Ok::<_, CacheError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("addr", &self.client.get_connection_info().addr)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Text stored in Redis for a value: strings raw, everything else as JSON.
fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Backend for RedisBackend {
    const DIRECT_EXISTS: bool = true;

    fn name(&self) -> &'static str {
        "redis"
    }

    async fn probe(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.connection().await?;
        let (exists, value): (bool, Option<String>) = ::redis::pipe()
            .cmd("EXISTS")
            .arg(key)
            .cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await?;

        if !exists {
            return Ok(None);
        }
        Ok(Some(value.map_or(Value::Null, Value::String)))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let exists: bool = ::redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(exists)
    }

    async fn write(&self, key: &str, value: &Value, expiry: Expiry) -> Result<()> {
        let mut conn = self.connection().await?;
        let mut pipe = ::redis::pipe();
        pipe.cmd("SET").arg(key).arg(encode_value(value)).ignore();

        match expiry.unix_deadline(Utc::now()) {
            Some(at) => pipe.cmd("EXPIREAT").arg(key).arg(at).ignore(),
            None => pipe.cmd("PERSIST").arg(key).ignore(),
        };

        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: i64 = ::redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn remove_batch(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let removed: i64 = ::redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        debug!(requested = keys.len(), removed, "redis batch delete");
        Ok(())
    }

    async fn list_all_keys(&self) -> Result<KeyStream> {
        let conn = self.connection().await?;
        let state = ScanState {
            conn,
            cursor: Some(0),
            buffered: VecDeque::new(),
        };

        let keys = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(key) = state.buffered.pop_front() {
                    return Some((Ok(key), state));
                }
                let cursor = state.cursor?;

                let page: std::result::Result<(u64, Vec<String>), _> = ::redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("COUNT")
                    .arg(SCAN_PAGE_SIZE)
                    .query_async(&mut state.conn)
                    .await;

                match page {
                    Ok((next, keys)) => {
                        state.cursor = (next != 0).then_some(next);
                        state.buffered.extend(keys);
                    }
                    Err(err) => {
                        state.cursor = None;
                        return Some((Err(CacheError::from(err)), state));
                    }
                }
            }
        });

        Ok(keys.boxed())
    }
}

struct ScanState {
    conn: ConnectionManager,
    /// None once the server reported the end of the iteration
    cursor: Option<u64>,
    buffered: VecDeque<String>,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_is_lazy() {
        // Nothing listens here; construction must still succeed
        let backend = RedisBackend::open("redis://127.0.0.1:1").unwrap();
        assert!(!backend.is_connected());
        assert_eq!(backend.name(), "redis");
    }

    #[test]
    fn test_open_rejects_bad_url() {
        let result = RedisBackend::open("not a url");
        assert!(matches!(result, Err(CacheError::Redis(_))));
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value(&json!("plain")), "plain");
        assert_eq!(encode_value(&json!(1)), "1");
        assert_eq!(encode_value(&json!(true)), "true");
        assert_eq!(encode_value(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
