//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::backend::orm::DEFAULT_TABLE;

/// Which backend the server's pool is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Ephemeral,
    Redis,
    Orm,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ephemeral" | "memory" => Ok(BackendKind::Ephemeral),
            "redis" => Ok(BackendKind::Redis),
            "orm" => Ok(BackendKind::Orm),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Ephemeral => "ephemeral",
            BackendKind::Redis => "redis",
            BackendKind::Orm => "orm",
        };
        f.write_str(name)
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend the pool is built on
    pub backend: BackendKind,
    /// Redis connection URL, used by the redis backend
    pub redis_url: String,
    /// Entity table, used by the orm backend
    pub orm_table: String,
    /// HTTP server port
    pub server_port: u16,
    /// Ephemeral expiry sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `ephemeral`, `redis` or `orm` (default: ephemeral)
    /// - `REDIS_URL` - Redis URL (default: redis://127.0.0.1:6379)
    /// - `ORM_TABLE` - Entity table name (default: cache)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env::var("CACHE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            orm_table: env::var("ORM_TABLE").unwrap_or(defaults.orm_table),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ephemeral,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            orm_table: DEFAULT_TABLE.to_string(),
            server_port: 3000,
            sweep_interval: 1,
        }
    }
}
