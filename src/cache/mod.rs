//! Cache Module
//!
//! Lazy-loading cache items, the pools that hand them out, and multi-key
//! result collections.

mod collection;
pub mod expiry;
mod item;
mod pool;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use collection::ItemCollection;
pub use expiry::Expiry;
pub use item::{Item, LoadState};
pub use pool::Pool;
pub use stats::{PoolStats, StatsSnapshot};

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Keys removed per backend flush while clearing a pool
pub const CLEAR_BATCH_SIZE: usize = 100;

// == Key Validation ==
/// Rejects keys no backend can hold: empty, or longer than
/// [`MAX_KEY_LENGTH`] bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "Key cannot be empty".to_string(),
        ));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
