//! Expiry Sweep Task
//!
//! Background task that periodically drops expired entries from an
//! ephemeral pool, along with the items the pool retains for them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::EphemeralBackend;
use crate::cache::Pool;

/// Spawns a background task that periodically purges expired entries.
///
/// # Arguments
/// * `pool` - Shared ephemeral pool
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let pool = Arc::new(Pool::ephemeral());
/// let sweep_handle = spawn_sweep_task(pool.clone(), 1);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(
    pool: Arc<Pool<EphemeralBackend>>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = pool.purge_expired().await;
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
