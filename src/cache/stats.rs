//! Pool Statistics Module
//!
//! Tracks how lazy loads resolved and how many writes and deletes a pool
//! pushed to its backend.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Pool Stats ==
/// Live counters shared by a pool and every item it hands out.
#[derive(Debug, Default)]
pub struct PoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one lazy load.
    pub fn record_load(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

// == Stats Snapshot ==
/// Serializable copy of a pool's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Lazy loads that found the key
    pub hits: u64,
    /// Lazy loads that did not find the key
    pub misses: u64,
    /// Values pushed to the backend
    pub writes: u64,
    /// Item deletes issued to the backend
    pub deletes: u64,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Calculates the load hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if nothing has been loaded.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
