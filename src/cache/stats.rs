//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Recorder ==
/// Shared counter set mutated by cache operations and sweeps.
///
/// Counters are relaxed atomics: every operation takes `&self`, so exact
/// cross-counter consistency is not promised, only per-counter accuracy.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    /// Successful cache retrievals
    hits: AtomicU64,
    /// Failed cache retrievals (key not found or expired)
    misses: AtomicU64,
    /// Entries removed by sweeps
    evictions: AtomicU64,
    /// Completed sweep passes
    sweeps: AtomicU64,
}

impl StatsRecorder {
    // == Constructor ==
    /// Creates a recorder with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Sweep ==
    /// Increments the completed-sweep counter.
    pub fn record_sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Captures the counters together with the tracked entry estimate.
    pub fn snapshot(&self, tracked_entries: i64) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            tracked_entries,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of one cache's performance metrics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted by sweeps
    pub evictions: u64,
    /// Number of completed sweep passes
    pub sweeps: u64,
    /// Approximate entry count as tracked by the coordinator
    pub tracked_entries: i64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
