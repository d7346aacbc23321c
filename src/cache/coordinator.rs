//! Sweep Coordinator Module
//!
//! Decides when a sweep runs and how: inline on the writing caller for
//! small overshoot, on a background task for large bursts, never more than
//! one at a time per cache.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::{EvictionSweep, StatsRecorder, TimestampIndex};
use crate::config::SweepTuning;
use crate::error::Result;
use crate::guard::GuardProvider;
use crate::store::KeyValueStore;

// == Sweep Coordinator ==
/// Per-cache sweep scheduling and approximate size accounting.
///
/// The tracked entry estimate counts writes up and removals down between
/// sweeps; each sweep resyncs it against the store. Concurrent writers may
/// push the estimate past `max_entries`; the next sweep corrects the
/// overshoot.
pub struct SweepCoordinator {
    /// Approximate live entry count
    tracked: Arc<AtomicI64>,
    /// Unix millis of the most recent sweep attempt
    last_attempt_ms: AtomicI64,
    /// Throttle parameters
    tuning: SweepTuning,
    /// Sweep executor, absent when the cache has no entry bound
    worker: Option<Arc<SweepWorker>>,
}

impl SweepCoordinator {
    // == Constructor ==
    /// Creates a coordinator for one cache.
    ///
    /// With `max_entries` of None the coordinator only maintains the
    /// tracked estimate and never sweeps.
    pub fn new(
        cache_name: &str,
        max_entries: Option<u64>,
        tuning: SweepTuning,
        store: Arc<dyn KeyValueStore>,
        index: Arc<dyn TimestampIndex>,
        guard: Arc<dyn GuardProvider>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        let tracked = Arc::new(AtomicI64::new(0));
        let worker = max_entries.map(|max| {
            Arc::new(SweepWorker {
                cache_name: cache_name.to_string(),
                guard_name: format!("sweep:{}", cache_name),
                max_entries: max,
                guard_lease: tuning.guard_lease,
                sweep: EvictionSweep::new(Arc::clone(&store), Arc::clone(&index)),
                store,
                index,
                guard,
                tracked: Arc::clone(&tracked),
                stats,
            })
        });
        Self {
            tracked,
            last_attempt_ms: AtomicI64::new(0),
            tuning,
            worker,
        }
    }

    // == On Write ==
    /// Counts a completed write and applies the sweep decision table.
    ///
    /// With the estimate over the bound: skip while a sweep is in flight,
    /// sweep inline while the overshoot stays under the burst threshold,
    /// otherwise hand the sweep to a background task at most once per
    /// backoff window.
    pub async fn on_write(&self) {
        let tracked = self.tracked.fetch_add(1, Ordering::Relaxed) + 1;

        let worker = match &self.worker {
            Some(worker) => worker,
            None => return,
        };
        let max = worker.max_entries as i64;
        if tracked <= max {
            return;
        }

        if worker.in_flight().await {
            debug!(
                "cache '{}': overshoot at {} with a sweep in flight",
                worker.cache_name,
                tracked - max
            );
            return;
        }

        let overshoot = (tracked - max) as u64;
        if overshoot < self.tuning.burst_threshold {
            self.record_attempt();
            worker.run().await;
            return;
        }

        if self.millis_since_attempt() >= self.tuning.sweep_backoff.as_millis() as i64 {
            self.record_attempt();
            let worker = Arc::clone(worker);
            tokio::spawn(async move {
                worker.run().await;
            });
        }
    }

    // == On Remove ==
    /// Counts a completed removal.
    pub fn on_remove(&self) {
        self.tracked.fetch_sub(1, Ordering::Relaxed);
    }

    // == On Clear ==
    /// Resets the estimate after a bulk clear.
    pub fn on_clear(&self) {
        self.tracked.store(0, Ordering::Relaxed);
    }

    // == Tracked Estimate ==
    /// Returns the approximate live entry count.
    pub fn tracked_estimate(&self) -> i64 {
        self.tracked.load(Ordering::Relaxed)
    }

    fn record_attempt(&self) {
        self.last_attempt_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn millis_since_attempt(&self) -> i64 {
        Utc::now().timestamp_millis() - self.last_attempt_ms.load(Ordering::Relaxed)
    }
}

// == Sweep Worker ==
/// Guarded sweep execution shared between the inline path and background
/// tasks.
struct SweepWorker {
    cache_name: String,
    guard_name: String,
    max_entries: u64,
    guard_lease: Duration,
    store: Arc<dyn KeyValueStore>,
    index: Arc<dyn TimestampIndex>,
    guard: Arc<dyn GuardProvider>,
    sweep: EvictionSweep,
    tracked: Arc<AtomicI64>,
    stats: Arc<StatsRecorder>,
}

impl SweepWorker {
    /// Reports whether this cache's sweep guard is currently held.
    async fn in_flight(&self) -> bool {
        match self.guard.is_held(&self.guard_name).await {
            Ok(held) => held,
            Err(err) => {
                warn!(
                    "cache '{}': sweep guard probe failed: {}",
                    self.cache_name, err
                );
                false
            }
        }
    }

    /// Runs one guarded sweep.
    ///
    /// Losing the guard race is a silent skip: the holder's sweep covers
    /// this trigger. Sweep errors are logged and abandoned for this cycle;
    /// the guard is released on every exit path either way.
    async fn run(&self) {
        match self
            .guard
            .try_acquire(&self.guard_name, self.guard_lease)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!("cache '{}': sweep guard busy, skipping", self.cache_name);
                return;
            }
            Err(err) => {
                warn!(
                    "cache '{}': sweep guard acquisition failed: {}",
                    self.cache_name, err
                );
                return;
            }
        }

        if let Err(err) = self.sweep_guarded().await {
            warn!("cache '{}': sweep abandoned: {}", self.cache_name, err);
        }

        if let Err(err) = self.guard.release(&self.guard_name).await {
            warn!(
                "cache '{}': sweep guard release failed: {}",
                self.cache_name, err
            );
        }
    }

    /// The sweep body. Caller must hold the guard.
    async fn sweep_guarded(&self) -> Result<()> {
        // Stale index records go first so they never soak up victim slots.
        let stale = self.sweep.reconcile().await?;
        for key in &stale {
            self.index.remove(key);
        }

        // Resync the estimate with the store before judging overshoot.
        let size = self.store.size().await?;
        self.tracked.store(size as i64, Ordering::Relaxed);

        let mut evicted = 0u64;
        if size > self.max_entries {
            let overflow = (size - self.max_entries) as usize;
            for key in self.sweep.select_victims(overflow) {
                if self.store.remove(&key).await? {
                    self.tracked.fetch_sub(1, Ordering::Relaxed);
                    self.stats.record_eviction();
                    evicted += 1;
                }
                self.index.remove(&key);
            }
        }

        self.stats.record_sweep();
        info!(
            "cache '{}': sweep done, {} stale records dropped, {} entries evicted",
            self.cache_name,
            stale.len(),
            evicted
        );
        Ok(())
    }
}
