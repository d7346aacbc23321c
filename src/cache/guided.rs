//! Guided Cache Module
//!
//! The public cache surface: dual TTL expiry checked lazily on reads, a
//! soft entry bound enforced through the sweep coordinator, and a typed
//! serde boundary over opaque stored values.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheStats, StatsRecorder, SweepCoordinator, TimestampIndex};
use crate::config::{CacheConfig, SweepTuning};
use crate::error::{CacheError, Result};
use crate::guard::GuardProvider;
use crate::store::KeyValueStore;

// == Guided Cache ==
/// Policy decorator over a key/value store.
///
/// Every operation takes `&self` and is safe under concurrent callers.
/// Reads check expiry against the timestamp index before touching the
/// store; writes update the index and hand the sweep decision to the
/// coordinator. Nothing here blocks on the store's own consistency
/// mechanism.
pub struct GuidedCache {
    /// Cache name, also scoping the sweep guard
    name: String,
    /// Policy resolved at creation, immutable afterward
    config: CacheConfig,
    store: Arc<dyn KeyValueStore>,
    index: Arc<dyn TimestampIndex>,
    coordinator: SweepCoordinator,
    stats: Arc<StatsRecorder>,
}

impl GuidedCache {
    // == Constructor ==
    /// Creates a cache over the given collaborators.
    ///
    /// # Arguments
    /// * `name` - Cache name, used for logging and the sweep guard
    /// * `config` - Expiry windows and entry bound
    /// * `tuning` - Sweep throttle parameters
    /// * `store` - The underlying key/value store
    /// * `index` - Timestamp index shared with other holders of this cache
    /// * `guard` - Guard provider scoping sweeps to one holder at a time
    pub fn new(
        name: impl Into<String>,
        config: CacheConfig,
        tuning: SweepTuning,
        store: Arc<dyn KeyValueStore>,
        index: Arc<dyn TimestampIndex>,
        guard: Arc<dyn GuardProvider>,
    ) -> Self {
        let name = name.into();
        let stats = Arc::new(StatsRecorder::new());
        let coordinator = SweepCoordinator::new(
            &name,
            config.max_entries,
            tuning,
            Arc::clone(&store),
            Arc::clone(&index),
            guard,
            Arc::clone(&stats),
        );
        Self {
            name,
            config,
            store,
            index,
            coordinator,
            stats,
        }
    }

    // == Get ==
    /// Returns the value for a key, or None when absent or expired.
    ///
    /// Expiry is checked lazily against the timestamp index: an entry past
    /// its window is evicted here and reported absent. Under access expiry
    /// a successful read refreshes the entry's record.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        if self.expire_if_stale(key).await? {
            self.stats.record_miss();
            return Ok(None);
        }
        match self.store.get(key).await? {
            Some(value) => {
                if self.config.access_expiry.is_some() {
                    self.index.touch(key);
                }
                self.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Get As ==
    /// Returns the value for a key deserialized into `T`.
    ///
    /// A stored value whose shape disagrees with `T` fails fast with
    /// [`CacheError::TypeMismatch`]; the entry itself is left in place.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(typed) => Ok(Some(typed)),
                Err(err) => Err(CacheError::TypeMismatch {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                    detail: err.to_string(),
                }),
            },
            None => Ok(None),
        }
    }

    // == Get With ==
    /// Returns the cached value, loading and caching it on a miss.
    ///
    /// The loader runs at most once per call. Its failure surfaces as
    /// [`CacheError::Loader`] carrying the key and the loader identity,
    /// and nothing is cached. Two concurrent callers missing on the same
    /// key may both load; the later write wins.
    pub async fn get_with<F, Fut>(&self, key: &str, loader: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Value>>,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let loaded = loader().await.map_err(|reason| CacheError::Loader {
            key: key.to_string(),
            loader: std::any::type_name::<F>(),
            reason,
        })?;
        self.put_value(key, loaded.clone()).await?;
        Ok(loaded)
    }

    // == Put ==
    /// Associates a value with a key.
    ///
    /// Serialization failure surfaces as [`CacheError::Serialization`]
    /// and leaves the cache untouched.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|err| CacheError::Serialization {
            key: key.to_string(),
            detail: err.to_string(),
        })?;
        self.put_value(key, value).await
    }

    // == Put If Absent ==
    /// Writes the value only when the key holds no live entry.
    ///
    /// # Returns
    /// The value associated with the key afterward: the existing one when
    /// the presence probe hit, otherwise the given one. The probe and the
    /// write are separate store operations, so two racing callers on a new
    /// key may both write and one value survives.
    pub async fn put_if_absent<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<Value> {
        let value = serde_json::to_value(value).map_err(|err| CacheError::Serialization {
            key: key.to_string(),
            detail: err.to_string(),
        })?;

        if let Some(existing) = self.get(key).await? {
            return Ok(existing);
        }
        self.put_value(key, value.clone()).await?;
        Ok(value)
    }

    // == Evict ==
    /// Removes a key's entry and its timestamp record.
    pub async fn evict(&self, key: &str) -> Result<()> {
        self.evict_if_present(key).await?;
        Ok(())
    }

    // == Evict If Present ==
    /// Removes a key's entry and its timestamp record.
    ///
    /// # Returns
    /// `true` when an entry was actually removed.
    pub async fn evict_if_present(&self, key: &str) -> Result<bool> {
        let removed = self.store.remove(key).await?;
        if removed {
            self.coordinator.on_remove();
        }
        self.index.remove(key);
        Ok(removed)
    }

    // == Clear ==
    /// Removes every entry and every timestamp record.
    ///
    /// Not atomic against concurrent puts: a racing put may leave one
    /// entry behind.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        self.index.clear();
        self.coordinator.on_clear();
        Ok(())
    }

    // == Invalidate ==
    /// Clears the cache.
    ///
    /// # Returns
    /// `true` when the cache held any entries beforehand.
    pub async fn invalidate(&self) -> Result<bool> {
        let had_entries = self.store.size().await? > 0;
        self.clear().await?;
        Ok(had_entries)
    }

    // == Accessors ==
    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resolved policy for this cache.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the store's current entry count.
    pub async fn size(&self) -> Result<u64> {
        self.store.size().await
    }

    /// Returns a snapshot of this cache's metrics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.coordinator.tracked_estimate())
    }

    // == Internals ==
    /// The write path shared by put, put_if_absent, and the loader.
    ///
    /// An overwrite counts as an evict followed by a fresh write in both
    /// the store and the index.
    async fn put_value(&self, key: &str, value: Value) -> Result<()> {
        if self.store.remove(key).await? {
            self.coordinator.on_remove();
        }
        self.index.remove(key);

        self.store.put(key, value).await?;
        self.index.touch(key);
        self.coordinator.on_write().await;
        Ok(())
    }

    /// Evicts the key when its record is past the active expiry window.
    ///
    /// # Returns
    /// `true` when the entry was expired and removed here.
    async fn expire_if_stale(&self, key: &str) -> Result<bool> {
        let window = match self.config.expiry_window() {
            Some(window) => window,
            None => return Ok(false),
        };
        let stamp = match self.index.timestamp_of(key) {
            Some(stamp) => stamp,
            None => return Ok(false),
        };

        let age_ms = Utc::now().signed_duration_since(stamp).num_milliseconds();
        if age_ms < window.as_millis() as i64 {
            return Ok(false);
        }

        debug!(
            "cache '{}': entry '{}' expired after {}ms",
            self.name, key, age_ms
        );
        if self.store.remove(key).await? {
            self.coordinator.on_remove();
        }
        self.index.remove(key);
        Ok(true)
    }
}
