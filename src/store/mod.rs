//! Store Module
//!
//! Trait seams for the underlying key/value store and the backend provider
//! that yields per-cache collaborators.

mod memory;

pub use memory::{MemoryBackend, MemoryStore};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::TimestampIndex;
use crate::error::Result;
use crate::guard::GuardProvider;

// == Key Value Store ==
/// The store the cache decorates.
///
/// Implementations are assumed already consistent and already replicated;
/// the policy layer never coordinates reads and writes across callers.
/// Values are opaque JSON payloads. Typed access happens above this trait.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value associated with a key, or None when absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Associates a value with a key, replacing any prior value.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Removes a key.
    ///
    /// # Returns
    /// `true` when the key was present.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Reports whether a key is present.
    async fn contains_key(&self, key: &str) -> Result<bool>;

    /// Returns the current entry count.
    ///
    /// May lag concurrent mutations; callers treat it as an estimate.
    async fn size(&self) -> Result<u64>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}

// == Cache Backend ==
/// Provider of per-cache collaborators.
///
/// One backend serves every cache in a registry. Calling `store` or
/// `timestamps` twice with the same name must yield handles onto the same
/// underlying data.
pub trait CacheBackend: Send + Sync + 'static {
    /// Returns the key/value store for a named cache.
    fn store(&self, name: &str) -> Arc<dyn KeyValueStore>;

    /// Returns the timestamp index for a named cache.
    fn timestamps(&self, name: &str) -> Arc<dyn TimestampIndex>;

    /// Returns the process-wide sweep guard provider.
    fn guard(&self) -> Arc<dyn GuardProvider>;
}
