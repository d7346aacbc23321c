//! In-Memory Store Module
//!
//! DashMap-backed store and backend for single-process deployments and tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::cache::{MemoryTimestampIndex, TimestampIndex};
use crate::error::Result;
use crate::guard::{GuardProvider, LocalGuard};
use crate::store::{CacheBackend, KeyValueStore};

// == Memory Store ==
/// Concurrent in-memory key/value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.entries.len() as u64)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

// == Memory Backend ==
/// Backend serving DashMap-backed collaborators, one set per cache name.
///
/// Repeated lookups for the same name return handles onto the same store
/// and index. The guard provider is shared across all names.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Store per cache name
    stores: DashMap<String, Arc<MemoryStore>>,
    /// Timestamp index per cache name
    indexes: DashMap<String, Arc<MemoryTimestampIndex>>,
    /// Process-wide sweep guard table
    guard: Arc<LocalGuard>,
}

impl MemoryBackend {
    /// Creates a new backend with no caches materialized yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryBackend {
    fn store(&self, name: &str) -> Arc<dyn KeyValueStore> {
        self.stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new()))
            .value()
            .clone()
    }

    fn timestamps(&self, name: &str) -> Arc<dyn TimestampIndex> {
        self.indexes
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryTimestampIndex::new()))
            .value()
            .clone()
    }

    fn guard(&self) -> Arc<dyn GuardProvider> {
        self.guard.clone()
    }
}
