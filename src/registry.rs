//! Cache Registry Module
//!
//! Resolves cache names to lazily built, shared cache instances.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::cache::GuidedCache;
use crate::config::RegistryConfig;
use crate::store::{CacheBackend, MemoryBackend};

// == Cache Registry ==
/// Name to cache mapping over one backend.
///
/// A cache is built on its first lookup: the registry resolves the name's
/// policy through [`RegistryConfig::resolve`], pulls the store and index
/// for that name from the backend, and keeps the instance for every later
/// lookup. Two callers racing the first lookup still end up sharing one
/// instance.
pub struct CacheRegistry {
    backend: Arc<dyn CacheBackend>,
    config: RegistryConfig,
    caches: DashMap<String, Arc<GuidedCache>>,
}

impl CacheRegistry {
    // == Constructor ==
    /// Creates a registry over the given backend and configuration.
    pub fn new(backend: Arc<dyn CacheBackend>, config: RegistryConfig) -> Self {
        Self {
            backend,
            config,
            caches: DashMap::new(),
        }
    }

    /// Creates a registry over an in-memory backend with default
    /// configuration, for single-process deployments and tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), RegistryConfig::default())
    }

    // == Cache ==
    /// Returns the cache for a name, building it on first lookup.
    pub fn cache(&self, name: &str) -> Arc<GuidedCache> {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| {
                let config = self.config.resolve(name);
                info!("cache '{}': created with {:?}", name, config);
                Arc::new(GuidedCache::new(
                    name,
                    config,
                    self.config.tuning.clone(),
                    self.backend.store(name),
                    self.backend.timestamps(name),
                    self.backend.guard(),
                ))
            })
            .value()
            .clone()
    }

    // == Cache Names ==
    /// Returns the names of every cache built so far.
    pub fn cache_names(&self) -> Vec<String> {
        self.caches.iter().map(|cache| cache.key().clone()).collect()
    }
}
