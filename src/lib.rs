//! Guided Cache - a policy layer over pluggable key/value stores
//!
//! Adds dual TTL expiry, a soft entry bound with oldest-first eviction, and
//! throttled guarded sweeps on top of any store wired in through the trait
//! seams. Ships in-memory collaborators for single-process use.

pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod registry;
pub mod store;

pub use cache::{CacheStats, GuidedCache, TimestampIndex};
pub use config::{CacheConfig, RegistryConfig, SweepTuning};
pub use error::{CacheError, Result};
pub use guard::GuardProvider;
pub use registry::CacheRegistry;
pub use store::{CacheBackend, KeyValueStore, MemoryBackend};
