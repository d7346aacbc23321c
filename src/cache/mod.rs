//! Cache Module
//!
//! The policy layer: timestamp index, eviction sweep, sweep coordinator,
//! and the guided cache surface composing them.

mod coordinator;
mod guided;
mod index;
mod stats;
mod sweep;


// Re-export public types
pub use coordinator::SweepCoordinator;
pub use guided::GuidedCache;
pub use index::{MemoryTimestampIndex, TimestampIndex};
pub use stats::{CacheStats, StatsRecorder};
pub use sweep::EvictionSweep;
