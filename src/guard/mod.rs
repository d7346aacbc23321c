//! Guard Module
//!
//! Named leased guards gating the eviction sweep: at most one holder per
//! name at a time, with lease expiry as the recovery path for holders that
//! never release.

mod local;

pub use local::LocalGuard;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// == Guard Provider ==
/// Provider of named guards with a bounded lease.
///
/// A guard held past its lease may be taken over by another caller, so a
/// holder that crashes mid-sweep blocks successors for at most one lease.
/// Holders release explicitly on every normal exit path regardless.
#[async_trait]
pub trait GuardProvider: Send + Sync + 'static {
    /// Attempts to take the named guard for the lease duration.
    ///
    /// Never blocks waiting for the current holder.
    ///
    /// # Returns
    /// `true` when the guard was taken, `false` when another holder has it.
    async fn try_acquire(&self, name: &str, lease: Duration) -> Result<bool>;

    /// Releases the named guard.
    ///
    /// Idempotent: releasing a guard that is not held is a no-op.
    async fn release(&self, name: &str) -> Result<()>;

    /// Reports whether the named guard is currently held.
    async fn is_held(&self, name: &str) -> Result<bool>;
}
