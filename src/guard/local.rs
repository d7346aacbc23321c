//! Local Guard Module
//!
//! Single-process guard provider backed by a lease table.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::Result;
use crate::guard::GuardProvider;

// == Local Guard ==
/// Lease-table guard provider: a timed mutex per name.
///
/// Each entry maps a guard name to the instant its lease runs out. A name
/// whose lease has passed counts as free even before release, so a holder
/// that vanished mid-sweep blocks successors for at most one lease.
///
/// `release` removes the entry without checking who holds it. A holder that
/// outlives its lease can therefore release a successor's guard; the sweep
/// tolerates that overlap, at worst re-evicting keys that are already gone.
#[derive(Debug, Default)]
pub struct LocalGuard {
    /// Guard name to lease expiry
    leases: DashMap<String, Instant>,
}

impl LocalGuard {
    /// Creates a guard provider with no leases outstanding.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuardProvider for LocalGuard {
    async fn try_acquire(&self, name: &str, lease: Duration) -> Result<bool> {
        let now = Instant::now();
        // The entry holds its shard lock across the check and the write,
        // so two callers cannot both take an expired lease.
        let acquired = match self.leases.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() <= now {
                    occupied.insert(now + lease);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now + lease);
                true
            }
        };
        Ok(acquired)
    }

    async fn release(&self, name: &str) -> Result<()> {
        self.leases.remove(name);
        Ok(())
    }

    async fn is_held(&self, name: &str) -> Result<bool> {
        let held = self
            .leases
            .get(name)
            .map(|expiry| *expiry > Instant::now())
            .unwrap_or(false);
        Ok(held)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const LEASE: Duration = Duration::from_millis(250);

    #[tokio::test]
    async fn test_guard_acquire_when_free() {
        let guard = LocalGuard::new();

        assert!(guard.try_acquire("sweep", LEASE).await.unwrap());
        assert!(guard.is_held("sweep").await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_blocked_while_held() {
        let guard = LocalGuard::new();

        assert!(guard.try_acquire("sweep", LEASE).await.unwrap());
        assert!(!guard.try_acquire("sweep", LEASE).await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_release_frees() {
        let guard = LocalGuard::new();

        guard.try_acquire("sweep", LEASE).await.unwrap();
        guard.release("sweep").await.unwrap();

        assert!(!guard.is_held("sweep").await.unwrap());
        assert!(guard.try_acquire("sweep", LEASE).await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_release_idempotent() {
        let guard = LocalGuard::new();

        guard.release("never_held").await.unwrap();
        guard.release("never_held").await.unwrap();

        assert!(!guard.is_held("never_held").await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_lease_expiry_allows_reacquire() {
        let guard = LocalGuard::new();
        let short_lease = Duration::from_millis(50);

        assert!(guard.try_acquire("sweep", short_lease).await.unwrap());

        // Wait past the lease without releasing
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(!guard.is_held("sweep").await.unwrap());
        assert!(guard.try_acquire("sweep", LEASE).await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_names_independent() {
        let guard = LocalGuard::new();

        assert!(guard.try_acquire("sweep_orders", LEASE).await.unwrap());
        assert!(guard.try_acquire("sweep_users", LEASE).await.unwrap());
        assert!(guard.is_held("sweep_orders").await.unwrap());
        assert!(guard.is_held("sweep_users").await.unwrap());
    }
}
