//! Eviction Sweep Module
//!
//! Computes which keys a sweep should remove: the oldest entries when the
//! cache is over its bound, and index records whose entries are gone.

use std::collections::BinaryHeap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::TimestampIndex;
use crate::error::Result;
use crate::store::KeyValueStore;

// == Candidate ==
/// One victim candidate. Ordering is by timestamp, then key, so ties on
/// the same instant resolve the same way in every pass.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    stamp: DateTime<Utc>,
    key: String,
}

// == Eviction Sweep ==
/// Victim selection and index reconciliation over one cache's store and
/// timestamp index.
pub struct EvictionSweep {
    store: Arc<dyn KeyValueStore>,
    index: Arc<dyn TimestampIndex>,
}

impl EvictionSweep {
    /// Creates a sweep over the given collaborators.
    pub fn new(store: Arc<dyn KeyValueStore>, index: Arc<dyn TimestampIndex>) -> Self {
        Self { store, index }
    }

    // == Select Victims ==
    /// Returns up to `overflow` keys with the smallest recorded timestamps,
    /// oldest first.
    ///
    /// Single pass over the index with a candidate buffer of capacity
    /// `overflow`: while the buffer is full, a visited record replaces the
    /// newest candidate whenever it is older. Memory stays O(overflow) no
    /// matter how large the index is.
    pub fn select_victims(&self, overflow: usize) -> Vec<String> {
        if overflow == 0 {
            return Vec::new();
        }

        // Max-heap keyed by (stamp, key): the root is the newest candidate,
        // the one a full buffer gives up first.
        let mut candidates: BinaryHeap<Candidate> = BinaryHeap::with_capacity(overflow);
        self.index.for_each(&mut |key, stamp| {
            if candidates.len() < overflow {
                candidates.push(Candidate {
                    stamp,
                    key: key.to_string(),
                });
            } else if let Some(newest) = candidates.peek() {
                if (stamp, key) < (newest.stamp, newest.key.as_str()) {
                    candidates.pop();
                    candidates.push(Candidate {
                        stamp,
                        key: key.to_string(),
                    });
                }
            }
        });

        candidates
            .into_sorted_vec()
            .into_iter()
            .map(|candidate| candidate.key)
            .collect()
    }

    // == Reconcile ==
    /// Returns the keys recorded in the index but absent from the store.
    ///
    /// Such stale records are left behind by out-of-band removal or partial
    /// failure; dropping them keeps the index cardinality an honest proxy
    /// for store size.
    pub async fn reconcile(&self) -> Result<Vec<String>> {
        // Snapshot the keys first: the traversal is synchronous and the
        // store probes are not.
        let mut keys = Vec::new();
        self.index.for_each(&mut |key, _| keys.push(key.to_string()));

        let mut stale = Vec::new();
        for key in keys {
            if !self.store.contains_key(&key).await? {
                stale.push(key);
            }
        }
        Ok(stale)
    }
}
