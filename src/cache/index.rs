//! Timestamp Index Module
//!
//! Side index mapping each key to its last relevant instant, used to
//! approximate recency without scanning stored values.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

// == Timestamp Index ==
/// Key to last-relevant-instant mapping.
///
/// Instants are wall-clock so the index can be shared by processes on
/// different machines. One record exists per live entry: created on first
/// write, replaced on every later write (and on reads when the cache runs
/// under access expiry), removed when the entry goes away.
pub trait TimestampIndex: Send + Sync + 'static {
    /// Records "now" for the key, replacing any prior record.
    fn touch(&self, key: &str);

    /// Returns the recorded instant for the key, or None when absent.
    fn timestamp_of(&self, key: &str) -> Option<DateTime<Utc>>;

    /// Deletes the key's record. No-op when absent.
    fn remove(&self, key: &str);

    /// Visits every record once, in no particular order.
    ///
    /// Traversal tolerates concurrent mutation: records removed mid-pass
    /// never corrupt it, and records added mid-pass may or may not be
    /// visited. The visitor must not mutate this index.
    fn for_each(&self, visit: &mut dyn FnMut(&str, DateTime<Utc>));

    /// Deletes every record.
    fn clear(&self);

    /// Returns the number of records.
    fn len(&self) -> u64;

    /// Returns true when the index holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Memory Timestamp Index ==
/// Concurrent in-memory index for single-process deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryTimestampIndex {
    /// Key to instant records
    records: DashMap<String, DateTime<Utc>>,
}

impl MemoryTimestampIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimestampIndex for MemoryTimestampIndex {
    fn touch(&self, key: &str) {
        self.records.insert(key.to_string(), Utc::now());
    }

    fn timestamp_of(&self, key: &str) -> Option<DateTime<Utc>> {
        self.records.get(key).map(|record| *record.value())
    }

    fn remove(&self, key: &str) {
        self.records.remove(key);
    }

    fn for_each(&self, visit: &mut dyn FnMut(&str, DateTime<Utc>)) {
        for record in self.records.iter() {
            visit(record.key(), *record.value());
        }
    }

    fn clear(&self) {
        self.records.clear();
    }

    fn len(&self) -> u64 {
        self.records.len() as u64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_index_new_is_empty() {
        let index = MemoryTimestampIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_index_touch_records_instant() {
        let index = MemoryTimestampIndex::new();

        let before = Utc::now();
        index.touch("key1");
        let after = Utc::now();

        let stamp = index.timestamp_of("key1").unwrap();
        assert!(stamp >= before && stamp <= after);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_index_touch_replaces_prior_record() {
        let index = MemoryTimestampIndex::new();

        index.touch("key1");
        let first = index.timestamp_of("key1").unwrap();

        sleep(Duration::from_millis(5));
        index.touch("key1");
        let second = index.timestamp_of("key1").unwrap();

        assert!(second > first);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_index_timestamp_of_missing() {
        let index = MemoryTimestampIndex::new();
        assert_eq!(index.timestamp_of("nonexistent"), None);
    }

    #[test]
    fn test_index_remove() {
        let index = MemoryTimestampIndex::new();

        index.touch("key1");
        index.remove("key1");

        assert_eq!(index.timestamp_of("key1"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_index_remove_missing_is_noop() {
        let index = MemoryTimestampIndex::new();

        index.touch("key1");
        index.remove("nonexistent");

        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_index_for_each_visits_all_records() {
        let index = MemoryTimestampIndex::new();

        index.touch("key1");
        index.touch("key2");
        index.touch("key3");

        let mut visited = HashSet::new();
        index.for_each(&mut |key, _| {
            visited.insert(key.to_string());
        });

        assert_eq!(visited.len(), 3);
        assert!(visited.contains("key1"));
        assert!(visited.contains("key2"));
        assert!(visited.contains("key3"));
    }

    #[test]
    fn test_index_clear() {
        let index = MemoryTimestampIndex::new();

        index.touch("key1");
        index.touch("key2");
        index.clear();

        assert!(index.is_empty());
        assert_eq!(index.timestamp_of("key1"), None);
    }
}
