//! Windowed State Store
//!
//! Windowed state store for buffering records on one side of a stream-stream
//! join. Records are stored by join key with time-based eviction.
//!
//! ## Time-Indexed Lookups
//!
//! Records are stored in a two-level structure:
//! - Outer: `HashMap<JoinKey, TimeIndex>` for O(1) key lookup
//! - Inner: `BTreeMap<EventTime, VecDeque<Entries>>` for O(log n) time range
//!   queries and low-timestamp bulk eviction
//!
//! The same structure serves both access patterns the join needs: point
//! lookups by key constrained to a time window, and eviction of everything
//! older than a cutoff.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::Serialize;

use crate::error::JoinError;
use crate::join::record::JoinSide;

/// Entry in the windowed store: one buffered record plus match bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEntry {
    /// Join key of the buffered record
    pub key: String,
    /// Record payload
    pub value: String,
    /// Event time of the record (milliseconds)
    pub timestamp: i64,
    /// Insertion sequence number, unique within one store
    pub seq: u64,
    /// Whether a partner was ever found for this entry (or an eager fallback
    /// was already emitted for it). Gates fallback emission on eviction.
    pub matched: bool,
}

/// Statistics for monitoring windowed store behavior
#[derive(Debug, Default, Clone, Serialize)]
pub struct StoreStats {
    /// Total records stored (lifetime)
    pub records_stored: u64,
    /// Total records evicted by the expiry sweep (lifetime)
    pub records_evicted: u64,
    /// Total lookup operations
    pub lookups: u64,
    /// Total matches found across all lookups
    pub matches_found: u64,
    /// Current number of records in the store
    pub current_size: usize,
    /// Peak number of records observed
    pub peak_size: usize,
    /// Current number of unique keys
    pub current_keys: usize,
    /// Number of inserts rejected because a capacity limit was hit
    pub limit_hits: u64,
}

impl StoreStats {
    /// Record that a record was stored
    pub fn record_store(&mut self, new_size: usize) {
        self.records_stored += 1;
        self.current_size = new_size;
        if new_size > self.peak_size {
            self.peak_size = new_size;
        }
    }

    /// Record that records were evicted
    pub fn record_eviction(&mut self, count: usize, new_size: usize, new_keys: usize) {
        self.records_evicted += count as u64;
        self.current_size = new_size;
        self.current_keys = new_keys;
    }

    /// Record a lookup operation
    pub fn record_lookup(&mut self, matches: usize) {
        self.lookups += 1;
        self.matches_found += matches as u64;
    }
}

/// Configuration for state store memory limits
#[derive(Debug, Clone, Serialize)]
pub struct StoreConfig {
    /// Maximum number of records to store (0 = unlimited)
    pub max_records: usize,
    /// Maximum records per key (0 = unlimited)
    pub max_records_per_key: usize,
    /// Warning threshold as percentage of max_records (0-100)
    pub warning_threshold_pct: u8,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_records: 1_000_000,
            max_records_per_key: 10_000,
            warning_threshold_pct: 80,
        }
    }
}

impl StoreConfig {
    /// Create unlimited config (use with caution!)
    pub fn unlimited() -> Self {
        Self {
            max_records: 0,
            max_records_per_key: 0,
            warning_threshold_pct: 0,
        }
    }

    /// Create config with specific limits
    pub fn with_limits(max_records: usize, max_per_key: usize) -> Self {
        Self {
            max_records,
            max_records_per_key: max_per_key,
            warning_threshold_pct: 80,
        }
    }
}

/// Time-indexed store for records at a single join key
///
/// Uses BTreeMap for O(log n) time range queries. Each event time can hold
/// multiple records (VecDeque for FIFO order).
type TimeIndex = BTreeMap<i64, VecDeque<WindowEntry>>;

/// Windowed state store for one side of a stream-stream join
///
/// Records are indexed by join key, then by event time. Each key can hold
/// multiple records (the same key may appear many times in a stream).
/// Records are retired by [`WindowStore::evict_older_than`], driven by the
/// opposite stream's advancing time.
///
/// ## Capacity
///
/// Unlike a cache, the store never silently drops state: when a configured
/// limit is hit, `insert` fails with [`JoinError::CapacityExceeded`] and the
/// caller decides what to do. A warning is logged once when the store
/// approaches its global limit.
#[derive(Debug)]
pub struct WindowStore {
    /// Which side of the join this store buffers
    side: JoinSide,

    /// Records indexed by join key, then by event time
    records: HashMap<String, TimeIndex>,

    /// Running count of total records (maintained incrementally)
    record_count: usize,

    /// Next insertion sequence number
    next_seq: u64,

    /// Memory limit configuration
    config: StoreConfig,

    /// Flag indicating if we've logged a capacity warning
    capacity_warning_logged: bool,

    /// Statistics for monitoring
    stats: StoreStats,
}

impl WindowStore {
    /// Create a new store for the given side with default limits
    pub fn new(side: JoinSide) -> Self {
        Self::with_config(side, StoreConfig::default())
    }

    /// Create a new store with custom capacity configuration
    pub fn with_config(side: JoinSide, config: StoreConfig) -> Self {
        Self {
            side,
            records: HashMap::new(),
            record_count: 0,
            next_seq: 0,
            config,
            capacity_warning_logged: false,
            stats: StoreStats::default(),
        }
    }

    /// Count records for a specific key (O(n) where n is distinct event times)
    fn count_records_for_key(time_index: &TimeIndex) -> usize {
        time_index.values().map(|entries| entries.len()).sum()
    }

    /// Insert a record, returning a snapshot of the stored entry
    ///
    /// The returned [`WindowEntry`] carries the assigned sequence number and
    /// can be passed to [`WindowStore::mark_matched`].
    ///
    /// # Errors
    /// Returns [`JoinError::CapacityExceeded`] if a configured record limit
    /// (global or per-key) would be breached.
    pub fn insert(&mut self, key: &str, value: &str, timestamp: i64) -> Result<WindowEntry, JoinError> {
        if self.config.max_records > 0 && self.record_count >= self.config.max_records {
            self.stats.limit_hits += 1;
            return Err(JoinError::CapacityExceeded {
                side: self.side,
                limit: self.config.max_records,
            });
        }

        if self.config.max_records_per_key > 0 {
            if let Some(time_index) = self.records.get(key) {
                if Self::count_records_for_key(time_index) >= self.config.max_records_per_key {
                    self.stats.limit_hits += 1;
                    return Err(JoinError::CapacityExceeded {
                        side: self.side,
                        limit: self.config.max_records_per_key,
                    });
                }
            }
        }

        // Warn once when approaching the global limit
        if self.config.max_records > 0 && !self.capacity_warning_logged {
            let threshold =
                (self.config.max_records * self.config.warning_threshold_pct as usize) / 100;
            if self.record_count >= threshold {
                log::warn!(
                    "WindowStore({}): approaching capacity limit ({}/{} records)",
                    self.side,
                    self.record_count,
                    self.config.max_records
                );
                self.capacity_warning_logged = true;
            }
        }

        let entry = WindowEntry {
            key: key.to_string(),
            value: value.to_string(),
            timestamp,
            seq: self.next_seq,
            matched: false,
        };
        self.next_seq += 1;

        self.records
            .entry(key.to_string())
            .or_default()
            .entry(timestamp)
            .or_default()
            .push_back(entry.clone());

        self.record_count += 1;
        self.stats.record_store(self.record_count);
        self.stats.current_keys = self.records.len();

        Ok(entry)
    }

    /// Lookup all entries for a key within `[center - window, center + window]`
    ///
    /// Uses BTreeMap range queries for O(log n + m) complexity where n is the
    /// number of distinct event times for the key and m is matching entries.
    /// Results are returned in insertion order and `matched` flags are left
    /// untouched.
    pub fn range_lookup(&mut self, key: &str, center: i64, window_ms: i64) -> Vec<WindowEntry> {
        let lower = center.saturating_sub(window_ms);
        let upper = center.saturating_add(window_ms);

        let mut matches: Vec<WindowEntry> = self
            .records
            .get(key)
            .map(|time_index| {
                time_index
                    .range(lower..=upper)
                    .flat_map(|(_, entries)| entries.iter())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // BTreeMap iteration is time-ordered; restore insertion order
        matches.sort_by_key(|e| e.seq);

        self.stats.record_lookup(matches.len());
        matches
    }

    /// Idempotently mark the entry identified by `entry` as matched
    ///
    /// No-op if the entry has already been evicted.
    pub fn mark_matched(&mut self, entry: &WindowEntry) {
        if let Some(entries) = self
            .records
            .get_mut(&entry.key)
            .and_then(|time_index| time_index.get_mut(&entry.timestamp))
        {
            if let Some(stored) = entries.iter_mut().find(|e| e.seq == entry.seq) {
                stored.matched = true;
            }
        }
    }

    /// Remove and return every entry with `timestamp < cutoff`
    ///
    /// Evicted entries are returned in insertion order so the caller can emit
    /// deterministic fallback results for never-matched entries. Uses
    /// BTreeMap's ordered structure to split each key's index at the cutoff
    /// without scanning entries that survive.
    pub fn evict_older_than(&mut self, cutoff: i64) -> Vec<WindowEntry> {
        let mut evicted = Vec::new();

        self.records.retain(|_key, time_index| {
            // split_off keeps `>= cutoff` in the returned map
            let surviving = time_index.split_off(&cutoff);
            let expired = std::mem::replace(time_index, surviving);
            for (_, mut entries) in expired {
                evicted.extend(entries.drain(..));
            }
            !time_index.is_empty()
        });

        evicted.sort_by_key(|e| e.seq);

        self.record_count = self.record_count.saturating_sub(evicted.len());
        self.stats
            .record_eviction(evicted.len(), self.record_count, self.records.len());

        evicted
    }

    /// Which side of the join this store buffers
    pub fn side(&self) -> JoinSide {
        self.side
    }

    /// Get statistics
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Get the number of unique keys currently stored
    pub fn key_count(&self) -> usize {
        self.records.len()
    }

    /// Get the total number of records currently stored (O(1))
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the current configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Clear all records from the store
    pub fn clear(&mut self) {
        let evicted = self.record_count;
        self.records.clear();
        self.record_count = 0;
        self.stats.record_eviction(evicted, 0, 0);
        self.capacity_warning_logged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> WindowStore {
        WindowStore::new(JoinSide::Left)
    }

    #[test]
    fn test_insert_and_range_lookup() {
        let mut store = store();
        store.insert("a", "v1", 1000).unwrap();
        store.insert("a", "v2", 2000).unwrap();
        store.insert("b", "v3", 1500).unwrap();

        let matches = store.range_lookup("a", 1500, 600);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].value, "v1");
        assert_eq!(matches[1].value, "v2");

        // Window excludes the 2000 entry
        let matches = store.range_lookup("a", 1000, 500);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, "v1");

        // Unknown key
        assert!(store.range_lookup("missing", 1000, 5000).is_empty());
    }

    #[test]
    fn test_range_lookup_insertion_order() {
        let mut store = store();
        // Inserted out of timestamp order
        store.insert("a", "late", 3000).unwrap();
        store.insert("a", "early", 1000).unwrap();

        let matches = store.range_lookup("a", 2000, 2000);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].value, "late");
        assert_eq!(matches[1].value, "early");
    }

    #[test]
    fn test_duplicate_timestamps_kept_independently() {
        let mut store = store();
        store.insert("a", "first", 1000).unwrap();
        store.insert("a", "second", 1000).unwrap();

        let matches = store.range_lookup("a", 1000, 0);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].value, "first");
        assert_eq!(matches[1].value, "second");
    }

    #[test]
    fn test_mark_matched_idempotent() {
        let mut store = store();
        let entry = store.insert("a", "v", 1000).unwrap();
        assert!(!entry.matched);

        store.mark_matched(&entry);
        store.mark_matched(&entry);

        let matches = store.range_lookup("a", 1000, 0);
        assert!(matches[0].matched);
    }

    #[test]
    fn test_lookup_does_not_mutate_matched() {
        let mut store = store();
        store.insert("a", "v", 1000).unwrap();
        store.range_lookup("a", 1000, 1000);
        let matches = store.range_lookup("a", 1000, 1000);
        assert!(!matches[0].matched);
    }

    #[test]
    fn test_evict_older_than() {
        let mut store = store();
        store.insert("a", "old", 1000).unwrap();
        store.insert("b", "old", 1500).unwrap();
        store.insert("a", "new", 3000).unwrap();

        let evicted = store.evict_older_than(2000);
        assert_eq!(evicted.len(), 2);
        // Insertion order
        assert_eq!(evicted[0].value, "old");
        assert_eq!(evicted[0].key, "a");
        assert_eq!(evicted[1].key, "b");

        assert_eq!(store.record_count(), 1);
        // Evicted entries are gone for good
        assert!(store.range_lookup("a", 1000, 500).is_empty());
        assert_eq!(store.range_lookup("a", 3000, 0).len(), 1);
    }

    #[test]
    fn test_evict_cutoff_is_exclusive_at_boundary() {
        let mut store = store();
        store.insert("a", "v", 2000).unwrap();
        // timestamp == cutoff survives (eviction is `timestamp < cutoff`)
        assert!(store.evict_older_than(2000).is_empty());
        assert_eq!(store.record_count(), 1);
    }

    #[test]
    fn test_global_capacity_limit() {
        let mut store = WindowStore::with_config(JoinSide::Right, StoreConfig::with_limits(2, 0));
        store.insert("a", "v1", 1000).unwrap();
        store.insert("b", "v2", 1000).unwrap();

        let err = store.insert("c", "v3", 1000).unwrap_err();
        match err {
            JoinError::CapacityExceeded { side, limit } => {
                assert_eq!(side, JoinSide::Right);
                assert_eq!(limit, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.stats().limit_hits, 1);

        // Eviction frees capacity again
        store.evict_older_than(2000);
        store.insert("c", "v3", 3000).unwrap();
    }

    #[test]
    fn test_per_key_capacity_limit() {
        let mut store = WindowStore::with_config(JoinSide::Left, StoreConfig::with_limits(0, 2));
        store.insert("a", "v1", 1000).unwrap();
        store.insert("a", "v2", 2000).unwrap();
        assert!(store.insert("a", "v3", 3000).is_err());
        // Other keys are unaffected
        store.insert("b", "v1", 1000).unwrap();
    }

    #[test]
    fn test_stats_tracking() {
        let mut store = store();
        store.insert("a", "v1", 1000).unwrap();
        store.insert("a", "v2", 2000).unwrap();
        store.range_lookup("a", 1500, 1000);
        store.evict_older_than(1500);

        let stats = store.stats();
        assert_eq!(stats.records_stored, 2);
        assert_eq!(stats.lookups, 1);
        assert_eq!(stats.matches_found, 2);
        assert_eq!(stats.records_evicted, 1);
        assert_eq!(stats.current_size, 1);
        assert_eq!(stats.peak_size, 2);
    }

    #[test]
    fn test_clear() {
        let mut store = store();
        store.insert("a", "v", 1000).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.record_count(), 0);
    }
}
