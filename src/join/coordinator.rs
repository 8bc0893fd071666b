//! Join Coordinator
//!
//! Coordinates windowed stream-stream join processing by managing dual state
//! stores, routing records to the appropriate side, sweeping expired state,
//! and producing joined results.
//!
//! ## Processing Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 JoinCoordinator                     │
//! │                                                     │
//! │  ┌────────────┐   stream time   ┌────────────┐     │
//! │  │ Left Store │◄───────────────►│ Right Store│     │
//! │  └────────────┘                 └────────────┘     │
//! │                                                     │
//! │  process(Left, r)  ──► probe right store, sweep    │
//! │  process(Right, r) ──► probe left store, sweep     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! One record is processed at a time; each step is a single atomic,
//! synchronous call that probes the opposite store, emits results, buffers
//! the record, and sweeps state whose window has fully elapsed. Eviction is
//! purely a function of observed timestamps, never of wall-clock time.

use std::fmt;

use serde::Serialize;

use crate::error::JoinError;
use crate::join::config::{Combiner, Fallback, FallbackPolicy, JoinConfig, JoinMode};
use crate::join::record::{JoinOutput, JoinSide, Record};
use crate::join::state_store::WindowStore;
use crate::join::watermark::StreamTimeTracker;

/// Statistics for monitoring join coordinator behavior
#[derive(Debug, Default, Clone, Serialize)]
pub struct JoinStats {
    /// Records processed from the left side
    pub left_records_processed: u64,
    /// Records processed from the right side
    pub right_records_processed: u64,
    /// Total combined results emitted
    pub matches_emitted: u64,
    /// Total fallback results emitted (eager or on eviction)
    pub fallbacks_emitted: u64,
    /// Records that arrived too late to ever join
    pub late_records: u64,
    /// Current left state store size
    pub left_store_size: usize,
    /// Current right state store size
    pub right_store_size: usize,
}

/// Coordinates windowed stream-stream join processing
///
/// The coordinator owns both state stores and the stream-time watermarks.
/// Processing a record from side `S`:
/// 1. Advance `S`'s stream time (late records are counted, not rejected).
/// 2. Probe the opposite store for entries with the same key whose timestamp
///    lies within the join window, in insertion order.
/// 3. Emit one combined result per match, marking the partner entries.
/// 4. On the no-match path, apply the configured fallback policy.
/// 5. Buffer the record in `S`'s own store.
/// 6. Sweep the opposite store: entries older than `stream_time[S] - window`
///    can never be probed by a future on-time `S` record, so they are
///    evicted, emitting a deferred fallback for never-matched entries whose
///    side owes one.
pub struct JoinCoordinator {
    /// Join mode (inner, left, outer)
    mode: JoinMode,

    /// Fallback emission policy
    policy: FallbackPolicy,

    /// Join window in milliseconds
    window_ms: i64,

    /// Combines a matched (left, right) value pair
    combiner: Combiner,

    /// Renders an unmatched left value
    left_fallback: Fallback,

    /// Renders an unmatched right value
    right_fallback: Fallback,

    /// State store for left side records
    left_store: WindowStore,

    /// State store for right side records
    right_store: WindowStore,

    /// Per-side stream time watermarks
    stream_time: StreamTimeTracker,

    /// Statistics
    stats: JoinStats,
}

impl JoinCoordinator {
    /// Create a new join coordinator with the given configuration
    ///
    /// # Errors
    /// Returns [`JoinError::InvalidConfiguration`] if the join window is
    /// zero or exceeds `i64` milliseconds.
    pub fn new(config: JoinConfig) -> Result<Self, JoinError> {
        let window_ms = config.validated_window_ms()?;

        Ok(Self {
            mode: config.mode,
            policy: config.policy,
            window_ms,
            combiner: config.combiner,
            left_fallback: config.left_fallback,
            right_fallback: config.right_fallback,
            left_store: WindowStore::with_config(JoinSide::Left, config.store.clone()),
            right_store: WindowStore::with_config(JoinSide::Right, config.store),
            stream_time: StreamTimeTracker::new(),
            stats: JoinStats::default(),
        })
    }

    /// Process a record from the left side
    pub fn process_left(&mut self, record: Record) -> Result<Vec<JoinOutput>, JoinError> {
        self.process(JoinSide::Left, record)
    }

    /// Process a record from the right side
    pub fn process_right(&mut self, record: Record) -> Result<Vec<JoinOutput>, JoinError> {
        self.process(JoinSide::Right, record)
    }

    /// Process a record from the specified side
    ///
    /// Returns the results generated by this step in emission order: combined
    /// results for every partner found in the opposite store, then (policy
    /// and mode permitting) fallback results, then fallbacks for entries
    /// evicted by the sweep.
    ///
    /// # Errors
    /// Returns [`JoinError::InvalidRecord`] for an empty key and
    /// [`JoinError::CapacityExceeded`] if the record's own store is full.
    pub fn process(&mut self, side: JoinSide, record: Record) -> Result<Vec<JoinOutput>, JoinError> {
        if record.key.is_empty() {
            return Err(JoinError::invalid_record("record key must be non-empty"));
        }

        match side {
            JoinSide::Left => self.stats.left_records_processed += 1,
            JoinSide::Right => self.stats.right_records_processed += 1,
        }

        // 1. Advance this side's stream time
        let on_time = self
            .stream_time
            .observe(side, record.timestamp, self.window_ms);
        if !on_time {
            self.stats.late_records += 1;
            log::debug!(
                "JoinCoordinator: late record on {} side (key={}, ts={}); window already elapsed",
                side,
                record.key,
                record.timestamp
            );
        }

        let (own_store, opposite_store) = match side {
            JoinSide::Left => (&mut self.left_store, &mut self.right_store),
            JoinSide::Right => (&mut self.right_store, &mut self.left_store),
        };

        let mut outputs = Vec::new();

        // 2-3. Probe the opposite store within the window
        let matches = opposite_store.range_lookup(&record.key, record.timestamp, self.window_ms);
        for partner in &matches {
            let value = match side {
                JoinSide::Left => (self.combiner)(&record.value, &partner.value),
                JoinSide::Right => (self.combiner)(&partner.value, &record.value),
            };
            outputs.push(JoinOutput::new(record.key.clone(), value));
            opposite_store.mark_matched(partner);
        }
        let matched = !matches.is_empty();
        self.stats.matches_emitted += matches.len() as u64;

        // 4. No-match path: under the eager policy the fallback fires now;
        // under the deferred policy the decision waits for the sweep.
        let mut settled = matched;
        if !matched && self.policy == FallbackPolicy::Eager && self.mode.owes_fallback(side) {
            let value = match side {
                JoinSide::Left => (self.left_fallback)(&record.value),
                JoinSide::Right => (self.right_fallback)(&record.value),
            };
            outputs.push(JoinOutput::new(record.key.clone(), value));
            self.stats.fallbacks_emitted += 1;
            settled = true;
        }

        // 5. Buffer the record on its own side
        let entry = own_store.insert(&record.key, &record.value, record.timestamp)?;
        if settled {
            // No fallback owed on eviction: the record either matched or
            // already emitted its eager fallback
            own_store.mark_matched(&entry);
        }

        // 6. Sweep state whose window has fully elapsed
        self.sweep(side, &mut outputs);

        self.stats.left_store_size = self.left_store.record_count();
        self.stats.right_store_size = self.right_store.record_count();

        Ok(outputs)
    }

    /// Process a batch of records from one side
    pub fn process_batch(
        &mut self,
        side: JoinSide,
        records: Vec<Record>,
    ) -> Result<Vec<JoinOutput>, JoinError> {
        let mut all_results = Vec::new();

        for record in records {
            let results = self.process(side, record)?;
            all_results.extend(results);
        }

        Ok(all_results)
    }

    /// Explicitly advance a side's stream time (e.g. from a transport-level
    /// watermark) and sweep, without processing a record.
    ///
    /// Returns any fallback results produced by the sweep.
    pub fn advance_stream_time(&mut self, side: JoinSide, watermark: i64) -> Vec<JoinOutput> {
        self.stream_time.advance(side, watermark);

        let mut outputs = Vec::new();
        self.sweep(side, &mut outputs);

        self.stats.left_store_size = self.left_store.record_count();
        self.stats.right_store_size = self.right_store.record_count();

        outputs
    }

    /// Evict entries from the opposite store that can no longer be reached
    /// by a future record on `side`, emitting fallbacks for never-matched
    /// entries whose side owes one.
    fn sweep(&mut self, side: JoinSide, outputs: &mut Vec<JoinOutput>) {
        let Some(stream_time) = self.stream_time.stream_time(side) else {
            return;
        };
        let cutoff = stream_time.saturating_sub(self.window_ms);

        let opposite = side.opposite();
        let opposite_store = match opposite {
            JoinSide::Left => &mut self.left_store,
            JoinSide::Right => &mut self.right_store,
        };

        for evicted in opposite_store.evict_older_than(cutoff) {
            if !evicted.matched && self.mode.owes_fallback(opposite) {
                let value = match opposite {
                    JoinSide::Left => (self.left_fallback)(&evicted.value),
                    JoinSide::Right => (self.right_fallback)(&evicted.value),
                };
                outputs.push(JoinOutput::new(evicted.key, value));
                self.stats.fallbacks_emitted += 1;
            }
        }
    }

    /// Get the join mode
    pub fn mode(&self) -> JoinMode {
        self.mode
    }

    /// Get the fallback emission policy
    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Get the join window in milliseconds
    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Get statistics
    pub fn stats(&self) -> &JoinStats {
        &self.stats
    }

    /// Get left store reference (for testing/monitoring)
    pub fn left_store(&self) -> &WindowStore {
        &self.left_store
    }

    /// Get right store reference (for testing/monitoring)
    pub fn right_store(&self) -> &WindowStore {
        &self.right_store
    }

    /// Get the stream time tracker
    pub fn stream_time(&self) -> &StreamTimeTracker {
        &self.stream_time
    }

    /// Check if both stores are empty
    pub fn is_empty(&self) -> bool {
        self.left_store.is_empty() && self.right_store.is_empty()
    }

    /// Get total record count across both stores
    pub fn total_records(&self) -> usize {
        self.left_store.record_count() + self.right_store.record_count()
    }
}

impl fmt::Debug for JoinCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinCoordinator")
            .field("mode", &self.mode)
            .field("policy", &self.policy)
            .field("window_ms", &self.window_ms)
            .field("left_store", &self.left_store)
            .field("right_store", &self.right_store)
            .field("stream_time", &self.stream_time)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
