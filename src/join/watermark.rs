//! Stream Time Tracking
//!
//! Tracks per-stream watermarks for a stream-stream join. Each side's stream
//! time is the maximum event timestamp observed so far on that side; it never
//! retreats. Eviction of one side's state is driven by the *opposite* side's
//! stream time, since a buffered entry is only ever probed by records
//! arriving on the other stream.

use serde::Serialize;

use crate::join::record::JoinSide;

/// Tracks stream time (per-side watermarks) for both sides of a join
///
/// A record is "late" when its own side's stream time has already advanced
/// past `timestamp + window` on arrival: the record is still accepted and
/// buffered, but it is immediately eligible for eviction and can no longer
/// join. Late records are counted, not rejected.
#[derive(Debug, Default)]
pub struct StreamTimeTracker {
    /// Maximum timestamp observed on the left stream
    left_stream_time: Option<i64>,

    /// Maximum timestamp observed on the right stream
    right_stream_time: Option<i64>,

    /// Late records observed per side
    late_records_left: u64,
    late_records_right: u64,
}

impl StreamTimeTracker {
    /// Create a new tracker with no time observed on either side
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance a side's stream time to `timestamp` if it is the largest seen
    /// so far; never retreats. Returns the side's stream time afterwards.
    pub fn advance(&mut self, side: JoinSide, timestamp: i64) -> i64 {
        let stream_time = match side {
            JoinSide::Left => &mut self.left_stream_time,
            JoinSide::Right => &mut self.right_stream_time,
        };
        let current = stream_time.get_or_insert(timestamp);
        if timestamp > *current {
            *current = timestamp;
        }
        *current
    }

    /// Observe a record's timestamp on a side, advancing that side's stream
    /// time if the timestamp is the largest seen so far.
    ///
    /// Returns `false` if the record is late relative to `window_ms` (its
    /// side's stream time already exceeds `timestamp + window_ms`).
    pub fn observe(&mut self, side: JoinSide, timestamp: i64, window_ms: i64) -> bool {
        let stream_time = self.advance(side, timestamp);
        let on_time = stream_time.saturating_sub(timestamp) <= window_ms;
        if !on_time {
            match side {
                JoinSide::Left => self.late_records_left += 1,
                JoinSide::Right => self.late_records_right += 1,
            }
        }
        on_time
    }

    /// Get the stream time for a side, or `None` if no record has arrived yet
    pub fn stream_time(&self, side: JoinSide) -> Option<i64> {
        match side {
            JoinSide::Left => self.left_stream_time,
            JoinSide::Right => self.right_stream_time,
        }
    }

    /// Get the combined (minimum) stream time across both sides
    ///
    /// `None` until both sides have seen at least one record.
    pub fn combined_stream_time(&self) -> Option<i64> {
        match (self.left_stream_time, self.right_stream_time) {
            (Some(l), Some(r)) => Some(l.min(r)),
            _ => None,
        }
    }

    /// Get count of late records for a side
    pub fn late_record_count(&self, side: JoinSide) -> u64 {
        match side {
            JoinSide::Left => self.late_records_left,
            JoinSide::Right => self.late_records_right,
        }
    }

    /// Get total late record count
    pub fn total_late_records(&self) -> u64 {
        self.late_records_left + self.late_records_right
    }

    /// Get statistics
    pub fn stats(&self) -> StreamTimeStats {
        StreamTimeStats {
            left_stream_time: self.left_stream_time,
            right_stream_time: self.right_stream_time,
            late_records_left: self.late_records_left,
            late_records_right: self.late_records_right,
        }
    }
}

/// Statistics for stream time tracking
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamTimeStats {
    pub left_stream_time: Option<i64>,
    pub right_stream_time: Option<i64>,
    pub late_records_left: u64,
    pub late_records_right: u64,
}
