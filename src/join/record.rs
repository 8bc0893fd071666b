//! Core record types for the join engine
//!
//! The engine assumes records are already decoded by the transport layer:
//! inputs are `(key, value, timestamp)` triples tagged with the side of the
//! join they arrived on, and outputs are `(key, value)` pairs handed to an
//! [`OutputSink`](crate::join::OutputSink) in emission order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the join a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinSide {
    /// Left side (e.g. the impressions stream)
    Left,
    /// Right side (e.g. the clicks stream)
    Right,
}

impl JoinSide {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            JoinSide::Left => JoinSide::Right,
            JoinSide::Right => JoinSide::Left,
        }
    }
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Left => write!(f, "left"),
            JoinSide::Right => write!(f, "right"),
        }
    }
}

/// A single decoded input record from one of the two streams
///
/// Immutable once created. Timestamps are event times in milliseconds, as
/// assigned by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Join key
    pub key: String,
    /// Record payload
    pub value: String,
    /// Event time in milliseconds
    pub timestamp: i64,
}

impl Record {
    /// Create a new record
    pub fn new(key: impl Into<String>, value: impl Into<String>, timestamp: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }
}

/// A combined result produced by the join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutput {
    /// Join key the result was produced for
    pub key: String,
    /// Combined value (combiner output, or a fallback rendering)
    pub value: String,
}

impl JoinOutput {
    /// Create a new join output
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
