//! Join engine error types
//!
//! All fallible operations in the engine surface one of the variants below.
//! Late records are deliberately *not* an error: a record whose stream time
//! has already advanced past its window on arrival is accepted, counted in
//! the stats, and silently unable to join.

use crate::join::JoinSide;

/// Main error type for the stream-stream join engine
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    /// A state store insert was rejected because a configured memory bound
    /// was hit. The caller decides whether to drop, block, or reconfigure.
    #[error("{side} store capacity exceeded: limit {limit} records")]
    CapacityExceeded {
        /// Side of the join whose store hit the bound
        side: JoinSide,
        /// The configured record limit that was breached
        limit: usize,
    },

    /// The join configuration is invalid (detected at construction)
    #[error("invalid join configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A record was rejected at ingestion (e.g. empty join key)
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
}

impl JoinError {
    /// Create an `InvalidConfiguration` error
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an `InvalidRecord` error
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }
}
