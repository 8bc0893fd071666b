//! Join Configuration
//!
//! Configuration for a windowed stream-stream join: the join window, the
//! join mode, the combiner and fallback functions, the fallback emission
//! policy, and the state store capacity bounds.
//!
//! Combiners and fallbacks are injected as plain function values rather than
//! a trait per join variant, so a single coordinator type serves every
//! configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JoinError;
use crate::join::record::JoinSide;
use crate::join::state_store::StoreConfig;

/// Combines a left value and a right value into one output value
pub type Combiner = Box<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Renders an unmatched value into a fallback output value
pub type Fallback = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Join mode, determining which side owes a fallback for unmatched records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinMode {
    /// Only matching pairs are emitted; unmatched records emit nothing
    #[default]
    Inner,
    /// Unmatched left-side records emit a fallback; right-side do not
    Left,
    /// Unmatched records on either side emit a fallback
    Outer,
}

impl JoinMode {
    /// Whether an unmatched record on `side` owes a fallback result
    pub fn owes_fallback(&self, side: JoinSide) -> bool {
        match self {
            JoinMode::Inner => false,
            JoinMode::Left => side == JoinSide::Left,
            JoinMode::Outer => true,
        }
    }
}

/// When the fallback for an unmatched record is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Emit the fallback immediately when a record finds no partner at
    /// arrival. The record may still match later arrivals, so a key can
    /// produce both a fallback and subsequent combined results. This is the
    /// classic eager stream-stream outer join behavior.
    #[default]
    Eager,
    /// Defer the fallback until the record's window has fully elapsed
    /// without a partner (tracked via eviction). A record then emits either
    /// combined results or exactly one fallback, never both.
    Deferred,
}

/// Configuration for a windowed stream-stream join
pub struct JoinConfig {
    /// Symmetric join window: records match iff their timestamps differ by
    /// at most this duration
    pub window: Duration,
    /// Join mode (inner, left, outer)
    pub mode: JoinMode,
    /// Fallback emission policy
    pub policy: FallbackPolicy,
    /// How two matched values merge
    pub combiner: Combiner,
    /// How an unmatched left value is rendered
    pub left_fallback: Fallback,
    /// How an unmatched right value is rendered
    pub right_fallback: Fallback,
    /// Capacity bounds applied to each side's state store
    pub store: StoreConfig,
}

impl JoinConfig {
    /// Create a configuration with the given join window and defaults:
    /// inner join, eager fallback policy, `left/right` combiner, and
    /// `not-clicked-yet` / `not-shown-yet` style fallbacks.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            mode: JoinMode::default(),
            policy: FallbackPolicy::default(),
            combiner: Box::new(|left, right| format!("{}/{}", left, right)),
            left_fallback: Box::new(|left| format!("{}/not-clicked-yet", left)),
            right_fallback: Box::new(|right| format!("not-shown-yet/{}", right)),
            store: StoreConfig::default(),
        }
    }

    /// Set the join mode
    pub fn with_mode(mut self, mode: JoinMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the fallback emission policy
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the combiner function
    pub fn with_combiner<F>(mut self, combiner: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.combiner = Box::new(combiner);
        self
    }

    /// Set the fallback function for unmatched left values
    pub fn with_left_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.left_fallback = Box::new(fallback);
        self
    }

    /// Set the fallback function for unmatched right values
    pub fn with_right_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.right_fallback = Box::new(fallback);
        self
    }

    /// Set the state store capacity configuration
    pub fn with_store_config(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Validate the configuration, returning the join window in milliseconds
    ///
    /// # Errors
    /// Returns [`JoinError::InvalidConfiguration`] if the window is zero or
    /// does not fit in `i64` milliseconds.
    pub fn validated_window_ms(&self) -> Result<i64, JoinError> {
        if self.window.is_zero() {
            return Err(JoinError::invalid_configuration(
                "join window must be non-zero",
            ));
        }
        i64::try_from(self.window.as_millis()).map_err(|_| {
            JoinError::invalid_configuration(format!(
                "join window {} ms exceeds i64::MAX",
                self.window.as_millis()
            ))
        })
    }
}

impl fmt::Debug for JoinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinConfig")
            .field("window", &self.window)
            .field("mode", &self.mode)
            .field("policy", &self.policy)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
