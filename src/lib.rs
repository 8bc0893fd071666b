//! # stream-join
//!
//! A windowed stream-to-stream join engine. Correlates events arriving
//! independently on two unbounded, keyed event streams and emits a combined
//! result whenever a matching pair is observed within a bounded time window.
//! Outer and left join modes additionally emit a fallback result for records
//! that never find a partner.
//!
//! ## Features
//!
//! - **Time-Indexed State Stores**: per-side key + time indexed buffers with
//!   O(log n) range lookups and bulk low-timestamp eviction
//! - **Stream-Time Eviction**: state retirement driven purely by observed
//!   record timestamps, never by wall-clock timers
//! - **Configurable Join Modes**: inner, left, and outer joins with injected
//!   combiner and fallback functions
//! - **Eager or Deferred Fallbacks**: unmatched results emitted either
//!   immediately on arrival or once the record's window has closed
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use stream_join::{
//!     CollectingSink, JoinConfig, JoinCoordinator, JoinMode, JoinSide, OutputEmitter, Record,
//! };
//!
//! let config = JoinConfig::new(Duration::from_secs(5)).with_mode(JoinMode::Outer);
//! let mut coordinator = JoinCoordinator::new(config).unwrap();
//! let mut emitter = OutputEmitter::new(CollectingSink::new());
//!
//! let results = coordinator
//!     .process(JoinSide::Left, Record::new("ad-1", "shown", 1_000))
//!     .unwrap();
//! emitter.forward(results);
//!
//! let results = coordinator
//!     .process(JoinSide::Right, Record::new("ad-1", "clicked", 2_000))
//!     .unwrap();
//! emitter.forward(results);
//!
//! assert_eq!(emitter.sink().outputs()[1].value, "shown/clicked");
//! ```

pub mod error;
pub mod join;

// Re-export main API
pub use error::JoinError;
pub use join::{
    CollectingSink, FallbackPolicy, JoinConfig, JoinCoordinator, JoinMode, JoinOutput, JoinSide,
    JoinStats, OutputEmitter, OutputSink, Record, StoreConfig, StoreStats, WindowEntry,
    WindowStore,
};

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "windowed_state_store",
    "stream_time_eviction",
    "inner_join",
    "left_join",
    "outer_join",
    "eager_fallback",
    "deferred_fallback",
];
