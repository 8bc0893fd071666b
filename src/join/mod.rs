//! Windowed Stream-Stream Join
//!
//! The join engine correlates two keyed event streams within a bounded time
//! window. [`JoinCoordinator`] owns one [`WindowStore`] per side plus the
//! per-side stream-time watermarks; every incoming record probes the
//! opposite side's store, emits combined results for matches, and drives
//! eviction of state whose window has fully elapsed.
//!
//! Ownership is one-directional: the coordinator owns both stores and the
//! watermark pair; store entries never reference each other across sides.

pub mod config;
pub mod coordinator;
pub mod emitter;
pub mod record;
pub mod state_store;
pub mod watermark;

pub use config::{Combiner, Fallback, FallbackPolicy, JoinConfig, JoinMode};
pub use coordinator::{JoinCoordinator, JoinStats};
pub use emitter::{CollectingSink, OutputEmitter, OutputSink};
pub use record::{JoinOutput, JoinSide, Record};
pub use state_store::{StoreConfig, StoreStats, WindowEntry, WindowStore};
pub use watermark::{StreamTimeStats, StreamTimeTracker};
