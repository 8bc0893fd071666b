//! Output Emission
//!
//! Hands joined results to an external sink collaborator in generation
//! order. The engine itself never buffers beyond the immediate hand-off:
//! within one processing step results arrive in match order, and across
//! steps in input-arrival order.

use crate::join::record::JoinOutput;

/// Core trait for join output sinks
///
/// Implementations can forward to a topic, a queue, or a test collector.
/// The engine is single-threaded per partition, so sinks are not required
/// to be thread-safe.
pub trait OutputSink {
    /// Accept one output record
    fn emit(&mut self, output: JoinOutput);
}

/// Sequences join results into a sink in emission order
#[derive(Debug)]
pub struct OutputEmitter<S: OutputSink> {
    sink: S,
    emitted: u64,
}

impl<S: OutputSink> OutputEmitter<S> {
    /// Create an emitter wrapping the given sink
    pub fn new(sink: S) -> Self {
        Self { sink, emitted: 0 }
    }

    /// Forward a batch of results to the sink, preserving order
    pub fn forward(&mut self, results: Vec<JoinOutput>) {
        for output in results {
            self.sink.emit(output);
            self.emitted += 1;
        }
    }

    /// Total outputs handed to the sink so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Get a reference to the underlying sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the emitter, returning the underlying sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// In-memory sink collecting outputs in arrival order (for tests and
/// embedding)
#[derive(Debug, Default)]
pub struct CollectingSink {
    outputs: Vec<JoinOutput>,
}

impl CollectingSink {
    /// Create an empty collecting sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All outputs received so far, in arrival order
    pub fn outputs(&self) -> &[JoinOutput] {
        &self.outputs
    }

    /// Consume the sink, returning the collected outputs
    pub fn into_outputs(self) -> Vec<JoinOutput> {
        self.outputs
    }

    /// Number of outputs received
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether no output has been received yet
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl OutputSink for CollectingSink {
    fn emit(&mut self, output: JoinOutput) {
        self.outputs.push(output);
    }
}
