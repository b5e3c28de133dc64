//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while the pipeline runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Pipeline started for a project root
    Started { root: String },

    /// A stage started
    PhaseStarted { phase: String },

    /// An input file was converted or indexed
    FileProcessed { path: String, records: usize },

    /// An input file was left out
    FileSkipped { path: String, reason: String },

    /// A batch of chunks was embedded
    EmbeddingBatch { done: usize, total: usize },

    /// A stage finished
    PhaseComplete { phase: String, duration: Duration },

    /// All stages finished
    Completed { phases: usize, total_time: Duration },

    /// The run aborted
    Failed { phase: String, error: String },
}

/// Trait for handling progress events
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
