//! Progress handler trait and events

use crate::analysis::AnalyzerStatus;
use crate::pipeline::PipelineState;
use std::time::Duration;

/// Events emitted while a pipeline run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run accepted for a subject
    Started { subject: String },

    /// Pipeline moved between states
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },

    /// An analyzer was dispatched
    AnalyzerStarted { analyzer_id: String },

    /// An analyzer reached a terminal status
    AnalyzerFinished {
        analyzer_id: String,
        status: AnalyzerStatus,
        attempts: u32,
        duration: Duration,
    },

    /// All analyzers joined
    ResearchComplete {
        succeeded: usize,
        total: usize,
        duration: Duration,
    },

    /// Synthesis call issued
    SynthesisStarted,

    /// Run finished with a report
    Completed { total_time: Duration },

    /// Run aborted
    Failed { error: String },
}

/// Trait for handling progress events during a pipeline run
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
