//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use crate::analysis::AnalyzerStatus;
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { subject } => {
                info!(subject = %subject, "Starting analysis");
            }
            ProgressEvent::StateChanged { from, to } => {
                debug!(from = %from, to = %to, "Pipeline state changed");
            }
            ProgressEvent::AnalyzerStarted { analyzer_id } => {
                debug!(analyzer = %analyzer_id, "Analyzer dispatched");
            }
            ProgressEvent::AnalyzerFinished {
                analyzer_id,
                status,
                attempts,
                duration,
            } => {
                if *status == AnalyzerStatus::Success {
                    info!(
                        analyzer = %analyzer_id,
                        attempts,
                        duration_ms = duration.as_millis(),
                        "Analyzer complete"
                    );
                } else {
                    warn!(
                        analyzer = %analyzer_id,
                        status = %status,
                        attempts,
                        duration_ms = duration.as_millis(),
                        "Analyzer did not succeed"
                    );
                }
            }
            ProgressEvent::ResearchComplete {
                succeeded,
                total,
                duration,
            } => {
                info!(
                    succeeded,
                    total,
                    duration_ms = duration.as_millis(),
                    "Research stage complete"
                );
            }
            ProgressEvent::SynthesisStarted => {
                info!("Synthesizing report");
            }
            ProgressEvent::Completed { total_time } => {
                info!(total_time_ms = total_time.as_millis(), "Analysis complete");
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Analysis failed");
            }
        }
    }
}
