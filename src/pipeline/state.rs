use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    RunningResearch,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, RunningResearch)
                | (RunningResearch, Synthesizing)
                | (RunningResearch, Failed)
                | (Synthesizing, Done)
                | (Synthesizing, Failed)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::RunningResearch => "running_research",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
