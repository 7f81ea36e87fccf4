pub mod analysis;
pub mod config;
pub mod state;

pub use analysis::{AnalysisPipeline, PipelineError, PipelineRun, PIPELINE_AGENT_ID};
pub use config::PipelineConfig;
pub use state::PipelineState;
