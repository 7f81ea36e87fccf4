//! resolutes - multi-agent startup investment analysis
//!
//! Six domain analysts (team, market, product, traction, finance,
//! competition) examine a startup concurrently; a synthesizer merges their
//! structured output into one investment report.
//!
//! # Core Concepts
//!
//! - **Analyzer**: one generic LLM-backed analyst parameterized by an
//!   [`AnalyzerSpec`] (instructions, output schema, search queries)
//! - **Research stage**: bounded fan-out over every analyzer with a single join;
//!   a failing analyst becomes a status, never an aborted run
//! - **Synthesis**: merges the domain sections verbatim and adds the
//!   investment and executive summaries
//! - **Ingestion, rendering and storage**: documents in, PDF or text out,
//!   JSON records on disk
//! - **Startup profile**: one structured extraction over uploaded documents,
//!   stored as the startup record
//!
//! # Example Usage
//!
//! ```no_run
//! use resolutes::{AnalysisPipeline, AnalysisRequest, PipelineConfig, ResolutesConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ResolutesConfig::from_env()?;
//! let llm = config.create_client().await?;
//! let pipeline = AnalysisPipeline::new(llm, PipelineConfig::default());
//!
//! let report = pipeline
//!     .run(AnalysisRequest::new("Acme Robotics", "Seed-stage warehouse robotics"))
//!     .await?;
//! println!("{}", report.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod search;
pub mod store;
pub mod util;

pub use analysis::{
    AnalysisRequest, AnalyzerResult, AnalyzerSpec, AnalyzerStatus, FinalReport, ProfileError,
    StartupProfiler, SynthesisError, ValidationError,
};
pub use config::{ConfigError, ResolutesConfig};
pub use ingest::{ingest_documents, IngestError, UploadedDocument};
pub use llm::{BackendError, GenAIClient, LLMClient, MockLLMClient};
pub use pipeline::{AnalysisPipeline, PipelineConfig, PipelineError, PipelineRun};
pub use report::{render, RenderedReport, ReportInput};
pub use store::{FileStore, MemoryStore, PersistenceError, ReportStore, SaveOutcome};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
