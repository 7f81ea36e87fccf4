//! Domain analyzers, the concurrent research stage, report synthesis and
//! the single-call document profile

pub mod analyzer;
pub mod catalog;
pub mod profile;
pub mod report;
pub mod request;
pub mod research;
pub mod response;
pub mod schema;
pub mod synthesizer;

pub use analyzer::{Analyzer, AnalyzerOptions, AnalyzerResult, AnalyzerStatus};
pub use catalog::{AnalyzerSpec, ANALYZER_IDS};
pub use profile::{ProfileError, StartupProfiler};
pub use report::{DomainSection, FinalReport, ReportMetadata};
pub use request::{AnalysisRequest, ValidationError};
pub use research::ResearchStage;
pub use response::{extract_json_from_markdown, ParseFailure};
pub use schema::{FieldKind, OutputSchema, SchemaField};
pub use synthesizer::{SynthesisError, Synthesizer};
