//! Error handling integration tests
//!
//! Covers the failure surfaces callers see:
//! - configuration errors before any work
//! - request validation
//! - transport failures inside analyst results
//! - synthesis failures aborting the run
//! - document problems folded into the context text
//! - persistence failures

use resolutes::analysis::{AnalysisRequest, AnalyzerStatus, ValidationError};
use resolutes::config::{ConfigError, ResolutesConfig};
use resolutes::ingest::{ingest_documents, IngestError, UploadedDocument};
use resolutes::llm::{BackendError, MockLLMClient, MockResponse};
use resolutes::pipeline::{AnalysisPipeline, PipelineConfig, PipelineError};
use resolutes::store::{FileStore, PersistenceError, ReportStore};
use resolutes::SynthesisError;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

const BASE: [(&str, &str); 2] = [
    ("GOOGLE_CLOUD_PROJECT", "resolutes-test"),
    ("GOOGLE_CLOUD_LOCATION", "us-central1"),
];

#[test]
fn test_missing_project_is_missing_env() {
    let result = ResolutesConfig::from_lookup(lookup(&[("GOOGLE_CLOUD_LOCATION", "us")]));
    match result {
        Err(ConfigError::MissingEnv(name)) => assert_eq!(name, "GOOGLE_CLOUD_PROJECT"),
        other => panic!("Expected MissingEnv, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_blank_location_counts_as_missing() {
    let result = ResolutesConfig::from_lookup(lookup(&[
        ("GOOGLE_CLOUD_PROJECT", "p"),
        ("GOOGLE_CLOUD_LOCATION", "   "),
    ]));
    assert!(
        matches!(result, Err(ConfigError::MissingEnv(name)) if name == "GOOGLE_CLOUD_LOCATION")
    );
}

#[test]
fn test_unparseable_timeout_rejected() {
    let mut vars = BASE.to_vec();
    vars.push(("RESOLUTES_ANALYZER_TIMEOUT", "soon"));
    let result = ResolutesConfig::from_lookup(lookup(&vars));
    assert!(matches!(
        result,
        Err(ConfigError::ParseError { field, .. }) if field == "RESOLUTES_ANALYZER_TIMEOUT"
    ));
}

#[test]
fn test_zero_timeout_fails_validation() {
    let mut vars = BASE.to_vec();
    vars.push(("RESOLUTES_PIPELINE_TIMEOUT", "0"));
    let config = ResolutesConfig::from_lookup(lookup(&vars)).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));
}

#[tokio::test]
async fn test_invalid_subject_never_reaches_the_model() {
    let llm = Arc::new(MockLLMClient::new());
    let pipeline = AnalysisPipeline::new(llm.clone(), PipelineConfig::default());

    let too_long = "x".repeat(201);
    let result = pipeline.run(AnalysisRequest::subject_only(too_long)).await;

    assert!(matches!(
        result,
        Err(PipelineError::Validation(ValidationError::SubjectTooLong { .. }))
    ));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_auth_failure_is_recorded_per_analyst() {
    let llm = Arc::new(MockLLMClient::new());
    llm.on_prompt_containing(
        "investment committee",
        MockResponse::json(json!({"investment_summary": {}, "executive_summary": {}})),
    );
    llm.on_prompt_containing(
        "Analysis domain:",
        MockResponse::error(BackendError::AuthenticationError {
            message: "API key not valid".to_string(),
        }),
    );

    let run = AnalysisPipeline::new(llm.clone(), PipelineConfig::default())
        .run_detailed(AnalysisRequest::subject_only("Acme Robotics"))
        .await
        .unwrap();

    for result in run.results.values() {
        assert_eq!(result.status, AnalyzerStatus::Failed);
        assert_eq!(result.attempts, 1);
        assert!(result.error.as_deref().unwrap().contains("API key not valid"));
    }
    // Transport errors are not retried: six analyst calls plus one synthesis
    assert_eq!(llm.requests().len(), 7);
    assert_eq!(run.report.analysis_metadata.confidence_level, "Low");
}

#[tokio::test]
async fn test_synthesis_transport_error_aborts_run() {
    let llm = Arc::new(MockLLMClient::new());
    llm.on_prompt_containing(
        "investment committee",
        MockResponse::error(BackendError::NetworkError {
            message: "connection reset".to_string(),
        }),
    );
    llm.on_prompt_containing("Analysis domain:", MockResponse::text("{\"score\": 50}"));

    let result = AnalysisPipeline::new(llm, PipelineConfig::default())
        .run(AnalysisRequest::subject_only("Acme Robotics"))
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Synthesis(SynthesisError::Backend(_)))
    ));
}

#[tokio::test]
async fn test_document_problems_do_not_fail_ingestion() {
    let docs = vec![
        UploadedDocument::new("deck.pdf", b"%PDF-1.7".to_vec()),
        UploadedDocument::new("memo.docx", b"PK\x03\x04broken".to_vec()),
        UploadedDocument::new("notes", b"hello".to_vec()),
    ];

    let text = ingest_documents(&docs, None).await.unwrap();
    let parts: Vec<&str> = text.split("\n\n").collect();

    assert!(parts[0].starts_with("Error processing PDF file: "));
    assert_eq!(parts[2], "Unsupported file type: unknown");
    assert!(text.ends_with("\n\n"));
}

#[tokio::test]
async fn test_six_documents_rejected() {
    let docs: Vec<UploadedDocument> = (0..6)
        .map(|i| UploadedDocument::new(format!("{}.pdf", i), b"%PDF".to_vec()))
        .collect();

    let result = ingest_documents(&docs, None).await;
    assert!(matches!(result, Err(IngestError::TooManyDocuments { count: 6, max: 5 })));
}

#[tokio::test]
async fn test_store_rejects_unusable_names() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    let result = store.load_pipeline_report("///").await;
    assert!(matches!(result, Err(PersistenceError::InvalidName(_))));
}
