//! Subcommand handlers
//!
//! Each handler returns a process exit code. Errors are reported on stderr;
//! a failed save is printed as a warning and never turns a produced report
//! into a failure.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::commands::{AnalyzeArgs, RenderArgs, ShowArgs};
use super::output::OutputFormatter;
use crate::analysis::{AnalysisRequest, FinalReport, StartupProfiler};
use crate::config::ResolutesConfig;
use crate::ingest::{DocumentIngestor, UploadedDocument, VisionOcr, MAX_DOCUMENTS};
use crate::llm::LLMClient;
use crate::pipeline::AnalysisPipeline;
use crate::progress::LoggingHandler;
use crate::report::{self, RenderedReport, ReportInput};
use crate::search::DuckDuckGoSearch;
use crate::store::{FileStore, PersistenceError, ReportStore, SaveOutcome};

const SEARCH_MAX_RESULTS: usize = 5;

pub async fn handle_analyze(args: &AnalyzeArgs, config: ResolutesConfig) -> i32 {
    exit_code(run_analyze(args, config).await)
}

pub async fn handle_render(args: &RenderArgs, config: &ResolutesConfig) -> i32 {
    exit_code(run_render(args, config).await)
}

pub async fn handle_show(args: &ShowArgs, config: &ResolutesConfig) -> i32 {
    exit_code(run_show(args, config).await)
}

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn apply_overrides(args: &AnalyzeArgs, mut config: ResolutesConfig) -> Result<ResolutesConfig> {
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(timeout) = args.timeout {
        config.pipeline_timeout_secs = timeout;
    }
    if args.no_search {
        config.search_enabled = false;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn resolve_subject(subject: Option<&str>) -> Result<String> {
    if let Some(subject) = subject {
        return Ok(subject.to_string());
    }
    if !atty::is(atty::Stream::Stdin) {
        bail!("A startup name is required when stdin is not a terminal");
    }
    let name: String = dialoguer::Input::new()
        .with_prompt("Startup name")
        .interact_text()
        .context("Failed to read startup name")?;
    Ok(name)
}

async fn load_documents(paths: &[PathBuf]) -> Result<Vec<UploadedDocument>> {
    if paths.len() > MAX_DOCUMENTS {
        bail!(
            "Too many documents: {} supplied, at most {} allowed",
            paths.len(),
            MAX_DOCUMENTS
        );
    }
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        documents.push(UploadedDocument::from_path(path).await?);
    }
    Ok(documents)
}

fn build_ingestor(config: &ResolutesConfig) -> Result<DocumentIngestor> {
    let mut ingestor = DocumentIngestor::new();
    match &config.vision_auth {
        Some(auth) => {
            let ocr = VisionOcr::new(
                config.project_id.clone(),
                config.location.clone(),
                auth.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )
            .context("Failed to create OCR client")?;
            ingestor = ingestor.with_pdf_extractor(Arc::new(ocr));
        }
        None => debug!("No OCR credentials, PDFs will be reported as unreadable"),
    }
    Ok(ingestor)
}

async fn run_analyze(args: &AnalyzeArgs, config: ResolutesConfig) -> Result<()> {
    let config = apply_overrides(args, config)?;
    debug!("{}", config);

    let subject = resolve_subject(args.subject.as_deref())?;
    let request = AnalysisRequest::new(subject, "");
    request.validate()?;

    let documents = load_documents(&args.docs).await?;
    let context_text = if documents.is_empty() {
        String::new()
    } else {
        build_ingestor(&config)?.ingest(&documents).await?
    };
    let request = AnalysisRequest::new(request.subject_name, context_text);

    let llm: Arc<dyn LLMClient> = config.create_client().await?;
    let mut pipeline = AnalysisPipeline::new(llm.clone(), config.pipeline_config())
        .with_progress(Arc::new(LoggingHandler));
    if let Some(synthesis) = config.create_synthesis_client().await? {
        pipeline = pipeline.with_synthesis_client(synthesis);
    }
    if config.search_enabled {
        let search = DuckDuckGoSearch::new(
            Duration::from_secs(config.request_timeout_secs),
            SEARCH_MAX_RESULTS,
        )?;
        pipeline = pipeline.with_search(Arc::new(search));
    }

    let subject = request.subject_name.clone();
    let context_text = request.context_text.clone();
    let run = tokio::time::timeout(config.pipeline_timeout(), pipeline.run_detailed(request))
        .await
        .map_err(|_| {
            anyhow!(
                "Analysis did not finish within {}s",
                config.pipeline_timeout_secs
            )
        })??;

    if !args.no_save {
        let profile = if documents.is_empty() {
            None
        } else {
            profile_documents(llm, &config, &subject, &context_text).await
        };
        let store = FileStore::new(&config.store_dir);
        persist(&store, &subject, &context_text, profile.as_ref(), &run.report).await;
    }

    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_run(&run)?, args.output.as_deref()).await?;

    if let Some(ref path) = args.pdf {
        write_rendered(&run.report, &subject, path, config.font_dir.as_deref()).await?;
    }
    Ok(())
}

async fn profile_documents(
    llm: Arc<dyn LLMClient>,
    config: &ResolutesConfig,
    subject: &str,
    extracted_text: &str,
) -> Option<Value> {
    let profiler = StartupProfiler::new(llm)
        .with_max_tokens(Some(config.max_tokens))
        .with_max_context_chars(config.max_context_size);
    match profiler.profile(subject, extracted_text).await {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(error = %e, "No startup profile, startup record skipped");
            eprintln!("Warning: {}", e);
            None
        }
    }
}

/// Saves the startup record when there is a profile, then upserts the report.
///
/// Failures are logged and printed to stderr, never returned as errors; the
/// returned messages are the ones that were printed.
pub async fn persist(
    store: &dyn ReportStore,
    subject: &str,
    extracted_text: &str,
    profile: Option<&Value>,
    report: &FinalReport,
) -> Vec<String> {
    let mut failures = Vec::new();

    if let Some(profile) = profile {
        match store.save_startup(subject, extracted_text, profile).await {
            Ok(id) => info!(id = %id, store = store.name(), "Startup record saved"),
            Err(e) => failures.push(save_failed("startup record", &e)),
        }
    }

    match store.save_pipeline_report(subject, report).await {
        Ok(SaveOutcome::Inserted(id)) => info!(id = %id, "Report saved"),
        Ok(SaveOutcome::Updated) => info!(subject, "Existing report updated"),
        Err(e) => failures.push(save_failed("report", &e)),
    }

    failures
}

fn save_failed(what: &str, error: &PersistenceError) -> String {
    warn!(error = %error, "Failed to save {}", what);
    let message = format!("failed to save {}: {}", what, error);
    eprintln!("Warning: {}", message);
    message
}

async fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Output written");
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Writes the rendering, swapping the extension when only text was possible
async fn write_rendered(
    report: &FinalReport,
    subject: &str,
    path: &Path,
    font_dir: Option<&Path>,
) -> Result<PathBuf> {
    let rendered = report::render(&ReportInput::from(report), subject, font_dir);
    save_rendered(&rendered, path).await
}

async fn save_rendered(rendered: &RenderedReport, path: &Path) -> Result<PathBuf> {
    let target = if rendered.is_pdf() {
        path.to_path_buf()
    } else {
        path.with_extension(rendered.extension())
    };
    tokio::fs::write(&target, rendered.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;
    eprintln!("Report written to {}", target.display());
    Ok(target)
}

async fn run_render(args: &RenderArgs, config: &ResolutesConfig) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let input = ReportInput::Raw(raw);
    let subject = args.subject.clone().unwrap_or_default();

    let rendered = if args.text {
        RenderedReport::Text(report::render_text(&input, &subject))
    } else {
        report::render(&input, &subject, config.font_dir.as_deref())
    };
    save_rendered(&rendered, &args.output).await?;
    Ok(())
}

async fn run_show(args: &ShowArgs, config: &ResolutesConfig) -> Result<()> {
    let store = FileStore::new(&config.store_dir);
    let stored = store
        .load_pipeline_report(&args.subject)
        .await?
        .ok_or_else(|| {
            anyhow!(
                "No stored report for {:?} in {}",
                args.subject,
                store.root().display()
            )
        })?;

    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_stored(&stored)?, None).await?;

    if let Some(ref path) = args.pdf {
        write_rendered(
            &stored.report,
            &stored.startup_name,
            path,
            config.font_dir.as_deref(),
        )
        .await?;
    }
    Ok(())
}
