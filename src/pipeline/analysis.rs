use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::analysis::{
    AnalysisRequest, AnalyzerResult, AnalyzerSpec, FinalReport, ResearchStage, SynthesisError,
    Synthesizer, ValidationError,
};
use crate::llm::LLMClient;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::search::SearchProvider;

use super::config::PipelineConfig;
use super::state::PipelineState;

/// Agent identifier recorded in every report
pub const PIPELINE_AGENT_ID: &str = "business_analysis_agent";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub report: FinalReport,
    pub results: BTreeMap<String, AnalyzerResult>,
    pub states: Vec<PipelineState>,
    pub duration: Duration,
}

impl PipelineRun {
    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }
}

struct StateTracker<'a> {
    current: PipelineState,
    history: Vec<PipelineState>,
    progress: &'a dyn ProgressHandler,
}

impl<'a> StateTracker<'a> {
    fn new(progress: &'a dyn ProgressHandler) -> Self {
        Self {
            current: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            progress,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        self.progress.on_progress(&ProgressEvent::StateChanged {
            from: self.current,
            to: next,
        });
        self.current = next;
        self.history.push(next);
    }
}

/// Research stage followed by synthesis, single-shot per call
pub struct AnalysisPipeline {
    llm: Arc<dyn LLMClient>,
    synthesis_llm: Option<Arc<dyn LLMClient>>,
    search: Option<Arc<dyn SearchProvider>>,
    specs: Vec<AnalyzerSpec>,
    config: PipelineConfig,
    progress: Arc<dyn ProgressHandler>,
}

impl AnalysisPipeline {
    pub fn new(llm: Arc<dyn LLMClient>, config: PipelineConfig) -> Self {
        Self {
            llm,
            synthesis_llm: None,
            search: None,
            specs: AnalyzerSpec::defaults(),
            config,
            progress: Arc::new(NoOpHandler),
        }
    }

    /// Uses a separate client for the synthesis call
    pub fn with_synthesis_client(mut self, llm: Arc<dyn LLMClient>) -> Self {
        self.synthesis_llm = Some(llm);
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_specs(mut self, specs: Vec<AnalyzerSpec>) -> Self {
        self.specs = specs;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn specs(&self) -> &[AnalyzerSpec] {
        &self.specs
    }

    pub async fn run(&self, request: AnalysisRequest) -> Result<FinalReport, PipelineError> {
        Ok(self.run_detailed(request).await?.report)
    }

    pub async fn run_detailed(
        &self,
        request: AnalysisRequest,
    ) -> Result<PipelineRun, PipelineError> {
        request.validate()?;

        let start = Instant::now();
        let progress = self.progress.as_ref();
        let mut state = StateTracker::new(progress);

        progress.on_progress(&ProgressEvent::Started {
            subject: request.subject_name.clone(),
        });
        info!(
            subject = %request.subject_name,
            analyzers = self.specs.len(),
            context_chars = request.context_text.len(),
            "Starting analysis pipeline"
        );

        state.advance(PipelineState::RunningResearch);
        let request = Arc::new(request);
        let stage = ResearchStage::new(self.llm.clone(), self.config.analyzer.clone())
            .with_search(self.search.clone())
            .with_max_concurrency(self.config.max_concurrency)
            .with_analyzer_timeout(self.config.analyzer_timeout)
            .with_progress(self.progress.clone());
        let results = stage.run_all(request.clone(), &self.specs).await;

        state.advance(PipelineState::Synthesizing);
        progress.on_progress(&ProgressEvent::SynthesisStarted);

        let order: Vec<String> = self.specs.iter().map(|s| s.id.clone()).collect();
        let synthesis_llm = self.synthesis_llm.clone().unwrap_or_else(|| self.llm.clone());
        let synthesizer = Synthesizer::new(synthesis_llm, PIPELINE_AGENT_ID)
            .with_max_tokens(self.config.synthesis_max_tokens)
            .with_max_context_chars(self.config.analyzer.max_context_chars);

        let report = match synthesizer.synthesize(&request, &order, &results).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Synthesis failed");
                state.advance(PipelineState::Failed);
                progress.on_progress(&ProgressEvent::Failed {
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        state.advance(PipelineState::Done);
        progress.on_progress(&ProgressEvent::Completed {
            total_time: start.elapsed(),
        });

        Ok(PipelineRun {
            report,
            results,
            states: state.history,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLLMClient, MockResponse};
    use crate::progress::LoggingHandler;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<ProgressEvent>>);

    impl ProgressHandler for Recorder {
        fn on_progress(&self, event: &ProgressEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn scripted() -> Arc<MockLLMClient> {
        let llm = Arc::new(MockLLMClient::new());
        llm.on_prompt_containing(
            "investment committee",
            MockResponse::json(json!({
                "investment_summary": {"overall_score": 5.5},
                "executive_summary": {},
                "confidence_level": "Medium"
            })),
        );
        llm.on_prompt_containing("Analysis domain:", MockResponse::text("{\"score\": 50}"));
        llm
    }

    #[tokio::test]
    async fn test_empty_subject_rejected_before_any_call() {
        let llm = scripted();
        let pipeline = AnalysisPipeline::new(llm.clone(), PipelineConfig::default());

        let result = pipeline.run(AnalysisRequest::subject_only("  ")).await;

        assert!(matches!(result, Err(PipelineError::Validation(_))));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_state_history() {
        let pipeline = AnalysisPipeline::new(scripted(), PipelineConfig::default())
            .with_progress(Arc::new(LoggingHandler));

        let run = pipeline
            .run_detailed(AnalysisRequest::subject_only("Acme"))
            .await
            .unwrap();

        assert_eq!(
            run.states,
            vec![
                PipelineState::Idle,
                PipelineState::RunningResearch,
                PipelineState::Synthesizing,
                PipelineState::Done
            ]
        );
        assert_eq!(run.succeeded(), 6);
    }

    #[tokio::test]
    async fn test_synthesis_failure_emits_failed_state() {
        let llm = Arc::new(MockLLMClient::new());
        llm.on_prompt_containing("investment committee", MockResponse::text("no json here"));
        llm.on_prompt_containing("Analysis domain:", MockResponse::text("{\"score\": 50}"));
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));

        let result = AnalysisPipeline::new(llm, PipelineConfig::default())
            .with_progress(recorder.clone())
            .run(AnalysisRequest::subject_only("Acme"))
            .await;

        assert!(matches!(result, Err(PipelineError::Synthesis(_))));
        let events = recorder.0.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::StateChanged {
                to: PipelineState::Failed,
                ..
            }
        )));
        assert!(matches!(events.last(), Some(ProgressEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn test_separate_synthesis_client() {
        let analyzers = Arc::new(MockLLMClient::new());
        analyzers.on_prompt_containing("Analysis domain:", MockResponse::text("{\"score\": 50}"));
        let synthesis = scripted();

        let report = AnalysisPipeline::new(analyzers.clone(), PipelineConfig::default())
            .with_synthesis_client(synthesis.clone())
            .run(AnalysisRequest::subject_only("Acme"))
            .await
            .unwrap();

        assert_eq!(report.investment_summary["overall_score"], json!(5.5));
        assert_eq!(analyzers.count_requests_containing("investment committee"), 0);
        assert_eq!(synthesis.requests().len(), 1);
    }
}
