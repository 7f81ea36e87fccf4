//! Concurrent fan-out over every configured analyzer

use super::analyzer::{Analyzer, AnalyzerOptions, AnalyzerResult};
use super::catalog::AnalyzerSpec;
use super::request::AnalysisRequest;
use crate::llm::LLMClient;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::search::SearchProvider;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_CONCURRENCY: usize = 6;
pub const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(180);

pub struct ResearchStage {
    llm: Arc<dyn LLMClient>,
    search: Option<Arc<dyn SearchProvider>>,
    options: AnalyzerOptions,
    max_concurrency: usize,
    analyzer_timeout: Duration,
    progress: Arc<dyn ProgressHandler>,
}

impl ResearchStage {
    pub fn new(llm: Arc<dyn LLMClient>, options: AnalyzerOptions) -> Self {
        Self {
            llm,
            search: None,
            options,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            analyzer_timeout: DEFAULT_ANALYZER_TIMEOUT,
            progress: Arc::new(NoOpHandler),
        }
    }

    pub fn with_search(mut self, search: Option<Arc<dyn SearchProvider>>) -> Self {
        self.search = search;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_analyzer_timeout(mut self, timeout: Duration) -> Self {
        self.analyzer_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Runs every analyzer against the same request and waits for all of them.
    ///
    /// The returned map holds exactly one result per distinct spec id, whatever
    /// mix of successes, malformed replies, timeouts or panics occurred.
    pub async fn run_all(
        &self,
        request: Arc<AnalysisRequest>,
        specs: &[AnalyzerSpec],
    ) -> BTreeMap<String, AnalyzerResult> {
        let start = Instant::now();
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        info!(
            analyzers = specs.len(),
            max_concurrency = self.max_concurrency,
            timeout_secs = self.analyzer_timeout.as_secs(),
            "Dispatching analyzers"
        );

        for spec in specs {
            let mut analyzer = Analyzer::new(spec.clone(), self.llm.clone(), self.options.clone());
            if let Some(search) = &self.search {
                analyzer = analyzer.with_search(search.clone());
            }

            let request = request.clone();
            let permits = permits.clone();
            let progress = self.progress.clone();
            let timeout = self.analyzer_timeout;

            tasks.spawn(async move {
                let id = analyzer.id().to_string();
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return AnalyzerResult::failed(
                            &id,
                            "concurrency limiter closed",
                            0,
                            Duration::ZERO,
                        )
                    }
                };

                progress.on_progress(&ProgressEvent::AnalyzerStarted {
                    analyzer_id: id.clone(),
                });

                let started = Instant::now();
                let result = match tokio::time::timeout(timeout, analyzer.analyze(&request)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            analyzer = %id,
                            timeout_secs = timeout.as_secs(),
                            "Analyzer timed out"
                        );
                        AnalyzerResult::failed(
                            &id,
                            format!("timed out after {}s", timeout.as_secs()),
                            0,
                            started.elapsed(),
                        )
                    }
                };

                progress.on_progress(&ProgressEvent::AnalyzerFinished {
                    analyzer_id: id,
                    status: result.status,
                    attempts: result.attempts,
                    duration: result.duration,
                });

                result
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    debug!(
                        analyzer = %result.analyzer_id,
                        status = %result.status,
                        "Analyzer joined"
                    );
                    if results.contains_key(&result.analyzer_id) {
                        warn!(
                            analyzer = %result.analyzer_id,
                            "Duplicate analyzer id, keeping first result"
                        );
                    } else {
                        results.insert(result.analyzer_id.clone(), result);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Analyzer task did not complete");
                }
            }
        }

        // A task that panicked cannot report its own id
        for spec in specs {
            if !results.contains_key(&spec.id) {
                results.insert(
                    spec.id.clone(),
                    AnalyzerResult::failed(&spec.id, "analyzer task aborted", 0, start.elapsed()),
                );
            }
        }

        let succeeded = results.values().filter(|r| r.is_success()).count();
        self.progress.on_progress(&ProgressEvent::ResearchComplete {
            succeeded,
            total: results.len(),
            duration: start.elapsed(),
        });

        results
    }
}
