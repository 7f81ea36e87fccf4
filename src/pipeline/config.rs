use crate::analysis::research::{DEFAULT_ANALYZER_TIMEOUT, DEFAULT_MAX_CONCURRENCY};
use crate::analysis::AnalyzerOptions;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_concurrency: usize,
    pub analyzer_timeout: Duration,
    pub analyzer: AnalyzerOptions,
    pub synthesis_max_tokens: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            analyzer_timeout: DEFAULT_ANALYZER_TIMEOUT,
            analyzer: AnalyzerOptions::default(),
            synthesis_max_tokens: Some(8192),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_analyzer_timeout(mut self, timeout: Duration) -> Self {
        self.analyzer_timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.analyzer.max_attempts = max_attempts;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.analyzer.max_tokens = max_tokens;
        self.synthesis_max_tokens = max_tokens;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.analyzer.max_context_chars = max_context_chars;
        self
    }
}
