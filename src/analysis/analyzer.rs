use super::catalog::AnalyzerSpec;
use super::request::AnalysisRequest;
use super::response::{normalize, parse_object};
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use crate::search::SearchProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const ANALYSIS_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerStatus {
    Success,
    MalformedOutput,
    Failed,
}

impl fmt::Display for AnalyzerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerStatus::Success => write!(f, "success"),
            AnalyzerStatus::MalformedOutput => write!(f, "malformed_output"),
            AnalyzerStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal outcome of one analyzer for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub analyzer_id: String,
    /// Normalized object on success, the last raw reply as a string when
    /// malformed, null when the model call failed
    pub raw_output: Value,
    pub status: AnalyzerStatus,
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub attempts: u32,
    /// Search queries that returned results
    #[serde(default)]
    pub searches: u32,
    pub duration: Duration,
}

impl AnalyzerResult {
    pub fn failed(
        analyzer_id: &str,
        error: impl Into<String>,
        attempts: u32,
        duration: Duration,
    ) -> Self {
        Self {
            analyzer_id: analyzer_id.to_string(),
            raw_output: Value::Null,
            status: AnalyzerStatus::Failed,
            error: Some(error.into()),
            warnings: Vec::new(),
            attempts,
            searches: 0,
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalyzerStatus::Success
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Total generation attempts when the reply is not a JSON object
    pub max_attempts: u32,
    pub max_context_chars: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            temperature: ANALYSIS_TEMPERATURE,
            max_tokens: Some(8192),
            max_attempts: 2,
            max_context_chars: 30_000,
        }
    }
}

/// One domain analyzer; behavior is identical for every spec
pub struct Analyzer {
    spec: AnalyzerSpec,
    llm: Arc<dyn LLMClient>,
    search: Option<Arc<dyn SearchProvider>>,
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(spec: AnalyzerSpec, llm: Arc<dyn LLMClient>, options: AnalyzerOptions) -> Self {
        Self {
            spec,
            llm,
            search: None,
            options,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &AnalyzerSpec {
        &self.spec
    }

    /// Runs the analysis. Failures are reported through the result status.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalyzerResult {
        let start = Instant::now();
        let id = self.spec.id.as_str();
        let mut warnings = Vec::new();

        let (evidence, searches) = self.gather_evidence(request, &mut warnings).await;
        let mut messages = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.user_prompt(request, evidence.as_deref())),
        ];

        let max_attempts = self.options.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_reply = String::new();
        let mut last_failure = String::new();

        while attempts < max_attempts {
            attempts += 1;

            let llm_request = LLMRequest::new(messages.clone())
                .with_temperature(self.options.temperature)
                .with_json_mode();
            let llm_request = match self.options.max_tokens {
                Some(max_tokens) => llm_request.with_max_tokens(max_tokens),
                None => llm_request,
            };

            let response = match self.llm.chat(llm_request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(analyzer = id, attempt = attempts, error = %e, "Model call failed");
                    let mut result =
                        AnalyzerResult::failed(id, e.to_string(), attempts, start.elapsed());
                    result.warnings = warnings;
                    result.searches = searches;
                    return result;
                }
            };

            match parse_object(&response.content) {
                Ok(parsed) => {
                    let (output, normalize_warnings) = normalize(parsed, &self.spec.output_schema);
                    warnings.extend(normalize_warnings);
                    warnings.extend(self.spec.output_schema.validate(&output));

                    if !warnings.is_empty() {
                        debug!(
                            analyzer = id,
                            warnings = warnings.len(),
                            "Output has advisory warnings"
                        );
                    }

                    return AnalyzerResult {
                        analyzer_id: id.to_string(),
                        raw_output: Value::Object(output),
                        status: AnalyzerStatus::Success,
                        error: None,
                        warnings,
                        attempts,
                        searches,
                        duration: start.elapsed(),
                    };
                }
                Err(failure) => {
                    warn!(
                        analyzer = id,
                        attempt = attempts,
                        max_attempts,
                        error = %failure,
                        "Unparseable analyzer output"
                    );
                    last_failure = failure.to_string();
                    last_reply = response.content;

                    messages.push(ChatMessage::assistant(last_reply.clone()));
                    messages.push(ChatMessage::user(format!(
                        "{}. Reply again with only the JSON object described above.",
                        last_failure
                    )));
                }
            }
        }

        AnalyzerResult {
            analyzer_id: id.to_string(),
            raw_output: Value::String(last_reply),
            status: AnalyzerStatus::MalformedOutput,
            error: Some(last_failure),
            warnings,
            attempts,
            searches,
            duration: start.elapsed(),
        }
    }

    async fn gather_evidence(
        &self,
        request: &AnalysisRequest,
        warnings: &mut Vec<String>,
    ) -> (Option<String>, u32) {
        if !self.spec.uses_search {
            return (None, 0);
        }
        let Some(search) = &self.search else {
            return (None, 0);
        };

        let mut lines = Vec::new();
        let mut searches = 0;
        for query in self.spec.queries_for(&request.subject_name) {
            match search.search(&query).await {
                Ok(hits) if hits.is_empty() => {
                    lines.push(format!("- no results for \"{}\"", query));
                }
                Ok(hits) => {
                    searches += 1;
                    for hit in hits {
                        if hit.url.is_empty() {
                            lines.push(format!("- {}: {}", hit.title, hit.snippet));
                        } else {
                            lines.push(format!("- {}: {} ({})", hit.title, hit.snippet, hit.url));
                        }
                    }
                }
                Err(e) => {
                    debug!(analyzer = %self.spec.id, query = %query, error = %e, "Search failed");
                    warnings.push(format!("search \"{}\" failed: {}", query, e));
                    lines.push(format!("- search unavailable for \"{}\"", query));
                }
            }
        }

        (Some(lines.join("\n")), searches)
    }

    fn system_prompt(&self) -> String {
        format!(
            "Analysis domain: {id}\n\n{instructions}\n\n\
             Respond with a single JSON object using exactly this structure:\n{template}\n\n\
             Return only the JSON object, without commentary.",
            id = self.spec.id,
            instructions = self.spec.instructions,
            template = self.spec.output_schema.render_template(),
        )
    }

    fn user_prompt(&self, request: &AnalysisRequest, evidence: Option<&str>) -> String {
        let mut prompt = format!("Startup: {}\n\n", request.subject_name);

        if request.has_context() {
            prompt.push_str("Supporting documents:\n");
            prompt.push_str(&truncate_chars(&request.context_text, self.options.max_context_chars));
            prompt.push_str("\n\n");
        } else {
            prompt.push_str("No supporting documents were provided.\n\n");
        }

        if let Some(evidence) = evidence {
            prompt.push_str("Web research:\n");
            prompt.push_str(evidence);
            prompt.push_str("\n\n");
        }

        prompt.push_str(&format!(
            "Produce the {} analysis for {}.",
            self.spec.display_name.to_lowercase(),
            request.subject_name
        ));
        prompt
    }
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}\n[truncated]", &text[..byte_idx]),
        None => text.to_string(),
    }
}
