//! Merge step: copies domain outputs verbatim and asks the model for the
//! cross-domain summaries

use super::analyzer::{truncate_chars, AnalyzerResult, ANALYSIS_TEMPERATURE};
use super::report::{
    DomainSection, FinalReport, ReportMetadata, EXECUTIVE_SUMMARY_KEY, INVESTMENT_SUMMARY_KEY,
};
use super::request::AnalysisRequest;
use super::response::{parse_object, ParseFailure};
use crate::llm::{BackendError, ChatMessage, LLMClient, LLMRequest};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const ANALYSIS_TYPE: &str = "Comprehensive Startup Analysis";

const SYNTHESIS_INSTRUCTIONS: &str = r#"You are the chair of an investment committee. Specialist analysts have
evaluated a startup across several domains. Combine their findings into a
single investment view.

- Weigh the domain scores and evidence; do not invent data the analysts did not provide.
- Domains marked unavailable must lower your confidence.
- investment_recommendation must be one of Buy, Hold or Pass.
- overall_score is a number from 1 to 10."#;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Synthesis model call failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Synthesis output unusable: {0}")]
    MalformedOutput(#[from] ParseFailure),
}

pub struct Synthesizer {
    llm: Arc<dyn LLMClient>,
    agent: String,
    max_tokens: Option<u32>,
    max_context_chars: usize,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LLMClient>, agent: impl Into<String>) -> Self {
        Self {
            llm,
            agent: agent.into(),
            max_tokens: None,
            max_context_chars: 30_000,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    /// Domain sections in the order of `order`, taken only from Success
    /// results; everything else becomes an empty placeholder.
    pub fn merge_sections(
        order: &[String],
        results: &BTreeMap<String, AnalyzerResult>,
    ) -> Vec<DomainSection> {
        order
            .iter()
            .map(|id| match results.get(id) {
                Some(result) if result.is_success() => DomainSection {
                    analyzer_id: id.clone(),
                    content: result.raw_output.clone(),
                },
                _ => DomainSection::placeholder(id),
            })
            .collect()
    }

    pub async fn synthesize(
        &self,
        request: &AnalysisRequest,
        order: &[String],
        results: &BTreeMap<String, AnalyzerResult>,
    ) -> Result<FinalReport, SynthesisError> {
        let sections = Self::merge_sections(order, results);

        let mut llm_request = LLMRequest::new(vec![
            ChatMessage::system(format!(
                "{}\n\nRespond with a single JSON object using exactly this structure:\n{}\n\n\
                 Return only the JSON object, without commentary.",
                SYNTHESIS_INSTRUCTIONS,
                summary_template()
            )),
            ChatMessage::user(self.user_prompt(request, &sections)),
        ])
        .with_temperature(ANALYSIS_TEMPERATURE)
        .with_json_mode();
        if let Some(max_tokens) = self.max_tokens {
            llm_request = llm_request.with_max_tokens(max_tokens);
        }

        let response = self.llm.chat(llm_request).await?;
        let mut output = parse_object(&response.content)?;

        let investment_summary = take_section(&mut output, INVESTMENT_SUMMARY_KEY);
        let executive_summary = take_section(&mut output, EXECUTIVE_SUMMARY_KEY);
        let confidence_level = output
            .get("confidence_level")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| fallback_confidence(results));

        let analysis_metadata = ReportMetadata {
            company_name: request.subject_name.clone(),
            analysis_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            analysis_type: ANALYSIS_TYPE.to_string(),
            agent: self.agent.clone(),
            confidence_level,
            data_sources: data_sources(request, results),
            analyzer_status: order
                .iter()
                .filter_map(|id| results.get(id).map(|r| (id.clone(), r.status)))
                .collect(),
        };

        info!(
            company = %analysis_metadata.company_name,
            sections = sections.len(),
            placeholders = sections.iter().filter(|s| s.is_placeholder()).count(),
            "Report synthesized"
        );

        Ok(FinalReport {
            analysis_metadata,
            sections,
            investment_summary,
            executive_summary,
        })
    }

    fn user_prompt(&self, request: &AnalysisRequest, sections: &[DomainSection]) -> String {
        let mut prompt = format!("Startup: {}\n\n", request.subject_name);

        if request.has_context() {
            prompt.push_str("Supporting documents:\n");
            prompt.push_str(&truncate_chars(&request.context_text, self.max_context_chars));
            prompt.push_str("\n\n");
        }

        prompt.push_str("Domain analyses:\n");
        for section in sections {
            prompt.push_str(&format!("\n## {}\n", section.analyzer_id));
            if section.is_placeholder() {
                prompt.push_str("unavailable\n");
            } else {
                let body = serde_json::to_string_pretty(&section.content)
                    .unwrap_or_else(|_| section.content.to_string());
                prompt.push_str(&body);
                prompt.push('\n');
            }
        }

        prompt
    }
}

fn summary_template() -> String {
    let template = json!({
        "investment_summary": {
            "overall_score": "number (1-10)",
            "investment_recommendation": "Buy|Hold|Pass",
            "investment_thesis": "string",
            "key_strengths": ["string"],
            "key_risks": ["string"],
            "valuation_commentary": "string"
        },
        "executive_summary": {
            "business_model_summary": "string",
            "market_opportunity": "string",
            "competitive_position": "string",
            "financial_outlook": "string",
            "team_assessment": "string"
        },
        "confidence_level": "High|Medium|Low"
    });
    serde_json::to_string_pretty(&template).unwrap_or_default()
}

fn take_section(output: &mut Map<String, Value>, key: &str) -> Value {
    match output.remove(key) {
        Some(value @ Value::Object(_)) => value,
        Some(other) => {
            warn!(section = key, found = %other, "Synthesis section is not an object");
            Value::Object(Map::new())
        }
        None => {
            warn!(section = key, "Synthesis output missing section");
            Value::Object(Map::new())
        }
    }
}

fn fallback_confidence(results: &BTreeMap<String, AnalyzerResult>) -> String {
    let total = results.len().max(1);
    let succeeded = results.values().filter(|r| r.is_success()).count();
    if succeeded * 3 >= total * 2 {
        "Medium".to_string()
    } else {
        "Low".to_string()
    }
}

fn data_sources(
    request: &AnalysisRequest,
    results: &BTreeMap<String, AnalyzerResult>,
) -> Vec<String> {
    let mut sources = Vec::new();
    if request.has_context() {
        sources.push("Uploaded documents".to_string());
    }
    if results.values().any(|r| r.searches > 0) {
        sources.push("Web search".to_string());
    }
    sources.push("Model knowledge".to_string());
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalyzerStatus;
    use crate::llm::{MockLLMClient, MockResponse};
    use std::time::Duration;

    fn ids() -> Vec<String> {
        ["team", "market"].iter().map(|s| s.to_string()).collect()
    }

    fn results() -> BTreeMap<String, AnalyzerResult> {
        let mut results = BTreeMap::new();
        results.insert(
            "team".to_string(),
            AnalyzerResult {
                analyzer_id: "team".to_string(),
                raw_output: json!({"score": 80}),
                status: AnalyzerStatus::Success,
                error: None,
                warnings: vec![],
                attempts: 1,
                searches: 0,
                duration: Duration::from_millis(5),
            },
        );
        results.insert(
            "market".to_string(),
            AnalyzerResult::failed("market", "quota", 1, Duration::from_millis(5)),
        );
        results
    }

    fn summaries() -> MockResponse {
        MockResponse::json(json!({
            "investment_summary": {"overall_score": 6.5, "investment_recommendation": "Hold"},
            "executive_summary": {"team_assessment": "Experienced"},
            "confidence_level": "Medium"
        }))
    }

    #[tokio::test]
    async fn test_merge_copies_success_and_placeholders_failures() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_response(summaries());

        let report = Synthesizer::new(llm.clone(), "business_analysis_agent")
            .synthesize(&AnalysisRequest::subject_only("Acme Robotics"), &ids(), &results())
            .await
            .unwrap();

        assert_eq!(report.company_name(), "Acme Robotics");
        assert_eq!(report.section("team"), Some(&json!({"score": 80})));
        assert_eq!(report.section("market"), Some(&json!({})));
        assert_eq!(report.investment_summary["investment_recommendation"], json!("Hold"));
        assert_eq!(report.analysis_metadata.agent, "business_analysis_agent");
        assert_eq!(
            report.analysis_metadata.analyzer_status["market"],
            AnalyzerStatus::Failed
        );

        let prompt = llm.requests()[0].full_text();
        assert!(prompt.contains("## market\nunavailable"));
        assert!(prompt.contains("\"score\": 80"));
    }

    #[tokio::test]
    async fn test_model_cannot_override_domain_sections() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_response(MockResponse::json(json!({
            "team": {"score": 1},
            "investment_summary": {},
            "executive_summary": {}
        })));

        let report = Synthesizer::new(llm, "agent")
            .synthesize(&AnalysisRequest::subject_only("Acme"), &ids(), &results())
            .await
            .unwrap();

        assert_eq!(report.section("team"), Some(&json!({"score": 80})));
    }

    #[tokio::test]
    async fn test_missing_section_becomes_empty() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_response(MockResponse::json(json!({
            "investment_summary": {"overall_score": 5}
        })));

        let report = Synthesizer::new(llm, "agent")
            .synthesize(&AnalysisRequest::subject_only("Acme"), &ids(), &results())
            .await
            .unwrap();

        assert_eq!(report.executive_summary, json!({}));
        assert_eq!(report.analysis_metadata.confidence_level, "Low");
    }

    #[tokio::test]
    async fn test_non_json_is_error() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_response(MockResponse::text("I recommend investing."));

        let result = Synthesizer::new(llm, "agent")
            .synthesize(&AnalysisRequest::subject_only("Acme"), &ids(), &results())
            .await;

        assert!(matches!(result, Err(SynthesisError::MalformedOutput(_))));
    }

    #[tokio::test]
    async fn test_transport_error_is_error() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_response(MockResponse::error(BackendError::TimeoutError { seconds: 60 }));

        let result = Synthesizer::new(llm, "agent")
            .synthesize(&AnalysisRequest::subject_only("Acme"), &ids(), &results())
            .await;

        assert!(matches!(result, Err(SynthesisError::Backend(_))));
    }

    #[test]
    fn test_data_sources() {
        let request = AnalysisRequest::new("Acme", "deck");
        let sources = data_sources(&request, &results());
        assert_eq!(sources, vec!["Uploaded documents", "Model knowledge"]);
    }
}
