//! Single-call structured profile of a startup from its uploaded documents
//!
//! The profile is what gets stored as the startup record next to the
//! extracted text. It is independent of the domain analyzers and the report.

use super::analyzer::{truncate_chars, ANALYSIS_TEMPERATURE};
use super::response::parse_object;
use super::schema::{OutputSchema, SchemaField};
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PROFILE_MAX_ATTEMPTS: u32 = 3;

pub const RECOMMENDATIONS: [&str; 3] = ["High Potential", "Needs More Data", "Risky"];

const PROFILE_INSTRUCTIONS: &str = "You profile early-stage startups for an investment team. \
Read the extracted document text and describe the founders, the problem and market, \
traction and financials, and the main risks. Use only what the documents support.";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Startup profile failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

pub fn profile_schema() -> OutputSchema {
    OutputSchema::new(vec![
        SchemaField::text("startup_name"),
        SchemaField::text("summary").with_hint("Concise summary of the startup"),
        SchemaField::object(
            "founder_profile",
            vec![
                SchemaField::object_list(
                    "founders",
                    vec![
                        SchemaField::text("name"),
                        SchemaField::text("background"),
                        SchemaField::text("commitment_level").with_hint("Full-time|Part-time"),
                        SchemaField::text("capital_invested"),
                    ],
                ),
                SchemaField::text("team_strengths"),
                SchemaField::text("red_flags"),
            ],
        ),
        SchemaField::object(
            "problem_and_market",
            vec![
                SchemaField::text("problem_statement"),
                SchemaField::text("market_size"),
                SchemaField::text_list("competitors"),
                SchemaField::text("differentiator"),
            ],
        ),
        SchemaField::object(
            "traction_and_financials",
            vec![
                SchemaField::text("revenue"),
                SchemaField::text("growth_rate"),
                SchemaField::text_list("key_metrics"),
                SchemaField::text("funding_history"),
            ],
        ),
        SchemaField::text_list("risk_factors"),
        SchemaField::one_of("overall_investment_recommendation", &RECOMMENDATIONS),
        SchemaField::number("confidence_score").with_hint("0.0 to 1.0"),
    ])
}

pub struct StartupProfiler {
    llm: Arc<dyn LLMClient>,
    schema: OutputSchema,
    max_attempts: u32,
    max_tokens: Option<u32>,
    max_context_chars: usize,
}

impl StartupProfiler {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            schema: profile_schema(),
            max_attempts: PROFILE_MAX_ATTEMPTS,
            max_tokens: None,
            max_context_chars: 30_000,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    /// Asks for the profile, resending the same prompt on any failure.
    ///
    /// The returned value is always a JSON object carrying `startup_name`.
    pub async fn profile(
        &self,
        startup_name: &str,
        extracted_text: &str,
    ) -> Result<Value, ProfileError> {
        let mut request = LLMRequest::new(vec![
            ChatMessage::system(format!(
                "{}\n\nRespond with a single JSON object using exactly this structure:\n{}\n\n\
                 Return only the JSON object, without commentary.",
                PROFILE_INSTRUCTIONS,
                self.schema.render_template()
            )),
            ChatMessage::user(format!(
                "Startup: {}\n\nExtracted text from documents:\n---\n{}\n---",
                startup_name,
                truncate_chars(extracted_text, self.max_context_chars)
            )),
        ])
        .with_temperature(ANALYSIS_TEMPERATURE)
        .with_json_mode();
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            let reply = match self.llm.chat(request.clone()).await {
                Ok(response) => response.content,
                Err(e) => {
                    warn!(startup = startup_name, attempt, error = %e, "Profile call failed");
                    last_error = e.to_string();
                    continue;
                }
            };

            match parse_object(&reply) {
                Ok(mut output) => {
                    let warnings = self.schema.validate(&output);
                    if !warnings.is_empty() {
                        debug!(startup = startup_name, ?warnings, "Profile has advisory warnings");
                    }
                    output
                        .entry("startup_name")
                        .or_insert_with(|| Value::String(startup_name.to_string()));

                    info!(startup = startup_name, attempts = attempt, "Startup profile extracted");
                    return Ok(Value::Object(output));
                }
                Err(failure) => {
                    warn!(startup = startup_name, attempt, error = %failure, "Unparseable profile");
                    last_error = failure.to_string();
                }
            }
        }

        Err(ProfileError::Exhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendError, MockLLMClient, MockResponse};
    use serde_json::json;

    fn profile_reply() -> MockResponse {
        MockResponse::json(json!({
            "startup_name": "Acme Robotics",
            "summary": "Warehouse picking robots",
            "risk_factors": ["Hardware margins"],
            "overall_investment_recommendation": "High Potential",
            "confidence_score": 0.7
        }))
    }

    #[tokio::test]
    async fn test_profile_first_try() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_response(profile_reply());

        let profile = StartupProfiler::new(llm.clone())
            .profile("Acme Robotics", "Pitch deck text")
            .await
            .unwrap();

        assert_eq!(profile["summary"], json!("Warehouse picking robots"));
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_mode);
        assert!(requests[0].full_text().contains("Pitch deck text"));
        assert!(requests[0].full_text().contains("traction_and_financials"));
    }

    #[tokio::test]
    async fn test_retries_until_json() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_responses(vec![
            MockResponse::text("Here is the profile you asked for."),
            MockResponse::error(BackendError::NetworkError {
                message: "reset".to_string(),
            }),
            profile_reply(),
        ]);

        let profile = StartupProfiler::new(llm.clone())
            .profile("Acme Robotics", "deck")
            .await
            .unwrap();

        assert_eq!(profile["confidence_score"], json!(0.7));
        assert_eq!(llm.requests().len(), 3);
        // The same prompt is resent each time
        assert_eq!(llm.requests()[0].messages, llm.requests()[2].messages);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_responses(vec![
            MockResponse::text("no"),
            MockResponse::text("[1]"),
            MockResponse::text("still no"),
            profile_reply(),
        ]);

        let result = StartupProfiler::new(llm.clone())
            .profile("Acme Robotics", "deck")
            .await;

        match result {
            Err(ProfileError::Exhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("not valid JSON"));
            }
            other => panic!("Expected Exhausted, got {:?}", other),
        }
        assert_eq!(llm.remaining_responses(), 1);
    }

    #[tokio::test]
    async fn test_startup_name_filled_in() {
        let llm = Arc::new(MockLLMClient::new());
        llm.add_response(MockResponse::text("```json\n{\"summary\": \"Robots\"}\n```"));

        let profile = StartupProfiler::new(llm)
            .profile("Acme Robotics", "deck")
            .await
            .unwrap();

        assert_eq!(profile["startup_name"], json!("Acme Robotics"));
    }

    #[test]
    fn test_schema_template_lists_sections() {
        let template = profile_schema().render_template();
        for key in [
            "founder_profile",
            "problem_and_market",
            "traction_and_financials",
            "risk_factors",
            "overall_investment_recommendation",
            "confidence_score",
        ] {
            assert!(template.contains(key), "{}", key);
        }
        assert!(template.contains("High Potential|Needs More Data|Risky"));
    }
}
