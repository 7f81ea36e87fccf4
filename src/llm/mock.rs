use super::client::LLMClient;
use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable client for tests.
///
/// Routed responses are matched against the full request text and are not
/// consumed, so concurrent callers get deterministic answers regardless of
/// scheduling. Requests that match no route pop from the FIFO queue.
pub struct MockLLMClient {
    routes: Mutex<Vec<(String, MockResponse)>>,
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<LLMRequest>>,
    name: String,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub content: String,
    pub error: Option<BackendError>,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            error: None,
            delay: None,
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::text(value.to_string())
    }

    pub fn error(error: BackendError) -> Self {
        Self {
            content: String::new(),
            error: Some(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self::with_name("MockLLM")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    /// Answers every request whose text contains `needle` with `response`
    pub fn on_prompt_containing(&self, needle: impl Into<String>, response: MockResponse) {
        self.routes.lock().unwrap().push((needle.into(), response));
    }

    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        let mut queue = self.responses.lock().unwrap();
        for response in responses {
            queue.push_back(response);
        }
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of received requests whose text contains `needle`
    pub fn count_requests_containing(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.full_text().contains(needle))
            .count()
    }

    fn next_response(&self, request: &LLMRequest) -> Option<MockResponse> {
        let text = request.full_text();
        let routed = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, response)| response.clone());

        routed.or_else(|| self.responses.lock().unwrap().pop_front())
    }
}

impl Default for MockLLMClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());

        let response = self
            .next_response(&request)
            .ok_or_else(|| BackendError::Other {
                message: "MockLLMClient: No more responses in queue".to_string(),
            })?;

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = response.error {
            return Err(error);
        }

        Ok(LLMResponse::text(response.content, Duration::from_millis(10)))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockLLMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLLMClient")
            .field("name", &self.name)
            .field("remaining_responses", &self.remaining_responses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[tokio::test]
    async fn test_mock_client_basic() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::text("Hello!"));

        let response = client.chat(LLMRequest::new(vec![])).await.unwrap();

        assert_eq!(response.content, "Hello!");
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::error(BackendError::TimeoutError {
            seconds: 30,
        }));

        let result = client.chat(LLMRequest::new(vec![])).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_no_responses() {
        let client = MockLLMClient::new();

        let result = client.chat(LLMRequest::new(vec![])).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_multiple_responses() {
        let client = MockLLMClient::new();
        client.add_responses(vec![
            MockResponse::text("First"),
            MockResponse::text("Second"),
            MockResponse::text("Third"),
        ]);

        assert_eq!(client.remaining_responses(), 3);

        let r1 = client.chat(LLMRequest::new(vec![])).await.unwrap();
        assert_eq!(r1.content, "First");

        let r2 = client.chat(LLMRequest::new(vec![])).await.unwrap();
        assert_eq!(r2.content, "Second");

        assert_eq!(client.remaining_responses(), 1);
    }

    #[tokio::test]
    async fn test_routes_are_not_consumed() {
        let client = MockLLMClient::new();
        client.on_prompt_containing("market", MockResponse::text("{\"score\": 1}"));

        for _ in 0..3 {
            let request = LLMRequest::new(vec![ChatMessage::user("market analysis")]);
            let response = client.chat(request).await.unwrap();
            assert_eq!(response.content, "{\"score\": 1}");
        }

        assert_eq!(client.count_requests_containing("market"), 3);
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_unrouted_request_falls_back_to_queue() {
        let client = MockLLMClient::new();
        client.on_prompt_containing("team", MockResponse::text("routed"));
        client.add_response(MockResponse::text("queued"));

        let request = LLMRequest::new(vec![ChatMessage::user("finance")]);
        let response = client.chat(request).await.unwrap();
        assert_eq!(response.content, "queued");
    }

    #[test]
    fn test_custom_name() {
        let client = MockLLMClient::with_name("TestClient");
        assert_eq!(client.name(), "TestClient");
    }
}
