//! DuckDuckGo instant-answer search

use super::{SearchError, SearchHit, SearchProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";

pub struct DuckDuckGoSearch {
    http: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration, max_results: usize) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("resolutes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SearchError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_results: max_results.max(1),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Extracts hits from an instant-answer payload
    pub(crate) fn parse_hits(body: &Value, max_results: usize) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        if let Some(abstract_text) = body.get("AbstractText").and_then(|v| v.as_str()) {
            if !abstract_text.is_empty() {
                hits.push(SearchHit {
                    title: body
                        .get("AbstractSource")
                        .and_then(|v| v.as_str())
                        .unwrap_or("Unknown")
                        .to_string(),
                    snippet: abstract_text.to_string(),
                    url: body
                        .get("AbstractURL")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                });
            }
        }

        for array_key in ["RelatedTopics", "Results"] {
            let Some(items) = body.get(array_key).and_then(|v| v.as_array()) else {
                continue;
            };
            for item in items {
                if hits.len() >= max_results {
                    return hits;
                }
                if let Some(text) = item.get("Text").and_then(|v| v.as_str()) {
                    let url = item.get("FirstURL").and_then(|v| v.as_str()).unwrap_or("");
                    hits.push(SearchHit {
                        title: text.split(" - ").next().unwrap_or(text).to_string(),
                        snippet: text.to_string(),
                        url: url.to_string(),
                    });
                }
            }
        }

        hits.truncate(max_results);
        hits
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!(
            "{}?q={}&format=json&no_html=1&skip_disambig=1",
            self.endpoint,
            urlencoding::encode(query)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let hits = Self::parse_hits(&body, self.max_results);
        debug!(query, hits = hits.len(), "Web search complete");
        Ok(hits)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}
