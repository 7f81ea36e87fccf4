//! Web search capability granted to analyzers
//!
//! Search is evidence gathering, not a dependency: analyzers treat any
//! failure here as degraded evidence and carry on.

mod duckduckgo;

pub use duckduckgo::DuckDuckGoSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// A single search result snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Failed to parse search response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;

    fn name(&self) -> &str;
}

/// Provider returning canned hits, recording every query it receives
#[derive(Debug, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    /// A provider whose every query fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(SearchError::Request("static provider set to fail".to_string()));
        }
        Ok(self.hits.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
