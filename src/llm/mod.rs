//! LLM client abstraction layer
//!
//! This module provides a trait-based abstraction for LLM communication,
//! allowing different backends (GenAI, Mock) to be used interchangeably.

mod client;
mod error;
mod genai;
mod mock;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use genai::{GenAIClient, API_BASE_URL_ENV};
pub use mock::{MockLLMClient, MockResponse};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
