//! LLM communication types
//!
//! This module defines the types used for LLM request/response communication,
//! independent of any specific provider implementation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// User message
    User,
    /// Assistant (LLM) response
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Text content of the message
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to send to the LLM
#[derive(Debug, Clone)]
pub struct LLMRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Temperature for response generation (0.0 - 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Ask the provider to constrain output to a JSON document
    pub json_mode: bool,
}

impl LLMRequest {
    /// Creates a new request with messages
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
            json_mode: false,
        }
    }

    /// Sets the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Requests JSON-constrained output where the provider supports it
    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Concatenated text of all messages, used by mocks to route responses
    pub fn full_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Response from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Time taken for the request
    pub response_time: Duration,
}

impl LLMResponse {
    /// Creates a new response with just content
    pub fn text(content: impl Into<String>, response_time: Duration) -> Self {
        Self {
            content: content.into(),
            response_time,
        }
    }
}
