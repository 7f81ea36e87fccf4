//! Transport-level errors raised while talking to an LLM provider

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur during backend operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Authentication failed or credentials are invalid
    AuthenticationError { message: String },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// Rate limit or quota exceeded, retry after the specified duration (in seconds)
    RateLimitError { retry_after: Option<u64> },

    /// The provider answered but the payload was unusable
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Configuration error (missing API keys, invalid settings, etc.)
    ConfigurationError { message: String },

    /// Network-related error
    NetworkError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl BackendError {
    /// Classifies a provider error message into the closest variant.
    ///
    /// `genai` flattens most provider failures into strings, so status codes
    /// and well-known phrases are the only signal left.
    pub fn from_provider_message(provider: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("429") || lower.contains("quota") || lower.contains("rate limit") {
            BackendError::RateLimitError { retry_after: None }
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
        {
            BackendError::AuthenticationError {
                message: format!("{} rejected credentials: {}", provider, message),
            }
        } else if lower.contains("connection") || lower.contains("dns") {
            BackendError::NetworkError {
                message: format!("{} unreachable: {}", provider, message),
            }
        } else {
            BackendError::ApiError {
                message: format!("{} request failed: {}", provider, message),
                status_code: None,
            }
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::AuthenticationError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::RateLimitError { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limit exceeded, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limit exceeded")
                }
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from LLM: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_status_code() {
        let err = BackendError::ApiError {
            message: "bad gateway".to_string(),
            status_code: Some(502),
        };
        assert_eq!(err.to_string(), "API error (502): bad gateway");
    }

    #[test]
    fn test_timeout_display() {
        let err = BackendError::TimeoutError { seconds: 30 };
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }

    #[test]
    fn test_classify_quota_message() {
        let err = BackendError::from_provider_message("Gemini", "HTTP 429: quota exhausted");
        assert!(matches!(err, BackendError::RateLimitError { .. }));
    }

    #[test]
    fn test_classify_auth_message() {
        let err = BackendError::from_provider_message("Gemini", "401 Unauthorized");
        assert!(matches!(err, BackendError::AuthenticationError { .. }));
    }

    #[test]
    fn test_classify_fallback_is_api_error() {
        let err = BackendError::from_provider_message("Gemini", "model overloaded");
        match err {
            BackendError::ApiError { message, .. } => {
                assert!(message.contains("Gemini request failed"));
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }
}
