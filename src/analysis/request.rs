use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_SUBJECT_NAME_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Subject name must not be empty")]
    EmptySubject,

    #[error("Subject name is {length} characters long (maximum {max})")]
    SubjectTooLong { length: usize, max: usize },
}

/// The startup under analysis plus any supporting document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub subject_name: String,
    #[serde(default)]
    pub context_text: String,
}

impl AnalysisRequest {
    pub fn new(subject_name: impl Into<String>, context_text: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into().trim().to_string(),
            context_text: context_text.into().trim().to_string(),
        }
    }

    pub fn subject_only(subject_name: impl Into<String>) -> Self {
        Self::new(subject_name, String::new())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.subject_name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptySubject);
        }

        let length = name.chars().count();
        if length > MAX_SUBJECT_NAME_CHARS {
            return Err(ValidationError::SubjectTooLong {
                length,
                max: MAX_SUBJECT_NAME_CHARS,
            });
        }

        Ok(())
    }

    pub fn has_context(&self) -> bool {
        !self.context_text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_input() {
        let request = AnalysisRequest::new("  Acme Robotics \n", "\n deck text \n");
        assert_eq!(request.subject_name, "Acme Robotics");
        assert_eq!(request.context_text, "deck text");
        assert!(request.has_context());
    }

    #[test]
    fn test_empty_subject_rejected() {
        assert_eq!(
            AnalysisRequest::subject_only("   ").validate(),
            Err(ValidationError::EmptySubject)
        );
    }

    #[test]
    fn test_whitespace_subject_rejected_when_built_directly() {
        let request = AnalysisRequest {
            subject_name: " \t ".to_string(),
            context_text: String::new(),
        };
        assert_eq!(request.validate(), Err(ValidationError::EmptySubject));
    }

    #[test]
    fn test_long_subject_rejected() {
        let request = AnalysisRequest::subject_only("x".repeat(201));
        assert!(matches!(
            request.validate(),
            Err(ValidationError::SubjectTooLong { length: 201, .. })
        ));

        assert!(AnalysisRequest::subject_only("x".repeat(200)).validate().is_ok());
    }

    #[test]
    fn test_context_is_optional() {
        let request = AnalysisRequest::subject_only("Acme");
        assert!(request.validate().is_ok());
        assert!(!request.has_context());
    }
}
