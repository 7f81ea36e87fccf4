//! PDF text extraction through the Cloud Vision `files:annotate` endpoint

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Request(String),

    #[error("OCR service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Unexpected OCR response: {0}")]
    InvalidResponse(String),

    #[error("No OCR credentials configured (set GOOGLE_API_KEY or GOOGLE_OAUTH_ACCESS_TOKEN)")]
    NotConfigured,
}

#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, OcrError>;
}

#[derive(Clone)]
pub enum VisionAuth {
    ApiKey(String),
    BearerToken(String),
}

impl fmt::Debug for VisionAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisionAuth::ApiKey(_) => write!(f, "ApiKey(***)"),
            VisionAuth::BearerToken(_) => write!(f, "BearerToken(***)"),
        }
    }
}

pub struct VisionOcr {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    location: String,
    auth: VisionAuth,
}

impl VisionOcr {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        auth: VisionAuth,
        timeout: Duration,
    ) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: VISION_ENDPOINT.to_string(),
            project_id: project_id.into(),
            location: location.into(),
            auth,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_body(&self, pdf: &[u8]) -> Value {
        json!({
            "parent": format!("projects/{}/locations/{}", self.project_id, self.location),
            "requests": [{
                "inputConfig": {
                    "content": base64::engine::general_purpose::STANDARD.encode(pdf),
                    "mimeType": "application/pdf"
                },
                "features": [{"type": "DOCUMENT_TEXT_DETECTION"}]
            }]
        })
    }

    /// Concatenates `fullTextAnnotation.text` of every page in order
    pub(crate) fn collect_text(body: &Value) -> Result<String, OcrError> {
        let file_response = body
            .get("responses")
            .and_then(|r| r.get(0))
            .ok_or_else(|| OcrError::InvalidResponse("missing responses".to_string()))?;

        if let Some(error) = file_response.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(OcrError::InvalidResponse(message.to_string()));
        }

        let pages = file_response
            .get("responses")
            .and_then(|r| r.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(pages
            .iter()
            .filter_map(|page| page.pointer("/fullTextAnnotation/text"))
            .filter_map(|text| text.as_str())
            .collect::<String>())
    }
}

#[async_trait]
impl PdfTextExtractor for VisionOcr {
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, OcrError> {
        let url = format!("{}/files:annotate", self.endpoint);
        let mut request = self
            .http
            .post(&url)
            .header("x-goog-user-project", &self.project_id)
            .json(&self.request_body(pdf));

        request = match &self.auth {
            VisionAuth::ApiKey(key) => request.query(&[("key", key)]),
            VisionAuth::BearerToken(token) => request.bearer_auth(token),
        };

        let response = request
            .send()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("no error message")
                .to_string();
            return Err(OcrError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let text = Self::collect_text(&body)?;
        debug!(bytes = pdf.len(), chars = text.len(), "PDF OCR complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ocr() -> VisionOcr {
        VisionOcr::new(
            "resolutes-dev",
            "us",
            VisionAuth::ApiKey("k".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = ocr().request_body(b"%PDF-1.4");

        assert_eq!(body["parent"], json!("projects/resolutes-dev/locations/us"));
        assert_eq!(
            body["requests"][0]["features"][0]["type"],
            json!("DOCUMENT_TEXT_DETECTION")
        );
        assert_eq!(
            body["requests"][0]["inputConfig"]["content"],
            json!("JVBERi0xLjQ=")
        );
    }

    #[test]
    fn test_collect_text_concatenates_pages() {
        let body = json!({
            "responses": [{
                "responses": [
                    {"fullTextAnnotation": {"text": "Page one\n"}},
                    {},
                    {"fullTextAnnotation": {"text": "Page two\n"}}
                ]
            }]
        });

        assert_eq!(VisionOcr::collect_text(&body).unwrap(), "Page one\nPage two\n");
    }

    #[test]
    fn test_collect_text_file_error() {
        let body = json!({"responses": [{"error": {"message": "Bad PDF"}}]});
        let err = VisionOcr::collect_text(&body).unwrap_err();
        assert!(err.to_string().contains("Bad PDF"));
    }

    #[test]
    fn test_collect_text_missing_responses() {
        assert!(VisionOcr::collect_text(&json!({})).is_err());
    }

    #[test]
    fn test_auth_debug_redacts() {
        let debug = format!("{:?}", VisionAuth::BearerToken("ya29.secret".to_string()));
        assert!(!debug.contains("ya29"));
    }
}
