//! Document ingestion: uploaded files to one block of plain text
//!
//! Per-document problems never fail the batch. They are folded into the
//! combined text as marker strings so the analyzers still see which file
//! could not be read.

pub mod docx;
pub mod mime;
pub mod vision;

pub use docx::{extract_docx_text, DocxError};
pub use vision::{OcrError, PdfTextExtractor, VisionAuth, VisionOcr};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MAX_DOCUMENTS: usize = 5;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Too many documents: {count} supplied, at most {max} allowed")]
    TooManyDocuments { count: usize, max: usize },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
    pub declared_mime: Option<String>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            declared_mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    pub async fn from_path(path: &Path) -> Result<Self, IngestError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            bytes,
            declared_mime: mime::from_extension(path).map(str::to_string),
        })
    }

    /// Sniffed type first, declared type otherwise
    pub fn effective_mime(&self) -> Option<String> {
        mime::sniff(&self.bytes)
            .map(str::to_string)
            .or_else(|| self.declared_mime.clone())
    }
}

#[derive(Default)]
pub struct DocumentIngestor {
    pdf: Option<Arc<dyn PdfTextExtractor>>,
}

impl DocumentIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pdf_extractor(mut self, pdf: Arc<dyn PdfTextExtractor>) -> Self {
        self.pdf = Some(pdf);
        self
    }

    /// Text of every document in upload order, each followed by a blank line
    pub async fn ingest(&self, documents: &[UploadedDocument]) -> Result<String, IngestError> {
        if documents.len() > MAX_DOCUMENTS {
            return Err(IngestError::TooManyDocuments {
                count: documents.len(),
                max: MAX_DOCUMENTS,
            });
        }

        let mut combined = String::new();
        for document in documents {
            combined.push_str(&self.extract(document).await);
            combined.push_str("\n\n");
        }

        info!(
            documents = documents.len(),
            chars = combined.len(),
            "Documents ingested"
        );
        Ok(combined)
    }

    pub async fn extract(&self, document: &UploadedDocument) -> String {
        let detected = document.effective_mime();
        debug!(document = %document.name, mime = ?detected, "Extracting text");

        match detected.as_deref() {
            Some(mime::PDF) => match &self.pdf {
                Some(pdf) => match pdf.extract_text(&document.bytes).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(document = %document.name, error = %e, "PDF extraction failed");
                        format!("Error processing PDF file: {}", e)
                    }
                },
                None => format!("Error processing PDF file: {}", OcrError::NotConfigured),
            },
            Some(m) if mime::is_word(m) => match extract_docx_text(&document.bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!(document = %document.name, error = %e, "DOCX extraction failed");
                    format!("Error processing DOCX file: {}", e)
                }
            },
            Some(other) => format!("Unsupported file type: {}", other),
            None => "Unsupported file type: unknown".to_string(),
        }
    }
}

/// Convenience wrapper over [`DocumentIngestor::ingest`]
pub async fn ingest_documents(
    documents: &[UploadedDocument],
    pdf: Option<Arc<dyn PdfTextExtractor>>,
) -> Result<String, IngestError> {
    let mut ingestor = DocumentIngestor::new();
    if let Some(pdf) = pdf {
        ingestor = ingestor.with_pdf_extractor(pdf);
    }
    ingestor.ingest(documents).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeOcr(Result<String, String>);

    #[async_trait]
    impl PdfTextExtractor for FakeOcr {
        async fn extract_text(&self, _pdf: &[u8]) -> Result<String, OcrError> {
            self.0.clone().map_err(OcrError::Request)
        }
    }

    fn pdf() -> UploadedDocument {
        UploadedDocument::new("deck.pdf", b"%PDF-1.7 body".to_vec())
    }

    #[tokio::test]
    async fn test_upload_order_and_separators() {
        let ingestor = DocumentIngestor::new()
            .with_pdf_extractor(Arc::new(FakeOcr(Ok("deck text".to_string()))));
        let memo = UploadedDocument::new("memo.docx", docx::tests::build_docx(&["memo line"]));

        let text = ingestor.ingest(&[memo, pdf()]).await.unwrap();
        assert_eq!(text, "memo line\n\ndeck text\n\n");
    }

    #[tokio::test]
    async fn test_unsupported_type_is_marker_not_error() {
        let png = UploadedDocument::new("logo.png", b"\x89PNG\r\n\x1a\n".to_vec());
        let text = DocumentIngestor::new().ingest(&[png]).await.unwrap();
        assert_eq!(text, "Unsupported file type: image/png\n\n");
    }

    #[tokio::test]
    async fn test_unknown_type_uses_declared_mime() {
        let notes = UploadedDocument::new("notes.txt", b"hello".to_vec()).with_mime("text/plain");
        let unknown = UploadedDocument::new("blob", b"hello".to_vec());

        let text = DocumentIngestor::new().ingest(&[notes, unknown]).await.unwrap();
        assert_eq!(
            text,
            "Unsupported file type: text/plain\n\nUnsupported file type: unknown\n\n"
        );
    }

    #[tokio::test]
    async fn test_sniffed_type_beats_declared() {
        let mislabeled = UploadedDocument::new("deck.docx", b"%PDF-1.5".to_vec())
            .with_mime(mime::DOCX);
        assert_eq!(mislabeled.effective_mime().as_deref(), Some(mime::PDF));
    }

    #[tokio::test]
    async fn test_ocr_failure_marker() {
        let ingestor =
            DocumentIngestor::new().with_pdf_extractor(Arc::new(FakeOcr(Err("quota".to_string()))));
        let text = ingestor.extract(&pdf()).await;
        assert_eq!(text, "Error processing PDF file: OCR request failed: quota");
    }

    #[tokio::test]
    async fn test_pdf_without_extractor() {
        let text = DocumentIngestor::new().extract(&pdf()).await;
        assert!(text.starts_with("Error processing PDF file: No OCR credentials"));
    }

    #[tokio::test]
    async fn test_broken_word_document_marker() {
        let doc =
            UploadedDocument::new("old.doc", b"not really a zip".to_vec()).with_mime(mime::MSWORD);
        let text = DocumentIngestor::new().extract(&doc).await;
        assert!(text.starts_with("Error processing DOCX file: "));
    }

    #[tokio::test]
    async fn test_too_many_documents() {
        let docs: Vec<_> = (0..6)
            .map(|i| UploadedDocument::new(format!("{}.pdf", i), vec![]))
            .collect();
        let result = ingest_documents(&docs, None).await;
        assert!(matches!(
            result,
            Err(IngestError::TooManyDocuments { count: 6, max: 5 })
        ));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        assert_eq!(ingest_documents(&[], None).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = UploadedDocument::from_path(Path::new("/nonexistent/deck.pdf")).await;
        assert!(matches!(result, Err(IngestError::Read { .. })));
    }
}
