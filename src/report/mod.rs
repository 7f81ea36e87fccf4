//! Report rendering
//!
//! A final report (or whatever text the pipeline produced in its place) is
//! turned into a [`ReportDocument`] and rendered to PDF. When no font family
//! can be loaded, or genpdf fails, the same document is rendered as text.

pub mod document;
pub mod pdf;
pub mod text;

pub use document::{Block, ReportDocument};
pub use pdf::PdfError;

use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::analysis::FinalReport;

#[derive(Debug, Clone)]
pub enum ReportInput {
    Json(Value),
    Raw(String),
}

impl From<&FinalReport> for ReportInput {
    fn from(report: &FinalReport) -> Self {
        ReportInput::Json(report.to_value())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedReport {
    Pdf(Vec<u8>),
    Text(String),
}

impl RenderedReport {
    pub fn is_pdf(&self) -> bool {
        matches!(self, RenderedReport::Pdf(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RenderedReport::Pdf(bytes) => bytes,
            RenderedReport::Text(text) => text.as_bytes(),
        }
    }

    /// Conventional file extension for the rendered form
    pub fn extension(&self) -> &'static str {
        match self {
            RenderedReport::Pdf(_) => "pdf",
            RenderedReport::Text(_) => "txt",
        }
    }
}

/// Raw strings are parsed first. Anything that is not a JSON object becomes
/// the generation error document.
pub fn build_document(input: &ReportInput, subject: &str) -> ReportDocument {
    match input {
        ReportInput::Json(value) if value.is_object() => ReportDocument::from_value(value, subject),
        ReportInput::Json(value) => ReportDocument::parse_error(&value.to_string()),
        ReportInput::Raw(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) if value.is_object() => ReportDocument::from_value(&value, subject),
            _ => ReportDocument::parse_error(raw),
        },
    }
}

pub fn render(input: &ReportInput, subject: &str, font_dir: Option<&Path>) -> RenderedReport {
    let document = build_document(input, subject);

    let pdf = pdf::load_fonts(font_dir).and_then(|fonts| pdf::render_pdf(&document, fonts));
    match pdf {
        Ok(bytes) => {
            info!(subject, bytes = bytes.len(), "Rendered PDF report");
            RenderedReport::Pdf(bytes)
        }
        Err(e) => {
            warn!(subject, error = %e, "PDF rendering unavailable, using text report");
            RenderedReport::Text(text::render_text(&document))
        }
    }
}

/// Text rendering without attempting PDF
pub fn render_text(input: &ReportInput, subject: &str) -> String {
    text::render_text(&build_document(input, subject))
}
