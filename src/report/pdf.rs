//! PDF rendering through genpdf

use genpdf::elements::{Break, PageBreak, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::{Document, SimplePageDecorator};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::document::{Block, ReportDocument};

/// Directory and family name pairs tried after the configured font dir
const SYSTEM_FONTS: [(&str, &str); 4] = [
    ("/usr/share/fonts/truetype/liberation", "LiberationSans"),
    ("/usr/share/fonts/liberation", "LiberationSans"),
    ("/System/Library/Fonts", "Helvetica"),
    ("/Library/Fonts", "Arial"),
];

const DEFAULT_FAMILY: &str = "LiberationSans";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("No usable font family found (searched: {})", .searched.join(", "))]
    NoFonts { searched: Vec<String> },

    #[error("Failed to render PDF: {0}")]
    Render(String),
}

pub fn load_fonts(font_dir: Option<&Path>) -> Result<FontFamily<FontData>, PdfError> {
    let mut candidates: Vec<(PathBuf, &str)> = Vec::new();
    if let Some(dir) = font_dir {
        candidates.push((dir.to_path_buf(), DEFAULT_FAMILY));
    }
    candidates.extend(
        SYSTEM_FONTS
            .iter()
            .map(|(dir, family)| (PathBuf::from(dir), *family)),
    );

    let mut searched = Vec::new();
    for (dir, family) in candidates {
        match genpdf::fonts::from_files(&dir, family, None) {
            Ok(fonts) => {
                debug!(dir = %dir.display(), family, "Loaded PDF fonts");
                return Ok(fonts);
            }
            Err(_) => searched.push(format!("{}/{}", dir.display(), family)),
        }
    }
    Err(PdfError::NoFonts { searched })
}

pub fn render_pdf(
    document: &ReportDocument,
    fonts: FontFamily<FontData>,
) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::new(fonts);
    doc.set_title(document.title.clone());

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(30);
    doc.set_page_decorator(decorator);

    let title = Style::new().bold().with_font_size(18);
    let heading = Style::new().bold().with_font_size(14);
    let subheading = Style::new().bold().with_font_size(11);
    let label = Style::new().bold();

    for block in &document.blocks {
        match block {
            Block::Title(text) => {
                doc.push(Paragraph::new(StyledString::new(text.clone(), title)));
                doc.push(Break::new(1));
            }
            Block::Heading(text) => {
                doc.push(Break::new(0.5));
                doc.push(Paragraph::new(StyledString::new(text.clone(), heading)));
                doc.push(Break::new(0.5));
            }
            Block::Subheading(text) => {
                doc.push(Break::new(0.3));
                doc.push(Paragraph::new(StyledString::new(text.clone(), subheading)));
            }
            Block::Paragraph(text) => {
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    doc.push(Paragraph::new(line.to_string()));
                }
                doc.push(Break::new(0.5));
            }
            Block::Field { label: name, value } => {
                let mut paragraph = Paragraph::default();
                paragraph.push(StyledString::new(format!("{}: ", name), label));
                paragraph.push(value.clone());
                doc.push(paragraph);
            }
            Block::Bullets(items) => {
                for item in items {
                    doc.push(Paragraph::new(format!("\u{2022} {}", item)));
                }
            }
            Block::PageBreak => doc.push(PageBreak::new()),
        }
    }

    let mut bytes = Vec::new();
    doc.render(&mut bytes)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_dir_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        // An empty configured dir must be skipped, whatever the host has installed
        match load_fonts(Some(dir.path())) {
            Ok(_) => {}
            Err(PdfError::NoFonts { searched }) => {
                assert!(searched[0].starts_with(&dir.path().display().to_string()));
                assert_eq!(searched.len(), SYSTEM_FONTS.len() + 1);
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_no_fonts_message() {
        let err = PdfError::NoFonts {
            searched: vec!["/a/X".to_string(), "/b/Y".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No usable font family found (searched: /a/X, /b/Y)"
        );
    }
}
