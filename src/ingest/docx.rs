//! Plain-text extraction from WordprocessingML packages

use roxmltree::{Document, Node};
use std::io::{Cursor, Read};
use thiserror::Error;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("{0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to read word/document.xml: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Returns one line per paragraph, in document order
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    let doc = Document::parse(&xml)?;
    let paragraphs: Vec<String> = doc
        .descendants()
        .filter(|n| n.has_tag_name((WORD_NS, "p")))
        .map(paragraph_text)
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: Node) -> String {
    let mut text = String::new();
    for node in paragraph.descendants() {
        if node.tag_name().namespace() != Some(WORD_NS) {
            continue;
        }
        match node.tag_name().name() {
            "t" => text.push_str(node.text().unwrap_or("")),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}
