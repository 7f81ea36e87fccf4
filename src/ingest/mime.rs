//! Content sniffing from leading bytes

use std::io::Cursor;
use std::path::Path;

pub const PDF: &str = "application/pdf";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MSWORD: &str = "application/msword";

const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Detects a MIME type from magic bytes, `None` when unrecognized
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF") {
        return Some(PDF);
    }
    if bytes.starts_with(b"PK\x03\x04") {
        return Some(if is_word_package(bytes) {
            DOCX
        } else {
            "application/zip"
        });
    }
    if bytes.starts_with(&OLE2_MAGIC) {
        return Some(MSWORD);
    }
    if bytes.starts_with(b"\x89PNG") {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF8") {
        return Some("image/gif");
    }
    None
}

fn is_word_package(bytes: &[u8]) -> bool {
    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(bytes)) else {
        return false;
    };
    let found = archive.by_name("word/document.xml").is_ok();
    found
}

/// MIME implied by a file extension, used as the declared type for local files
pub fn from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF),
        "docx" => Some(DOCX),
        "doc" => Some(MSWORD),
        "txt" => Some("text/plain"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

pub fn is_word(mime: &str) -> bool {
    mime == DOCX || mime == MSWORD
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with(entry: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(entry, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_sniff_pdf() {
        assert_eq!(sniff(b"%PDF-1.7\n..."), Some(PDF));
    }

    #[test]
    fn test_sniff_docx_vs_plain_zip() {
        assert_eq!(sniff(&zip_with("word/document.xml")), Some(DOCX));
        assert_eq!(sniff(&zip_with("data.csv")), Some("application/zip"));
    }

    #[test]
    fn test_sniff_ole2() {
        let mut bytes = OLE2_MAGIC.to_vec();
        bytes.extend_from_slice(&[0; 16]);
        assert_eq!(sniff(&bytes), Some(MSWORD));
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(sniff(b"plain text notes"), None);
        assert_eq!(sniff(&[]), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(from_extension(Path::new("deck.PDF")), Some(PDF));
        assert_eq!(from_extension(Path::new("memo.docx")), Some(DOCX));
        assert_eq!(from_extension(Path::new("archive.tar")), None);
        assert_eq!(from_extension(Path::new("README")), None);
    }
}
