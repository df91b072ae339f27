//! Text extraction for the supported document formats.
//!
//! Dispatches on file extension: `.txt`/`.md` are read as UTF-8, `.pdf` goes
//! through `pdf-extract`, `.docx` is unzipped and its `w:t` text runs are
//! collected with `quick-xml`. Extraction never panics; a failure returns a
//! typed [`ParseError`] and the ingestion pipeline skips the document.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Extensions the discovery scan will pick up.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["txt", "md", "pdf", "docx"];

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Return true if `path` has a supported extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Extract plain text from a document on disk.
pub fn parse_document(path: &Path) -> Result<String, ParseError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "md" => std::fs::read_to_string(path).map_err(|e| ParseError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
        "pdf" => parse_pdf(path),
        "docx" => parse_docx(path),
        other => Err(ParseError::Unsupported(other.to_string())),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ParseError> {
    std::fs::read(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn parse_pdf(path: &Path) -> Result<String, ParseError> {
    let bytes = read_bytes(path)?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ParseError::Pdf(e.to_string()))
}

fn parse_docx(path: &Path) -> Result<String, ParseError> {
    let bytes = read_bytes(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| ParseError::Docx(e.to_string()))?;

    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ParseError::Docx("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ParseError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ParseError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    collect_text_runs(&doc_xml)
}

/// Walk the document XML and concatenate `w:t` text runs, inserting
/// newlines at paragraph ends so the segmenter sees real boundaries.
fn collect_text_runs(xml: &[u8]) -> Result<String, ParseError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ParseError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn supported_extension_check() {
        assert!(is_supported(Path::new("notes.md")));
        assert!(is_supported(Path::new("Resume.PDF")));
        assert!(!is_supported(Path::new("photo.png")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn unsupported_extension_returns_error() {
        let err = parse_document(Path::new("image.png")).unwrap_err();
        assert!(matches!(err, ParseError::Unsupported(_)));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let err = parse_document(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn plain_text_roundtrips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Alice studied Biology.").unwrap();
        assert_eq!(parse_document(&path).unwrap(), "Alice studied Biology.");
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        let err = parse_document(&path).unwrap_err();
        assert!(matches!(err, ParseError::Pdf(_)));
    }

    #[test]
    fn docx_text_runs_extracted() {
        let dir = tempfile::TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("doc.docx");

        let file = std::fs::File::create(&path).unwrap();
        let mut archive = zip::ZipWriter::new(file);
        archive
            .start_file::<_, ()>("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        archive
            .write_all(
                br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
  </w:body>
</w:document>"#,
            )
            .unwrap();
        archive.finish().unwrap();

        let text = parse_document(&path).unwrap();
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
    }

    #[test]
    fn invalid_docx_returns_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        let err = parse_document(&path).unwrap_err();
        assert!(matches!(err, ParseError::Docx(_)));
    }
}
