//! PDF text extraction with per-page splitting.
//!
//! Extraction returns one string per page so chunk provenance can carry a
//! page number. The extractor emits a form feed between pages; splitting on
//! it reconstructs page boundaries without a second parse.

use std::path::Path;

/// Extraction error. The ingest pipeline skips the offending file and
/// continues.
#[derive(Debug)]
pub enum PdfError {
    Io(String),
    Extract(String),
    /// The document parsed but contained no extractable text, typically a
    /// scanned or image-only PDF.
    Empty,
}

impl std::fmt::Display for PdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfError::Io(e) => write!(f, "failed to read PDF: {}", e),
            PdfError::Extract(e) => write!(f, "PDF extraction failed: {}", e),
            PdfError::Empty => write!(f, "no extractable text in PDF"),
        }
    }
}

impl std::error::Error for PdfError {}

/// Extract the text of each page of a PDF file. Pages are 1-based in the
/// returned order; interior blank pages are kept so numbering stays aligned.
pub fn extract_pages(path: &Path) -> Result<Vec<String>, PdfError> {
    let bytes = std::fs::read(path).map_err(|e| PdfError::Io(e.to_string()))?;
    extract_pages_from_mem(&bytes)
}

/// Extract pages from in-memory PDF bytes.
pub fn extract_pages_from_mem(bytes: &[u8]) -> Result<Vec<String>, PdfError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| PdfError::Extract(e.to_string()))?;
    let pages = split_pages(&text);
    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(PdfError::Empty);
    }
    Ok(pages)
}

/// Split extracted text on the form-feed page separator, dropping trailing
/// blank pages produced by the final separator.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(|p| p.to_string()).collect();
    while pages.len() > 1 && pages.last().map(|p| p.trim().is_empty()).unwrap_or(false) {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_extract_error() {
        let err = extract_pages_from_mem(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Extract(_)));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let err = extract_pages(Path::new("/nonexistent/report.pdf")).unwrap_err();
        assert!(matches!(err, PdfError::Io(_)));
    }

    #[test]
    fn splits_on_form_feed_and_drops_trailing_blanks() {
        assert_eq!(split_pages("one\x0ctwo\x0c"), vec!["one", "two"]);
        assert_eq!(split_pages("only"), vec!["only"]);
        // Interior blank pages are kept so page numbers stay aligned.
        assert_eq!(split_pages("a\x0c\x0cb\x0c"), vec!["a", "", "b"]);
    }
}
