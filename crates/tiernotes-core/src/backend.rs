use thiserror::Error;

/// PDF files may carry junk before the header; readers look this far for it.
const HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors provide the low-level text extraction step; sanitizing,
/// classification and rendering live in [`crate::pipeline::Pipeline`].
pub trait PdfBackend: Send + Sync {
    /// Extract the text of the first `max_pages` pages of an in-memory PDF.
    ///
    /// Each entry holds one page, its text fragments joined by single spaces.
    fn extract_pages(&self, data: &[u8], max_pages: usize) -> Result<Vec<String>, BackendError>;
}

/// Check for the `%PDF-` magic within the header search window.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Run a backend against `data`, rejecting non-PDF buffers up front, and join
/// the page texts with single spaces.
pub fn extract_text(
    backend: &dyn PdfBackend,
    data: &[u8],
    max_pages: usize,
) -> Result<String, BackendError> {
    if !looks_like_pdf(data) {
        return Err(BackendError::OpenError("missing %PDF- header".into()));
    }
    let pages = backend.extract_pages(data, max_pages)?;
    Ok(pages.join(" "))
}


#[cfg(test)]
mod tests {
    use super::mock::MockBackend;
    use super::*;

    #[test]
    fn test_looks_like_pdf() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(looks_like_pdf(b"\x00\x00junk%PDF-1.4"));
        assert!(!looks_like_pdf(b"hello world"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn test_header_beyond_window_rejected() {
        let mut data = vec![b' '; HEADER_SEARCH_WINDOW];
        data.extend_from_slice(b"%PDF-1.4");
        assert!(!looks_like_pdf(&data));
    }

    #[test]
    fn test_extract_text_joins_pages_with_space() {
        let backend = MockBackend::new(["first page", "second page", "third page"]);
        let text = extract_text(&backend, b"%PDF-1.4", 2).unwrap();
        assert_eq!(text, "first page second page");
    }

    #[test]
    fn test_extract_text_rejects_non_pdf_without_calling_backend() {
        let backend = MockBackend::new(["unused"]);
        let err = extract_text(&backend, b"plain text upload", 15).unwrap_err();
        assert!(matches!(err, BackendError::OpenError(_)));
        assert_eq!(backend.call_count(), 0);
    }
}
