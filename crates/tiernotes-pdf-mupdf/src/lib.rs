use mupdf::{Document, TextPageFlags};

use tiernotes_core::{BackendError, PdfBackend};

/// MIME hint handed to MuPDF when opening an in-memory buffer.
const PDF_MIME: &str = "application/pdf";

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency so
/// that the rest of the workspace does not link against it directly.
///
/// Each text line MuPDF reports on a page is one fragment; fragments are
/// joined with single spaces in reading order.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_pages(&self, data: &[u8], max_pages: usize) -> Result<Vec<String>, BackendError> {
        let document = Document::from_bytes(data, PDF_MIME)
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::OpenError(e.to_string()))?
            .take(max_pages)
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let mut fragments = Vec::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    // Glyphs without a Unicode mapping contribute nothing.
                    let text: String = line.chars().filter_map(|c| c.char()).collect();
                    fragments.push(text);
                }
            }
            pages_text.push(fragments.join(" "));
        }

        Ok(pages_text)
    }
}
