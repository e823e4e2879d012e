//! Document text extraction with per-page OCR fallback.
//!
//! Native PDF text extraction is attempted first for every page; only pages
//! whose native text is empty or whitespace are handed to the configured
//! [`OcrEngine`](ocr::OcrEngine). Pages where both methods come up empty are
//! omitted from the result rather than represented as blank pages.

pub mod ocr;

use lopdf::Document;
use tracing::debug;

use crate::types::RagError;
use ocr::OcrEngine;

pub use ocr::DisabledOcr;
#[cfg(feature = "ocr-tesseract")]
pub use ocr::TesseractOcr;

/// One unit of extraction: a page number (1-based, source order) and the
/// non-whitespace text recovered for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

/// Extracts the ordered page texts of a PDF document.
///
/// Fails with [`RagError::Extraction`] when the bytes are not a parsable
/// document. An `Ok(vec![])` result means the document parsed but no page
/// produced text; callers decide whether that is an error
/// ([`RagError::EmptyDocument`] at the session layer).
///
/// OCR engine failures propagate: a page whose recognition errored is never
/// silently reported as "no text on this page".
pub async fn extract_pages(bytes: &[u8], ocr: &dyn OcrEngine) -> Result<Vec<Page>, RagError> {
    let document =
        Document::load_mem(bytes).map_err(|err| RagError::Extraction(err.to_string()))?;

    let mut pages = Vec::new();
    for (&number, _) in document.get_pages().iter() {
        // Pages without a text layer surface as extraction errors in lopdf;
        // both cases fall through to the OCR attempt.
        let native = document.extract_text(&[number]).unwrap_or_default();
        let native = native.trim();
        if !native.is_empty() {
            pages.push(Page {
                number,
                text: native.to_string(),
            });
            continue;
        }

        debug!(page = number, "no native text, falling back to OCR");
        let recognized = ocr.recognize_page(bytes, number).await?;
        let recognized = recognized.trim();
        if !recognized.is_empty() {
            pages.push(Page {
                number,
                text: recognized.to_string(),
            });
        } else {
            debug!(page = number, "page dropped: native and OCR both empty");
        }
    }

    Ok(pages)
}
