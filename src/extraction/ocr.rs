//! Optical character recognition seam for image-only pages.
//!
//! The extractor only knows the [`OcrEngine`] contract; concrete engines
//! render a single page and recognize its text. The tesseract-backed engine
//! is gated behind the `ocr-tesseract` feature because it shells out to the
//! system `tesseract` and poppler binaries.

use async_trait::async_trait;

use crate::types::RagError;

/// Recognizes the text of one page of a document.
///
/// Implementations receive the full raw document plus a 1-based page number
/// and are responsible for rendering that page themselves. Rendering happens
/// lazily, only for pages whose native extraction came up empty.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Returns the recognized text for the page, or an empty string when the
    /// page holds nothing recognizable. Errors mean the recognition attempt
    /// itself failed and must not be confused with "no text found".
    async fn recognize_page(&self, document: &[u8], page_number: u32) -> Result<String, RagError>;
}

/// Engine for deployments without OCR tooling: recognizes nothing.
///
/// With this engine, image-only pages are simply dropped from extraction.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledOcr;

#[async_trait]
impl OcrEngine for DisabledOcr {
    async fn recognize_page(&self, _document: &[u8], _page_number: u32) -> Result<String, RagError> {
        Ok(String::new())
    }
}

#[cfg(feature = "ocr-tesseract")]
pub use tesseract::TesseractOcr;

#[cfg(feature = "ocr-tesseract")]
mod tesseract {
    use super::*;
    use pdf2image::{PDF, Pages, RenderOptionsBuilder};

    /// OCR engine backed by the system tesseract binary, with page
    /// rasterization through poppler (`pdftoppm`).
    #[derive(Clone, Debug)]
    pub struct TesseractOcr {
        language: String,
    }

    impl TesseractOcr {
        /// Engine recognizing the given tesseract language pack, e.g. `eng`.
        pub fn new(language: impl Into<String>) -> Self {
            Self {
                language: language.into(),
            }
        }
    }

    impl Default for TesseractOcr {
        fn default() -> Self {
            Self::new("eng")
        }
    }

    #[async_trait]
    impl OcrEngine for TesseractOcr {
        async fn recognize_page(
            &self,
            document: &[u8],
            page_number: u32,
        ) -> Result<String, RagError> {
            let bytes = document.to_vec();
            let language = self.language.clone();
            // Rendering and recognition are blocking subprocess work.
            tokio::task::spawn_blocking(move || recognize_blocking(bytes, page_number, language))
                .await
                .map_err(|err| RagError::Extraction(err.to_string()))?
        }
    }

    fn recognize_blocking(
        bytes: Vec<u8>,
        page_number: u32,
        language: String,
    ) -> Result<String, RagError> {
        let pdf = PDF::from_bytes(bytes).map_err(|err| RagError::Extraction(err.to_string()))?;
        let options = RenderOptionsBuilder::default()
            .build()
            .map_err(|err| RagError::Extraction(err.to_string()))?;
        let rendered = pdf
            .render(Pages::Range(page_number..=page_number), options)
            .map_err(|err| RagError::Extraction(err.to_string()))?;
        let Some(image) = rendered.into_iter().next() else {
            return Ok(String::new());
        };

        let image = rusty_tesseract::Image::from_dynamic_image(&image)
            .map_err(|err| RagError::Extraction(err.to_string()))?;
        let args = rusty_tesseract::Args {
            lang: language,
            ..Default::default()
        };
        rusty_tesseract::image_to_string(&image, &args)
            .map_err(|err| RagError::Extraction(err.to_string()))
    }
}
