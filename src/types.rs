//! Shared error taxonomy for the document pipeline.
//!
//! Every fallible operation in the crate returns [`RagError`]. Variants map
//! one-to-one onto the failure classes callers need to distinguish: a corrupt
//! upload reads differently to a user than a scanned document with no
//! recognizable text, and an upstream generation failure must never be
//! presented as "the document does not answer this question".

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum RagError {
    /// The uploaded bytes could not be parsed as a document at all.
    #[error("document could not be parsed: {0}")]
    Extraction(String),

    /// The document parsed, but no page yielded non-whitespace text from
    /// either native extraction or OCR.
    #[error("document contains no extractable text")]
    EmptyDocument,

    /// A question or summary was requested while no document is resident.
    #[error("no active document loaded")]
    NoActiveDocument,

    /// The embedding service rejected or failed a request.
    #[error("embedding service failure: {0}")]
    Embedding(String),

    /// The generation service rejected or failed a request. Distinct from a
    /// grounded "the context is insufficient" answer, which is a success.
    #[error("answer generation failed: {0}")]
    Generation(String),

    /// Vector storage failure (sqlite, sqlite-vec, or the in-memory store).
    #[error("vector storage failure: {0}")]
    Storage(String),

    /// HTTP transport failure (news client).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_distinguishes_empty_from_unparsable() {
        let corrupt = RagError::Extraction("bad xref table".into());
        let blank = RagError::EmptyDocument;
        assert!(corrupt.to_string().contains("could not be parsed"));
        assert!(blank.to_string().contains("no extractable text"));
        assert_ne!(corrupt.to_string(), blank.to_string());
    }
}
