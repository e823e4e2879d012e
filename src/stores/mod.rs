//! Storage backends for segment embeddings.
//!
//! A [`VectorBackend`] stores `(record, vector)` pairs and answers raw
//! nearest-neighbor queries; relevance/diversity re-ranking happens one layer
//! up in [`crate::index::SegmentIndex`]. Two backends cover the two
//! deployment profiles:
//!
//! - [`memory::InMemoryStore`]: ephemeral; a fresh store per upload,
//!   discarded when the next document replaces it.
//! - [`sqlite::SqliteSegmentStore`]: persistent; one durable store shared
//!   across uploads, with a keyed fingerprint existence check so
//!   byte-identical re-uploads skip embedding entirely.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use memory::InMemoryStore;
pub use sqlite::SqliteSegmentStore;

/// A stored segment, identified by `{fingerprint}_{ordinal}`.
///
/// The identifier is globally unique because it combines the document's
/// content fingerprint with the segment's ordinal in the flat chunk sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: String,
    pub fingerprint: String,
    /// 1-based source page.
    pub page: u32,
    /// Position in the document's flat segment sequence.
    pub ordinal: usize,
    pub content: String,
}

impl SegmentRecord {
    /// Canonical record identifier for a segment ordinal of a document.
    pub fn identifier(fingerprint: &str, ordinal: usize) -> String {
        format!("{fingerprint}_{ordinal}")
    }
}

/// A search hit: the record, its stored vector, and its cosine similarity to
/// the query. Vectors are unit-normalized, so similarity is a plain dot
/// product; the vector is carried along for diversity re-ranking.
#[derive(Clone, Debug)]
pub struct ScoredSegment {
    pub record: SegmentRecord,
    pub embedding: Vec<f32>,
    pub similarity: f32,
}

/// Raw vector storage contract.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// True iff any stored record belongs to the given document fingerprint.
    async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool, RagError>;

    /// Stores records with their (already normalized) embeddings.
    async fn insert_segments(
        &self,
        records: Vec<(SegmentRecord, Vec<f32>)>,
    ) -> Result<(), RagError>;

    /// Returns up to `limit` records ranked by raw cosine similarity to
    /// `query`, most similar first.
    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredSegment>, RagError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, RagError>;
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_combines_fingerprint_and_ordinal() {
        assert_eq!(SegmentRecord::identifier("abc123", 4), "abc123_4");
    }

    #[test]
    fn dot_of_unit_vectors_is_cosine() {
        assert!((dot(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(dot(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }
}
