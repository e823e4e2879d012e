//! Ephemeral in-memory backend for single-document mode.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use super::{ScoredSegment, SegmentRecord, VectorBackend, dot};
use crate::types::RagError;

/// In-memory vector store, discarded together with its document.
///
/// Cloning shares the underlying storage; `search` takes a read lock, so
/// concurrent readers over an already-built index never block each other.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    rows: Arc<RwLock<Vec<(SegmentRecord, Vec<f32>)>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorBackend for InMemoryStore {
    async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool, RagError> {
        Ok(self
            .rows
            .read()
            .iter()
            .any(|(record, _)| record.fingerprint == fingerprint))
    }

    async fn insert_segments(
        &self,
        records: Vec<(SegmentRecord, Vec<f32>)>,
    ) -> Result<(), RagError> {
        self.rows.write().extend(records);
        Ok(())
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredSegment>, RagError> {
        let mut hits: Vec<ScoredSegment> = self
            .rows
            .read()
            .iter()
            .map(|(record, embedding)| ScoredSegment {
                record: record.clone(),
                embedding: embedding.clone(),
                similarity: dot(query, embedding),
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, RagError> {
        Ok(self.rows.read().len())
    }
}
