//! Document-level vector index: cache-aware insertion and diversity-aware
//! retrieval over a [`VectorBackend`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::chunking::Segment;
use crate::config::RetrievalConfig;
use crate::embeddings::{EmbeddingProvider, normalize};
use crate::stores::{ScoredSegment, SegmentRecord, VectorBackend, dot};
use crate::types::RagError;

/// Result of an [`SegmentIndex::upsert`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The fingerprint was already present; nothing was embedded or stored.
    CacheHit,
    /// Segments were embedded and stored.
    Indexed { segment_count: usize },
}

/// Vector index for one embedding space.
///
/// Couples a storage backend with the embedding provider that populated it;
/// queries embed through the same provider, which keeps index-time and
/// query-time vectors in a single space.
pub struct SegmentIndex<B> {
    backend: B,
    embedder: Arc<dyn EmbeddingProvider>,
    retrieval: RetrievalConfig,
}

impl<B> SegmentIndex<B>
where
    B: VectorBackend,
{
    pub fn new(backend: B, embedder: Arc<dyn EmbeddingProvider>, retrieval: RetrievalConfig) -> Self {
        Self {
            backend,
            embedder,
            retrieval,
        }
    }

    /// Embeds and stores a document's segments under
    /// `{fingerprint}_{ordinal}` identifiers.
    ///
    /// Idempotent: when the fingerprint is already present the call is a
    /// complete no-op (no embedding work, no partial merge), so redundant
    /// re-uploads of byte-identical content are free.
    pub async fn upsert(
        &self,
        fingerprint: &str,
        segments: &[Segment],
    ) -> Result<UpsertOutcome, RagError> {
        if self.backend.contains_fingerprint(fingerprint).await? {
            info!(fingerprint, "document already indexed, skipping embedding");
            return Ok(UpsertOutcome::CacheHit);
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let mut vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != segments.len() {
            return Err(RagError::Embedding(format!(
                "expected {} vectors, provider returned {}",
                segments.len(),
                vectors.len()
            )));
        }
        for vector in &mut vectors {
            normalize(vector);
        }

        let records: Vec<(SegmentRecord, Vec<f32>)> = segments
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(ordinal, (segment, vector))| {
                (
                    SegmentRecord {
                        id: SegmentRecord::identifier(fingerprint, ordinal),
                        fingerprint: fingerprint.to_string(),
                        page: segment.page,
                        ordinal,
                        content: segment.text.clone(),
                    },
                    vector,
                )
            })
            .collect();

        let segment_count = records.len();
        self.backend.insert_segments(records).await?;
        info!(
            fingerprint,
            segment_count,
            embedder = self.embedder.name(),
            "document indexed"
        );
        Ok(UpsertOutcome::Indexed { segment_count })
    }

    /// Retrieves the `k` most relevant segments for `text`, re-ranked for
    /// diversity.
    ///
    /// A candidate pool of raw nearest neighbors is fetched first, then `k`
    /// results are selected by maximal marginal relevance so a repetitive
    /// document does not fill the whole context with near-duplicates.
    /// Returns `min(k, indexed)` results with no duplicate identifiers.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredSegment>, RagError> {
        let mut vectors = self.embedder.embed_batch(&[text.to_string()]).await?;
        let mut query_vec = vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("provider returned no query vector".into()))?;
        normalize(&mut query_vec);

        let pool_size = usize::max(self.retrieval.candidate_pool, k);
        let pool = self.backend.search(&query_vec, pool_size).await?;
        debug!(candidates = pool.len(), k, "re-ranking candidate pool");
        Ok(mmr_select(pool, k, self.retrieval.mmr_lambda))
    }

    pub async fn count(&self) -> Result<usize, RagError> {
        self.backend.count().await
    }

    pub async fn is_empty(&self) -> Result<bool, RagError> {
        Ok(self.count().await? == 0)
    }
}

/// Maximal-marginal-relevance selection.
///
/// Iteratively picks the candidate maximizing
/// `lambda * relevance − (1 − lambda) * max_similarity_to_selected`
/// until `k` items are chosen or the pool is exhausted. With `lambda = 1`
/// this degenerates to plain top-k by relevance.
fn mmr_select(pool: Vec<ScoredSegment>, k: usize, lambda: f32) -> Vec<ScoredSegment> {
    let mut remaining = pool;
    let mut selected: Vec<ScoredSegment> = Vec::with_capacity(k.min(remaining.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (idx, candidate) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|chosen| dot(&candidate.embedding, &chosen.embedding))
                .fold(0.0_f32, f32::max);
            let score = lambda * candidate.similarity - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best = idx;
            }
        }
        selected.push(remaining.swap_remove(best));
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;
    use crate::stores::InMemoryStore;
    use std::collections::HashSet;

    fn segment(page: u32, text: &str) -> Segment {
        Segment {
            page,
            text: text.to_string(),
        }
    }

    fn index_with_mock() -> (SegmentIndex<InMemoryStore>, Arc<MockEmbeddingProvider>) {
        let embedder = Arc::new(MockEmbeddingProvider::new());
        let index = SegmentIndex::new(
            InMemoryStore::new(),
            embedder.clone(),
            RetrievalConfig::default(),
        );
        (index, embedder)
    }

    #[tokio::test]
    async fn upsert_assigns_sequential_identifiers() {
        let (index, _) = index_with_mock();
        let segments = vec![segment(1, "first"), segment(1, "second"), segment(2, "third")];
        let outcome = index.upsert("fp", &segments).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Indexed { segment_count: 3 });

        let hits = index.query("first", 3).await.unwrap();
        let ids: HashSet<String> = hits.iter().map(|h| h.record.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("fp_0") && ids.contains("fp_1") && ids.contains("fp_2"));
    }

    #[tokio::test]
    async fn second_upsert_of_same_fingerprint_is_a_cache_hit() {
        let (index, embedder) = index_with_mock();
        let segments = vec![segment(1, "alpha"), segment(1, "beta")];

        assert_eq!(
            index.upsert("fp", &segments).await.unwrap(),
            UpsertOutcome::Indexed { segment_count: 2 }
        );
        let calls_after_first = embedder.call_count();

        assert_eq!(
            index.upsert("fp", &segments).await.unwrap(),
            UpsertOutcome::CacheHit
        );
        assert_eq!(embedder.call_count(), calls_after_first);
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn query_returns_min_of_k_and_total_without_duplicates() {
        let (index, _) = index_with_mock();
        index
            .upsert("fp", &[segment(1, "only"), segment(1, "two")])
            .await
            .unwrap();

        let hits = index.query("anything", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        let ids: HashSet<&str> = hits.iter().map(|h| h.record.id.as_str()).collect();
        assert_eq!(ids.len(), hits.len());
    }

    fn scored(id: &str, embedding: Vec<f32>, similarity: f32) -> ScoredSegment {
        ScoredSegment {
            record: SegmentRecord {
                id: id.to_string(),
                fingerprint: "fp".to_string(),
                page: 1,
                ordinal: 0,
                content: id.to_string(),
            },
            embedding,
            similarity,
        }
    }

    #[test]
    fn mmr_prefers_diverse_results_over_near_duplicates() {
        // Two near-identical top candidates plus one distinct one. Naive
        // top-2 takes both duplicates; MMR with lambda < 1 takes one of
        // each.
        let pool = vec![
            scored("dup_a", vec![1.0, 0.0], 0.99),
            scored("dup_b", vec![0.999, 0.045], 0.98),
            scored("other", vec![0.0, 1.0], 0.40),
        ];

        let naive: Vec<&str> = pool.iter().take(2).map(|s| s.record.id.as_str()).collect();
        assert_eq!(naive, vec!["dup_a", "dup_b"]);

        let selected = mmr_select(pool, 2, 0.5);
        let ids: Vec<&str> = selected.iter().map(|s| s.record.id.as_str()).collect();
        assert_eq!(ids, vec!["dup_a", "other"]);

        let pairwise = dot(&selected[0].embedding, &selected[1].embedding);
        assert!(pairwise < 0.9, "selected pair should be dissimilar");
    }

    #[test]
    fn mmr_with_lambda_one_is_plain_top_k() {
        let pool = vec![
            scored("a", vec![1.0, 0.0], 0.9),
            scored("b", vec![0.99, 0.14], 0.8),
            scored("c", vec![0.0, 1.0], 0.1),
        ];
        let selected = mmr_select(pool, 2, 1.0);
        let ids: Vec<&str> = selected.iter().map(|s| s.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn mmr_exhausts_small_pools() {
        let pool = vec![scored("a", vec![1.0, 0.0], 0.9)];
        assert_eq!(mmr_select(pool, 5, 0.5).len(), 1);
        assert!(mmr_select(Vec::new(), 5, 0.5).is_empty());
    }
}
