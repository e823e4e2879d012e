//! Embedding-service seam.
//!
//! The index only knows the [`EmbeddingProvider`] contract. The same provider
//! instance must serve both index time and query time, otherwise the query
//! vector lives in a different space than the stored segment vectors.
//!
//! Vectors are unit-normalized at encode time, so cosine similarity reduces
//! to a dot product everywhere downstream.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rig::embeddings::embedding::EmbeddingModel;

use crate::types::RagError;

/// Embeds text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts, one vector per input, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Adapter exposing any rig [`EmbeddingModel`] as an [`EmbeddingProvider`].
#[derive(Clone)]
pub struct RigEmbeddingProvider<M> {
    model: M,
    name: String,
}

impl<M> RigEmbeddingProvider<M>
where
    M: EmbeddingModel,
{
    pub fn new(model: M, name: impl Into<String>) -> Self {
        Self {
            model,
            name: name.into(),
        }
    }
}

#[async_trait]
impl<M> EmbeddingProvider for RigEmbeddingProvider<M>
where
    M: EmbeddingModel + Sync,
{
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self
            .model
            .embed_texts(texts.to_vec())
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        if embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "provider returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings
            .into_iter()
            .map(|embedding| embedding.vec.into_iter().map(|v| v as f32).collect())
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Deterministic in-process provider for tests and offline runs.
///
/// Vectors are derived from a hash of the input text, unit-normalized, and
/// stable across calls; identical texts always embed identically. The
/// provider counts its batch calls so tests can assert that cache hits
/// perform no embedding work.
#[derive(Debug, Default)]
pub struct MockEmbeddingProvider {
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    /// Dimensionality of the mock vectors.
    pub const DIMS: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `embed_batch` invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed_one(text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut vector: Vec<f32> = (0..Self::DIMS)
            .map(|i| {
                let bits = seed.rotate_left((i as u32) * 7) ^ ((i as u64) << 17);
                (bits % 2048) as f32 / 2048.0 - 0.5
            })
            .collect();
        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| Self::embed_one(text)).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let mut vector = vec![3.0, 4.0];
        normalize(&mut vector);
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut vector = vec![0.0, 0.0, 0.0];
        normalize(&mut vector);
        assert_eq!(vector, vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic_and_unit_length() {
        let provider = MockEmbeddingProvider::new();
        let texts = vec!["plaintiff".to_string(), "defendant".to_string()];

        let first = provider.embed_batch(&texts).await.unwrap();
        let second = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);

        for vector in &first {
            let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
        assert_eq!(provider.call_count(), 2);
    }
}
