//! Single-document session: the owned, atomically swappable slot that holds
//! the active document and its index.
//!
//! The boundary layer (HTTP or CLI) keeps one [`AssistantSession`] for the
//! whole process. Uploading builds everything (pages, segments,
//! fingerprint, populated index) *before* the slot is swapped under a
//! short write lock, so a reader can never observe an index belonging to one
//! document while the page set belongs to another. Question answering and
//! summarization clone the slot handle under a read lock and run against
//! that snapshot; concurrent readers over one built index are safe.
//!
//! Concurrent uploads are last-write-wins; serializing them is the boundary
//! layer's job.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::chunking::{Segment, split_pages};
use crate::config::{ChunkingProfile, RetrievalConfig};
use crate::embeddings::EmbeddingProvider;
use crate::extraction::ocr::{DisabledOcr, OcrEngine};
use crate::extraction::{Page, extract_pages};
use crate::fingerprint::fingerprint;
use crate::generation::Generator;
use crate::index::{SegmentIndex, UpsertOutcome};
use crate::stores::{InMemoryStore, VectorBackend};
use crate::types::RagError;

/// The resident document and everything derived from it.
pub struct ActiveDocument<B> {
    pub name: String,
    pub fingerprint: String,
    pub pages: Vec<Page>,
    pub segments: Vec<Segment>,
    pub index: SegmentIndex<B>,
}

/// Outcome of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReport {
    pub fingerprint: String,
    pub page_count: usize,
    pub segment_count: usize,
    /// True when the fingerprint was already indexed and no embedding work
    /// was performed (persistent profile only; ephemeral stores start
    /// empty).
    pub cache_hit: bool,
}

type BackendFactory<B> = Box<dyn Fn() -> B + Send + Sync>;

/// Process-wide assistant state: at most one resident document at a time.
pub struct AssistantSession<B> {
    embedder: Arc<dyn EmbeddingProvider>,
    qa_generator: Arc<dyn Generator>,
    summary_generator: Arc<dyn Generator>,
    ocr: Arc<dyn OcrEngine>,
    chunking: ChunkingProfile,
    retrieval: RetrievalConfig,
    backends: BackendFactory<B>,
    active: RwLock<Option<Arc<ActiveDocument<B>>>>,
}

impl AssistantSession<InMemoryStore> {
    /// Session in the ephemeral profile: every upload gets a fresh in-memory
    /// index that is discarded when the next document replaces it.
    pub fn ephemeral(
        embedder: Arc<dyn EmbeddingProvider>,
        qa_generator: Arc<dyn Generator>,
        summary_generator: Arc<dyn Generator>,
    ) -> Self {
        Self::builder()
            .embedder(embedder)
            .qa_generator(qa_generator)
            .summary_generator(summary_generator)
            .backend_factory(InMemoryStore::new)
            .build()
    }
}

impl<B> AssistantSession<B>
where
    B: VectorBackend,
{
    pub fn builder() -> AssistantSessionBuilder<B> {
        AssistantSessionBuilder::default()
    }

    /// Ingests a document and atomically replaces the active slot.
    ///
    /// Pipeline: extract pages (OCR fallback per page) → chunk → fingerprint
    /// → index upsert. Nothing is published on failure; in particular a
    /// parsed-but-textless document fails with [`RagError::EmptyDocument`]
    /// and leaves the previous document (if any) resident.
    pub async fn load_document(
        &self,
        name: impl Into<String>,
        bytes: &[u8],
    ) -> Result<UploadReport, RagError> {
        let name = name.into();
        let pages = extract_pages(bytes, self.ocr.as_ref()).await?;
        if pages.is_empty() {
            return Err(RagError::EmptyDocument);
        }

        let segments = split_pages(&pages, &self.chunking);
        let doc_fingerprint = fingerprint(bytes);

        let index = SegmentIndex::new((self.backends)(), self.embedder.clone(), self.retrieval);
        let outcome = index.upsert(&doc_fingerprint, &segments).await?;

        let report = UploadReport {
            fingerprint: doc_fingerprint.clone(),
            page_count: pages.len(),
            segment_count: segments.len(),
            cache_hit: outcome == UpsertOutcome::CacheHit,
        };
        info!(
            document = %name,
            pages = report.page_count,
            segments = report.segment_count,
            cache_hit = report.cache_hit,
            "document loaded"
        );

        let document = Arc::new(ActiveDocument {
            name,
            fingerprint: doc_fingerprint,
            pages,
            segments,
            index,
        });
        *self.active.write() = Some(document);
        Ok(report)
    }

    /// Answers a question against the active document.
    pub async fn ask(&self, question: &str) -> Result<String, RagError> {
        let document = self.active_document().ok_or(RagError::NoActiveDocument)?;
        crate::qa::answer_question(
            &document.index,
            question,
            self.qa_generator.as_ref(),
            self.retrieval.top_k,
        )
        .await
    }

    /// Summarizes the active document in a single stuffing call.
    pub async fn summarize(&self) -> Result<String, RagError> {
        let document = self.active_document().ok_or(RagError::NoActiveDocument)?;
        crate::summarize::summarize_pages(&document.pages, self.summary_generator.as_ref()).await
    }

    /// Handle to the resident document, if any. The handle stays internally
    /// consistent even if another upload replaces the slot afterwards.
    pub fn active_document(&self) -> Option<Arc<ActiveDocument<B>>> {
        self.active.read().clone()
    }
}

/// Builder for [`AssistantSession`].
pub struct AssistantSessionBuilder<B> {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    qa_generator: Option<Arc<dyn Generator>>,
    summary_generator: Option<Arc<dyn Generator>>,
    ocr: Arc<dyn OcrEngine>,
    chunking: ChunkingProfile,
    retrieval: RetrievalConfig,
    backends: Option<BackendFactory<B>>,
}

impl<B> Default for AssistantSessionBuilder<B> {
    fn default() -> Self {
        Self {
            embedder: None,
            qa_generator: None,
            summary_generator: None,
            ocr: Arc::new(DisabledOcr),
            chunking: ChunkingProfile::default(),
            retrieval: RetrievalConfig::default(),
            backends: None,
        }
    }
}

impl<B> AssistantSessionBuilder<B>
where
    B: VectorBackend,
{
    /// Embedding provider used at both index and query time.
    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Generator instance for question answering.
    #[must_use]
    pub fn qa_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.qa_generator = Some(generator);
        self
    }

    /// Generator instance for summarization.
    #[must_use]
    pub fn summary_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.summary_generator = Some(generator);
        self
    }

    /// OCR engine for image-only pages. Defaults to [`DisabledOcr`].
    #[must_use]
    pub fn ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    #[must_use]
    pub fn chunking(mut self, profile: ChunkingProfile) -> Self {
        self.chunking = profile;
        self
    }

    #[must_use]
    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Factory invoked once per upload. Ephemeral profile: return a fresh
    /// store. Persistent profile: return a clone of the shared durable
    /// store, so the upsert cache check can skip re-embedding.
    #[must_use]
    pub fn backend_factory(mut self, factory: impl Fn() -> B + Send + Sync + 'static) -> Self {
        self.backends = Some(Box::new(factory));
        self
    }

    /// Builds the session.
    ///
    /// # Panics
    ///
    /// Panics when the embedder, either generator, or the backend factory
    /// was not provided.
    pub fn build(self) -> AssistantSession<B> {
        AssistantSession {
            embedder: self.embedder.expect("session requires an embedder"),
            qa_generator: self
                .qa_generator
                .expect("session requires a QA generator"),
            summary_generator: self
                .summary_generator
                .expect("session requires a summary generator"),
            ocr: self.ocr,
            chunking: self.chunking,
            retrieval: self.retrieval,
            backends: self.backends.expect("session requires a backend factory"),
            active: RwLock::new(None),
        }
    }
}
