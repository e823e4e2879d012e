//! Single-document retrieval-augmented assistant.
//!
//! The crate turns one uploaded PDF into a queryable knowledge source:
//!
//! ```text
//! PDF bytes ──► extraction (native text, per-page OCR fallback) ──► Pages
//!
//! Pages ──► chunking::split_pages ──► Segments
//!       └─► summarize (whole-document stuffing)
//!
//! PDF bytes ──► fingerprint ──┐
//!                             │
//! Segments ──► embeddings ──► index::SegmentIndex ──► stores (memory / sqlite-vec)
//!                             │
//! Question ──► qa::answer_question ◄── MMR-ranked segments
//! ```
//!
//! [`session::AssistantSession`] ties the pipeline together behind a
//! single-document slot that is atomically replaced on each upload. Provider
//! seams ([`embeddings::EmbeddingProvider`], [`generation::Generator`],
//! [`extraction::ocr::OcrEngine`], [`stores::VectorBackend`]) keep the
//! pipeline testable without network services.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod extraction;
pub mod fingerprint;
pub mod generation;
pub mod index;
pub mod news;
pub mod qa;
pub mod session;
pub mod stores;
pub mod summarize;
pub mod types;

pub use config::{ChunkingProfile, GenerationSettings, RetrievalConfig};
pub use session::{AssistantSession, UploadReport};
pub use types::RagError;
