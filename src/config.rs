//! Named configuration values for the pipeline.
//!
//! Every tunable that affects observable behavior lives here as an explicit
//! field with one documented default; nothing is buried as a literal inside
//! the pipeline code.

/// Windowed chunking parameters.
///
/// Pages are split into segments of at most `max_chars` characters, with
/// consecutive segments on the same page sharing `overlap_chars` characters.
/// The window never crosses a page boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkingProfile {
    /// Maximum segment length, in characters.
    pub max_chars: usize,
    /// Characters shared between consecutive segments of the same page.
    /// Must be strictly smaller than `max_chars`.
    pub overlap_chars: usize,
}

impl ChunkingProfile {
    /// Builds a profile, enforcing `overlap_chars < max_chars`.
    ///
    /// # Panics
    ///
    /// Panics when the overlap is not strictly smaller than the window; a
    /// non-advancing window would loop forever.
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        assert!(
            overlap_chars < max_chars,
            "chunk overlap ({overlap_chars}) must be smaller than the window ({max_chars})"
        );
        Self {
            max_chars,
            overlap_chars,
        }
    }

    /// Profile used by offline/batch deployments: larger windows, more
    /// overlap, fewer generation-context switches.
    pub fn offline() -> Self {
        Self::new(1000, 200)
    }

    /// Window advance per segment.
    pub(crate) fn step(&self) -> usize {
        self.max_chars - self.overlap_chars
    }
}

impl Default for ChunkingProfile {
    /// 800-character windows with 100 characters of overlap.
    fn default() -> Self {
        Self::new(800, 100)
    }
}

/// Retrieval parameters for [`crate::index::SegmentIndex::query`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalConfig {
    /// Number of segments handed to the generator as grounding context.
    pub top_k: usize,
    /// Size of the raw-similarity candidate pool re-ranked by maximal
    /// marginal relevance. Always at least `top_k` at query time.
    pub candidate_pool: usize,
    /// MMR trade-off: 1.0 is pure relevance, 0.0 is pure diversity.
    pub mmr_lambda: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            candidate_pool: 20,
            mmr_lambda: 0.5,
        }
    }
}

/// Settings for one configured generation-service instance.
///
/// The answering and summarization paths each hold their own instance; the
/// defaults below reproduce the two deployments this crate grew out of.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    /// Provider-side model identifier.
    pub model: String,
    /// Sampling temperature passed to the provider.
    pub temperature: f64,
}

impl GenerationSettings {
    /// Default instance for grounded question answering.
    pub fn qa_default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.2,
        }
    }

    /// Default instance for whole-document summarization.
    pub fn summary_default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_800_by_100() {
        let profile = ChunkingProfile::default();
        assert_eq!(profile.max_chars, 800);
        assert_eq!(profile.overlap_chars, 100);
        assert_eq!(profile.step(), 700);
    }

    #[test]
    fn offline_profile_is_1000_by_200() {
        let profile = ChunkingProfile::offline();
        assert_eq!(profile.max_chars, 1000);
        assert_eq!(profile.overlap_chars, 200);
    }

    #[test]
    #[should_panic(expected = "must be smaller")]
    fn rejects_overlap_equal_to_window() {
        let _ = ChunkingProfile::new(100, 100);
    }
}
