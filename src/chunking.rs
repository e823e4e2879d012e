//! Deterministic windowed chunking of extracted pages.
//!
//! Each page is split independently: a window of
//! [`max_chars`](crate::config::ChunkingProfile::max_chars) characters slides
//! over the page text with a step of `max_chars - overlap_chars`, so
//! consecutive segments from the same page share exactly the configured
//! overlap. Windows never cross page boundaries, and the whole operation is a
//! pure function of the page texts and the profile.

use crate::config::ChunkingProfile;
use crate::extraction::Page;

/// A retrieval-sized span of one page's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// 1-based page the text was taken from.
    pub page: u32,
    pub text: String,
}

/// Splits pages into a flat, ordered segment sequence.
///
/// For a page of `L` characters this yields `ceil(L / (max - overlap))`
/// segments; the final segment may be shorter than the window. Pages are
/// processed in order, so the flat sequence preserves document order.
pub fn split_pages(pages: &[Page], profile: &ChunkingProfile) -> Vec<Segment> {
    let mut segments = Vec::new();
    for page in pages {
        split_page(page, profile, &mut segments);
    }
    segments
}

fn split_page(page: &Page, profile: &ChunkingProfile, out: &mut Vec<Segment>) {
    // Windowing is defined over characters; byte offsets of each char
    // boundary keep the slicing UTF-8 safe.
    let bounds: Vec<usize> = page
        .text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(page.text.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut start = 0;
    while start < char_len {
        let end = usize::min(start + profile.max_chars, char_len);
        out.push(Segment {
            page: page.number,
            text: page.text[bounds[start]..bounds[end]].to_string(),
        });
        start += profile.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, text: &str) -> Page {
        Page {
            number,
            text: text.to_string(),
        }
    }

    fn expected_count(len: usize, profile: &ChunkingProfile) -> usize {
        len.div_ceil(profile.max_chars - profile.overlap_chars)
    }

    #[test]
    fn segment_count_matches_ceiling_formula() {
        let profile = ChunkingProfile::new(10, 3);
        for len in [1, 6, 7, 8, 13, 14, 20, 21, 35, 100] {
            let text = "x".repeat(len);
            let segments = split_pages(&[page(1, &text)], &profile);
            assert_eq!(
                segments.len(),
                expected_count(len, &profile),
                "length {len}"
            );
        }
    }

    #[test]
    fn consecutive_segments_share_the_overlap() {
        let profile = ChunkingProfile::new(10, 4);
        let text: String = ('a'..='z').cycle().take(40).collect();
        let segments = split_pages(&[page(1, &text)], &profile);

        for pair in segments.windows(2) {
            let [left, right] = pair else { unreachable!() };
            if left.text.chars().count() == profile.max_chars {
                let tail: String = left
                    .text
                    .chars()
                    .skip(profile.max_chars - profile.overlap_chars)
                    .collect();
                let head: String = right.text.chars().take(profile.overlap_chars).collect();
                assert_eq!(tail, head);
            }
        }
    }

    #[test]
    fn short_page_yields_one_whole_segment() {
        let profile = ChunkingProfile::default();
        let segments = split_pages(&[page(3, "brief filing")], &profile);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].page, 3);
        assert_eq!(segments[0].text, "brief filing");
    }

    #[test]
    fn windows_never_cross_page_boundaries() {
        let profile = ChunkingProfile::new(10, 3);
        let pages = [page(1, &"a".repeat(15)), page(2, &"b".repeat(15))];
        let segments = split_pages(&pages, &profile);

        for segment in &segments {
            let expected = if segment.page == 1 { 'a' } else { 'b' };
            assert!(segment.text.chars().all(|c| c == expected));
        }
        // Overlap restarts on page 2: both pages chunk identically in shape.
        let per_page = expected_count(15, &profile);
        assert_eq!(segments.len(), per_page * 2);
    }

    #[test]
    fn chunking_is_deterministic() {
        let profile = ChunkingProfile::default();
        let pages = [page(1, &"lorem ipsum ".repeat(200))];
        assert_eq!(split_pages(&pages, &profile), split_pages(&pages, &profile));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let profile = ChunkingProfile::new(4, 1);
        let text = "§1 café naïve — тест";
        let segments = split_pages(&[page(1, text)], &profile);
        assert_eq!(segments.len(), expected_count(text.chars().count(), &profile));
        for segment in &segments {
            assert!(segment.text.chars().count() <= profile.max_chars);
        }
    }

    #[test]
    fn empty_page_text_yields_no_segments() {
        // The extractor never emits empty pages, but the chunker still
        // handles them without producing a zero-length segment.
        let segments = split_pages(&[page(1, "")], &ChunkingProfile::default());
        assert!(segments.is_empty());
    }
}
