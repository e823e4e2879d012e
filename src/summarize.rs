//! Whole-document summarization by stuffing.
//!
//! All extraction units of the active document are concatenated into a
//! single generation call. There is deliberately no map-reduce or recursive
//! summarization: a document whose text exceeds the generation service's
//! input budget fails at the provider instead of being summarized partially.

use crate::extraction::Page;
use crate::generation::Generator;
use crate::types::RagError;

/// Instruction template for structured bullet summaries. `{document}` is
/// substituted with the full concatenated text.
const SUMMARY_TEMPLATE: &str = "\
You are a legal document summarizer. Extract the most important and \
relevant information from the document below.

Organize the key details into logically titled sections; derive the section \
headings from the document's own content and nature. Under each heading, \
present individual facts as concise bullet points, keeping every point \
directly relevant to the document's main purpose. Maintain a neutral, \
objective, professional tone.

Document:
{document}

Expected shape of the output (headings will vary with the content):

**[Main Topic / Document Type]:**
* [Key point]
* [Key point]

**[Relevant Section Heading]:**
* [Important detail]
* [Important detail]

Add further sections as the document's content requires.";

/// Summarizes the full ordered page sequence in one stuffing call.
///
/// The generated text is returned verbatim; provider failures propagate as
/// [`RagError::Generation`].
pub async fn summarize_pages(pages: &[Page], generator: &dyn Generator) -> Result<String, RagError> {
    let document = pages
        .iter()
        .map(|page| page.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = SUMMARY_TEMPLATE.replace("{document}", &document);
    generator.generate(&prompt).await
}
