//! Retrieval-augmented question answering.
//!
//! Retrieval and generation are sequenced here: embed the question with the
//! index's own provider, fetch the top segments, assemble the grounding
//! context, and hand `{context, question}` to the generator under a fixed
//! instruction template. The template constrains the model to the supplied
//! context and tells it to decline explicitly when that context is
//! insufficient. An insufficient-context answer is a success, unlike a
//! generation failure, which propagates as [`RagError::Generation`].

use tracing::debug;

use crate::generation::Generator;
use crate::index::SegmentIndex;
use crate::stores::VectorBackend;
use crate::types::RagError;

/// Instruction template for grounded answering. `{context}` and `{question}`
/// are substituted at call time.
const QA_TEMPLATE: &str = "\
You are a legal assistant answering questions strictly from the provided \
document context.

Guidelines:
1. When a name appears, identify its role in the matter (plaintiff, \
defendant, judge, counsel) before using it in the answer.
2. Answer directly and precisely; quote names, roles, dates, and amounts \
from the context rather than paraphrasing them loosely.
3. Use plain language a non-lawyer can follow; briefly explain any legal \
term you must keep.
4. Never invent facts. If the context does not contain enough information, \
reply exactly: \"The information provided does not contain sufficient \
details to answer this question.\"
5. Keep the answer consistent with every mention of the same person or \
event in the context.

Context:
{context}

Question:
{question}

Answer:";

/// Answers `question` from the segments indexed in `index`.
///
/// Fails with [`RagError::NoActiveDocument`] before any retrieval or
/// generation work when the index holds nothing. The generated text is
/// returned verbatim.
pub async fn answer_question<B>(
    index: &SegmentIndex<B>,
    question: &str,
    generator: &dyn Generator,
    top_k: usize,
) -> Result<String, RagError>
where
    B: VectorBackend,
{
    if index.is_empty().await? {
        return Err(RagError::NoActiveDocument);
    }

    let hits = index.query(question, top_k).await?;
    debug!(retrieved = hits.len(), top_k, "assembling grounding context");

    let context = hits
        .iter()
        .map(|hit| hit.record.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = QA_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", question);
    generator.generate(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Segment;
    use crate::config::RetrievalConfig;
    use crate::embeddings::MockEmbeddingProvider;
    use crate::generation::MockGenerator;
    use crate::stores::InMemoryStore;
    use std::sync::Arc;

    fn empty_index() -> SegmentIndex<InMemoryStore> {
        SegmentIndex::new(
            InMemoryStore::new(),
            Arc::new(MockEmbeddingProvider::new()),
            RetrievalConfig::default(),
        )
    }

    #[tokio::test]
    async fn empty_index_fails_before_generation() {
        let index = empty_index();
        let generator = MockGenerator::replying("should never run");

        let err = answer_question(&index, "who won?", &generator, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::NoActiveDocument));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_retrieved_context_and_question() {
        let index = empty_index();
        index
            .upsert(
                "fp",
                &[
                    Segment {
                        page: 1,
                        text: "Alice sues Bob for breach of contract.".into(),
                    },
                    Segment {
                        page: 2,
                        text: "The court ruled in favor of Alice.".into(),
                    },
                ],
            )
            .await
            .unwrap();

        let generator = MockGenerator::replying("Alice prevailed.");
        let answer = answer_question(&index, "Who won the case?", &generator, 4)
            .await
            .unwrap();
        assert_eq!(answer, "Alice prevailed.");

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Alice sues Bob"));
        assert!(prompts[0].contains("ruled in favor of Alice"));
        assert!(prompts[0].contains("Who won the case?"));
        // Retrieved segments are separated by blank lines.
        assert!(prompts[0].contains("\n\n"));
    }

    #[tokio::test]
    async fn generation_failure_is_surfaced_not_retried() {
        let index = empty_index();
        index
            .upsert(
                "fp",
                &[Segment {
                    page: 1,
                    text: "some context".into(),
                }],
            )
            .await
            .unwrap();

        let generator = MockGenerator::failing("provider timeout");
        let err = answer_question(&index, "anything?", &generator, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
        assert_eq!(generator.prompts().len(), 1, "no retry");
    }
}
