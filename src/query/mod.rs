//! Context-aware query engine.
//!
//! Answers a question against one document's chunks: similarity search
//! filtered by title, neighbor stitching through the chunk chain, and
//! answer synthesis from the stitched context.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::capabilities::{
    EmbeddingProvider, Metadata, MetadataFilter, TextGenerator, VectorIndex, bounded,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::document::metadata_str;

/// Fixed instruction for answer synthesis. The generator must answer only
/// from the supplied context and say so when the context is insufficient.
const ANSWER_PROMPT: &str = "You are a helpful assistant that answers questions based on the \
provided context.\nAnswer the question based on the following context. If the answer cannot \
be found in the context, say \"I cannot answer this based on the provided context.\"\n\n\
Context:\n{context}\n\nQuestion: {question}\n\nAnswer:";

/// Similarity search plus context stitching over one document.
pub struct QueryEngine {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn TextGenerator>,
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn TextGenerator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
            config,
        }
    }

    /// Returns up to `top_k` context-stitched chunk texts for `question`,
    /// each prefixed with the document title as a heading.
    ///
    /// Filtering by title is mandatory: matches are only meaningful within
    /// one document's chunk chain, so an empty title is
    /// [`EngineError::MissingTarget`].
    pub async fn query(
        &self,
        question: &str,
        document_title: &str,
        top_k: usize,
    ) -> Result<Vec<String>, EngineError> {
        if document_title.trim().is_empty() {
            return Err(EngineError::MissingTarget);
        }

        let vector = bounded(self.config.call_timeout, self.embedder.embed(question), || {
            EngineError::retrieval("embedding call timed out")
        })
        .await?;

        let filter = MetadataFilter::equals("title", document_title);
        let matches = bounded(
            self.config.call_timeout,
            self.index.query(&vector, top_k, Some(&filter), true),
            || EngineError::retrieval("similarity query timed out"),
        )
        .await?;
        debug!(document_title, matches = matches.len(), "similarity query complete");

        let mut results = Vec::with_capacity(matches.len());
        for m in matches {
            results.push(self.stitch(document_title, &m.metadata).await);
        }
        Ok(results)
    }

    /// Convenience wrapper using the configured `top_k`.
    pub async fn query_default(
        &self,
        question: &str,
        document_title: &str,
    ) -> Result<Vec<String>, EngineError> {
        self.query(question, document_title, self.config.top_k).await
    }

    /// Synthesizes an answer from the retrieved context chunks.
    ///
    /// Prompt assembly only; the generation call is a pass-through whose
    /// failure gates the rest of the pipeline.
    pub async fn answer(
        &self,
        question: &str,
        context_chunks: &[String],
    ) -> Result<String, EngineError> {
        let context = context_chunks.join("\n\n");
        let prompt = ANSWER_PROMPT
            .replace("{context}", &context)
            .replace("{question}", question);
        let answer = bounded(self.config.call_timeout, self.generator.generate(&prompt), || {
            EngineError::generation("answer generation timed out")
        })
        .await?;
        if answer.trim().is_empty() {
            return Err(EngineError::generation("answer generation returned empty"));
        }
        Ok(answer)
    }

    /// Builds the context window for one match: up to `stitch_window`
    /// trailing characters of the previous chunk, the full matched chunk,
    /// and up to `stitch_window` leading characters of the next chunk.
    ///
    /// Neighbor fetch failure or empty neighbor ids degrade gracefully to
    /// the bare matched chunk; that is deliberate, not an error.
    async fn stitch(&self, title: &str, metadata: &Metadata) -> String {
        let content = metadata_str(metadata, "content");
        let previous_id = metadata_str(metadata, "previous_chunk_id");
        let next_id = metadata_str(metadata, "next_chunk_id");

        let mut context = String::new();
        if !previous_id.is_empty() || !next_id.is_empty() {
            let ids: Vec<String> = [previous_id.clone(), next_id.clone()]
                .into_iter()
                .filter(|id| !id.is_empty())
                .collect();
            let fetched = bounded(self.config.call_timeout, self.index.fetch(&ids), || {
                EngineError::retrieval("neighbor fetch timed out")
            })
            .await;
            match fetched {
                Ok(neighbors) => {
                    if let Some(prev) = neighbors.get(&previous_id) {
                        context.push_str(&tail_chars(
                            &metadata_str(prev, "content"),
                            self.config.stitch_window,
                        ));
                    }
                    context.push_str(&format!("\n{content}\n"));
                    if let Some(next) = neighbors.get(&next_id) {
                        context.push_str(&head_chars(
                            &metadata_str(next, "content"),
                            self.config.stitch_window,
                        ));
                    }
                }
                Err(err) => {
                    warn!(error = %err, "neighbor fetch failed, returning bare chunk");
                    context.clear();
                }
            }
        }

        if context.is_empty() {
            format!("# {title}\n\n{content}")
        } else {
            format!("# {title}\n\n{context}")
        }
    }
}

/// Last `n` characters of `s`, on char boundaries.
fn tail_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

/// First `n` characters of `s`, on char boundaries.
fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_helpers_respect_bounds() {
        let text = "abcdefgh";
        assert_eq!(tail_chars(text, 3), "fgh");
        assert_eq!(head_chars(text, 3), "abc");
        assert_eq!(tail_chars(text, 100), text);
        assert_eq!(head_chars(text, 100), text);
    }

    #[test]
    fn window_helpers_hold_on_multibyte_text() {
        let text = "héllo wörld";
        assert_eq!(head_chars(text, 5), "héllo");
        assert_eq!(tail_chars(text, 5), "wörld");
    }
}
