//! Chunk splitting capability: long text into topically coherent spans.

use async_trait::async_trait;

use crate::error::EngineError;

/// Splits a document into spans sized by token bounds.
///
/// Production deployments back this with a semantic splitter; the engine
/// only relies on the bounds contract and on split order.
#[async_trait]
pub trait ChunkSplitter: Send + Sync {
    /// Splits `text` into spans of roughly `min_tokens..=max_tokens`
    /// whitespace tokens. An empty or whitespace-only input yields no spans.
    async fn split(
        &self,
        text: &str,
        min_tokens: usize,
        max_tokens: usize,
    ) -> Result<Vec<String>, EngineError>;
}

/// Paragraph-boundary splitter used as the in-crate reference.
///
/// Paragraphs (blank-line separated) are accumulated until the minimum
/// token bound is met; a single paragraph longer than the maximum bound is
/// hard-split on word boundaries.
#[derive(Clone, Debug, Default)]
pub struct ParagraphSplitter;

impl ParagraphSplitter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChunkSplitter for ParagraphSplitter {
    async fn split(
        &self,
        text: &str,
        min_tokens: usize,
        max_tokens: usize,
    ) -> Result<Vec<String>, EngineError> {
        let mut spans = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0usize;

        for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            let tokens = token_count(paragraph);
            if tokens > max_tokens {
                if !current.is_empty() {
                    spans.push(std::mem::take(&mut current));
                    current_tokens = 0;
                }
                spans.extend(hard_split(paragraph, max_tokens));
                continue;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            current_tokens += tokens;
            if current_tokens >= min_tokens {
                spans.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
        }
        if !current.is_empty() {
            spans.push(current);
        }
        Ok(spans)
    }
}

fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn hard_split(paragraph: &str, max_tokens: usize) -> Vec<String> {
    let words: Vec<&str> = paragraph.split_whitespace().collect();
    words
        .chunks(max_tokens.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}
