//! Embedding capability: text to fixed-dimension vectors.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::EngineError;

/// Converts batches of text into fixed-dimension vectors.
///
/// The dimension must be stable per deployment; the document store and the
/// semantic cache both derive zero-vector probes from it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every input, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError>;

    /// The fixed output dimension.
    fn dimensions(&self) -> usize;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EngineError::retrieval("embedding provider returned no vector"))
    }
}

/// Deterministic hash-derived embeddings for tests and offline runs.
///
/// Identical text always embeds identically; distinct text almost always
/// embeds differently. The vectors carry no semantic signal.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 16 }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());
        let mut vector = vec![0.0f32; self.dimensions];
        for (i, byte) in digest.iter().cycle().take(self.dimensions * 4).enumerate() {
            vector[i % self.dimensions] += f32::from(*byte) / 255.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
