//! External capabilities consumed by the engine.
//!
//! The engine core never talks to an embedding model, vector database, or
//! LLM directly; it goes through the traits defined here. Each trait ships
//! with an in-crate reference implementation suitable for tests and offline
//! runs:
//!
//! * [`EmbeddingProvider`] / [`MockEmbeddingProvider`]
//! * [`ChunkSplitter`] / [`ParagraphSplitter`]
//! * [`VectorIndex`] / [`InMemoryVectorIndex`]
//! * [`TextGenerator`] (no reference impl; tests script their own)

pub mod embedder;
pub mod generator;
pub mod splitter;
pub mod vector_index;

use std::future::Future;
use std::time::Duration;

use crate::error::EngineError;

/// Bounds a capability call by `deadline`, converting elapsed time into
/// the caller's error.
pub(crate) async fn bounded<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, EngineError>>,
    on_timeout: impl FnOnce() -> EngineError,
) -> Result<T, EngineError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}

pub use embedder::{EmbeddingProvider, MockEmbeddingProvider};
pub use generator::TextGenerator;
pub use splitter::{ChunkSplitter, ParagraphSplitter};
pub use vector_index::{
    IndexEntry, InMemoryVectorIndex, Metadata, MetadataFilter, QueryMatch, VectorIndex,
    cosine_similarity,
};
