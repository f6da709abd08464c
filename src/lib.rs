//! ```text
//! Document ──► store::DocumentStore ──► capabilities::VectorIndex
//!                 │  (fingerprint, dedup, split, link, embed, batch upsert)
//!                 │
//! Question ──► query::QueryEngine ──► stitched evidence + answer
//!                 │
//! Request ──► orchestrator::Orchestrator
//!                 ├─► cache::SemanticCache (dialogue scripts)
//!                 └─► stage machine ──► orchestrator::Artifact
//! ```
//!
pub mod capabilities;
pub mod cache;
pub mod config;
pub mod error;
pub mod message;
pub mod orchestrator;
pub mod query;
pub mod store;
pub mod telemetry;

pub use cache::{CacheEntry, SemanticCache};
pub use capabilities::{
    ChunkSplitter, EmbeddingProvider, InMemoryVectorIndex, MockEmbeddingProvider,
    ParagraphSplitter, TextGenerator, VectorIndex,
};
pub use config::EngineConfig;
pub use error::EngineError;
pub use orchestrator::{
    Artifact, GenerationOutcome, Orchestrator, OrchestratorError, OutputKind,
};
pub use query::QueryEngine;
pub use store::{Document, DocumentStore, IngestReceipt};
