//! Vector index capability: vector storage with metadata, filtered
//! nearest-neighbor query, id fetch, and deletion.
//!
//! The engine consumes this trait; it does not implement a production index.
//! [`InMemoryVectorIndex`] is the in-crate reference backend used by tests
//! and small deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::EngineError;

/// Metadata payload stored alongside each vector.
pub type Metadata = FxHashMap<String, Value>;

/// A vector plus its metadata, keyed by an opaque id.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// One nearest-neighbor result.
#[derive(Clone, Debug)]
pub struct QueryMatch {
    pub id: String,
    /// 0-1 proximity; higher is more similar. Zero-vector probes score 0.
    pub score: f32,
    pub metadata: Metadata,
}

/// Equality filter applied to one metadata field.
#[derive(Clone, Debug)]
pub struct MetadataFilter {
    pub field: String,
    pub equals: Value,
}

impl MetadataFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            equals: value.into(),
        }
    }

    fn matches(&self, metadata: &Metadata) -> bool {
        metadata.get(&self.field) == Some(&self.equals)
    }
}

/// Storage backend for embedded chunks and cache keys.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces entries by id.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), EngineError>;

    /// Returns up to `top_k` entries nearest to `vector`, optionally
    /// restricted by a metadata filter. A zero vector is a metadata-only
    /// probe: every filtered entry is eligible and ordering is arbitrary.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, EngineError>;

    /// Fetches metadata for the given ids; absent ids are omitted.
    async fn fetch(&self, ids: &[String]) -> Result<FxHashMap<String, Metadata>, EngineError>;

    /// Deletes entries by id; unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<(), EngineError>;
}

/// Reference backend holding vectors in process memory.
///
/// Proximity is cosine similarity mapped onto 0-1; entries are kept in an
/// `FxHashMap` behind a `parking_lot::RwLock`, so reads never block each
/// other.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    entries: RwLock<FxHashMap<String, (Vec<f32>, Metadata)>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Exposed for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), EngineError> {
        let mut guard = self.entries.write();
        for entry in entries {
            guard.insert(entry.id, (entry.vector, entry.metadata));
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, EngineError> {
        let guard = self.entries.read();
        let mut matches: Vec<QueryMatch> = guard
            .iter()
            .filter(|(_, (_, metadata))| filter.is_none_or(|f| f.matches(metadata)))
            .map(|(id, (stored, metadata))| QueryMatch {
                id: id.clone(),
                score: cosine_similarity(vector, stored),
                metadata: if include_metadata {
                    metadata.clone()
                } else {
                    Metadata::default()
                },
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn fetch(&self, ids: &[String]) -> Result<FxHashMap<String, Metadata>, EngineError> {
        let guard = self.entries.read();
        let mut found = FxHashMap::default();
        for id in ids {
            if let Some((_, metadata)) = guard.get(id) {
                found.insert(id.clone(), metadata.clone());
            }
        }
        Ok(found)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), EngineError> {
        let mut guard = self.entries.write();
        for id in ids {
            guard.remove(id);
        }
        Ok(())
    }
}

/// Cosine similarity clamped to 0-1; zero-norm inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}
