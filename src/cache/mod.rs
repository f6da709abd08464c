//! Semantic result cache.
//!
//! Maps a (question, document title) pair to a previously computed
//! generation artifact by nearest-neighbor proximity of the composite key,
//! not exact string equality. Scoped to a dedicated vector index: cache
//! keys never mix with document chunks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::capabilities::{
    EmbeddingProvider, IndexEntry, Metadata, MetadataFilter, VectorIndex, bounded,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::orchestrator::script::DialogueScript;

/// Bound used when draining the cache index on [`SemanticCache::clear`].
const CLEAR_LIMIT: usize = 10_000;

/// A cached dialogue-script generation result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub script: DialogueScript,
    pub source_document_title: String,
    pub answer: String,
    pub evidence: Vec<String>,
    /// Storage location of any rendered media, owned by external
    /// collaborators.
    pub media_location: Option<String>,
    pub cached_at: DateTime<Utc>,
}

/// Proximity-gated cache over prior (question, document) generations.
///
/// False negatives are acceptable (the pipeline recomputes); false
/// positives are correctness bugs, so the proximity threshold is biased
/// high (default 0.97) and lookups are additionally filtered to the same
/// document title.
pub struct SemanticCache {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
}

impl SemanticCache {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Composite key embedded for proximity matching.
    fn cache_key(question: &str, document_title: &str) -> String {
        format!("{document_title}:{question}")
    }

    /// Returns the cached entry whose key is sufficiently close to this
    /// (question, document) pair, or `None` below the proximity threshold.
    pub async fn lookup(
        &self,
        question: &str,
        document_title: &str,
    ) -> Result<Option<CacheEntry>, EngineError> {
        let key = Self::cache_key(question, document_title);
        let vector = bounded(self.config.call_timeout, self.embedder.embed(&key), || {
            EngineError::retrieval("cache key embedding timed out")
        })
        .await?;

        let filter = MetadataFilter::equals("document_title", document_title);
        let matches = bounded(
            self.config.call_timeout,
            self.index.query(&vector, 1, Some(&filter), true),
            || EngineError::retrieval("cache lookup timed out"),
        )
        .await?;

        let Some(nearest) = matches.into_iter().next() else {
            return Ok(None);
        };
        if nearest.score < self.config.min_proximity {
            debug!(
                score = nearest.score,
                threshold = self.config.min_proximity,
                "nearest cached question below proximity threshold"
            );
            return Ok(None);
        }

        let entry = decode_entry(&nearest.metadata)?;
        debug!(document_title, score = nearest.score, "semantic cache hit");
        Ok(Some(entry))
    }

    /// Writes a new entry stamped with the current time.
    ///
    /// No dedup and no eviction: a sufficiently dissimilar question simply
    /// adds a new entry. Eviction policy belongs outside this contract.
    pub async fn store(
        &self,
        question: &str,
        document_title: &str,
        mut entry: CacheEntry,
    ) -> Result<(), EngineError> {
        entry.cached_at = Utc::now();
        let key = Self::cache_key(question, document_title);
        let vector = bounded(self.config.call_timeout, self.embedder.embed(&key), || {
            EngineError::retrieval("cache key embedding timed out")
        })
        .await?;

        let payload = serde_json::to_string(&entry)
            .map_err(|err| EngineError::retrieval(format!("cache entry encoding failed: {err}")))?;
        let mut metadata = Metadata::default();
        metadata.insert("document_title".to_string(), json!(document_title));
        metadata.insert("question".to_string(), json!(question));
        metadata.insert("payload".to_string(), json!(payload));

        let entries = vec![IndexEntry {
            id: key,
            vector,
            metadata,
        }];
        bounded(self.config.call_timeout, self.index.upsert(entries), || {
            EngineError::retrieval("cache write timed out")
        })
        .await?;
        info!(document_title, "generation result cached");
        Ok(())
    }

    /// Drops all entries. Administrative reset and test isolation.
    pub async fn clear(&self) -> Result<(), EngineError> {
        let zero = vec![0.0f32; self.embedder.dimensions()];
        let matches = bounded(
            self.config.call_timeout,
            self.index.query(&zero, CLEAR_LIMIT, None, false),
            || EngineError::retrieval("cache scan timed out"),
        )
        .await?;
        let ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();
        if !ids.is_empty() {
            bounded(self.config.call_timeout, self.index.delete(&ids), || {
                EngineError::retrieval("cache clear timed out")
            })
            .await?;
        }
        Ok(())
    }
}

fn decode_entry(metadata: &Metadata) -> Result<CacheEntry, EngineError> {
    let payload = metadata
        .get("payload")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EngineError::retrieval("cached entry is missing its payload"))?;
    serde_json::from_str(payload)
        .map_err(|err| EngineError::retrieval(format!("cache entry decoding failed: {err}")))
}
