//! Content-addressed document store.
//!
//! Owns fingerprinting, dedup/overwrite policy, chunk linkage, and batched
//! writes to the vector index. Retrieval lives in [`crate::query`].

pub mod document;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::capabilities::{
    ChunkSplitter, EmbeddingProvider, IndexEntry, MetadataFilter, VectorIndex, bounded,
};
use crate::config::EngineConfig;
use crate::error::EngineError;

pub use document::{Chunk, Document, Fingerprint, link_chunks};

/// Upper bound used for metadata-only probes ("list everything matching").
const PROBE_LIMIT: usize = 10_000;

/// Result of one ingest call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestReceipt {
    /// Chunks written to the index. Zero with `was_overwrite == false` means
    /// either a dedup no-op or an empty split; callers must not treat a
    /// zero-chunk result as a successful dedup.
    pub chunks_written: usize,
    /// True when existing chunks for this fingerprint were replaced.
    pub was_overwrite: bool,
}

/// Ingests documents, deduplicates by fingerprint, and indexes linked chunks.
pub struct DocumentStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    splitter: Arc<dyn ChunkSplitter>,
    config: EngineConfig,
    /// Serializes ingest per fingerprint: the existence probe and the
    /// delete/upsert that follow are not atomic at the index.
    ingest_locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl DocumentStore {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        splitter: Arc<dyn ChunkSplitter>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            splitter,
            config,
            ingest_locks: Mutex::new(FxHashMap::default()),
        }
    }

    /// Ingests a document: fingerprint, dedup check, split, link, embed,
    /// upsert in batches.
    ///
    /// When the fingerprint already exists and `overwrite` is false this is
    /// a no-op returning `(0, false)`. With `overwrite`, all existing chunk
    /// ids are deleted first; a deletion failure aborts the call with
    /// [`EngineError::DedupConflict`] and no partial write. A batch failure
    /// mid-indexing aborts the remaining batches.
    pub async fn ingest(
        &self,
        document: &Document,
        overwrite: bool,
    ) -> Result<IngestReceipt, EngineError> {
        let fingerprint = document.fingerprint();
        let lock = self.fingerprint_lock(fingerprint.as_str()).await;
        let result = {
            let _guard = lock.lock().await;
            self.ingest_locked(document, &fingerprint, overwrite).await
        };
        drop(lock);
        self.release_fingerprint_lock(fingerprint.as_str()).await;
        result
    }

    async fn ingest_locked(
        &self,
        document: &Document,
        fingerprint: &Fingerprint,
        overwrite: bool,
    ) -> Result<IngestReceipt, EngineError> {
        let (exists, existing_chunks) = self.exists(fingerprint).await?;

        if exists && !overwrite {
            debug!(
                title = %document.title,
                fingerprint = %fingerprint,
                "document already indexed, skipping"
            );
            return Ok(IngestReceipt {
                chunks_written: 0,
                was_overwrite: false,
            });
        }

        if exists && overwrite {
            bounded(
                self.config.call_timeout,
                self.index.delete(&existing_chunks),
                || EngineError::retrieval("chunk deletion timed out"),
            )
            .await
            .map_err(|err| EngineError::DedupConflict {
                fingerprint: fingerprint.as_str().to_string(),
                message: err.to_string(),
            })?;
            debug!(
                fingerprint = %fingerprint,
                removed = existing_chunks.len(),
                "cleared existing chunks before re-index"
            );
        }

        let spans = bounded(
            self.config.call_timeout,
            self.splitter.split(
                &document.raw_text,
                self.config.min_split_tokens,
                self.config.max_split_tokens,
            ),
            || EngineError::retrieval("chunk splitter call timed out"),
        )
        .await?;

        if spans.is_empty() {
            warn!(title = %document.title, "split produced zero chunks, nothing indexed");
            return Ok(IngestReceipt {
                chunks_written: 0,
                was_overwrite: false,
            });
        }

        let chunks = link_chunks(document, fingerprint, spans);

        for batch in chunks.chunks(self.config.batch_size) {
            let texts: Vec<String> = batch.iter().map(Chunk::embedding_text).collect();
            let vectors = bounded(
                self.config.call_timeout,
                self.embedder.embed_batch(&texts),
                || EngineError::retrieval("embedding call timed out"),
            )
            .await?;

            if vectors.len() != batch.len() {
                return Err(EngineError::retrieval(format!(
                    "embedding batch returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            let entries: Vec<IndexEntry> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| IndexEntry {
                    id: chunk.chunk_id.clone(),
                    vector,
                    metadata: chunk.to_metadata(),
                })
                .collect();
            bounded(self.config.call_timeout, self.index.upsert(entries), || {
                EngineError::retrieval("vector index upsert timed out")
            })
            .await?;
        }

        info!(
            title = %document.title,
            chunks = chunks.len(),
            overwrite = exists,
            "document indexed"
        );
        Ok(IngestReceipt {
            chunks_written: chunks.len(),
            was_overwrite: exists,
        })
    }

    /// Checks whether any chunks exist for `fingerprint`, returning their
    /// ids when present.
    ///
    /// Implemented as a zero-vector metadata probe filtered by fingerprint,
    /// mirroring how the index is consulted everywhere else.
    pub async fn exists(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<(bool, Vec<String>), EngineError> {
        let zero = vec![0.0f32; self.embedder.dimensions()];
        let filter = MetadataFilter::equals("fingerprint", fingerprint.as_str());
        let matches = bounded(
            self.config.call_timeout,
            self.index.query(&zero, PROBE_LIMIT, Some(&filter), false),
            || EngineError::retrieval("fingerprint probe timed out"),
        )
        .await?;
        let ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();
        Ok((!ids.is_empty(), ids))
    }

    /// Lists the distinct titles currently indexed, sorted.
    pub async fn list_documents(&self) -> Result<Vec<String>, EngineError> {
        let zero = vec![0.0f32; self.embedder.dimensions()];
        let matches = bounded(
            self.config.call_timeout,
            self.index.query(&zero, PROBE_LIMIT, None, true),
            || EngineError::retrieval("title scan timed out"),
        )
        .await?;
        let mut titles: Vec<String> = matches
            .iter()
            .filter_map(|m| m.metadata.get("title").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect();
        titles.sort();
        titles.dedup();
        Ok(titles)
    }

    /// Deletes every chunk belonging to `document_id`, returning how many
    /// were removed.
    pub async fn delete_document(&self, document_id: &str) -> Result<usize, EngineError> {
        let zero = vec![0.0f32; self.embedder.dimensions()];
        let filter = MetadataFilter::equals("document_id", json!(document_id));
        let matches = bounded(
            self.config.call_timeout,
            self.index.query(&zero, PROBE_LIMIT, Some(&filter), false),
            || EngineError::retrieval("document probe timed out"),
        )
        .await?;
        let ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        bounded(self.config.call_timeout, self.index.delete(&ids), || {
            EngineError::retrieval("chunk deletion timed out")
        })
        .await?;
        info!(document_id, removed = ids.len(), "document deleted from index");
        Ok(ids.len())
    }

    /// Number of live ingest serialization entries. Exposed for tests and
    /// diagnostics.
    pub async fn ingest_lock_count(&self) -> usize {
        self.ingest_locks.lock().await.len()
    }

    async fn fingerprint_lock(&self, fingerprint: &str) -> Arc<Mutex<()>> {
        let mut locks = self.ingest_locks.lock().await;
        locks
            .entry(fingerprint.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Evicts the serialization entry once no ingest holds a clone of it,
    /// so the map does not grow with every fingerprint ever ingested.
    async fn release_fingerprint_lock(&self, fingerprint: &str) {
        let mut locks = self.ingest_locks.lock().await;
        if locks
            .get(fingerprint)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(fingerprint);
        }
    }
}
