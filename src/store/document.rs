//! Documents, fingerprints, and linked chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::capabilities::Metadata;

/// An ingested source text. Immutable once created; re-ingestion produces a
/// new logical version distinguished by a new fingerprint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    /// Opaque stable identifier derived from the source path.
    pub document_id: String,
    /// Human-readable title, used as the similarity-query filter key.
    pub title: String,
    pub page_count: usize,
    pub raw_text: String,
    pub processed_at: DateTime<Utc>,
    /// Citations carried through to chunk metadata.
    pub references: Vec<String>,
}

impl Document {
    /// Creates a document stamped with the current time.
    pub fn new(
        document_id: impl Into<String>,
        title: impl Into<String>,
        page_count: usize,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            title: title.into(),
            page_count,
            raw_text: raw_text.into(),
            processed_at: Utc::now(),
            references: Vec::new(),
        }
    }

    /// Derives a document from a source path: the id is a digest prefix of
    /// the path, the title its file stem.
    pub fn from_source_path(path: &str, page_count: usize, raw_text: impl Into<String>) -> Self {
        let digest = Sha256::digest(path.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let document_id = format!("doc_{:x}", u64::from_be_bytes(prefix));
        let title = std::path::Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(path)
            .to_string();
        Self::new(document_id, title, page_count, raw_text)
    }

    /// Computes the dedup fingerprint over `(raw_text, title, processed_at)`.
    ///
    /// Because `processed_at` participates, re-ingesting byte-identical
    /// content at a different time yields a different fingerprint: dedup is
    /// scoped to the same ingestion batch, not to content forever.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.raw_text.as_bytes());
        hasher.update(self.title.as_bytes());
        hasher.update(self.processed_at.to_rfc3339().as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }
}

/// Hex-encoded SHA-256 dedup key for a document version.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contiguous span of a document's text, the unit of embedding and
/// retrieval. Chunks form a doubly linked chain through
/// `previous_chunk_id`/`next_chunk_id` (empty string at either end).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `"{document_id}#{index}"`.
    pub chunk_id: String,
    pub content: String,
    /// Empty for the first chunk.
    pub previous_chunk_id: String,
    /// Empty for the last chunk.
    pub next_chunk_id: String,
    pub title: String,
    pub document_id: String,
    pub fingerprint: String,
    pub page_count: usize,
    pub references: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl Chunk {
    /// Text handed to the embedding provider: title heading plus content.
    pub fn embedding_text(&self) -> String {
        format!("# {}\n{}", self.title, self.content)
    }

    /// Flattens the chunk into vector-index metadata.
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::default();
        metadata.insert("id".to_string(), json!(self.chunk_id));
        metadata.insert("title".to_string(), json!(self.title));
        metadata.insert("content".to_string(), json!(self.content));
        metadata.insert("previous_chunk_id".to_string(), json!(self.previous_chunk_id));
        metadata.insert("next_chunk_id".to_string(), json!(self.next_chunk_id));
        metadata.insert("document_id".to_string(), json!(self.document_id));
        metadata.insert("fingerprint".to_string(), json!(self.fingerprint));
        metadata.insert("page_count".to_string(), json!(self.page_count));
        metadata.insert("references".to_string(), json!(self.references));
        metadata.insert("processed_at".to_string(), json!(self.processed_at.to_rfc3339()));
        metadata
    }
}

/// Reads one string field out of index metadata, defaulting to empty.
pub(crate) fn metadata_str(metadata: &Metadata, field: &str) -> String {
    metadata
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Builds the linked chunk chain for a document from split order.
///
/// Chunk 0 has an empty `previous_chunk_id`, chunk N-1 an empty
/// `next_chunk_id`; interior chunks point at their immediate neighbors.
pub fn link_chunks(document: &Document, fingerprint: &Fingerprint, spans: Vec<String>) -> Vec<Chunk> {
    let total = spans.len();
    spans
        .into_iter()
        .enumerate()
        .map(|(i, content)| Chunk {
            chunk_id: format!("{}#{}", document.document_id, i),
            content,
            previous_chunk_id: if i == 0 {
                String::new()
            } else {
                format!("{}#{}", document.document_id, i - 1)
            },
            next_chunk_id: if i + 1 == total {
                String::new()
            } else {
                format!("{}#{}", document.document_id, i + 1)
            },
            title: document.title.clone(),
            document_id: document.document_id.clone(),
            fingerprint: fingerprint.as_str().to_string(),
            page_count: document.page_count,
            references: document.references.clone(),
            processed_at: document.processed_at,
        })
        .collect()
}
