//! Shared test doubles and the wired-up engine harness.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use studygraph::capabilities::{
    ChunkSplitter, EmbeddingProvider, IndexEntry, InMemoryVectorIndex, Metadata,
    MetadataFilter, MockEmbeddingProvider, ParagraphSplitter, QueryMatch, TextGenerator,
    VectorIndex,
};
use studygraph::cache::SemanticCache;
use studygraph::config::EngineConfig;
use studygraph::error::EngineError;
use studygraph::orchestrator::Orchestrator;
use studygraph::query::QueryEngine;
use studygraph::store::DocumentStore;

/// Embedder with exact-string vector overrides and a deterministic hash
/// fallback. Overrides let tests place specific texts at chosen points in
/// vector space to exercise proximity thresholds.
pub struct StubEmbedder {
    fallback: MockEmbeddingProvider,
    overrides: FxHashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            fallback: MockEmbeddingProvider::with_dimensions(dimensions),
            overrides: FxHashMap::default(),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_override(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.overrides.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            match self.overrides.get(text) {
                Some(vector) => vectors.push(vector.clone()),
                None => vectors.push(self.fallback.embed(text).await?),
            }
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.fallback.dimensions()
    }
}

/// Generator that replays queued responses in order and records every
/// prompt it receives. An exhausted queue yields a fixed placeholder.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(str::to_string).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        let next = self.responses.lock().pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(next.unwrap_or_else(|| "scripted response".to_string()))
    }
}

/// In-memory index wrapper that injects a failure per operation, for
/// exercising degraded and fatal backend paths.
#[derive(Default)]
pub struct FlakyVectorIndex {
    inner: InMemoryVectorIndex,
    fail_upsert: AtomicBool,
    fail_query: AtomicBool,
    fail_fetch: AtomicBool,
    fail_delete: AtomicBool,
}

impl FlakyVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_query(&self, fail: bool) {
        self.fail_query.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl VectorIndex for FlakyVectorIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), EngineError> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(EngineError::retrieval("injected upsert failure"));
        }
        self.inner.upsert(entries).await
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, EngineError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(EngineError::retrieval("injected query failure"));
        }
        self.inner.query(vector, top_k, filter, include_metadata).await
    }

    async fn fetch(&self, ids: &[String]) -> Result<FxHashMap<String, Metadata>, EngineError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(EngineError::retrieval("injected fetch failure"));
        }
        self.inner.fetch(ids).await
    }

    async fn delete(&self, ids: &[String]) -> Result<(), EngineError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(EngineError::retrieval("injected delete failure"));
        }
        self.inner.delete(ids).await
    }
}

/// Fully wired engine over in-memory backends, with handles kept on every
/// component so tests can assert from any angle.
pub struct Harness {
    pub doc_index: Arc<InMemoryVectorIndex>,
    pub cache_index: Arc<InMemoryVectorIndex>,
    pub embedder: Arc<StubEmbedder>,
    pub generator: Arc<ScriptedGenerator>,
    pub store: DocumentStore,
    pub query: Arc<QueryEngine>,
    pub cache: Arc<SemanticCache>,
    pub orchestrator: Orchestrator,
}

pub fn harness(
    config: EngineConfig,
    embedder: StubEmbedder,
    generator: ScriptedGenerator,
) -> Harness {
    studygraph::telemetry::init_tracing();
    let doc_index = Arc::new(InMemoryVectorIndex::new());
    let cache_index = Arc::new(InMemoryVectorIndex::new());
    let embedder = Arc::new(embedder);
    let generator = Arc::new(generator);

    let store = DocumentStore::new(
        doc_index.clone() as Arc<dyn VectorIndex>,
        embedder.clone() as Arc<dyn EmbeddingProvider>,
        Arc::new(ParagraphSplitter::new()) as Arc<dyn ChunkSplitter>,
        config.clone(),
    );
    let query = Arc::new(QueryEngine::new(
        doc_index.clone() as Arc<dyn VectorIndex>,
        embedder.clone() as Arc<dyn EmbeddingProvider>,
        generator.clone() as Arc<dyn TextGenerator>,
        config.clone(),
    ));
    let cache = Arc::new(SemanticCache::new(
        cache_index.clone() as Arc<dyn VectorIndex>,
        embedder.clone() as Arc<dyn EmbeddingProvider>,
        config.clone(),
    ));
    let orchestrator = Orchestrator::new(
        query.clone(),
        cache.clone(),
        generator.clone() as Arc<dyn TextGenerator>,
        config,
    );

    Harness {
        doc_index,
        cache_index,
        embedder,
        generator,
        store,
        query,
        cache,
        orchestrator,
    }
}
