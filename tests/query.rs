mod common;

use std::sync::Arc;

use common::{FlakyVectorIndex, ScriptedGenerator, StubEmbedder, harness};
use studygraph::capabilities::{
    ChunkSplitter, EmbeddingProvider, ParagraphSplitter, TextGenerator, VectorIndex,
};
use studygraph::config::EngineConfig;
use studygraph::error::EngineError;
use studygraph::query::QueryEngine;
use studygraph::store::{Document, DocumentStore};

fn per_paragraph_config() -> EngineConfig {
    EngineConfig::default().with_split_tokens(1, 100)
}

fn notes_doc() -> Document {
    Document::new(
        "doc_notes",
        "Notes",
        3,
        "First paragraph about memory.\n\nSecond paragraph about recall.\n\nThird paragraph about sleep.",
    )
}

#[tokio::test]
async fn middle_chunk_match_is_stitched_with_both_neighbors() {
    let spike = vec![1.0, 0.0, 0.0, 0.0];
    let embedder = StubEmbedder::new(4)
        .with_override("# Notes\nSecond paragraph about recall.", spike.clone())
        .with_override("what about recall?", spike);
    let h = harness(per_paragraph_config(), embedder, ScriptedGenerator::new(vec![]));
    h.store.ingest(&notes_doc(), false).await.unwrap();

    let results = h.query.query("what about recall?", "Notes", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    let stitched = &results[0];
    assert!(stitched.starts_with("# Notes\n\n"));
    assert!(stitched.contains("First paragraph about memory."));
    assert!(stitched.contains("Second paragraph about recall."));
    assert!(stitched.contains("Third paragraph about sleep."));
}

#[tokio::test]
async fn stitch_window_bounds_neighbor_text() {
    let spike = vec![1.0, 0.0, 0.0, 0.0];
    let embedder = StubEmbedder::new(4)
        .with_override("# Notes\nSecond paragraph about recall.", spike.clone())
        .with_override("what about recall?", spike);
    let mut config = per_paragraph_config();
    config.stitch_window = 7;
    let h = harness(config, embedder, ScriptedGenerator::new(vec![]));
    h.store.ingest(&notes_doc(), false).await.unwrap();

    let results = h.query.query("what about recall?", "Notes", 1).await.unwrap();
    let stitched = &results[0];
    // Last 7 chars of the previous chunk, first 7 of the next.
    assert!(stitched.contains("memory."));
    assert!(!stitched.contains("First paragraph"));
    assert!(stitched.contains("Third p"));
    assert!(!stitched.contains("Third paragraph"));
    assert!(stitched.contains("Second paragraph about recall."));
}

#[tokio::test]
async fn first_chunk_match_has_no_leading_neighbor() {
    let spike = vec![0.0, 1.0, 0.0, 0.0];
    let embedder = StubEmbedder::new(4)
        .with_override("# Notes\nFirst paragraph about memory.", spike.clone())
        .with_override("what about memory?", spike);
    let h = harness(per_paragraph_config(), embedder, ScriptedGenerator::new(vec![]));
    h.store.ingest(&notes_doc(), false).await.unwrap();

    let results = h.query.query("what about memory?", "Notes", 1).await.unwrap();
    let stitched = &results[0];
    assert!(stitched.contains("First paragraph about memory."));
    assert!(stitched.contains("Second paragraph about recall."));
    assert!(!stitched.contains("Third paragraph about sleep."));
}

#[tokio::test]
async fn neighbor_fetch_failure_degrades_to_the_bare_chunk() {
    let spike = vec![1.0, 0.0, 0.0, 0.0];
    let embedder: Arc<StubEmbedder> = Arc::new(
        StubEmbedder::new(4)
            .with_override("# Notes\nSecond paragraph about recall.", spike.clone())
            .with_override("what about recall?", spike),
    );
    let index = Arc::new(FlakyVectorIndex::new());
    let config = per_paragraph_config();
    let store = DocumentStore::new(
        index.clone() as Arc<dyn VectorIndex>,
        embedder.clone() as Arc<dyn EmbeddingProvider>,
        Arc::new(ParagraphSplitter::new()) as Arc<dyn ChunkSplitter>,
        config.clone(),
    );
    let query = QueryEngine::new(
        index.clone() as Arc<dyn VectorIndex>,
        embedder as Arc<dyn EmbeddingProvider>,
        Arc::new(ScriptedGenerator::new(vec![])) as Arc<dyn TextGenerator>,
        config,
    );
    store.ingest(&notes_doc(), false).await.unwrap();

    index.fail_fetch(true);
    let results = query.query("what about recall?", "Notes", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0], "# Notes\n\nSecond paragraph about recall.");
}

#[tokio::test]
async fn query_is_scoped_to_the_named_document() {
    let h = harness(
        per_paragraph_config(),
        StubEmbedder::new(4),
        ScriptedGenerator::new(vec![]),
    );
    h.store.ingest(&notes_doc(), false).await.unwrap();
    h.store
        .ingest(&Document::new("doc_other", "Other", 1, "unrelated text."), false)
        .await
        .unwrap();

    let results = h.query.query("anything", "Other", 10).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].starts_with("# Other\n\n"));
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let h = harness(
        per_paragraph_config(),
        StubEmbedder::new(4),
        ScriptedGenerator::new(vec![]),
    );
    let err = h.query.query("anything", "  ", 3).await.unwrap_err();
    assert!(matches!(err, EngineError::MissingTarget));
}

#[tokio::test]
async fn answer_fills_the_prompt_and_returns_generated_text() {
    let h = harness(
        per_paragraph_config(),
        StubEmbedder::new(4),
        ScriptedGenerator::new(vec!["The answer is 42."]),
    );
    let answer = h
        .query
        .answer("what is the answer?", &["some evidence".to_string()])
        .await
        .unwrap();
    assert_eq!(answer, "The answer is 42.");

    let prompts = h.generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("some evidence"));
    assert!(prompts[0].contains("what is the answer?"));
    assert!(!prompts[0].contains("{context}"));
}

#[tokio::test]
async fn empty_generation_is_an_error() {
    let h = harness(
        per_paragraph_config(),
        StubEmbedder::new(4),
        ScriptedGenerator::new(vec!["   "]),
    );
    let err = h.query.answer("q", &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::Generation { .. }));
}
