//! Generation pipeline.
//!
//! Drives one request through an explicit stage machine: kind routing,
//! cache check (dialogue scripts only), context retrieval with answer
//! synthesis, topic expansion (scripts only), kind-specific output
//! synthesis, and finalization. Every external call is bounded by the
//! configured timeout and every failure carries the stage it happened in.

pub mod artifacts;
pub mod prompts;
pub mod script;
pub mod state;

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, SemanticCache};
use crate::capabilities::{TextGenerator, bounded};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::message::Message;
use crate::query::QueryEngine;

pub use artifacts::{
    Article, Artifact, Flashcard, FlashcardSet, QuestionFeedback, QuizGrade, QuizQuestion,
    QuizSet, ShortPost,
};
pub use script::{DialogueScript, ScriptSegment, parse_script};
pub use state::{GenerationState, OutputKind, Stage};

/// A pipeline failure attributed to the stage it occurred in.
#[derive(Debug, Error, Diagnostic)]
#[error("generation failed during {stage}")]
#[diagnostic(code(studygraph::orchestrator))]
pub struct OrchestratorError {
    pub stage: Stage,
    #[source]
    #[diagnostic_source]
    pub source: EngineError,
}

/// What one completed run hands back to the caller.
#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    pub artifact: Artifact,
    pub answer: String,
    pub evidence: Vec<String>,
    pub cache_hit: bool,
    pub trace: Vec<Message>,
}

/// Runs generation requests end to end over the query engine, the semantic
/// cache, and a text generator.
pub struct Orchestrator {
    query: Arc<QueryEngine>,
    cache: Arc<SemanticCache>,
    generator: Arc<dyn TextGenerator>,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(
        query: Arc<QueryEngine>,
        cache: Arc<SemanticCache>,
        generator: Arc<dyn TextGenerator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            query,
            cache,
            generator,
            config,
        }
    }

    /// Produces one artifact of `kind` for `question` against the named
    /// document, advancing the stage machine until completion.
    pub async fn generate_content(
        &self,
        kind: OutputKind,
        question: &str,
        document_title: &str,
    ) -> Result<GenerationOutcome, OrchestratorError> {
        let mut state = GenerationState::new(kind, question, document_title);
        info!(kind = %kind, document_title, "generation request started");

        loop {
            let stage = state.stage;
            match stage {
                Stage::RouteByKind => {
                    // Pure dispatch; only scripts consult the cache.
                    state.stage = if kind == OutputKind::DialogueScript {
                        Stage::CheckCache
                    } else {
                        Stage::RetrieveContext
                    };
                    Ok(())
                }
                Stage::CheckCache => self.check_cache(&mut state).await,
                Stage::RetrieveContext => self.retrieve_context(&mut state).await,
                Stage::ExpandTopic => self.expand_topic(&mut state).await,
                Stage::SynthesizeOutput => self.synthesize_output(&mut state).await,
                Stage::Finalize => self.finalize(&mut state).await,
                Stage::Complete => break,
            }
            .map_err(|source| OrchestratorError { stage, source })?;
        }

        let artifact = state.artifact.ok_or(OrchestratorError {
            stage: Stage::Finalize,
            source: EngineError::generation("pipeline completed without an artifact"),
        })?;
        info!(kind = %kind, cache_hit = state.cache_hit, "generation request complete");
        Ok(GenerationOutcome {
            artifact,
            answer: state.answer.unwrap_or_default(),
            evidence: state.evidence,
            cache_hit: state.cache_hit,
            trace: state.trace,
        })
    }

    /// Cache consultation, dialogue scripts only. A hit short-circuits
    /// straight to finalization; a backend failure counts as a miss.
    async fn check_cache(&self, state: &mut GenerationState) -> Result<(), EngineError> {
        let cached = match self
            .cache
            .lookup(&state.question, &state.document_title)
            .await
        {
            Ok(hit) => hit,
            Err(err) => {
                warn!(error = %err, "cache lookup failed, generating fresh");
                None
            }
        };
        match cached {
            Some(entry) => {
                debug!(document_title = %state.document_title, "serving script from cache");
                state.answer = Some(entry.answer);
                state.evidence = entry.evidence;
                state.artifact = Some(Artifact::DialogueScript(entry.script));
                state.cache_hit = true;
                state.push_trace(Message::assistant("Served dialogue script from cache"));
                state.stage = Stage::Finalize;
            }
            None => {
                state.stage = Stage::RetrieveContext;
            }
        }
        Ok(())
    }

    /// Similarity retrieval followed by answer synthesis over the evidence.
    async fn retrieve_context(&self, state: &mut GenerationState) -> Result<(), EngineError> {
        state.evidence = self
            .query
            .query_default(&state.question, &state.document_title)
            .await?;
        state.push_trace(Message::assistant(&format!(
            "Retrieved {} evidence chunks",
            state.evidence.len()
        )));

        let answer = self.query.answer(&state.question, &state.evidence).await?;
        state.push_trace(Message::assistant(&answer));
        state.answer = Some(answer);
        state.stage = if state.output_kind == OutputKind::DialogueScript {
            Stage::ExpandTopic
        } else {
            Stage::SynthesizeOutput
        };
        Ok(())
    }

    /// Outline expansion before script writing; dialogue scripts only.
    async fn expand_topic(&self, state: &mut GenerationState) -> Result<(), EngineError> {
        let answer = state.answer.as_deref().unwrap_or_default();
        let prompt = prompts::expand_topic(&state.question, answer, &state.evidence);
        let outline = self.generate(&prompt).await?;
        state.push_trace(Message::assistant(&outline));
        state.outline = Some(outline);
        state.stage = Stage::SynthesizeOutput;
        Ok(())
    }

    async fn synthesize_output(&self, state: &mut GenerationState) -> Result<(), EngineError> {
        let answer = state.answer.clone().unwrap_or_default();
        let artifact = match state.output_kind {
            OutputKind::DialogueScript => {
                let outline = state.outline.as_deref().unwrap_or(&answer);
                let raw = self.generate(&prompts::script(outline, &answer)).await?;
                // Parse failures degrade to the heuristic inside
                // parse_script; they never fail the run.
                let dialogue = parse_script(&raw);
                debug!(segments = dialogue.len(), "script parsed");
                Artifact::DialogueScript(dialogue)
            }
            OutputKind::FlashcardSet => {
                let raw = self
                    .generate(&prompts::flashcards(
                        &answer,
                        &state.evidence,
                        self.config.flashcard_count,
                    ))
                    .await?;
                let set: FlashcardSet = decode_json(&raw)?;
                Artifact::FlashcardSet(set)
            }
            OutputKind::QuizSet => {
                let raw = self
                    .generate(&prompts::quiz(
                        &answer,
                        &state.evidence,
                        self.config.quiz_question_count,
                    ))
                    .await?;
                let set: QuizSet = decode_json(&raw)?;
                if set.questions.len() != self.config.quiz_question_count {
                    warn!(
                        requested = self.config.quiz_question_count,
                        produced = set.questions.len(),
                        "quiz question count differs from request"
                    );
                }
                Artifact::QuizSet(set)
            }
            OutputKind::Article => {
                let raw = self
                    .generate(&prompts::article(&answer, &state.evidence))
                    .await?;
                Artifact::Article(Article::from_generated(&raw))
            }
            OutputKind::ShortPost => {
                // Length is a prompt constraint; overlong output passes
                // through untruncated.
                let raw = self
                    .generate(&prompts::short_post(
                        &answer,
                        &state.evidence,
                        self.config.short_post_char_limit,
                    ))
                    .await?;
                Artifact::ShortPost(ShortPost { text: raw })
            }
        };
        state.push_trace(Message::assistant(&format!(
            "Produced {} artifact",
            state.output_kind
        )));
        state.artifact = Some(artifact);
        state.stage = Stage::Finalize;
        Ok(())
    }

    /// Caches freshly generated dialogue scripts. Cache hits and non-script
    /// kinds pass through.
    async fn finalize(&self, state: &mut GenerationState) -> Result<(), EngineError> {
        if !state.cache_hit {
            if let Some(Artifact::DialogueScript(script)) = &state.artifact {
                let entry = CacheEntry {
                    script: script.clone(),
                    source_document_title: state.document_title.clone(),
                    answer: state.answer.clone().unwrap_or_default(),
                    evidence: state.evidence.clone(),
                    media_location: None,
                    cached_at: chrono::Utc::now(),
                };
                if let Err(err) = self
                    .cache
                    .store(&state.question, &state.document_title, entry)
                    .await
                {
                    // The artifact is already in hand; losing the cache
                    // write only costs a future recomputation.
                    warn!(error = %err, "failed to cache generated script");
                }
            }
        }
        state.stage = Stage::Complete;
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        let output = bounded(self.config.call_timeout, self.generator.generate(prompt), || {
            EngineError::generation("generation call timed out")
        })
        .await?;
        if output.trim().is_empty() {
            return Err(EngineError::generation("generator returned empty output"));
        }
        Ok(output)
    }
}

/// Decodes generator JSON after stripping any markdown code fence.
fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, EngineError> {
    let body = script::strip_code_fences(raw);
    serde_json::from_str(body).map_err(|err| EngineError::parse(err.to_string()))
}
