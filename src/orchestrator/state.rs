//! Pipeline state: output kinds, stages, and the mutable generation record.

use serde::{Deserialize, Serialize};

use crate::message::Message;

use super::artifacts::Artifact;

/// The closed set of content kinds the pipeline can be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    DialogueScript,
    FlashcardSet,
    QuizSet,
    Article,
    ShortPost,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DialogueScript => "dialogue_script",
            Self::FlashcardSet => "flashcard_set",
            Self::QuizSet => "quiz_set",
            Self::Article => "article",
            Self::ShortPost => "short_post",
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stages in execution order. Not every kind visits every stage:
/// only dialogue scripts consult the cache and expand an outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RouteByKind,
    CheckCache,
    RetrieveContext,
    ExpandTopic,
    SynthesizeOutput,
    Finalize,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RouteByKind => "route_by_kind",
            Self::CheckCache => "check_cache",
            Self::RetrieveContext => "retrieve_context",
            Self::ExpandTopic => "expand_topic",
            Self::SynthesizeOutput => "synthesize_output",
            Self::Finalize => "finalize",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one generation run accumulates as it moves through the
/// stages. Owned by the pipeline loop; tests inspect it through
/// [`super::GenerationOutcome`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationState {
    pub output_kind: OutputKind,
    pub question: String,
    pub document_title: String,
    pub answer: Option<String>,
    pub evidence: Vec<String>,
    /// Expanded topic outline; dialogue scripts only.
    pub outline: Option<String>,
    pub cache_hit: bool,
    pub artifact: Option<Artifact>,
    pub stage: Stage,
    /// Conversation-shaped record of the run, one message per meaningful
    /// step.
    pub trace: Vec<Message>,
}

impl GenerationState {
    pub fn new(
        output_kind: OutputKind,
        question: impl Into<String>,
        document_title: impl Into<String>,
    ) -> Self {
        let mut state = Self {
            output_kind,
            question: question.into(),
            document_title: document_title.into(),
            answer: None,
            evidence: Vec::new(),
            outline: None,
            cache_hit: false,
            artifact: None,
            stage: Stage::RouteByKind,
            trace: Vec::new(),
        };
        let opener = Message::user(&state.question);
        state.trace.push(opener);
        state
    }

    pub fn push_trace(&mut self, message: Message) {
        self.trace.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_run_starts_at_routing() {
        let state = GenerationState::new(OutputKind::DialogueScript, "q", "Notes");
        assert_eq!(state.stage, Stage::RouteByKind);
        assert_eq!(state.trace.len(), 1);
        assert!(state.trace[0].has_role(crate::message::Message::USER));
    }

    #[test]
    fn output_kind_serializes_snake_case() {
        let json = serde_json::to_string(&OutputKind::ShortPost).unwrap();
        assert_eq!(json, "\"short_post\"");
        assert_eq!(OutputKind::Article.to_string(), "article");
    }
}
