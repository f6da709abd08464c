//! Two-speaker dialogue scripts and their parsers.
//!
//! Generated script text arrives in one of two shapes: structured JSON
//! matching [`DialogueScript`], or loose labeled lines. [`parse_script`]
//! tries the structured form first and falls back to the line heuristic,
//! so a malformed generation degrades instead of failing the pipeline.

use serde::{Deserialize, Serialize};

pub const SPEAKER_ONE: &str = "Speaker 1";
pub const SPEAKER_TWO: &str = "Speaker 2";

/// One speaker turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub speaker: String,
    pub text: String,
    /// Delivery cue such as `excited` or `thoughtful`, when the generator
    /// provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl ScriptSegment {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            expression: None,
        }
    }
}

/// An ordered two-speaker script.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueScript {
    pub segments: Vec<ScriptSegment>,
}

impl DialogueScript {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

/// Parses generated script text, structured form first, heuristic second.
///
/// Never fails: input with no recognizable structure yields an empty
/// script, which callers may still treat as a degenerate result.
pub fn parse_script(raw: &str) -> DialogueScript {
    if let Some(script) = parse_strict(raw) {
        return script;
    }
    parse_heuristic(raw)
}

/// Structured parse: a [`DialogueScript`] object or a bare segment array,
/// with optional markdown code fences around either.
fn parse_strict(raw: &str) -> Option<DialogueScript> {
    let body = strip_code_fences(raw);
    if let Ok(script) = serde_json::from_str::<DialogueScript>(body) {
        if !script.segments.is_empty() {
            return Some(script);
        }
    }
    if let Ok(segments) = serde_json::from_str::<Vec<ScriptSegment>>(body) {
        if !segments.is_empty() {
            return Some(DialogueScript { segments });
        }
    }
    None
}

/// Line heuristic for loose script text.
///
/// `Speaker 1:` / `Speaker 2:` prefixes start a new turn; every unlabeled
/// line becomes its own Speaker 1 turn, regardless of who spoke last.
/// A leading `[cue]` on a turn's text becomes its expression.
pub fn parse_heuristic(raw: &str) -> DialogueScript {
    let mut segments: Vec<ScriptSegment> = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = labeled(trimmed, SPEAKER_ONE) {
            segments.push(segment_with_cue(SPEAKER_ONE, rest));
        } else if let Some(rest) = labeled(trimmed, SPEAKER_TWO) {
            segments.push(segment_with_cue(SPEAKER_TWO, rest));
        } else {
            segments.push(segment_with_cue(SPEAKER_ONE, trimmed));
        }
    }
    segments.retain(|s| !s.text.is_empty());
    DialogueScript { segments }
}

fn labeled<'a>(line: &'a str, speaker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(speaker)?;
    let rest = rest.trim_start();
    rest.strip_prefix(':').map(str::trim_start)
}

fn segment_with_cue(speaker: &str, text: &str) -> ScriptSegment {
    let mut segment = ScriptSegment::new(speaker, text.trim());
    if let Some(rest) = text.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let cue = rest[..end].trim();
            if !cue.is_empty() {
                segment.expression = Some(cue.to_string());
                segment.text = rest[end + 1..].trim().to_string();
            }
        }
    }
    segment
}

/// Strips a surrounding markdown code fence, with or without a language tag.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
