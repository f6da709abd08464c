//! Error taxonomy for the studygraph engine.
//!
//! Errors are split by failure domain rather than by module: retrieval
//! covers embedding and vector-index transport, generation covers the
//! external LLM seam, and parse covers structured-output decoding. Stage
//! attribution for orchestrated requests lives in
//! [`crate::orchestrator::OrchestratorError`].

use miette::Diagnostic;
use thiserror::Error;

/// Fatal engine errors surfaced to callers.
///
/// Parse failures during dialogue-script synthesis are recovered locally by
/// the heuristic parser and never reach callers as this type; parse failures
/// for every other output kind are fatal because no fallback parser exists
/// for them.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// A query was issued without a resolvable target document.
    #[error("query has no target document")]
    #[diagnostic(
        code(studygraph::missing_target),
        help("Similarity matches are only meaningful within one document's chunk chain; pass a document title.")
    )]
    MissingTarget,

    /// Overwrite was requested but the existing chunks could not be removed.
    ///
    /// No partial state is tolerated: the caller must retry the whole ingest.
    #[error("failed to clear existing chunks for fingerprint {fingerprint}: {message}")]
    #[diagnostic(
        code(studygraph::dedup_conflict),
        help("The index may hold a partial chunk set for this fingerprint. Retry the full ingest.")
    )]
    DedupConflict {
        fingerprint: String,
        message: String,
    },

    /// An embedding or vector-index call failed or timed out.
    #[error("retrieval failed: {message}")]
    #[diagnostic(code(studygraph::retrieval))]
    Retrieval { message: String },

    /// The external generation call failed, timed out, or returned empty.
    #[error("generation failed: {message}")]
    #[diagnostic(code(studygraph::generation))]
    Generation { message: String },

    /// Structured parsing of generated output failed.
    #[error("could not parse generated output: {message}")]
    #[diagnostic(
        code(studygraph::parse),
        help("Generator output did not match the requested structure.")
    )]
    Parse { message: String },
}

impl EngineError {
    /// Shorthand for a retrieval failure with a formatted message.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Shorthand for a generation failure with a formatted message.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Shorthand for a parse failure with a formatted message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
