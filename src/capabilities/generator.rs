//! Text generation capability: a single-turn large-language-model call.

use async_trait::async_trait;

use crate::error::EngineError;

/// Produces text from a prompt.
///
/// The engine treats this as opaque: prompt assembly happens in the query
/// engine and orchestrator, output parsing in the synthesis stages.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, EngineError>;
}
