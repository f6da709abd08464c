//! Role-tagged messages recording the intermediate steps of a generation
//! request.
//!
//! Each [`crate::orchestrator::GenerationState`] carries an ordered trace of
//! these messages so callers can inspect what the pipeline did (cache
//! consultation, retrieved context, produced outline) without the engine
//! keeping any cross-request log.

use serde::{Deserialize, Serialize};

/// A single trace entry with a role and text content.
///
/// # Examples
///
/// ```
/// use studygraph::message::Message;
///
/// let request = Message::user("Create a quiz about: What is X?");
/// let note = Message::assistant("Retrieved 3 evidence chunks");
/// assert!(request.has_role(Message::USER));
/// assert!(!note.has_role(Message::USER));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// The role of the entry's author (e.g. "user", "assistant", "system").
    pub role: String,
    /// The text content of the entry.
    pub content: String,
}

impl Message {
    /// Caller-request entries.
    pub const USER: &'static str = "user";
    /// Pipeline-produced entries.
    pub const ASSISTANT: &'static str = "assistant";
    /// Fixed-instruction entries.
    pub const SYSTEM: &'static str = "system";

    /// Creates a message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
