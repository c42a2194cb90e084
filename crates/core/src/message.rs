//! Chat message and per-session message store.
//!
//! These are the value objects that flow through the whole system:
//! user query → compiled prompt → LLM completion → observation → next prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters of a single entry kept by [`MessageStore::render_history`].
pub const HISTORY_ENTRY_LIMIT: usize = 400;

/// Line that introduces the user's query at the end of a compiled prompt.
pub const QUESTION_MARKER: &str = "\nQuestion: ";

const OBSERVATION_MARKER: &str = "\nObservation: ";

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (also carries compiled prompts and observations)
    User,
    /// The LLM
    Assistant,
    /// Persona instructions
    System,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }
}

/// Ordered, role-tagged history of one session.
///
/// Index 0 is always the system persona message. Entries are never edited in
/// place; callers only get shared references back.
#[derive(Debug, Clone, Serialize)]
pub struct MessageStore {
    persona: String,
    messages: Vec<ChatMessage>,
}

impl MessageStore {
    /// Create a store seeded with the persona system message.
    pub fn new(persona: impl Into<String>) -> Self {
        let persona = persona.into();
        Self {
            messages: vec![ChatMessage::system(&persona)],
            persona,
        }
    }

    /// Drop all turns and reinstall the persona.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.messages.push(ChatMessage::system(&self.persona));
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of entries, including the system persona.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// A store is never empty; this reports whether any turn was recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Render prior turns as compact `role: content` lines.
    ///
    /// The system persona is skipped. A compiled prompt is shown as just its
    /// question, and a fed-back round as just its observation, since the
    /// assistant text is already the entry before it. Each entry is cut to
    /// [`HISTORY_ENTRY_LIMIT`] characters. Empty when no turn was recorded.
    pub fn render_history(&self) -> String {
        self.messages
            .iter()
            .skip(1)
            .map(|m| {
                let content = match m.role {
                    Role::User => user_summary(&m.content),
                    _ => m.content.trim(),
                };
                if content.chars().count() > HISTORY_ENTRY_LIMIT {
                    let cut: String = content.chars().take(HISTORY_ENTRY_LIMIT).collect();
                    format!("{}: {cut}…", m.role.as_str())
                } else {
                    format!("{}: {content}", m.role.as_str())
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn user_summary(content: &str) -> &str {
    if let Some(at) = content.rfind(QUESTION_MARKER) {
        return content[at + QUESTION_MARKER.len()..].trim();
    }
    if let Some(at) = content.rfind(OBSERVATION_MARKER) {
        return content[at + 1..].trim();
    }
    content.trim()
}
