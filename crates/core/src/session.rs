//! Session model and the SessionStore trait.
//!
//! A session is one conversation: its message history plus an optional
//! pending confirmation. Stores hand out shared handles guarded by an async
//! mutex, so two turns on the same session run one after the other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::confirmation::PendingConfirmation;
use crate::error::SessionError;
use crate::message::MessageStore;

/// Opaque session identifier (`session-<uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh, unique identifier.
    pub fn generate() -> Self {
        Self(format!("session-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One conversation.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub messages: MessageStore,
    pub pending: Option<PendingConfirmation>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, persona: impl Into<String>) -> Self {
        Self {
            id,
            messages: MessageStore::new(persona),
            pending: None,
            created_at: Utc::now(),
        }
    }

    /// Drop history and any pending confirmation.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            message_count: self.messages.len(),
            pending_confirmation: self.pending.as_ref().map(|p| p.prompt.clone()),
            created_at: self.created_at,
        }
    }
}

/// Read-only summary of a session, for listing and HTTP responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub message_count: usize,
    pub pending_confirmation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Shared, turn-serializing handle to a session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// The table of live sessions.
///
/// Implementations: in-memory with idle eviction. Every call that touches a
/// session refreshes its last-access time.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up `id`, or create a session when it is absent or unknown.
    ///
    /// A caller-supplied id that is not in the table is adopted as the new
    /// session's id.
    async fn get_or_create(&self, id: Option<&str>) -> std::result::Result<SessionHandle, SessionError>;

    /// Look up an existing session.
    async fn get(&self, id: &str) -> std::result::Result<Option<SessionHandle>, SessionError>;

    /// Remove a session. Returns whether it existed.
    async fn remove(&self, id: &str) -> std::result::Result<bool, SessionError>;

    /// Remove every session idle past the threshold. Returns how many were removed.
    async fn evict_idle(&self) -> std::result::Result<usize, SessionError>;

    /// Number of live sessions.
    async fn len(&self) -> std::result::Result<usize, SessionError>;

    /// Ids of all live sessions.
    async fn ids(&self) -> std::result::Result<Vec<SessionId>, SessionError>;
}
