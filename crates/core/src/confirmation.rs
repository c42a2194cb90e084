//! Human-in-the-loop confirmation handshake primitives.
//!
//! A tool requests approval by returning an observation that contains the
//! sentinel marker. The loop suspends, the operator answers yes or no on
//! the next turn, and the loop resumes with that answer as the observation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Marker a tool emits to suspend the loop.
pub const CONFIRMATION_SENTINEL: &str = "[HUMAN_CONFIRMATION_REQUIRED]";

/// Build the observation text a tool returns to request confirmation.
pub fn confirmation_marker(prompt: &str) -> String {
    format!("{CONFIRMATION_SENTINEL}: {prompt}")
}

fn marker_regex() -> Option<&'static regex_lite::Regex> {
    static RE: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    RE.get_or_init(|| regex_lite::Regex::new(r"\[HUMAN_CONFIRMATION_REQUIRED\]: (.+)").ok())
        .as_ref()
}

/// Extract the confirmation prompt from an observation, if one is present.
///
/// Captures the rest of the line after `marker: `. A sentinel with nothing
/// after it is not a request and reads as an ordinary observation.
pub fn extract_confirmation(observation: &str) -> Option<String> {
    let caps = marker_regex()?.captures(observation)?;
    caps.get(1).map(|m| m.as_str().trim().to_string())
}

/// An operator's answer to a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationReply {
    Yes,
    No,
}

impl ConfirmationReply {
    /// Parse a user reply. Only exact yes/no (trimmed, any case) count.
    pub fn parse(text: &str) -> Option<Self> {
        let t = text.trim();
        if t.eq_ignore_ascii_case("yes") {
            Some(Self::Yes)
        } else if t.eq_ignore_ascii_case("no") {
            Some(Self::No)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// A suspended turn waiting on the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub prompt: String,
    pub requested_at: DateTime<Utc>,
}

impl PendingConfirmation {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            requested_at: Utc::now(),
        }
    }
}
