//! Response parser: extract intent from one LLM reply.

use regex_lite::Regex;
use std::sync::OnceLock;

const FINAL_ANSWER: &str = "Final Answer:";

/// What a single LLM reply asks the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// Stop and return this answer.
    FinalAnswer(String),
    /// Invoke tool `name` with the raw JSON `input`.
    Action { name: String, input: String },
    /// Neither an answer nor a complete action. Carries the raw reply.
    Inconclusive(String),
}

fn action_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Action:\s*(.*?)\n").ok()).as_ref()
}

fn action_input_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Action Input:\s*(\{[\s\S]*?\})").ok())
        .as_ref()
}

fn capture<'t>(re: Option<&Regex>, text: &'t str) -> Option<&'t str> {
    re?.captures(text)?.get(1).map(|m| m.as_str())
}

/// Classify a reply. `Final Answer:` wins over any action in the same text.
///
/// The action input is matched non-greedily up to the first `}`, so nested
/// objects are cut short. Tools take flat arguments.
pub fn parse(text: &str) -> ParsedResponse {
    if let Some((_, answer)) = text.split_once(FINAL_ANSWER) {
        return ParsedResponse::FinalAnswer(answer.trim().to_string());
    }

    let name = capture(action_regex(), text).map(str::trim);
    let input = capture(action_input_regex(), text);
    match (name, input) {
        (Some(name), Some(input)) if !name.is_empty() => ParsedResponse::Action {
            name: name.to_string(),
            input: input.to_string(),
        },
        _ => ParsedResponse::Inconclusive(text.to_string()),
    }
}
