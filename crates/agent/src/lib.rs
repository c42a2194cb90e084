//! The KubeClaw agent: a ReAct loop over a fixed cluster tool catalog.
//!
//! A turn follows **Prompt → Think → Act → Observe**:
//!
//! 1. **Compile** the tool catalog, history, and question into a prompt
//! 2. **Call** the LLM with the session's full message history
//! 3. **Parse** the reply into a final answer, an action, or neither
//! 4. **Dispatch** the action and append its observation, then loop
//!
//! The loop ends on a final answer, an inconclusive reply, a confirmation
//! request from a tool, or when the round budget runs out.

pub mod dispatcher;
pub mod orchestrator;
pub mod parser;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatcher::Dispatcher;
pub use orchestrator::{EXHAUSTED_MESSAGE, Orchestrator, RoundRecord, TurnOutcome, TurnReply};
pub use parser::{ParsedResponse, parse};
