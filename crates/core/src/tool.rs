//! Tool trait: the abstraction over cluster capabilities.
//!
//! Tools are what let the assistant act on the cluster: list resources,
//! create or delete them, fetch logs, ask the operator for confirmation.
//! The LLM selects a tool by name in its text response and supplies a raw
//! JSON string as input; the tool owns parsing of that string.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use crate::error::ToolError;

/// The core Tool trait.
///
/// Each tool (list, delete, create, human, ...) implements this trait and is
/// registered in the [`ToolCatalog`] consulted by the dispatcher.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool, as it appears after `Action:`.
    fn name(&self) -> &str;

    /// What the tool does, rendered into the system prompt.
    fn description(&self) -> &str;

    /// Example of the JSON input this tool accepts, if any.
    fn args_schema(&self) -> Option<serde_json::Value> {
        None
    }

    /// Execute the tool against the raw `Action Input` text.
    async fn run(&self, raw_args: &str) -> std::result::Result<String, ToolError>;
}

/// Parse a raw `Action Input` string into a typed argument struct.
///
/// Blank input deserializes to `T::default()` so argument-less calls work.
pub fn parse_args<T>(raw_args: &str) -> std::result::Result<T, ToolError>
where
    T: DeserializeOwned + Default,
{
    let trimmed = raw_args.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(trimmed).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// The fixed set of tools available to the orchestration loop.
///
/// Registration order is preserved so the rendered prompt is stable.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Builder-style registration.
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Get a tool by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalog")
            .field("tools", &self.names())
            .finish()
    }
}
