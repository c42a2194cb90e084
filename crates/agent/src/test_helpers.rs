//! Shared test doubles: scripted providers and fixed-output tools.

use async_trait::async_trait;
use kubeclaw_core::confirmation::confirmation_marker;
use kubeclaw_core::error::{ProviderError, ToolError};
use kubeclaw_core::message::ChatMessage;
use kubeclaw_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use kubeclaw_core::tool::{Tool, ToolCatalog};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A provider that replays scripted replies in order.
///
/// Once the script runs out the last reply repeats, which makes budget
/// exhaustion tests a one-liner. Every request is recorded.
pub struct ScriptedProvider {
    replies: Vec<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long inside every call, so other tasks get to run.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let Some(text) = self.replies.get(n).or_else(|| self.replies.last()) else {
            return Err(ProviderError::Network("no scripted replies".into()));
        };
        Ok(ProviderResponse {
            message: ChatMessage::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A tool that records its calls and returns a fixed string.
pub struct FixedTool {
    name: String,
    output: String,
    schema: bool,
    calls: AtomicUsize,
}

impl FixedTool {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            schema: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_schema(mut self) -> Self {
        self.schema = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for FixedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "fixed output tool"
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        self.schema
            .then(|| serde_json::json!({ "type": "object", "properties": {} }))
    }

    async fn run(&self, _raw_args: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// A tool that always fails with a backend 404.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "FailingTool"
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn run(&self, _raw_args: &str) -> Result<String, ToolError> {
        Err(ToolError::Backend {
            status: 404,
            body: "pod not found".into(),
        })
    }
}

/// A stand-in for the human confirmation tool.
pub struct ConfirmTool;

#[async_trait]
impl Tool for ConfirmTool {
    fn name(&self) -> &str {
        "HumanTool"
    }

    fn description(&self) -> &str {
        "asks the operator"
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: serde_json::Value =
            serde_json::from_str(raw_args).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let prompt = args["prompt"].as_str().unwrap_or_default();
        Ok(confirmation_marker(prompt))
    }
}

pub fn catalog_of(tools: Vec<FixedTool>) -> ToolCatalog {
    tools
        .into_iter()
        .fold(ToolCatalog::new(), |catalog, tool| catalog.with(Arc::new(tool)))
}
