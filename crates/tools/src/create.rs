//! CreateTool: have the LLM draft a manifest, then submit it.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::message::ChatMessage;
use kubeclaw_core::provider::{Provider, ProviderRequest};
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use crate::client::{BackendClient, Endpoint};

/// System prompt for manifest generation.
pub const MANIFEST_SYSTEM_PROMPT: &str = "You are a virtual k8s (Kubernetes) assistant that can generate k8s yaml based on user input. The yaml will be compatible with kubectl apply command.

#Guidelines
- Do not provide any explanations, only output the yaml content
- Do not wrap the yaml content in markdown yaml code blocks";

#[derive(Debug, Default, Deserialize)]
struct CreateArgs {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    resource: String,
}

pub struct CreateTool {
    backend: Arc<BackendClient>,
    provider: Arc<dyn Provider>,
    model: String,
}

impl CreateTool {
    pub fn new(backend: Arc<BackendClient>, provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            backend,
            provider,
            model: model.into(),
        }
    }

    async fn generate_manifest(&self, prompt: &str) -> Result<String, ToolError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(MANIFEST_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            temperature: 0.0,
            max_tokens: None,
        };
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("manifest generation failed: {e}"),
            })?;
        Ok(strip_code_fence(&response.message.content))
    }
}

/// Remove a surrounding ``` fence if the model added one anyway.
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim().to_string()
}

#[async_trait]
impl Tool for CreateTool {
    fn name(&self) -> &str {
        "CreateTool"
    }

    fn description(&self) -> &str {
        "Used to create specified Kubernetes resources in a given namespace, such as creating pods, services, etc."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string", "description": "Place the user's resource creation prompt here exactly as provided, without any modifications" },
                "resource": { "type": "string", "description": "Specified k8s resource type, e.g. pod, service, etc." }
            }
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: CreateArgs = parse_args(raw_args)?;
        if args.prompt.is_empty() || args.resource.is_empty() {
            return Err(ToolError::InvalidArguments(
                "'prompt' and 'resource' are required".into(),
            ));
        }

        let yaml = self.generate_manifest(&args.prompt).await?;
        debug!(resource = %args.resource, bytes = yaml.len(), "Generated manifest");

        let endpoint = Endpoint::new(format!("/{}", args.resource.to_lowercase()));
        let body = self
            .backend
            .post_json(&endpoint, &serde_json::json!({ "yaml": yaml }))
            .await?;

        let parsed: serde_json::Value = serde_json::from_str(&body).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: format!("failed to parse backend response: {e}"),
        })?;
        Ok(match parsed.get("data") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_fence_is_stripped() {
        let fenced = "```yaml\napiVersion: v1\nkind: Pod\n```";
        assert_eq!(strip_code_fence(fenced), "apiVersion: v1\nkind: Pod");
        assert_eq!(strip_code_fence("  kind: Pod \n"), "kind: Pod");
    }
}
