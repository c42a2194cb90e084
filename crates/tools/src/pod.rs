//! PodTool: pod logs and events.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use std::sync::Arc;
use crate::client::{BackendClient, Endpoint};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodArgs {
    #[serde(default)]
    pub namespace: String,
    #[serde(default, alias = "name")]
    pub pod_name: String,
    #[serde(default)]
    pub container: String,
    #[serde(default)]
    pub tail: u32,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub operation: String,
}

pub struct PodTool {
    backend: Arc<BackendClient>,
}

impl PodTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    pub fn endpoint(args: &PodArgs) -> Result<Endpoint, ToolError> {
        let base = format!("/namespaces/{}/pods/{}", args.namespace, args.pod_name);
        match args.operation.as_str() {
            "logs" => {
                let ep = Endpoint::new(format!("{base}/logs")).param_if("container", &args.container);
                Ok(if args.tail > 0 { ep.param("tail", args.tail) } else { ep })
            }
            "events" => Ok(Endpoint::new(format!("{base}/events")).param_if("type", &args.event_type)),
            other => Err(ToolError::InvalidArguments(format!(
                "invalid operation: '{other}' (expected 'logs' or 'events')"
            ))),
        }
    }
}

#[async_trait]
impl Tool for PodTool {
    fn name(&self) -> &str {
        "PodTool"
    }

    fn description(&self) -> &str {
        "Used for pod-specific operations like getting logs and events. Can retrieve pod logs with optional container and line count, and get pod events with optional event type filtering."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "namespace": { "type": "string", "description": "Namespace where the pod is located" },
                "podName": { "type": "string", "description": "Name of the pod" },
                "container": { "type": "string", "description": "Optional: Specific container name for logs" },
                "tail": { "type": "integer", "description": "Optional: Number of log lines to retrieve" },
                "eventType": { "type": "string", "description": "Optional: Filter events by type (e.g., Warning)" },
                "operation": { "type": "string", "description": "Operation to perform: 'logs' or 'events'" }
            }
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: PodArgs = parse_args(raw_args)?;
        if args.pod_name.is_empty() {
            return Err(ToolError::InvalidArguments("'podName' is required".into()));
        }
        self.backend.get(&Self::endpoint(&args)?).await
    }
}
