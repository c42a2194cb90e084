//! ListTool: list resources or fetch one resource's details.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use std::sync::Arc;
use crate::client::{BackendClient, Endpoint};

#[derive(Debug, Default, Deserialize)]
pub struct ListArgs {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

pub struct ListTool {
    backend: Arc<BackendClient>,
}

impl ListTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    /// Pick the backend route: named lookup, type filter, or plain listing.
    pub fn endpoint(args: &ListArgs) -> Endpoint {
        let resource = args.resource.to_lowercase();
        if !args.name.is_empty() {
            Endpoint::new(format!("/{resource}"))
                .param("ns", &args.namespace)
                .param("name", &args.name)
        } else if !args.kind.is_empty() {
            Endpoint::new("/get/resource")
                .param("resource", &resource)
                .param("type", &args.kind)
        } else if resource == "pod" || resource == "pods" {
            Endpoint::new(format!("/namespaces/{}/pods", args.namespace))
        } else {
            Endpoint::new(format!("/{resource}")).param("ns", &args.namespace)
        }
    }
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &str {
        "ListTool"
    }

    fn description(&self) -> &str {
        "Used to list and get details of Kubernetes resources. Can list all resources of a type in a namespace, get specific resource details, or filter resources by type."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "resource": { "type": "string", "description": "Specified k8s resource type, e.g. pod, service, etc." },
                "namespace": { "type": "string", "description": "Specified k8s namespace" },
                "name": { "type": "string", "description": "Optional: Name of specific resource to get details for" },
                "type": { "type": "string", "description": "Optional: Filter resources by type" }
            }
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: ListArgs = parse_args(raw_args)?;
        if args.resource.is_empty() {
            return Err(ToolError::InvalidArguments("'resource' is required".into()));
        }

        let body = self.backend.get_json(&Self::endpoint(&args)).await?;
        let data = body.get("data").cloned().unwrap_or(serde_json::Value::Null);
        serde_json::to_string_pretty(&data).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: format!("failed to format response data: {e}"),
        })
    }
}
