//! DeleteTool: remove one named resource.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use std::sync::Arc;
use crate::client::{BackendClient, Endpoint};

#[derive(Debug, Default, Deserialize)]
pub struct DeleteArgs {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

pub struct DeleteTool {
    backend: Arc<BackendClient>,
}

impl DeleteTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    pub fn endpoint(args: &DeleteArgs) -> Endpoint {
        Endpoint::new(format!("/{}", args.resource.to_lowercase()))
            .param("ns", &args.namespace)
            .param("name", &args.name)
    }
}

#[async_trait]
impl Tool for DeleteTool {
    fn name(&self) -> &str {
        "DeleteTool"
    }

    fn description(&self) -> &str {
        "Used to delete specified Kubernetes resources in a given namespace, such as deleting pods, services, etc."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "resource": { "type": "string", "description": "Specified k8s resource type, e.g. pod, service, etc." },
                "name": { "type": "string", "description": "Name of the specified k8s resource instance" },
                "namespace": { "type": "string", "description": "Namespace where the specified k8s resource is located" }
            }
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: DeleteArgs = parse_args(raw_args)?;
        if args.resource.is_empty() || args.name.is_empty() {
            return Err(ToolError::InvalidArguments(
                "'resource' and 'name' are required".into(),
            ));
        }

        self.backend.delete(&Self::endpoint(&args)).await?;
        Ok("Deletion successful".into())
    }
}
