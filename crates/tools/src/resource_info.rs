//! ResourceInfoTool: resource type metadata.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use std::sync::Arc;
use crate::client::{BackendClient, Endpoint};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfoArgs {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub info_type: String,
}

pub struct ResourceInfoTool {
    backend: Arc<BackendClient>,
}

impl ResourceInfoTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    pub fn endpoint(args: &ResourceInfoArgs) -> Result<Endpoint, ToolError> {
        let path = match args.info_type.as_str() {
            "gvr" => "/get/gvr",
            "list" => "/get/resource",
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "invalid info type: '{other}' (expected 'gvr' or 'list')"
                )));
            }
        };
        Ok(Endpoint::new(path).param("resource", &args.resource))
    }
}

#[async_trait]
impl Tool for ResourceInfoTool {
    fn name(&self) -> &str {
        "ResourceInfoTool"
    }

    fn description(&self) -> &str {
        "Used to get information about Kubernetes resource types. Can retrieve GVR (GroupVersionResource) information or list available resources of a specific type."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "resource": { "type": "string", "description": "Resource type to get information for" },
                "infoType": { "type": "string", "description": "Type of information to retrieve: 'gvr' for GroupVersionResource info or 'list' for resource list" }
            }
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: ResourceInfoArgs = parse_args(raw_args)?;
        self.backend.get(&Self::endpoint(&args)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gvr_and_list_routes() {
        let gvr: ResourceInfoArgs = parse_args(r#"{"resource":"deployments","infoType":"gvr"}"#).unwrap();
        assert_eq!(ResourceInfoTool::endpoint(&gvr).unwrap().path, "/get/gvr");

        let list: ResourceInfoArgs = parse_args(r#"{"resource":"deployments","infoType":"list"}"#).unwrap();
        let ep = ResourceInfoTool::endpoint(&list).unwrap();
        assert_eq!(ep.path, "/get/resource");
        assert_eq!(ep.query, vec![("resource", "deployments".into())]);
    }

    #[test]
    fn missing_info_type_is_rejected() {
        let args: ResourceInfoArgs = parse_args(r#"{"resource":"pods"}"#).unwrap();
        assert!(matches!(
            ResourceInfoTool::endpoint(&args),
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
