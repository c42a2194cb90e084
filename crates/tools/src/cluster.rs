//! ClusterTool: list the clusters known to the registry.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::Tool;
use std::sync::Arc;
use crate::client::{BackendClient, Endpoint};

pub struct ClusterTool {
    backend: Arc<BackendClient>,
}

impl ClusterTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ClusterTool {
    fn name(&self) -> &str {
        "ClusterTool"
    }

    fn description(&self) -> &str {
        "Used to list cluster information"
    }

    async fn run(&self, _raw_args: &str) -> Result<String, ToolError> {
        self.backend.get_clusters(&Endpoint::new("/clusters")).await
    }
}
