//! Cluster tools for the KubeClaw agent.
//!
//! Every tool except [`human::HumanTool`] is a thin HTTP call through the
//! shared [`client::BackendClient`]. Tools return their observation text on
//! success; failures are [`ToolError`](kubeclaw_core::error::ToolError)s that
//! the dispatcher turns into `Error:` observations.

pub mod client;
pub mod cluster;
pub mod create;
pub mod delete;
pub mod human;
pub mod intelligent_debug;
pub mod job_debug;
pub mod list;
pub mod pod;
pub mod resource_info;
pub mod sandbox_log;

use kubeclaw_core::provider::Provider;
use kubeclaw_core::tool::ToolCatalog;
use std::sync::Arc;

pub use client::{BackendClient, Endpoint};

/// Build the fixed tool catalog in prompt order.
///
/// `provider` and `model` are used by `CreateTool` to draft manifests.
pub fn default_catalog(backend: Arc<BackendClient>, provider: Arc<dyn Provider>, model: &str) -> ToolCatalog {
    ToolCatalog::new()
        .with(Arc::new(create::CreateTool::new(backend.clone(), provider, model)))
        .with(Arc::new(list::ListTool::new(backend.clone())))
        .with(Arc::new(delete::DeleteTool::new(backend.clone())))
        .with(Arc::new(human::HumanTool))
        .with(Arc::new(cluster::ClusterTool::new(backend.clone())))
        .with(Arc::new(pod::PodTool::new(backend.clone())))
        .with(Arc::new(resource_info::ResourceInfoTool::new(backend.clone())))
        .with(Arc::new(job_debug::JobDebugTool::new(backend.clone())))
        .with(Arc::new(sandbox_log::SandboxLogTool::new(backend.clone())))
        .with(Arc::new(intelligent_debug::IntelligentDebugTool::new(backend)))
}
