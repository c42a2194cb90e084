//! Tool dispatcher: run one action and phrase the result as an observation.

use chrono::Utc;
use kubeclaw_core::event::{DomainEvent, EventBus};
use kubeclaw_core::tool::ToolCatalog;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Prefix of every observation fed back to the LLM.
pub const OBSERVATION_PREFIX: &str = "Observation: ";

/// Routes actions to catalog tools. Never fails: every outcome is text.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<ToolCatalog>,
    event_bus: Arc<EventBus>,
}

impl Dispatcher {
    pub fn new(catalog: Arc<ToolCatalog>, event_bus: Arc<EventBus>) -> Self {
        Self { catalog, event_bus }
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Execute `action` with `raw_args` exactly once.
    pub async fn dispatch(&self, action: &str, raw_args: &str) -> String {
        let Some(tool) = self.catalog.get(action) else {
            warn!(action, "Unknown action requested");
            return format!("{OBSERVATION_PREFIX}Unknown action: {action}");
        };

        let start = Instant::now();
        let result = tool.run(raw_args).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: action.to_string(),
            success: result.is_ok(),
            duration_ms,
            timestamp: Utc::now(),
        });

        match result {
            Ok(output) => {
                debug!(tool = action, duration_ms, bytes = output.len(), "Tool succeeded");
                format!("{OBSERVATION_PREFIX}{output}")
            }
            Err(e) => {
                warn!(tool = action, error = %e, "Tool execution failed");
                format!("{OBSERVATION_PREFIX}Error: {e}")
            }
        }
    }
}
