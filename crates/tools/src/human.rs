//! HumanTool: ask the operator before an irreversible action.
//!
//! The tool never blocks on input. It returns the confirmation marker and
//! the orchestration loop suspends the turn until the operator replies.

use async_trait::async_trait;
use kubeclaw_core::confirmation::confirmation_marker;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct HumanArgs {
    #[serde(default)]
    prompt: String,
}

pub struct HumanTool;

#[async_trait]
impl Tool for HumanTool {
    fn name(&self) -> &str {
        "HumanTool"
    }

    fn description(&self) -> &str {
        "When you need to perform irreversible dangerous operations, such as deletion actions, use this tool to request human confirmation first"
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Content for which you need human assistance",
                    "example": "Please confirm if you want to delete the foo-app pod in the default namespace"
                }
            }
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: HumanArgs = parse_args(raw_args)?;
        // The marker is single-line; keep the prompt on one line
        let prompt = args.prompt.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(confirmation_marker(&prompt))
    }
}
