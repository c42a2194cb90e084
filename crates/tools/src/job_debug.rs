//! JobDebugTool: debug information for a failed job.
//!
//! Jobs are found by UUID or by name + namespace. The `full` view is
//! rendered as a sectioned report; the narrower views return the backend
//! body unchanged.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use crate::client::{BackendClient, Endpoint};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugView {
    #[default]
    Full,
    Traces,
    Errors,
    Logs,
    Pods,
}

impl DebugView {
    fn suffix(&self) -> &'static str {
        match self {
            DebugView::Full => "debug",
            DebugView::Traces => "traces",
            DebugView::Errors => "errors",
            DebugView::Logs => "sandbox",
            DebugView::Pods => "pods",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct JobDebugArgs {
    #[serde(default)]
    uuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    debug_type: DebugView,
}

pub struct JobDebugTool {
    backend: Arc<BackendClient>,
}

impl JobDebugTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    /// Resolve a UUID to `(name, namespace)` via the job lookup endpoint.
    async fn resolve_uuid(&self, uuid: &str, namespace: &str) -> Result<(String, String), ToolError> {
        let endpoint = Endpoint::new(format!("/jobs/uuid/{uuid}")).param_if("namespace", namespace);
        let job = self.backend.get_json(&endpoint).await?;
        Ok(job_identity(&job))
    }
}

/// Pull name and namespace from a job document, preferring `metadata`.
fn job_identity(job: &Value) -> (String, String) {
    let pick = |key: &str| {
        job.pointer(&format!("/metadata/{key}"))
            .and_then(Value::as_str)
            .or_else(|| job.get(key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    };
    (pick("name"), pick("namespace"))
}

fn s<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render the `full` debug document as a sectioned report.
pub fn format_debug_report(info: &Value) -> String {
    let mut out = String::new();

    if let Some(job) = info.get("job").filter(|v| v.is_object()) {
        out.push_str("=== Job Summary ===\n");
        let _ = writeln!(out, "Name: {}/{}", s(job, "namespace"), s(job, "name"));
        let _ = writeln!(out, "UUID: {}", s(job, "uuid"));
        let _ = writeln!(out, "Status: {}", s(job, "status"));
        out.push('\n');
    }

    if let Some(traces) = info.get("traces").filter(|v| v.is_object()) {
        out.push_str("=== Trace Information ===\n");
        for (key, label) in [
            ("datadogUrl", "Datadog URL"),
            ("traceId", "Trace ID"),
            ("traceLink", "Trace Link"),
        ] {
            let value = s(traces, key);
            if !value.is_empty() {
                let _ = writeln!(out, "{label}: {value}");
            }
        }
        out.push('\n');
    }

    if let Some(errors) = info.get("errors").filter(|v| v.is_object()) {
        out.push_str("=== Error Details ===\n");
        for (key, label) in [("reason", "Reason"), ("message", "Message")] {
            let value = s(errors, key);
            if !value.is_empty() {
                let _ = writeln!(out, "{label}: {value}");
            }
        }
        if let Some(pod_errors) = errors.get("podErrors").and_then(Value::as_array).filter(|a| !a.is_empty()) {
            out.push_str("\nPod Errors:\n");
            for pe in pod_errors {
                let _ = writeln!(out, "  - Pod: {}, Container: {}", s(pe, "podName"), s(pe, "container"));
                let _ = writeln!(out, "    Reason: {}", s(pe, "reason"));
                let _ = writeln!(out, "    Message: {}", s(pe, "message"));
            }
        }
        out.push('\n');
    }

    if let Some(logs) = info.get("logs").filter(|v| v.is_object()) {
        out.push_str("=== Log Information ===\n");
        let sandbox_path = s(logs, "sandboxPath");
        if !sandbox_path.is_empty() {
            let _ = writeln!(out, "Sandbox Path: {sandbox_path}");
            out.push_str("  Available log files: std.out, std.err, decout, decerr\n");
            out.push_str("  Use SandboxLogTool with this path to analyze them\n");
        }
        let sandbox_url = s(logs, "sandboxUrl");
        if !sandbox_url.is_empty() {
            let _ = writeln!(out, "Sandbox URL: {sandbox_url}");
        }
        if let Some(files) = logs.get("logFiles").and_then(Value::as_object).filter(|m| !m.is_empty()) {
            out.push_str("\nLog Files:\n");
            for (name, file) in files {
                let _ = writeln!(out, "  - {name}: {}", display(file));
            }
        }
        if let Some(containers) = logs.get("containers").and_then(Value::as_object).filter(|m| !m.is_empty()) {
            out.push_str("\nContainer Logs Available:\n");
            for (container, info) in containers {
                let _ = writeln!(out, "  - {container}: {}", display(info));
            }
        }
        out.push('\n');
    }

    if let Some(events) = info.get("events").and_then(Value::as_array).filter(|a| !a.is_empty()) {
        out.push_str("=== Events ===\n");
        for event in events {
            let _ = writeln!(out, "  - {}", display(event));
        }
        out.push('\n');
    }

    if let Some(pods) = info.get("pods").and_then(Value::as_array).filter(|a| !a.is_empty()) {
        out.push_str("=== Associated Pods ===\n");
        for pod in pods.iter().filter(|p| p.is_object()) {
            let _ = writeln!(
                out,
                "  - {} (Status: {}, Node: {})",
                s(pod, "name"),
                s(pod, "status"),
                s(pod, "node")
            );
        }
    }

    out
}

#[async_trait]
impl Tool for JobDebugTool {
    fn name(&self) -> &str {
        "JobDebugTool"
    }

    fn description(&self) -> &str {
        "Debug failed Kubernetes jobs by retrieving comprehensive information including Datadog traces, error details, sandbox logs, and associated pod information. Can find jobs by name or UUID."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "uuid": { "type": "string", "description": "The UUID of the job to debug (use this OR name+namespace)" },
                "name": { "type": "string", "description": "The name of the job to debug" },
                "namespace": { "type": "string", "description": "The namespace of the job (required if using name, optional if using UUID)" },
                "debug_type": {
                    "type": "string",
                    "enum": ["full", "traces", "errors", "logs", "pods"],
                    "description": "Type of debug information to retrieve. Default is 'full' for all information",
                    "default": "full"
                }
            },
            "oneOf": [
                { "required": ["uuid"] },
                { "required": ["name", "namespace"] }
            ]
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let mut args: JobDebugArgs = parse_args(raw_args)?;

        if !args.uuid.is_empty() {
            let (name, namespace) = self.resolve_uuid(&args.uuid, &args.namespace).await?;
            if !name.is_empty() {
                args.name = name;
            }
            if !namespace.is_empty() {
                args.namespace = namespace;
            }
        }

        if args.name.is_empty() || args.namespace.is_empty() {
            return Err(ToolError::InvalidArguments(
                "job name and namespace are required".into(),
            ));
        }

        let endpoint = Endpoint::new(format!(
            "/jobs/{}/{}/{}",
            args.namespace,
            args.name,
            args.debug_type.suffix()
        ));
        let body = self.backend.get(&endpoint).await?;

        if args.debug_type != DebugView::Full {
            return Ok(body);
        }
        // Unparseable debug documents pass through raw
        Ok(match serde_json::from_str::<Value>(&body) {
            Ok(info) if info.is_object() => format_debug_report(&info),
            _ => body,
        })
    }
}
