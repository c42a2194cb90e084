//! IntelligentDebugTool: staged debugging workflow for a failed job.
//!
//! Stages run in order and stop at the requested depth:
//! 1. job details and the pre-categorized job error (`quick`)
//! 2. error spans from the job's trace (`traces`)
//! 3. sandbox log scan plus the backend's log summary (`full`)

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;
use crate::client::{BackendClient, Endpoint};
use crate::sandbox_log::is_error_line;

const CONTAINER_LOG: &str = "containers.log";
const SCANNED_ERRORS: usize = 5;
const SHOWN_ERRORS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    #[default]
    Quick,
    Traces,
    Full,
}

impl DebugLevel {
    fn as_str(&self) -> &'static str {
        match self {
            DebugLevel::Quick => "quick",
            DebugLevel::Traces => "traces",
            DebugLevel::Full => "full",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntelligentDebugArgs {
    #[serde(default)]
    job_id: String,
    #[serde(default = "default_tenant")]
    tenant: String,
    #[serde(default = "default_namespace")]
    namespace: String,
    #[serde(default)]
    debug_level: DebugLevel,
}

fn default_tenant() -> String {
    "default-tenant".into()
}
fn default_namespace() -> String {
    "default".into()
}

impl Default for IntelligentDebugArgs {
    fn default() -> Self {
        Self {
            job_id: String::new(),
            tenant: default_tenant(),
            namespace: default_namespace(),
            debug_level: DebugLevel::default(),
        }
    }
}

pub struct IntelligentDebugTool {
    backend: Arc<BackendClient>,
}

impl IntelligentDebugTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    async fn trace_section(&self, trace_id: &str) -> String {
        let endpoint = Endpoint::new(format!("/api/datadog/trace/{trace_id}"));
        match self.backend.get_json(&endpoint).await {
            Ok(trace) => summarize_trace(&trace),
            Err(e) => format!("Failed to fetch traces: {e}"),
        }
    }

    async fn scan_container_log(&self, sandbox_path: &str) -> Vec<String> {
        let endpoint = Endpoint::new("/api/sandbox/logs")
            .param("path", sandbox_path)
            .param("file", CONTAINER_LOG);
        match self.backend.get(&endpoint).await {
            Ok(body) => body
                .lines()
                .filter(|l| is_error_line(l))
                .map(|l| l.trim().to_string())
                .take(SCANNED_ERRORS)
                .collect(),
            Err(e) => {
                debug!(error = %e, "Container log unavailable");
                Vec::new()
            }
        }
    }

    async fn smart_log_summary(&self, sandbox_path: &str) -> String {
        let endpoint = Endpoint::new("/api/sandbox/logs/smart").param("path", sandbox_path);
        match self.backend.get_json(&endpoint).await {
            Ok(analysis) => summarize_smart_analysis(&analysis),
            Err(_) => String::new(),
        }
    }
}

/// Render the pre-categorized `jobError.errMessage[].error` entries.
pub fn extract_job_error(details: &Value) -> String {
    let Some(messages) = details.pointer("/jobError/errMessage").and_then(Value::as_array) else {
        return String::new();
    };
    let mut out = String::new();
    for error in messages.iter().filter_map(|m| m.get("error")).filter(|e| e.is_object()) {
        for (key, label) in [
            ("category", "Category"),
            ("sub-category", "Sub-category"),
            ("component", "Component"),
            ("message", "Message"),
        ] {
            if let Some(value) = error.get(key).and_then(Value::as_str) {
                let _ = writeln!(out, "{label}: {value}");
            }
        }
        out.push('\n');
    }
    out
}

/// Trace id is the last path segment of the `Genesis-TraceID` link.
pub fn extract_trace_id(details: &Value) -> Option<String> {
    details
        .pointer("/contextData/Genesis-TraceID")
        .and_then(Value::as_str)
        .and_then(|url| url.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(String::from)
}

/// Sandbox path is the `path=` parameter of `jobLogLinks.logLink`.
pub fn extract_sandbox_path(details: &Value) -> Option<String> {
    let link = details.pointer("/jobLogLinks/logLink").and_then(Value::as_str)?;
    let (_, after) = link.split_once("path=")?;
    let path = after.split('&').next().unwrap_or_default();
    (!path.is_empty()).then(|| path.to_string())
}

#[derive(Debug, PartialEq)]
struct ErrorSpan {
    service: String,
    resource: String,
    error: String,
}

fn error_spans(trace: &Value) -> Vec<ErrorSpan> {
    let spans = trace
        .pointer("/data/attributes/spans")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .or_else(|| trace.get("spans").and_then(Value::as_array));
    let Some(spans) = spans else {
        return Vec::new();
    };

    spans
        .iter()
        .filter_map(|span| {
            let meta = span.get("meta");
            let meta_str = |key: &str| meta.and_then(|m| m.get(key)).and_then(Value::as_str);

            let otel_error = meta_str("otel.status_code") == Some("ERROR");
            let flagged = span.get("error").and_then(Value::as_f64) == Some(1.0);
            if !otel_error && !flagged {
                return None;
            }

            let mut error = String::new();
            if otel_error {
                error = meta_str("error.message")
                    .or_else(|| meta_str("err.msg"))
                    .unwrap_or_default()
                    .to_string();
                if let Some(kind) = meta_str("err.type") {
                    error = format!("[{kind}] {error}");
                }
                if let Some(sub) = meta_str("err.sub_category") {
                    error = format!("[{sub}] {error}");
                }
            }

            Some(ErrorSpan {
                service: span.get("service").and_then(Value::as_str).unwrap_or_default().into(),
                resource: span.get("resource").and_then(Value::as_str).unwrap_or_default().into(),
                error,
            })
        })
        .collect()
}

/// Summarize the error spans of a trace: root cause and propagation chain.
pub fn summarize_trace(trace: &Value) -> String {
    let spans = error_spans(trace);
    let Some(first) = spans.first() else {
        return "No error spans found in trace (all spans have OK status)".into();
    };

    let mut out = format!("Found {} error spans in trace:\n\n", spans.len());
    let root = spans.iter().find(|s| s.service == "ppregistrator").unwrap_or(first);

    out.push_str("Root Cause:\n");
    if !root.service.is_empty() {
        let _ = writeln!(out, "  Service: {}", root.service);
    }
    if !root.resource.is_empty() {
        let _ = writeln!(out, "  Resource: {}", root.resource);
    }
    if !root.error.is_empty() {
        let _ = writeln!(out, "  Error: {}", root.error);
    }
    out.push('\n');

    if spans.len() > 1 {
        let mut chain: Vec<&str> = Vec::new();
        for span in &spans {
            if !span.service.is_empty() && !chain.contains(&span.service.as_str()) {
                chain.push(&span.service);
            }
        }
        let _ = writeln!(out, "Error Propagation Chain:\n  {}", chain.join(" -> "));
    }
    out
}

fn summarize_smart_analysis(analysis: &Value) -> String {
    let Some(summary) = analysis.get("summary") else {
        return String::new();
    };
    let mut out = String::new();
    if let Some(counts) = summary.get("counts") {
        for (key, label) in [
            ("total_critical", "Total critical issues"),
            ("errors", "Errors"),
            ("warnings", "Warnings"),
        ] {
            if let Some(n) = counts.get(key).and_then(Value::as_f64) {
                let _ = writeln!(out, "{label}: {}", n as i64);
            }
        }
    }
    if let Some(categories) = summary.get("error_categories").and_then(Value::as_object) {
        out.push_str("\nError Categories:\n");
        for (category, count) in categories {
            if let Some(n) = count.as_f64() {
                let _ = writeln!(out, "- {category}: {}", n as i64);
            }
        }
    }
    out
}

fn summary_section(level: DebugLevel) -> String {
    let mut out = format!("Debug level: {}\n", level.as_str());
    let lines: &[&str] = match level {
        DebugLevel::Quick => &[
            "- Checked JobError section only",
            "- For system-level issues, use debugLevel='traces'",
            "- For application-level issues, use debugLevel='full'",
        ],
        DebugLevel::Traces => &[
            "- Checked JobError and traces",
            "- If issue not found, likely application-level - use debugLevel='full'",
        ],
        DebugLevel::Full => &[
            "- Performed full analysis including sandbox logs",
            "- Check std.out for detailed application errors",
            "- Check std.err for stack traces",
        ],
    };
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[async_trait]
impl Tool for IntelligentDebugTool {
    fn name(&self) -> &str {
        "IntelligentDebugTool"
    }

    fn description(&self) -> &str {
        "Intelligently debug failed jobs following the standard debugging workflow: 1) Get job details and JobError, 2) Fetch Datadog traces if needed, 3) Analyze sandbox logs if needed. Returns comprehensive debug summary."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "jobId": { "type": "string", "description": "The job ID or UUID to debug" },
                "tenant": { "type": "string", "description": "The tenant name", "default": "default-tenant" },
                "namespace": { "type": "string", "description": "The namespace of the job", "default": "default" },
                "debugLevel": {
                    "type": "string",
                    "enum": ["quick", "traces", "full"],
                    "description": "Debug level: quick (JobError only), traces (JobError + Datadog), full (all including sandbox logs)",
                    "default": "quick"
                }
            },
            "required": ["jobId"]
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: IntelligentDebugArgs = parse_args(raw_args)?;
        if args.job_id.is_empty() {
            return Err(ToolError::InvalidArguments("'jobId' is required".into()));
        }

        let details_endpoint = Endpoint::new(format!("/tenant/{}/jobs", args.tenant))
            .param("requuid", &args.job_id)
            .param("trace", "true");
        let details = self.backend.get_json(&details_endpoint).await?;

        let mut out = format!(
            "=== Debugging Job: {} (Tenant: {}) ===\n\n",
            args.job_id, args.tenant
        );
        let report = |body: String| format!("Debug Report for Job {}:\n\n{body}", args.job_id);

        let job_error = extract_job_error(&details);
        if job_error.is_empty() {
            out.push_str("=== Job Error ===\nNo pre-categorized errors found in JobError section.\n\n");
        } else {
            let _ = write!(out, "=== Job Error (Pre-categorized) ===\n{job_error}\n");
            if args.debug_level == DebugLevel::Quick {
                out.push_str("Tip: quick analysis complete. Use debugLevel='traces' or 'full' for deeper investigation.\n");
                return Ok(report(out));
            }
        }

        if args.debug_level != DebugLevel::Quick {
            if let Some(trace_id) = extract_trace_id(&details) {
                let _ = writeln!(out, "=== Traces ===\nTrace ID: {trace_id}");
                out.push_str(&self.trace_section(&trace_id).await);
                out.push('\n');
                if args.debug_level == DebugLevel::Traces {
                    out.push_str("Tip: trace analysis complete. Use debugLevel='full' to check application logs.\n");
                    return Ok(report(out));
                }
            }
        }

        if args.debug_level == DebugLevel::Full {
            match extract_sandbox_path(&details) {
                Some(path) => {
                    let _ = writeln!(out, "=== Sandbox Log Analysis ===\nSandbox Path: {path}\n");
                    let errors = self.scan_container_log(&path).await;
                    if errors.is_empty() {
                        let _ = writeln!(out, "No critical errors found in {CONTAINER_LOG}");
                    } else {
                        let _ = writeln!(out, "Critical errors found (showing first {SHOWN_ERRORS}):");
                        for line in errors.iter().take(SHOWN_ERRORS) {
                            let _ = writeln!(out, "- {line}");
                        }
                        if errors.len() > SHOWN_ERRORS {
                            out.push_str("... (more errors in file)\n");
                        }
                        out.push('\n');
                    }

                    let smart = self.smart_log_summary(&path).await;
                    if !smart.is_empty() {
                        let _ = writeln!(out, "\nLog Analysis Summary:\n{smart}");
                    }
                }
                None => out.push_str("=== Sandbox Logs ===\nNo sandbox path found in job details.\n\n"),
            }
        }

        out.push_str("=== Debug Summary ===\n");
        out.push_str(&summary_section(args.debug_level));
        Ok(report(out))
    }
}
