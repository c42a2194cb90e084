//! SandboxLogTool: read, scan, and search sandbox log files.

use async_trait::async_trait;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Tool, parse_args};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;
use crate::client::{BackendClient, Endpoint};

/// Log files present in every sandbox.
pub const SANDBOX_LOG_FILES: [&str; 4] = ["std.out", "std.err", "decout", "decerr"];

const ANALYZE_LINES: u32 = 500;
const SEARCH_LINES: u32 = 10_000;
const ERRORS_PER_FILE: usize = 5;
const MAX_SEARCH_MATCHES: usize = 20;

/// Whether a log line looks like a failure.
pub fn is_error_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    ["error", "exception", "failed", "fatal"]
        .iter()
        .any(|needle| lower.contains(needle))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogAction {
    Read,
    #[default]
    Analyze,
    Search,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SandboxLogArgs {
    #[serde(default)]
    sandbox_path: String,
    #[serde(default)]
    action: LogAction,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default)]
    start_line: u32,
    #[serde(default = "default_num_lines")]
    num_lines: u32,
    #[serde(default)]
    search_pattern: String,
}

fn default_log_file() -> String {
    "std.out".into()
}
fn default_num_lines() -> u32 {
    100
}

impl Default for SandboxLogArgs {
    fn default() -> Self {
        Self {
            sandbox_path: String::new(),
            action: LogAction::default(),
            log_file: default_log_file(),
            start_line: 0,
            num_lines: default_num_lines(),
            search_pattern: String::new(),
        }
    }
}

pub struct SandboxLogTool {
    backend: Arc<BackendClient>,
}

impl SandboxLogTool {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    fn read_endpoint(path: &str, file: &str, start: u32, lines: u32) -> Endpoint {
        Endpoint::new("/sandbox/read")
            .param("path", path)
            .param("file", file)
            .param("start", start)
            .param("lines", lines)
    }

    /// Fetch a window of a log file and return its `content` field.
    async fn read_content(&self, path: &str, file: &str, start: u32, lines: u32) -> Result<Option<String>, ToolError> {
        let body = self.backend.get(&Self::read_endpoint(path, file, start, lines)).await?;
        Ok(serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("content").and_then(|c| c.as_str()).map(String::from)))
    }

    async fn read(&self, args: &SandboxLogArgs) -> Result<String, ToolError> {
        let endpoint = Self::read_endpoint(&args.sandbox_path, &args.log_file, args.start_line, args.num_lines);
        let body = self.backend.get(&endpoint).await?;
        let content = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("content").and_then(|c| c.as_str()).map(String::from));
        Ok(match content {
            Some(content) => format!(
                "=== Content of {} (lines {}-{}) ===\n{content}",
                args.log_file,
                args.start_line,
                args.start_line + args.num_lines
            ),
            None => body,
        })
    }

    async fn analyze(&self, path: &str) -> String {
        let mut found: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for file in SANDBOX_LOG_FILES {
            // Missing files are skipped
            let content = match self.read_content(path, file, 0, ANALYZE_LINES).await {
                Ok(Some(content)) => content,
                Ok(None) => continue,
                Err(e) => {
                    debug!(file, error = %e, "Skipping sandbox log");
                    continue;
                }
            };
            let errors: Vec<String> = content
                .lines()
                .filter(|l| is_error_line(l))
                .map(|l| l.trim().to_string())
                .collect();
            if !errors.is_empty() {
                found.insert(file, errors);
            }
        }
        render_analysis(&found)
    }

    async fn search(&self, args: &SandboxLogArgs) -> Result<String, ToolError> {
        if args.search_pattern.is_empty() {
            return Err(ToolError::InvalidArguments(
                "searchPattern is required for search action".into(),
            ));
        }
        let content = self
            .read_content(&args.sandbox_path, &args.log_file, 0, SEARCH_LINES)
            .await?
            .unwrap_or_default();
        Ok(render_search(&args.log_file, &args.search_pattern, &content))
    }
}

fn render_analysis(found: &BTreeMap<&str, Vec<String>>) -> String {
    let mut out = String::from("=== Analyzing Sandbox Logs ===\n\n");
    if found.is_empty() {
        out.push_str("No obvious errors found in log files.\n");
        out.push_str("You may want to read specific files for more details.\n");
        return out;
    }

    out.push_str("Found errors in the following files:\n\n");
    for (file, errors) in found {
        let _ = writeln!(out, "File: {file}");
        out.push_str("Errors found:\n");
        for line in errors.iter().take(ERRORS_PER_FILE) {
            let _ = writeln!(out, "  - {line}");
        }
        if errors.len() > ERRORS_PER_FILE {
            let _ = writeln!(out, "  ... and {} more errors", errors.len() - ERRORS_PER_FILE);
        }
        out.push('\n');
    }
    out
}

fn render_search(file: &str, pattern: &str, content: &str) -> String {
    let mut out = format!("=== Searching for '{pattern}' in {file} ===\n");
    let needle = pattern.to_lowercase();
    let mut matches = 0;
    for line in content.lines().filter(|l| l.to_lowercase().contains(&needle)) {
        let _ = writeln!(out, "{}", line.trim());
        matches += 1;
        if matches >= MAX_SEARCH_MATCHES {
            let _ = writeln!(out, "\n... (showing first {MAX_SEARCH_MATCHES} matches)");
            break;
        }
    }
    if matches == 0 {
        let _ = writeln!(out, "No matches found for '{pattern}'");
    } else {
        let _ = writeln!(out, "\nTotal matches shown: {matches}");
    }
    out
}

#[async_trait]
impl Tool for SandboxLogTool {
    fn name(&self) -> &str {
        "SandboxLogTool"
    }

    fn description(&self) -> &str {
        "Read and analyze sandbox log files (std.out, std.err, decout, decerr) from failed jobs. Can search for errors, read specific lines, or analyze the entire log file."
    }

    fn args_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "sandboxPath": { "type": "string", "description": "The sandbox directory path containing log files" },
                "action": {
                    "type": "string",
                    "enum": ["read", "analyze", "search"],
                    "description": "Action to perform: read (show lines), analyze (find errors), search (grep for pattern)",
                    "default": "analyze"
                },
                "logFile": {
                    "type": "string",
                    "enum": SANDBOX_LOG_FILES,
                    "description": "The log file to read. Required for 'read' and 'search' actions",
                    "default": "std.out"
                },
                "startLine": { "type": "integer", "description": "Starting line number for 'read' action (0-based)", "default": 0 },
                "numLines": { "type": "integer", "description": "Number of lines to read for 'read' action", "default": 100 },
                "searchPattern": { "type": "string", "description": "Pattern to search for in 'search' action" }
            },
            "required": ["sandboxPath"]
        }))
    }

    async fn run(&self, raw_args: &str) -> Result<String, ToolError> {
        let args: SandboxLogArgs = parse_args(raw_args)?;
        if args.sandbox_path.is_empty() {
            return Err(ToolError::InvalidArguments("'sandboxPath' is required".into()));
        }
        if !SANDBOX_LOG_FILES.contains(&args.log_file.as_str()) {
            return Err(ToolError::InvalidArguments(format!(
                "unknown log file '{}'",
                args.log_file
            )));
        }

        match args.action {
            LogAction::Read => self.read(&args).await,
            LogAction::Analyze => Ok(self.analyze(&args.sandbox_path).await),
            LogAction::Search => self.search(&args).await,
        }
    }
}
