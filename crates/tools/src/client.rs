//! HTTP client for the cluster backend.
//!
//! Every tool is a thin call through this client. Non-2xx replies become
//! [`ToolError::Backend`] so the dispatcher can surface them as `Error:`
//! observations.

use kubeclaw_core::error::ToolError;
use std::time::Duration;
use tracing::debug;

/// A backend path plus query parameters, kept separate from the base URL
/// so tools can be tested without a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Add a parameter only when the value is non-empty.
    pub fn param_if(self, key: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.param(key, value)
        }
    }
}

/// Client for the resource backend and the cluster registry.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    clusters_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, clusters_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            clusters_url: clusters_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        }
    }

    pub fn from_config(config: &kubeclaw_config::BackendConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.clusters_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET against the resource backend.
    pub async fn get(&self, endpoint: &Endpoint) -> Result<String, ToolError> {
        let url = format!("{}{}", self.base_url, endpoint.path);
        self.send(self.client.get(&url).query(&endpoint.query), &url).await
    }

    /// GET against the cluster registry.
    pub async fn get_clusters(&self, endpoint: &Endpoint) -> Result<String, ToolError> {
        let url = format!("{}{}", self.clusters_url, endpoint.path);
        self.send(self.client.get(&url).query(&endpoint.query), &url).await
    }

    /// GET and decode the body as JSON.
    pub async fn get_json(&self, endpoint: &Endpoint) -> Result<serde_json::Value, ToolError> {
        let body = self.get(endpoint).await?;
        serde_json::from_str(&body).map_err(|e| ToolError::ExecutionFailed {
            tool_name: endpoint.path.clone(),
            reason: format!("failed to parse backend response: {e}"),
        })
    }

    /// POST a JSON body against the resource backend.
    pub async fn post_json(&self, endpoint: &Endpoint, body: &serde_json::Value) -> Result<String, ToolError> {
        let url = format!("{}{}", self.base_url, endpoint.path);
        self.send(self.client.post(&url).query(&endpoint.query).json(body), &url).await
    }

    /// DELETE against the resource backend.
    pub async fn delete(&self, endpoint: &Endpoint) -> Result<String, ToolError> {
        let url = format!("{}{}", self.base_url, endpoint.path);
        self.send(self.client.delete(&url).query(&endpoint.query), &url).await
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String, ToolError> {
        debug!(%url, "Backend request");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout {
                    tool_name: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                ToolError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ToolError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
