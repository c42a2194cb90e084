//! HTTP query gateway for KubeClaw.
//!
//! Exposes the orchestration loop over JSON:
//! - `POST /query` and `POST /api/query` run one turn
//! - `GET /sessions/{id}` and `DELETE /sessions/{id}` inspect and drop sessions
//! - `GET /tools` lists the catalog, `GET /health` reports liveness
//!
//! Built on Axum. Requests for the same session id queue on that session's
//! lock; different sessions run in parallel.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use kubeclaw_agent::Orchestrator;
use kubeclaw_core::message::ChatMessage;
use kubeclaw_core::session::SessionSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

const BODY_LIMIT: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
}

type SharedState = Arc<GatewayState>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, alias = "showThinkingProcess")]
    pub show_reasoning: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolInfo>,
    pub count: usize,
}

#[derive(Serialize)]
struct SessionDetail {
    #[serde(flatten)]
    snapshot: SessionSnapshot,
    messages: Vec<ChatMessage>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Build the router without CORS, for tests and embedding.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/query", post(query_handler))
        .route("/api/query", post(query_handler))
        .route("/tools", get(tools_handler))
        .route("/sessions/{id}", get(session_handler).delete(delete_session_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS restricted to the configured origins. Unparseable origins are skipped.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
pub async fn start(
    config: kubeclaw_config::AppConfig,
    orchestrator: Arc<Orchestrator>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState { orchestrator });
    let app = build_router(state).layer(cors_layer(&config.gateway.allowed_origins));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let sessions = state.orchestrator.sessions().len().await.unwrap_or(0);
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions,
    })
}

async fn query_handler(
    State(state): State<SharedState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    info!(
        query_len = payload.query.len(),
        session_id = payload.session_id.as_deref().unwrap_or("<new>"),
        show_reasoning = payload.show_reasoning,
        "Query received"
    );

    let reply = state
        .orchestrator
        .handle(payload.session_id.as_deref(), &payload.query)
        .await
        .map_err(|e| {
            error!(error = %e, "Turn could not be attempted");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(QueryResponse {
        response: reply.render(payload.show_reasoning),
        session_id: reply.session_id.to_string(),
    }))
}

async fn tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    let tools: Vec<ToolInfo> = state
        .orchestrator
        .catalog()
        .iter()
        .map(|tool| ToolInfo {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            args_schema: tool.args_schema(),
        })
        .collect();
    let count = tools.len();
    Json(ToolListResponse { tools, count })
}

async fn session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state
        .orchestrator
        .sessions()
        .get(&id)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Session not found: {id}")))?;

    let session = handle.lock().await;
    Ok(Json(SessionDetail {
        snapshot: session.snapshot(),
        messages: session.messages.messages().to_vec(),
    }))
}

async fn delete_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .orchestrator
        .sessions()
        .remove(&id)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if removed {
        info!(session_id = %id, "Session removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, format!("Session not found: {id}")))
    }
}
