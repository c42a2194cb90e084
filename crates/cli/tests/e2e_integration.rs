//! End-to-end tests for the KubeClaw assistant.
//!
//! These run the real orchestrator, tool catalog, and session store against
//! a scripted LLM and a throwaway cluster backend on 127.0.0.1.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use kubeclaw_agent::{EXHAUSTED_MESSAGE, Orchestrator, TurnOutcome};
use kubeclaw_core::error::ProviderError;
use kubeclaw_core::event::EventBus;
use kubeclaw_core::message::{ChatMessage, Role};
use kubeclaw_core::provider::{Provider, ProviderRequest, ProviderResponse};
use kubeclaw_core::session::SessionStore;
use kubeclaw_sessions::InMemorySessionStore;
use kubeclaw_tools::BackendClient;
use serde_json::json;
use std::collections::HashMap;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Replays scripted replies in sequence; the last one repeats.
struct ScriptedProvider {
    replies: Vec<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_user_message(&self, call: usize) -> ChatMessage {
        let requests = self.requests.lock().unwrap();
        requests[call]
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .cloned()
            .unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let text = self
            .replies
            .get(n)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or_default();
        Ok(ProviderResponse {
            message: ChatMessage::assistant(text),
            usage: None,
            model: "mock-model".into(),
        })
    }
}

// ── Mock Backend ─────────────────────────────────────────────────────────

#[derive(Default)]
struct BackendCounters {
    deletes: AtomicUsize,
    creates: AtomicUsize,
}

async fn spawn_backend(counters: Arc<BackendCounters>) -> String {
    let delete_counter = counters.clone();
    let create_counter = counters;

    let router = Router::new()
        .route(
            "/namespaces/{ns}/pods",
            get(|Path(ns): Path<String>| async move {
                Json(json!({ "data": [
                    { "name": "web-1", "namespace": ns, "status": "Running" },
                    { "name": "web-2", "namespace": ns, "status": "Running" },
                    { "name": "db-0", "namespace": ns, "status": "Running" }
                ]}))
            }),
        )
        .route(
            "/pod",
            post(move |Json(body): Json<serde_json::Value>| {
                let counters = create_counter.clone();
                async move {
                    counters.creates.fetch_add(1, Ordering::SeqCst);
                    assert!(body["yaml"].as_str().unwrap().contains("kind: Pod"));
                    Json(json!({ "data": "pod/nginx created" }))
                }
            })
            .delete(move |Query(q): Query<HashMap<String, String>>| {
                let counters = delete_counter.clone();
                async move {
                    if q.get("name").map(String::as_str) == Some("foo-app") {
                        counters.deletes.fetch_add(1, Ordering::SeqCst);
                        (StatusCode::OK, "{}".to_string())
                    } else {
                        (StatusCode::NOT_FOUND, "pods \"ghost\" not found".to_string())
                    }
                }
            }),
        )
        .route(
            "/clusters",
            get(|| async { Json(json!([{ "name": "prod-east" }])) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    provider: Arc<ScriptedProvider>,
    counters: Arc<BackendCounters>,
    orchestrator: Orchestrator,
}

async fn harness(replies: &[&str]) -> Harness {
    let provider = ScriptedProvider::new(replies);
    let counters = Arc::new(BackendCounters::default());
    let url = spawn_backend(counters.clone()).await;

    let backend = Arc::new(BackendClient::new(&url, &url, Duration::from_secs(5)));
    let catalog = kubeclaw_tools::default_catalog(backend, provider.clone(), "mock-model");
    let sessions = Arc::new(InMemorySessionStore::new("You are a helpful k8s assistant!"));
    let orchestrator = Orchestrator::new(
        provider.clone(),
        "mock-model",
        Arc::new(catalog),
        sessions,
        Arc::new(EventBus::default()),
    );

    Harness {
        provider,
        counters,
        orchestrator,
    }
}

const LIST_PODS: &str = "Thought: I should list the pods in the default namespace.\nAction: ListTool\nAction Input: {\"resource\": \"pod\", \"namespace\": \"default\"}\nPAUSE";
const CONFIRM_DELETE: &str = "Thought: Deletion is irreversible, confirm first.\nAction: HumanTool\nAction Input: {\"prompt\": \"Please confirm if you want to delete the foo-app pod in the default namespace (yes/no)\"}\nPAUSE";
const DELETE_FOO: &str = "Thought: User has confirmed.\nAction: DeleteTool\nAction Input: {\"resource\": \"pod\", \"name\": \"foo-app\", \"namespace\": \"default\"}\nPAUSE";

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_pods_in_default_namespace() {
    let h = harness(&[
        LIST_PODS,
        "Thought: Do I need to use a tool? No\nFinal Answer: There are 3 pods running.",
    ])
    .await;

    let reply = h
        .orchestrator
        .handle(None, "How many pods are running in the default namespace?")
        .await
        .unwrap();

    assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("There are 3 pods running.".into()));
    assert_eq!(reply.render(false), "There are 3 pods running.");
    assert_eq!(h.provider.calls(), 2);

    let fed_back = h.provider.last_user_message(1).content;
    assert!(fed_back.starts_with(LIST_PODS));
    assert!(fed_back.contains("\nObservation: ["));
    assert!(fed_back.contains("\"db-0\""));
}

#[tokio::test]
async fn delete_requires_confirmation_then_resumes() {
    let h = harness(&[
        CONFIRM_DELETE,
        DELETE_FOO,
        "Thought: Do I need to use a tool? No\nFinal Answer: The pod named foo-app in the default namespace has been successfully deleted.",
    ])
    .await;

    let first = h
        .orchestrator
        .handle(Some("ops-1"), "Delete the pod named foo-app in the default namespace")
        .await
        .unwrap();
    assert!(matches!(first.outcome, TurnOutcome::ConfirmationRequired { .. }));
    assert!(first.render(false).starts_with("**Confirmation Required:** Please confirm"));
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.counters.deletes.load(Ordering::SeqCst), 0);

    let second = h.orchestrator.handle(Some("ops-1"), "yes").await.unwrap();
    assert_eq!(
        second.outcome,
        TurnOutcome::FinalAnswer(
            "The pod named foo-app in the default namespace has been successfully deleted.".into()
        )
    );
    assert_eq!(h.provider.calls(), 3);
    assert_eq!(h.counters.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(h.provider.last_user_message(1).content, "Observation: yes");
    assert!(h.provider.last_user_message(2).content.ends_with("Observation: Deletion successful"));
}

#[tokio::test]
async fn declined_confirmation_skips_delete() {
    let h = harness(&[
        CONFIRM_DELETE,
        "Thought: Do I need to use a tool? No\nFinal Answer: Okay, the pod was not deleted.",
    ])
    .await;

    h.orchestrator.handle(Some("ops-2"), "Delete foo-app").await.unwrap();
    let reply = h.orchestrator.handle(Some("ops-2"), "No").await.unwrap();

    assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("Okay, the pod was not deleted.".into()));
    assert_eq!(h.provider.last_user_message(1).content, "Observation: no");
    assert_eq!(h.counters.deletes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn backend_error_becomes_observation() {
    let h = harness(&[
        "Action: DeleteTool\nAction Input: {\"resource\": \"pod\", \"name\": \"ghost\", \"namespace\": \"default\"}\n",
        "Final Answer: The pod ghost does not exist.",
    ])
    .await;

    let reply = h.orchestrator.handle(None, "delete ghost").await.unwrap();
    assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("The pod ghost does not exist.".into()));
    assert_eq!(
        reply.rounds[0].observation.as_deref(),
        Some("Observation: Error: Backend returned HTTP 404: pods \"ghost\" not found")
    );
}

#[tokio::test]
async fn malformed_arguments_become_observation() {
    let h = harness(&[
        "Action: ListTool\nAction Input: {\"resource\": pod}\n",
        "Final Answer: sorry",
    ])
    .await;

    let reply = h.orchestrator.handle(None, "list pods").await.unwrap();
    let observation = reply.rounds[0].observation.clone().unwrap();
    assert!(observation.starts_with("Observation: Error: Invalid tool arguments:"));
}

#[tokio::test]
async fn unknown_action_does_not_stop_the_loop() {
    let h = harness(&[
        "Action: KubectlTool\nAction Input: {\"cmd\": \"get pods\"}\n",
        "Action: ClusterTool\nAction Input: {}\n",
        "Final Answer: You have one cluster, prod-east.",
    ])
    .await;

    let reply = h.orchestrator.handle(None, "which clusters?").await.unwrap();
    assert_eq!(reply.rounds.len(), 3);
    assert_eq!(
        reply.rounds[0].observation.as_deref(),
        Some("Observation: Unknown action: KubectlTool")
    );
    assert!(reply.rounds[1].observation.as_deref().unwrap().contains("prod-east"));
    assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("You have one cluster, prod-east.".into()));
}

#[tokio::test]
async fn round_budget_is_enforced_and_history_is_kept() {
    const CHECK_CLUSTERS: &str = "Thought: check again\nAction: ClusterTool\nAction Input: {}\n";
    let mut script = vec![CHECK_CLUSTERS; 10];
    script.push("Final Answer: You have one cluster, prod-east.");
    let h = harness(&script).await;

    let reply = h.orchestrator.handle(Some("ops-3"), "loop").await.unwrap();
    assert_eq!(reply.outcome, TurnOutcome::Exhausted);
    assert_eq!(reply.render(true), EXHAUSTED_MESSAGE);
    assert_eq!(h.provider.calls(), 10);

    let follow_up = h.orchestrator.handle(Some("ops-3"), "so how many clusters?").await.unwrap();
    assert_eq!(
        follow_up.outcome,
        TurnOutcome::FinalAnswer("You have one cluster, prod-east.".into())
    );

    // persona, first prompt, ten action/observation pairs, then the follow-up prompt
    let requests = h.provider.requests.lock().unwrap();
    let messages = &requests[10].messages;
    assert_eq!(messages.len(), 23);
    assert!(messages[1].content.ends_with("Question: loop"));
    assert!(messages[22].content.ends_with("Question: so how many clusters?"));
}

#[tokio::test]
async fn create_tool_drafts_manifest_with_the_llm() {
    let h = harness(&[
        "Action: CreateTool\nAction Input: {\"prompt\": \"an nginx pod\", \"resource\": \"pod\"}\n",
        "```yaml\napiVersion: v1\nkind: Pod\nmetadata:\n  name: nginx\n```",
        "Final Answer: Created pod nginx.",
    ])
    .await;

    let reply = h.orchestrator.handle(None, "create an nginx pod").await.unwrap();
    assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("Created pod nginx.".into()));
    assert_eq!(reply.rounds[0].observation.as_deref(), Some("Observation: pod/nginx created"));
    assert_eq!(h.counters.creates.load(Ordering::SeqCst), 1);
    assert_eq!(h.provider.calls(), 3);
}

#[tokio::test]
async fn sessions_keep_separate_histories() {
    let h = harness(&["Final Answer: ok"]).await;

    h.orchestrator.handle(Some("a"), "first question").await.unwrap();
    h.orchestrator.handle(Some("a"), "second question").await.unwrap();
    h.orchestrator.handle(Some("b"), "other question").await.unwrap();

    let sessions = h.orchestrator.sessions();
    let a = sessions.get("a").await.unwrap().unwrap();
    let b = sessions.get("b").await.unwrap().unwrap();
    // persona plus one compiled prompt per question
    assert_eq!(a.lock().await.messages.len(), 3);
    assert_eq!(b.lock().await.messages.len(), 2);

    let second_prompt = h.provider.last_user_message(1).content;
    assert!(second_prompt.contains("Previous conversation history:\nuser: first question\n"));
    assert!(second_prompt.ends_with("Question: second question"));
}
