//! The orchestration loop.
//!
//! One turn runs up to `max_rounds` rounds of: call the LLM with the
//! session's full history, parse the reply, and either stop (final answer,
//! inconclusive reply) or dispatch one tool and feed its observation back.
//!
//! A tool can suspend the loop by returning the confirmation sentinel. The
//! session then records the pending prompt, and the operator's next `yes`
//! or `no` resumes the loop with that answer as the observation. Any other
//! reply runs as a new query and leaves the confirmation pending.
//!
//! The session's mutex is held for the whole turn, so concurrent turns on
//! one session id run one after another.

use chrono::Utc;
use kubeclaw_core::confirmation::{ConfirmationReply, PendingConfirmation, extract_confirmation};
use kubeclaw_core::event::{DomainEvent, EventBus};
use kubeclaw_core::provider::{Provider, ProviderRequest};
use kubeclaw_core::session::{Session, SessionId, SessionStore};
use kubeclaw_core::tool::ToolCatalog;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::parser::{ParsedResponse, parse};
use crate::prompt;

/// Reply when the round budget runs out.
pub const EXHAUSTED_MESSAGE: &str =
    "I couldn't complete the task within the allowed steps. Please try a simpler query.";

const CONTINUE_HINT: &str = "Please respond with 'yes' or 'no' to continue.";
const PREVIEW_CHARS: usize = 100;

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The LLM produced a final answer.
    FinalAnswer(String),
    /// A tool asked for operator approval; the session is suspended.
    ConfirmationRequired { prompt: String },
    /// The LLM replied with neither an answer nor an action.
    Inconclusive(String),
    /// The round budget ran out.
    Exhausted,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::FinalAnswer(_) => "final_answer",
            TurnOutcome::ConfirmationRequired { .. } => "confirmation_required",
            TurnOutcome::Inconclusive(_) => "inconclusive",
            TurnOutcome::Exhausted => "exhausted",
        }
    }
}

/// One LLM round as it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRecord {
    pub round: usize,
    pub assistant_text: String,
    pub observation: Option<String>,
}

/// The result of one call to [`Orchestrator::handle`].
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub session_id: SessionId,
    pub outcome: TurnOutcome,
    pub rounds: Vec<RoundRecord>,
}

impl TurnReply {
    /// Text shown to the user.
    ///
    /// With `show_reasoning`, every round's raw reply and observation is
    /// included ahead of the answer.
    pub fn render(&self, show_reasoning: bool) -> String {
        if !show_reasoning {
            return match &self.outcome {
                TurnOutcome::FinalAnswer(answer) => answer.clone(),
                TurnOutcome::ConfirmationRequired { prompt } => {
                    format!("**Confirmation Required:** {prompt}\n\n{CONTINUE_HINT}")
                }
                TurnOutcome::Inconclusive(raw) => raw.clone(),
                TurnOutcome::Exhausted => EXHAUSTED_MESSAGE.to_string(),
            };
        }

        if self.outcome == TurnOutcome::Exhausted {
            return EXHAUSTED_MESSAGE.to_string();
        }

        let suspended = matches!(self.outcome, TurnOutcome::ConfirmationRequired { .. });
        let mut out = String::new();
        for (i, record) in self.rounds.iter().enumerate() {
            let _ = write!(out, "**Round {}:**\n{}\n\n", record.round, record.assistant_text);
            if let Some(observation) = &record.observation {
                out.push('\n');
                out.push_str(observation);
                if !(suspended && i + 1 == self.rounds.len()) {
                    out.push_str("\n\n");
                }
            }
        }

        match &self.outcome {
            TurnOutcome::FinalAnswer(answer) => {
                let _ = write!(out, "---\n\n**Final Answer:**\n{answer}");
            }
            TurnOutcome::ConfirmationRequired { prompt } => {
                let _ = write!(out, "\n\n---\n\n**Human Confirmation Required:**\n{prompt}\n\n{CONTINUE_HINT}");
            }
            TurnOutcome::Inconclusive(_) => {
                out.push_str("\n\n**Note:** Process ended without a clear final answer.");
            }
            TurnOutcome::Exhausted => {}
        }
        out
    }
}

/// Drives ReAct turns for every session.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_rounds: usize,
    dispatcher: Dispatcher,
    sessions: Arc<dyn SessionStore>,
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        catalog: Arc<ToolCatalog>,
        sessions: Arc<dyn SessionStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_rounds: 10,
            dispatcher: Dispatcher::new(catalog, event_bus.clone()),
            sessions,
            event_bus,
        }
    }

    /// Apply LLM and round-budget settings from the loaded config.
    pub fn with_config(self, config: &kubeclaw_config::AppConfig) -> Self {
        self.with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_rounds(config.agent.max_rounds)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        self.dispatcher.catalog()
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one turn for `session_id` (or a fresh session when `None`).
    ///
    /// Only a session store failure is an error; every other failure ends
    /// the turn with a reply.
    pub async fn handle(&self, session_id: Option<&str>, query: &str) -> kubeclaw_core::Result<TurnReply> {
        let handle = self.sessions.get_or_create(session_id).await?;
        let mut session = handle.lock().await;
        let id = session.id.clone();

        info!(session_id = %id, pending = session.pending.is_some(), "Handling query");
        self.event_bus.publish(DomainEvent::QueryReceived {
            session_id: id.to_string(),
            content_preview: query.chars().take(PREVIEW_CHARS).collect(),
            timestamp: Utc::now(),
        });

        let resume = session
            .pending
            .as_ref()
            .and_then(|_| ConfirmationReply::parse(query));

        let (outcome, rounds) = match resume {
            Some(reply) => {
                info!(session_id = %id, reply = reply.as_str(), "Resuming after confirmation");
                session.pending = None;
                session.messages.push_user(format!("Observation: {}", reply.as_str()));
                self.run_rounds(&mut session, "").await
            }
            None => {
                if let Some(pending) = &session.pending {
                    info!(session_id = %id, prompt = %pending.prompt, "Confirmation still pending, running new query");
                }
                self.run_rounds(&mut session, query).await
            }
        };

        self.event_bus.publish(DomainEvent::TurnCompleted {
            session_id: id.to_string(),
            rounds: rounds.len(),
            outcome: outcome.as_str().to_string(),
            timestamp: Utc::now(),
        });
        info!(session_id = %id, rounds = rounds.len(), outcome = outcome.as_str(), "Turn completed");

        Ok(TurnReply {
            session_id: id,
            outcome,
            rounds,
        })
    }

    async fn run_rounds(&self, session: &mut Session, query: &str) -> (TurnOutcome, Vec<RoundRecord>) {
        let query = query.trim();
        if !query.is_empty() {
            let compiled = prompt::compile(self.catalog(), &session.messages.render_history(), query);
            session.messages.push_user(compiled);
        }

        let mut rounds = Vec::new();
        for round in 1..=self.max_rounds {
            let text = self.complete(session, round).await;
            debug!(session_id = %session.id, round, bytes = text.len(), "LLM round");

            match parse(&text) {
                ParsedResponse::FinalAnswer(answer) => {
                    rounds.push(RoundRecord {
                        round,
                        assistant_text: text,
                        observation: None,
                    });
                    return (TurnOutcome::FinalAnswer(answer), rounds);
                }
                ParsedResponse::Inconclusive(raw) => {
                    rounds.push(RoundRecord {
                        round,
                        assistant_text: text,
                        observation: None,
                    });
                    return (TurnOutcome::Inconclusive(raw), rounds);
                }
                ParsedResponse::Action { name, input } => {
                    session.messages.push_assistant(text.clone());
                    let observation = self.dispatcher.dispatch(&name, &input).await;

                    if let Some(prompt) = extract_confirmation(&observation) {
                        info!(session_id = %session.id, tool = %name, "Suspending for confirmation");
                        session.pending = Some(PendingConfirmation::new(prompt.clone()));
                        self.event_bus.publish(DomainEvent::ConfirmationRequested {
                            session_id: session.id.to_string(),
                            prompt: prompt.clone(),
                            timestamp: Utc::now(),
                        });
                        rounds.push(RoundRecord {
                            round,
                            assistant_text: text,
                            observation: Some(observation),
                        });
                        return (TurnOutcome::ConfirmationRequired { prompt }, rounds);
                    }

                    session.messages.push_user(format!("{text}\n{observation}"));
                    rounds.push(RoundRecord {
                        round,
                        assistant_text: text,
                        observation: Some(observation),
                    });
                }
            }
        }

        warn!(session_id = %session.id, max_rounds = self.max_rounds, "Round budget exhausted");
        (TurnOutcome::Exhausted, rounds)
    }

    /// One LLM call. Failures degrade to an empty reply.
    async fn complete(&self, session: &Session, round: usize) -> String {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: session.messages.messages().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    session_id: session.id.to_string(),
                    round,
                    model: response.model.clone(),
                    timestamp: Utc::now(),
                });
                response.message.content
            }
            Err(e) => {
                warn!(session_id = %session.id, round, error = %e, "LLM call failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ConfirmTool, FixedTool, ScriptedProvider};
    use kubeclaw_core::error::SessionError;
    use kubeclaw_core::message::Role;
    use kubeclaw_core::session::SessionHandle;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Minimal store for loop tests; eviction is covered by the sessions crate.
    #[derive(Default)]
    struct MapStore {
        sessions: Mutex<HashMap<String, SessionHandle>>,
    }

    #[async_trait::async_trait]
    impl SessionStore for MapStore {
        async fn get_or_create(&self, id: Option<&str>) -> Result<SessionHandle, SessionError> {
            let mut map = self.sessions.lock().await;
            let id = id.map(String::from).unwrap_or_else(|| SessionId::generate().to_string());
            Ok(map
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(SessionId::from(id), "persona"))))
                .clone())
        }
        async fn get(&self, id: &str) -> Result<Option<SessionHandle>, SessionError> {
            Ok(self.sessions.lock().await.get(id).cloned())
        }
        async fn remove(&self, id: &str) -> Result<bool, SessionError> {
            Ok(self.sessions.lock().await.remove(id).is_some())
        }
        async fn evict_idle(&self) -> Result<usize, SessionError> {
            Ok(0)
        }
        async fn len(&self) -> Result<usize, SessionError> {
            Ok(self.sessions.lock().await.len())
        }
        async fn ids(&self) -> Result<Vec<SessionId>, SessionError> {
            Ok(self.sessions.lock().await.keys().map(|k| SessionId::from(k.as_str())).collect())
        }
    }

    struct Harness {
        provider: Arc<ScriptedProvider>,
        list_tool: Arc<FixedTool>,
        store: Arc<MapStore>,
        orchestrator: Orchestrator,
    }

    fn harness(replies: &[&str]) -> Harness {
        let provider = Arc::new(ScriptedProvider::new(replies));
        let list_tool = Arc::new(FixedTool::new("ListTool", "[pod-a, pod-b, pod-c]"));
        let catalog = ToolCatalog::new()
            .with(list_tool.clone())
            .with(Arc::new(ConfirmTool));
        let store = Arc::new(MapStore::default());
        let orchestrator = Orchestrator::new(
            provider.clone(),
            "mock-model",
            Arc::new(catalog),
            store.clone(),
            Arc::new(EventBus::default()),
        );
        Harness {
            provider,
            list_tool,
            store,
            orchestrator,
        }
    }

    async fn session(store: &MapStore, id: &str) -> SessionHandle {
        store.get(id).await.unwrap().unwrap()
    }

    const LIST_ACTION: &str =
        "Thought: list pods\nAction: ListTool\nAction Input: {\"resource\": \"pod\", \"namespace\": \"default\"}\nPAUSE";
    const DELETE_CONFIRM: &str =
        "Thought: confirm first\nAction: HumanTool\nAction Input: {\"prompt\": \"Delete foo-app?\"}\nPAUSE";

    #[tokio::test]
    async fn final_answer_on_first_round() {
        let h = harness(&["Thought: Do I need to use a tool? No\nFinal Answer: Hello!"]);
        let reply = h.orchestrator.handle(Some("s1"), "hi").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("Hello!".into()));
        assert_eq!(h.provider.call_count(), 1);
        // persona + compiled prompt; the final answer is not appended
        let s = session(&h.store, "s1").await;
        assert_eq!(s.lock().await.messages.len(), 2);
    }

    #[tokio::test]
    async fn list_pods_takes_two_rounds() {
        let h = harness(&[LIST_ACTION, "Thought: Do I need to use a tool? No\nFinal Answer: There are 3 pods running."]);
        let reply = h.orchestrator.handle(Some("s1"), "How many pods in default?").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("There are 3 pods running.".into()));
        assert_eq!(h.provider.call_count(), 2);
        assert_eq!(h.list_tool.call_count(), 1);

        let second = &h.provider.requests()[1].messages;
        let last = second.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, format!("{LIST_ACTION}\nObservation: [pod-a, pod-b, pod-c]"));
        assert_eq!(second[second.len() - 2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn budget_exhaustion_makes_exactly_max_rounds_calls() {
        let h = harness(&[LIST_ACTION]);
        let orchestrator = h.orchestrator.with_max_rounds(3);
        let reply = orchestrator.handle(Some("s1"), "loop forever").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::Exhausted);
        assert_eq!(reply.rounds.len(), 3);
        assert_eq!(h.provider.call_count(), 3);
        assert_eq!(reply.render(false), EXHAUSTED_MESSAGE);
    }

    #[tokio::test]
    async fn confirmation_suspends_and_resumes() {
        let h = harness(&[
            DELETE_CONFIRM,
            "Thought: Do I need to use a tool? No\nFinal Answer: foo-app deleted.",
        ]);

        let first = h.orchestrator.handle(Some("s1"), "Delete foo-app").await.unwrap();
        assert_eq!(
            first.outcome,
            TurnOutcome::ConfirmationRequired { prompt: "Delete foo-app?".into() }
        );
        assert_eq!(
            first.render(false),
            "**Confirmation Required:** Delete foo-app?\n\nPlease respond with 'yes' or 'no' to continue."
        );
        assert_eq!(h.provider.call_count(), 1);
        {
            let s = session(&h.store, "s1").await;
            let s = s.lock().await;
            assert_eq!(s.pending.as_ref().unwrap().prompt, "Delete foo-app?");
            // the sentinel observation is not appended
            assert_eq!(s.messages.last().unwrap().role, Role::Assistant);
        }

        let second = h.orchestrator.handle(Some("s1"), "  YES ").await.unwrap();
        assert_eq!(second.outcome, TurnOutcome::FinalAnswer("foo-app deleted.".into()));
        assert_eq!(h.provider.call_count(), 2);

        let resumed = &h.provider.requests()[1].messages;
        assert_eq!(resumed.last().unwrap().content, "Observation: yes");
        // the original question is not compiled again
        let prompts = resumed.iter().filter(|m| m.content.contains("Question: Delete foo-app")).count();
        assert_eq!(prompts, 1);

        let s = session(&h.store, "s1").await;
        assert!(s.lock().await.pending.is_none());
    }

    #[tokio::test]
    async fn other_reply_keeps_confirmation_pending() {
        let h = harness(&[
            DELETE_CONFIRM,
            "Final Answer: services listed",
            "Final Answer: foo-app deleted.",
        ]);
        h.orchestrator.handle(Some("s1"), "Delete foo-app").await.unwrap();

        let reply = h.orchestrator.handle(Some("s1"), "actually, list services").await.unwrap();
        assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("services listed".into()));
        let last = h.provider.requests()[1].messages.last().cloned().unwrap();
        assert!(last.content.ends_with("Question: actually, list services"));
        {
            let s = session(&h.store, "s1").await;
            assert_eq!(s.lock().await.pending.as_ref().unwrap().prompt, "Delete foo-app?");
        }

        let resumed = h.orchestrator.handle(Some("s1"), "yes").await.unwrap();
        assert_eq!(resumed.outcome, TurnOutcome::FinalAnswer("foo-app deleted.".into()));
        let last = h.provider.requests()[2].messages.last().cloned().unwrap();
        assert_eq!(last.content, "Observation: yes");
        let s = session(&h.store, "s1").await;
        assert!(s.lock().await.pending.is_none());
    }

    #[tokio::test]
    async fn empty_confirmation_prompt_does_not_suspend() {
        let h = harness(&[
            "Action: HumanTool\nAction Input: {\"prompt\": \"\"}\n",
            "Final Answer: nothing to confirm",
        ]);
        let reply = h.orchestrator.handle(Some("s1"), "delete something").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("nothing to confirm".into()));
        assert_eq!(
            reply.rounds[0].observation.as_deref(),
            Some("Observation: [HUMAN_CONFIRMATION_REQUIRED]: ")
        );
        let s = session(&h.store, "s1").await;
        assert!(s.lock().await.pending.is_none());
    }

    #[tokio::test]
    async fn yes_without_pending_confirmation_is_a_query() {
        let h = harness(&["Final Answer: yes to what?"]);
        h.orchestrator.handle(Some("s1"), "yes").await.unwrap();

        let last = h.provider.requests()[0].messages.last().cloned().unwrap();
        assert!(last.content.ends_with("Question: yes"));
    }

    #[tokio::test]
    async fn history_continues_after_budget_exhaustion() {
        let h = harness(&[LIST_ACTION, LIST_ACTION, LIST_ACTION, "Final Answer: still 3 pods"]);
        let orchestrator = h.orchestrator.with_max_rounds(3);

        let first = orchestrator.handle(Some("s1"), "watch the pods").await.unwrap();
        assert_eq!(first.outcome, TurnOutcome::Exhausted);

        let second = orchestrator.handle(Some("s1"), "how many now?").await.unwrap();
        assert_eq!(second.outcome, TurnOutcome::FinalAnswer("still 3 pods".into()));

        // persona, first prompt, three assistant/observation pairs, second prompt
        let messages = &h.provider.requests()[3].messages;
        assert_eq!(messages.len(), 9);
        assert!(messages[1].content.ends_with("Question: watch the pods"));
        assert!(messages[8].content.ends_with("Question: how many now?"));
        assert!(messages[8].content.contains("user: watch the pods"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_turns_on_one_session_do_not_interleave() {
        let provider = Arc::new(
            ScriptedProvider::new(&[LIST_ACTION, "Final Answer: one", LIST_ACTION, "Final Answer: two"])
                .with_delay(Duration::from_millis(50)),
        );
        let catalog = ToolCatalog::new().with(Arc::new(FixedTool::new("ListTool", "[pod-a]")));
        let store = Arc::new(MapStore::default());
        let orchestrator = Orchestrator::new(
            provider.clone(),
            "mock-model",
            Arc::new(catalog),
            store.clone(),
            Arc::new(EventBus::default()),
        );

        let (a, b) = tokio::join!(
            orchestrator.handle(Some("s"), "first question"),
            orchestrator.handle(Some("s"), "second question"),
        );
        let mut answers = vec![a.unwrap().outcome, b.unwrap().outcome];
        answers.sort_by_key(|o| format!("{o:?}"));
        assert_eq!(
            answers,
            vec![
                TurnOutcome::FinalAnswer("one".into()),
                TurnOutcome::FinalAnswer("two".into()),
            ]
        );

        let s = session(&store, "s").await;
        let s = s.lock().await;
        let roles: Vec<Role> = s.messages.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::User, Role::Assistant, Role::User]
        );
        let msgs = s.messages.messages();
        assert!(msgs[1].content.contains("Question: "));
        assert!(msgs[3].content.ends_with("Observation: [pod-a]"));
        assert!(msgs[4].content.contains("Question: "));
        assert!(msgs[6].content.ends_with("Observation: [pod-a]"));
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn unknown_action_is_fed_back() {
        let h = harness(&[
            "Action: FooTool\nAction Input: {}\n",
            "Final Answer: FooTool does not exist.",
        ]);
        let reply = h.orchestrator.handle(Some("s1"), "use foo").await.unwrap();

        assert_eq!(reply.rounds[0].observation.as_deref(), Some("Observation: Unknown action: FooTool"));
        assert_eq!(reply.outcome, TurnOutcome::FinalAnswer("FooTool does not exist.".into()));
    }

    #[tokio::test]
    async fn inconclusive_reply_is_returned_raw() {
        let h = harness(&["I am not sure what you mean."]);
        let reply = h.orchestrator.handle(None, "??").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::Inconclusive("I am not sure what you mean.".into()));
        assert_eq!(reply.render(false), "I am not sure what you mean.");
        assert!(reply.render(true).ends_with("**Note:** Process ended without a clear final answer."));
        assert!(reply.session_id.as_str().starts_with("session-"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_empty_reply() {
        let h = harness(&[]);
        let reply = h.orchestrator.handle(Some("s1"), "hello").await.unwrap();
        assert_eq!(reply.outcome, TurnOutcome::Inconclusive(String::new()));
        assert_eq!(h.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn reasoning_transcript_layout() {
        let h = harness(&[LIST_ACTION, "Final Answer: There are 3 pods running."]);
        let reply = h.orchestrator.handle(Some("s1"), "pods?").await.unwrap();

        let expected = format!(
            "**Round 1:**\n{LIST_ACTION}\n\n\nObservation: [pod-a, pod-b, pod-c]\n\n\
             **Round 2:**\nFinal Answer: There are 3 pods running.\n\n\
             ---\n\n**Final Answer:**\nThere are 3 pods running."
        );
        assert_eq!(reply.render(true), expected);
        assert_eq!(reply.render(false), "There are 3 pods running.");
    }

    #[tokio::test]
    async fn reasoning_transcript_on_suspension() {
        let h = harness(&[DELETE_CONFIRM]);
        let reply = h.orchestrator.handle(Some("s1"), "Delete foo-app").await.unwrap();

        let rendered = reply.render(true);
        assert!(rendered.contains("\nObservation: [HUMAN_CONFIRMATION_REQUIRED]: Delete foo-app?\n\n---\n\n"));
        assert!(rendered.ends_with(
            "**Human Confirmation Required:**\nDelete foo-app?\n\nPlease respond with 'yes' or 'no' to continue."
        ));
    }

    #[tokio::test]
    async fn turn_events_are_published() {
        let h = harness(&["Final Answer: done"]);
        let mut rx = h.orchestrator.event_bus().subscribe();
        h.orchestrator.handle(Some("s1"), "hi").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event.as_ref() {
                DomainEvent::QueryReceived { .. } => "query",
                DomainEvent::ResponseGenerated { .. } => "response",
                DomainEvent::TurnCompleted { outcome, .. } => {
                    assert_eq!(outcome, "final_answer");
                    "completed"
                }
                _ => "other",
            });
        }
        assert_eq!(kinds, vec!["query", "response", "completed"]);
    }
}
