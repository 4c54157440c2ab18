use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use aether_agents::AgentRegistry;
use aether_core::model::{LogType, Message, NewLogEntry};
use aether_core::storage::AuditStore;
use aether_core::{AetherConfig, CostModel};
use aether_engine::{ChatMessage, CompletionOptions, EngineHandle};

use crate::error::DispatchError;

/// Where a request is within its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPhase {
    #[default]
    Idle,
    AwaitingExternal,
    RunningAgents,
    Finalizing,
}

/// Called on every phase transition, ending with `Idle` once per request.
pub type PhaseHook = Arc<dyn Fn(DispatchPhase) + Send + Sync>;

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// `[User, Assistant?, agents...]`
    pub messages: Vec<Message>,
    /// Amount charged to the ledger for this turn.
    pub cost: f64,
    /// Ledger total after the charge, `None` if persisting the turn failed.
    pub ledger_total: Option<f64>,
}

/// Phases of the requests currently in flight, keyed by start order.
#[derive(Default)]
struct PhaseBoard {
    next_ticket: u64,
    in_flight: BTreeMap<u64, DispatchPhase>,
}

/// Turns a prompt into the ordered reply messages, charging the ledger and
/// appending one `workbench` log entry per request.
///
/// Persistence runs on tokio's blocking pool, so dispatches must be driven
/// by a tokio runtime.
pub struct Dispatcher {
    audit: Arc<AuditStore>,
    registry: AgentRegistry,
    cost: CostModel,
    engine: Option<Arc<EngineHandle>>,
    system_prompt: String,
    options: CompletionOptions,
    phases: Mutex<PhaseBoard>,
    phase_hook: Option<PhaseHook>,
}

impl Dispatcher {
    /// Default agents, default cost model, no external engine.
    pub fn new(audit: Arc<AuditStore>) -> Self {
        Self::from_config(audit, &AetherConfig::default())
    }

    pub fn from_config(audit: Arc<AuditStore>, config: &AetherConfig) -> Self {
        Self {
            audit,
            registry: AgentRegistry::default(),
            cost: config.cost_model(),
            engine: None,
            system_prompt: config.system_prompt.clone(),
            options: CompletionOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            phases: Mutex::new(PhaseBoard::default()),
            phase_hook: None,
        }
    }

    pub fn with_engine(mut self, engine: Arc<EngineHandle>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_cost_model(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_phase_hook(mut self, hook: impl Fn(DispatchPhase) + Send + Sync + 'static) -> Self {
        self.phase_hook = Some(Arc::new(hook));
        self
    }

    pub fn audit(&self) -> &AuditStore {
        &self.audit
    }

    /// Phase of the oldest request still in flight, `Idle` when none is.
    ///
    /// Advisory only. With concurrent requests on one dispatcher it reflects
    /// a single one of them; use [`Dispatcher::with_phase_hook`] to follow
    /// every transition.
    pub fn phase(&self) -> DispatchPhase {
        self.board()
            .in_flight
            .values()
            .next()
            .copied()
            .unwrap_or_default()
    }

    /// Number of requests currently being dispatched.
    pub fn in_flight(&self) -> usize {
        self.board().in_flight.len()
    }

    fn board(&self) -> std::sync::MutexGuard<'_, PhaseBoard> {
        self.phases.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> InFlight<'_> {
        let mut board = self.board();
        let ticket = board.next_ticket;
        board.next_ticket += 1;
        InFlight {
            dispatcher: self,
            ticket,
        }
    }

    fn notify(&self, ticket: u64, phase: DispatchPhase) {
        tracing::debug!(request = ticket, ?phase, "Dispatch phase");
        if let Some(hook) = &self.phase_hook {
            hook(phase);
        }
    }

    /// Run one request and return its messages.
    ///
    /// Engine and persistence failures are logged and skipped; only an empty
    /// prompt is an error.
    pub async fn dispatch(
        &self,
        prompt: &str,
        user: Option<&str>,
    ) -> Result<Vec<Message>, DispatchError> {
        self.dispatch_turn(prompt, user).await.map(|turn| turn.messages)
    }

    /// Run one request and return its messages along with what it cost.
    pub async fn dispatch_turn(&self, prompt: &str, user: Option<&str>) -> Result<Turn, DispatchError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }
        let request = self.begin();

        let mut replies = Vec::with_capacity(self.registry.len() + 1);
        if let Some(text) = self.consult_engine(&request, prompt).await {
            replies.push(Message::assistant(text));
        }

        request.set(DispatchPhase::RunningAgents);
        replies.extend(self.registry.run_all(prompt));

        request.set(DispatchPhase::Finalizing);
        let cost = self
            .cost
            .turn_cost(prompt, replies.iter().map(|m| m.content.as_str()));
        let entry = NewLogEntry::new(LogType::Workbench, prompt, replies.clone())
            .with_user(user.map(str::to_string));
        let ledger_total = self.persist(entry, cost, replies.len()).await;

        let mut messages = Vec::with_capacity(replies.len() + 1);
        messages.push(Message::user(prompt));
        messages.extend(replies);
        Ok(Turn {
            messages,
            cost,
            ledger_total,
        })
    }

    /// File locking and I/O block, so the write runs off the async workers.
    async fn persist(&self, entry: NewLogEntry, cost: f64, replies: usize) -> Option<f64> {
        let audit = Arc::clone(&self.audit);
        let outcome = tokio::task::spawn_blocking(move || audit.record_dispatch(entry, cost)).await;
        match outcome {
            Ok(Ok((logged, total))) => {
                tracing::info!(
                    id = %logged.id.short(),
                    replies,
                    cost,
                    total,
                    "Dispatch complete"
                );
                Some(total)
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to persist dispatch: {e}");
                None
            }
            Err(e) => {
                tracing::warn!("Persist task did not finish: {e}");
                None
            }
        }
    }

    async fn consult_engine(&self, request: &InFlight<'_>, prompt: &str) -> Option<String> {
        let engine = self.engine.as_deref()?;
        if !engine.is_ready() {
            tracing::debug!(state = %engine.state(), "Inference engine not ready, skipping");
            return None;
        }

        request.set(DispatchPhase::AwaitingExternal);
        let history = [
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];
        match engine.complete(&history, &self.options).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!(engine = engine.name(), "Inference engine returned no text");
                None
            }
            Err(e) => {
                tracing::warn!(engine = engine.name(), "Inference engine call failed: {e}");
                None
            }
        }
    }
}

/// One request's slot on the phase board. Dropping it returns the request
/// to `Idle` however the request ends.
struct InFlight<'a> {
    dispatcher: &'a Dispatcher,
    ticket: u64,
}

impl InFlight<'_> {
    fn set(&self, phase: DispatchPhase) {
        self.dispatcher
            .board()
            .in_flight
            .insert(self.ticket, phase);
        self.dispatcher.notify(self.ticket, phase);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.dispatcher.board().in_flight.remove(&self.ticket);
        self.dispatcher.notify(self.ticket, DispatchPhase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use aether_core::model::{AgentRole, LogResponse};
    use aether_core::storage::{FileStore, KeyValueStore, MemoryStore, KEY_QUERY_LOGS};
    use aether_core::CoreError;
    use aether_engine::{EngineConfig, EngineError, EngineState, InferenceEngine};
    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;

    struct FakeEngine {
        reply: Result<String, EngineError>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeEngine {
        fn replying(reply: Result<&str, EngineError>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let engine = Self {
                reply: reply.map(str::to_string),
                calls: calls.clone(),
            };
            (engine, calls)
        }
    }

    #[async_trait]
    impl InferenceEngine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }

        async fn initialize(&self, _model_id: &str, _config: &EngineConfig) -> Result<(), EngineError> {
            Ok(())
        }

        async fn complete(
            &self,
            history: &[ChatMessage],
            options: &CompletionOptions,
        ) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(history.len(), 2);
            assert_eq!(history[0].content, "You are a helpful multi-agent coordinator.");
            assert_eq!(options.max_tokens, 256);
            self.reply.clone()
        }
    }

    /// Blocks its first completion until released; later calls answer at once.
    struct GatedEngine {
        gate: Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
        entered: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl InferenceEngine for GatedEngine {
        fn name(&self) -> &str {
            "gated"
        }

        async fn initialize(&self, _model_id: &str, _config: &EngineConfig) -> Result<(), EngineError> {
            Ok(())
        }

        async fn complete(
            &self,
            _history: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<String, EngineError> {
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                self.entered.notify_one();
                let _ = gate.await;
            }
            Ok("gated reply".to_string())
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, CoreError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), CoreError> {
            Err(CoreError::Lock(format!("{key} is read-only")))
        }

        fn remove(&self, _key: &str) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn memory_audit() -> Arc<AuditStore> {
        Arc::new(AuditStore::new(Arc::new(MemoryStore::new())))
    }

    async fn ready_engine(reply: Result<&str, EngineError>) -> (Arc<EngineHandle>, Arc<AtomicUsize>) {
        let (engine, calls) = FakeEngine::replying(reply);
        let handle = EngineHandle::new(engine);
        assert_eq!(
            handle.initialize("phi3.5", &EngineConfig::default()).await,
            EngineState::Ready
        );
        (Arc::new(handle), calls)
    }

    fn recording_hook() -> (Arc<Mutex<Vec<DispatchPhase>>>, impl Fn(DispatchPhase) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |phase| sink.lock().unwrap().push(phase))
    }

    fn roles(messages: &[Message]) -> Vec<AgentRole> {
        messages.iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn test_without_engine_yields_user_and_four_agents() {
        let dispatcher = Dispatcher::new(memory_audit());
        let messages = dispatcher.dispatch("what is 2+2", None).await.unwrap();
        assert_eq!(
            roles(&messages),
            vec![
                AgentRole::User,
                AgentRole::Planner,
                AgentRole::Analyst,
                AgentRole::Designer,
                AgentRole::Verifier
            ]
        );
        assert_eq!(messages[0].content, "what is 2+2");
        assert_eq!(messages[2].content, "Computation result: 4");
        assert!(messages[1].content.contains("Evaluate mathematical expression."));
        assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
    }

    #[tokio::test]
    async fn test_ready_engine_adds_assistant_message() {
        let (engine, calls) = ready_engine(Ok("Here is a plan.")).await;
        let dispatcher = Dispatcher::new(memory_audit()).with_engine(engine);
        let messages = dispatcher.dispatch("plan my week", None).await.unwrap();
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[1], Message::assistant("Here is a plan."));
        assert_eq!(messages[2].role, AgentRole::Planner);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let logged = dispatcher.audit().list(None).unwrap();
        match &logged[0].response {
            LogResponse::Messages(replies) => {
                assert_eq!(replies.len(), 5);
                assert_eq!(replies[0].role, AgentRole::Assistant);
            }
            other => panic!("expected messages, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_engine_not_ready_is_skipped() {
        let (engine, calls) = FakeEngine::replying(Ok("never"));
        let handle = Arc::new(EngineHandle::new(engine));
        let dispatcher = Dispatcher::new(memory_audit()).with_engine(handle);
        let messages = dispatcher.dispatch("hello", None).await.unwrap();
        assert_eq!(messages.len(), 5);
        assert!(messages.iter().all(|m| m.role != AgentRole::Assistant));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_and_blank_reply_are_skipped() {
        let failure = EngineError::Transport {
            endpoint: "http://127.0.0.1:11434".into(),
            reason: "connection refused".into(),
        };
        for reply in [Err(failure), Ok("   ")] {
            let (engine, calls) = ready_engine(reply).await;
            let dispatcher = Dispatcher::new(memory_audit()).with_engine(engine);
            let messages = dispatcher.dispatch("hello", None).await.unwrap();
            assert_eq!(messages.len(), 5);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            // Nothing about the failure reaches the log
            let logged = dispatcher.audit().list(Some("connection refused")).unwrap();
            assert!(logged.is_empty());
            assert_eq!(dispatcher.audit().list(None).unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_without_side_effects() {
        let dispatcher = Dispatcher::new(memory_audit());
        assert_eq!(
            dispatcher.dispatch("  \n\t", None).await,
            Err(DispatchError::EmptyPrompt)
        );
        assert!(dispatcher.audit().list(None).unwrap().is_empty());
        assert_eq!(dispatcher.audit().ledger_total().unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_ledger_is_sum_of_turn_costs() {
        let dispatcher = Dispatcher::new(memory_audit());
        let cost = CostModel::default();
        let mut expected = 0.0;
        for prompt in ["what is 2+2", "create a logo for my brand", "plan a trip"] {
            let messages = dispatcher.dispatch(prompt, None).await.unwrap();
            expected += cost.turn_cost(prompt, messages[1..].iter().map(|m| m.content.as_str()));
        }
        let total = dispatcher.audit().ledger_total().unwrap();
        assert!((total - expected).abs() < 1e-12);
        assert!(total > 0.0);
    }

    #[tokio::test]
    async fn test_log_entry_records_prompt_user_and_type() {
        let dispatcher = Dispatcher::new(memory_audit());
        dispatcher
            .dispatch("  create a logo for my brand ", Some("ada@example.com"))
            .await
            .unwrap();
        let logged = dispatcher.audit().list(None).unwrap();
        assert_eq!(logged.len(), 1);
        let entry = &logged[0];
        assert_eq!(entry.log_type, LogType::Workbench);
        assert_eq!(entry.prompt, "create a logo for my brand");
        assert_eq!(entry.user.as_deref(), Some("ada@example.com"));
        assert!(entry.response.to_text().contains("Designer: Will craft vector logo"));
    }

    #[tokio::test]
    async fn test_persistence_failure_still_returns_messages() {
        let audit = Arc::new(AuditStore::new(Arc::new(ReadOnlyStore)));
        let dispatcher = Dispatcher::new(audit);
        let messages = dispatcher.dispatch("hello", None).await.unwrap();
        assert_eq!(messages.len(), 5);
    }

    #[tokio::test]
    async fn test_corrupt_log_still_charges_ledger() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_QUERY_LOGS, "{not json").unwrap();
        let dispatcher = Dispatcher::new(Arc::new(AuditStore::new(store)));
        let messages = dispatcher.dispatch("hello", None).await.unwrap();
        assert_eq!(messages.len(), 5);
        assert!(dispatcher.audit().ledger_total().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_custom_registry_and_rate() {
        let registry = AgentRegistry::new(vec![aether_agents::DEFAULT_AGENTS[3]]);
        let dispatcher = Dispatcher::new(memory_audit())
            .with_registry(registry)
            .with_cost_model(CostModel::new(1.0));
        let messages = dispatcher.dispatch("one two", None).await.unwrap();
        assert_eq!(roles(&messages), vec![AgentRole::User, AgentRole::Verifier]);
        let expected = CostModel::new(1.0).turn_cost("one two", [messages[1].content.as_str()]);
        assert_eq!(dispatcher.audit().ledger_total().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_file_backed_dispatch_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = Arc::new(FileStore::open(dir.path()).unwrap());
            let dispatcher = Dispatcher::new(Arc::new(AuditStore::new(store)));
            dispatcher.dispatch("what is 6*7", None).await.unwrap();
        }
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let audit = AuditStore::new(store);
        let logged = audit.list(Some("computation result: 42")).unwrap();
        assert_eq!(logged.len(), 1);
        assert!(audit.ledger_total().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_phase_transitions_are_reported_in_order() {
        let (seen, hook) = recording_hook();
        let dispatcher = Dispatcher::new(memory_audit()).with_phase_hook(hook);
        dispatcher.dispatch("hello", None).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                DispatchPhase::RunningAgents,
                DispatchPhase::Finalizing,
                DispatchPhase::Idle
            ]
        );

        let (seen, hook) = recording_hook();
        let (engine, _) = ready_engine(Ok("sure")).await;
        let dispatcher = Dispatcher::new(memory_audit())
            .with_engine(engine)
            .with_phase_hook(hook);
        dispatcher.dispatch("hello", None).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                DispatchPhase::AwaitingExternal,
                DispatchPhase::RunningAgents,
                DispatchPhase::Finalizing,
                DispatchPhase::Idle
            ]
        );

        // Rejected prompts never enter the cycle
        let (seen, hook) = recording_hook();
        let dispatcher = Dispatcher::new(memory_audit()).with_phase_hook(hook);
        assert!(dispatcher.dispatch(" ", None).await.is_err());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finished_request_does_not_idle_one_in_flight() {
        let (release, gate) = tokio::sync::oneshot::channel();
        let entered = Arc::new(tokio::sync::Notify::new());
        let handle = EngineHandle::new(GatedEngine {
            gate: Mutex::new(Some(gate)),
            entered: entered.clone(),
        });
        assert_eq!(
            handle.initialize("phi3.5", &EngineConfig::default()).await,
            EngineState::Ready
        );
        let dispatcher = Arc::new(Dispatcher::new(memory_audit()).with_engine(Arc::new(handle)));

        let slow = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.dispatch("plan my week", None).await }
        });
        entered.notified().await;
        assert_eq!(dispatcher.phase(), DispatchPhase::AwaitingExternal);
        assert_eq!(dispatcher.in_flight(), 1);

        dispatcher.dispatch("hello", None).await.unwrap();
        assert_eq!(dispatcher.phase(), DispatchPhase::AwaitingExternal);
        assert_eq!(dispatcher.in_flight(), 1);

        release.send(()).unwrap();
        let messages = slow.await.unwrap().unwrap();
        assert_eq!(messages[1], Message::assistant("gated reply"));
        assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_turn_reports_charge_and_new_total() {
        let dispatcher = Dispatcher::new(memory_audit());
        let first = dispatcher.dispatch_turn("what is 2+2", None).await.unwrap();
        let expected = CostModel::default().turn_cost(
            "what is 2+2",
            first.messages[1..].iter().map(|m| m.content.as_str()),
        );
        assert_eq!(first.cost, expected);
        assert_eq!(first.ledger_total, Some(expected));

        let second = dispatcher.dispatch_turn("plan a trip", None).await.unwrap();
        let total = dispatcher.audit().ledger_total().unwrap();
        assert_eq!(second.ledger_total, Some(total));
        assert!((total - first.cost - second.cost).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_turn_without_persistence_has_no_total() {
        let dispatcher = Dispatcher::new(Arc::new(AuditStore::new(Arc::new(ReadOnlyStore))));
        let turn = dispatcher.dispatch_turn("hello", None).await.unwrap();
        assert!(turn.cost > 0.0);
        assert_eq!(turn.ledger_total, None);
    }

    #[tokio::test]
    async fn test_dispatch_appends_to_log_with_foreign_entries() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                KEY_QUERY_LOGS,
                r#"[{"id":"ext-1","time":1700000000000,"type":"chat","prompt":"draw","response":{"url":"x.png","width":512}}]"#,
            )
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(AuditStore::new(store)));
        let turn = dispatcher.dispatch_turn("what is 6*7", None).await.unwrap();
        assert!(turn.ledger_total.is_some());

        let logged = dispatcher.audit().list(None).unwrap();
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0].log_type, LogType::Workbench);
        assert_eq!(logged[1].id.as_str(), "ext-1");
        assert_eq!(logged[1].log_type, LogType::Other("chat".into()));
        assert!(matches!(logged[1].response, LogResponse::Other(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_file_backed_dispatches_all_persist() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(AuditStore::new(store))));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.dispatch_turn(&format!("task {i}"), None).await })
            })
            .collect();
        let mut charged = 0.0;
        for task in tasks {
            charged += task.await.unwrap().unwrap().cost;
        }

        assert_eq!(dispatcher.audit().list(None).unwrap().len(), 8);
        assert!((dispatcher.audit().ledger_total().unwrap() - charged).abs() < 1e-9);
        assert_eq!(dispatcher.in_flight(), 0);
    }
}
