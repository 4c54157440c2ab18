use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::{ChatMessage, CompletionOptions, EngineConfig, EngineState};

/// Capability boundary for an external chat model.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Make `model_id` available for completions.
    async fn initialize(&self, model_id: &str, config: &EngineConfig) -> Result<(), EngineError>;

    /// Produce one reply for the role-tagged history.
    async fn complete(
        &self,
        history: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, EngineError>;
}

/// Owns an engine and tracks its lifecycle.
///
/// `complete` is only forwarded once the state is `Ready`. A failed
/// initialization is terminal until `initialize` is called again.
pub struct EngineHandle {
    engine: Box<dyn InferenceEngine>,
    state: Mutex<EngineState>,
}

impl EngineHandle {
    pub fn new(engine: impl InferenceEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            state: Mutex::new(EngineState::Uninitialized),
        }
    }

    pub fn name(&self) -> &str {
        self.engine.name()
    }

    pub fn state(&self) -> EngineState {
        self.lock_state().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.lock_state().is_ready()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EngineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drive `Uninitialized`/`Failed` to `Ready` or `Failed`. Concurrent or
    /// repeated calls while `Initializing` or `Ready` are no-ops.
    pub async fn initialize(&self, model_id: &str, config: &EngineConfig) -> EngineState {
        {
            let mut state = self.lock_state();
            if matches!(*state, EngineState::Initializing | EngineState::Ready) {
                return state.clone();
            }
            *state = EngineState::Initializing;
        }

        tracing::info!(engine = self.engine.name(), model = %model_id, "Initializing inference engine");
        let next = match self.engine.initialize(model_id, config).await {
            Ok(()) => EngineState::Ready,
            Err(e) => {
                tracing::warn!(engine = self.engine.name(), "Engine initialization failed: {e}");
                EngineState::Failed(e.to_string())
            }
        };
        *self.lock_state() = next.clone();
        next
    }

    pub async fn complete(
        &self,
        history: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, EngineError> {
        if !self.is_ready() {
            return Err(EngineError::NotReady);
        }
        self.engine.complete(history, options).await
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine.name())
            .field("state", &self.state())
            .finish()
    }
}
