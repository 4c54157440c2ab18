use thiserror::Error;

/// Failures at the inference adapter boundary. None of these are fatal to a
/// dispatch; callers degrade to agent-only output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("engine is not ready")]
    NotReady,

    #[error("engine initialization failed: {0}")]
    Initialization(String),

    #[error("model '{model}' is not available on {endpoint}")]
    ModelUnavailable { model: String, endpoint: String },

    #[error("connection to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("could not decode engine response: {0}")]
    Decode(String),

    #[error("engine returned an empty completion")]
    EmptyResponse,
}
