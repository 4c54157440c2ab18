//! Optional external inference for Aether.
//!
//! The dispatcher talks to an [`EngineHandle`], which owns any
//! [`InferenceEngine`] and refuses completions until it reports ready.

pub mod engine;
pub mod error;
pub mod ollama;
pub mod types;

pub use engine::{EngineHandle, InferenceEngine};
pub use error::EngineError;
pub use ollama::{OllamaEngine, DEFAULT_ENDPOINT};
pub use types::{ChatMessage, ChatRole, CompletionOptions, EngineConfig, EngineState};
