pub mod settings;

pub use settings::{AetherConfig, DEFAULT_LOG_CAPACITY, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT};
