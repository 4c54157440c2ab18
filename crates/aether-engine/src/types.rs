use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role/content pair of the history sent to an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Sampling options for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 256,
        }
    }
}

/// Options passed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Keep the model resident between requests.
    pub cache_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
        }
    }
}

/// Lifecycle of the external engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

impl EngineState {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineState::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, EngineState::Initializing)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EngineState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Uninitialized => f.write_str("uninitialized"),
            EngineState::Initializing => f.write_str("initializing"),
            EngineState::Ready => f.write_str("ready"),
            EngineState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_view() {
        assert!(!EngineState::Uninitialized.is_ready());
        assert!(EngineState::Initializing.is_loading());
        assert!(EngineState::Ready.is_ready());
        let failed = EngineState::Failed("no gpu".into());
        assert_eq!(failed.error(), Some("no gpu"));
        assert!(!failed.is_ready() && !failed.is_loading());
    }

    #[test]
    fn test_chat_role_wire_names() {
        let json = serde_json::to_string(&ChatMessage::system("hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }
}
