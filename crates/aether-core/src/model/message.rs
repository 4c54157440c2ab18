use serde::{Deserialize, Serialize};

/// Who produced a message within a turn.
///
/// Serialized with the variant name unchanged (`"User"`, `"Planner"`, ...),
/// which is also how the roles appear in persisted log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    User,
    Assistant,
    Planner,
    Analyst,
    Designer,
    Verifier,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::User => "User",
            AgentRole::Assistant => "Assistant",
            AgentRole::Planner => "Planner",
            AgentRole::Analyst => "Analyst",
            AgentRole::Designer => "Designer",
            AgentRole::Verifier => "Verifier",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a dispatch turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: AgentRole,
    pub content: String,
}

impl Message {
    pub fn new(role: AgentRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(AgentRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(AgentRole::Assistant, content)
    }
}
