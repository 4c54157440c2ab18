use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;
use crate::error::CoreError;

/// Unique identifier of a log entry (hyphenated UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(pub String);

impl LogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for compact listings.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of interaction that produced a log entry.
///
/// Entries written by other producers may carry a type this build does not
/// know; those are kept verbatim as `Other` rather than failing the whole log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogType {
    Workbench,
    ImageAnalysis,
    ImageCaption,
    ImageGenerate,
    LogoGenerate,
    Other(String),
}

impl LogType {
    pub const ALL: [LogType; 5] = [
        LogType::Workbench,
        LogType::ImageAnalysis,
        LogType::ImageCaption,
        LogType::ImageGenerate,
        LogType::LogoGenerate,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LogType::Workbench => "workbench",
            LogType::ImageAnalysis => "image-analysis",
            LogType::ImageCaption => "image-caption",
            LogType::ImageGenerate => "image-generate",
            LogType::LogoGenerate => "logo-generate",
            LogType::Other(name) => name,
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict: only the known kinds parse. Use `From<String>` to accept anything.
impl std::str::FromStr for LogType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Config(format!("Unknown log type: {s}")))
    }
}

impl From<String> for LogType {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(LogType::Other(s))
    }
}

impl From<LogType> for String {
    fn from(t: LogType) -> Self {
        match t {
            LogType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// What was answered: free text from auxiliary producers, the ordered reply
/// messages of a dispatch, or any other JSON value a producer stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogResponse {
    Text(String),
    Messages(Vec<Message>),
    Other(serde_json::Value),
}

impl Default for LogResponse {
    fn default() -> Self {
        LogResponse::Text(String::new())
    }
}

impl LogResponse {
    /// Flatten to display text. Message lists render one `Role: content` per
    /// line; other values render as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            LogResponse::Text(text) => text.clone(),
            LogResponse::Messages(messages) => messages
                .iter()
                .map(|m| format!("{}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n"),
            LogResponse::Other(value) => value.to_string(),
        }
    }
}

impl From<String> for LogResponse {
    fn from(s: String) -> Self {
        LogResponse::Text(s)
    }
}

impl From<Vec<Message>> for LogResponse {
    fn from(messages: Vec<Message>) -> Self {
        LogResponse::Messages(messages)
    }
}

impl From<serde_json::Value> for LogResponse {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => LogResponse::Text(text),
            other => serde_json::from_value::<Vec<Message>>(other.clone())
                .map(LogResponse::Messages)
                .unwrap_or(LogResponse::Other(other)),
        }
    }
}

/// A log record before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub log_type: LogType,
    pub user: Option<String>,
    pub prompt: String,
    pub response: LogResponse,
}

impl NewLogEntry {
    pub fn new(log_type: LogType, prompt: impl Into<String>, response: impl Into<LogResponse>) -> Self {
        Self {
            log_type,
            user: None,
            prompt: prompt.into(),
            response: response.into(),
        }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    /// Stamp with a fresh id and the current time.
    ///
    /// Time is truncated to milliseconds, the precision it is persisted with.
    pub fn stamp(self) -> LogEntry {
        LogEntry {
            id: LogId::new(),
            time: Utc::now().trunc_subsecs(3),
            log_type: self.log_type,
            user: self.user,
            prompt: self.prompt,
            response: self.response,
        }
    }
}

/// A persisted audit record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub log_type: LogType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub response: LogResponse,
}

impl LogEntry {
    /// Case-insensitive substring match against the entry's JSON form.
    pub fn matches(&self, needle_lower: &str) -> bool {
        match serde_json::to_string(self) {
            Ok(json) => json.to_lowercase().contains(needle_lower),
            Err(_) => false,
        }
    }
}
