pub mod identity;
pub mod log_entry;
pub mod message;

pub use identity::Identity;
pub use log_entry::{LogEntry, LogId, LogResponse, LogType, NewLogEntry};
pub use message::{AgentRole, Message};
