//! One request/response cycle for Aether.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use aether_core::storage::{AuditStore, MemoryStore};
//! use aether_dispatch::Dispatcher;
//!
//! # async fn run() -> Result<(), aether_dispatch::DispatchError> {
//! let audit = Arc::new(AuditStore::new(Arc::new(MemoryStore::new())));
//! let dispatcher = Dispatcher::new(audit);
//! let turn = dispatcher.dispatch_turn("what is 2+2", Some("me@example.com")).await?;
//! for message in &turn.messages {
//!     println!("{}: {}", message.role, message.content);
//! }
//! println!("charged {}", turn.cost);
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod error;

pub use dispatcher::{DispatchPhase, Dispatcher, PhaseHook, Turn};
pub use error::DispatchError;

// Re-export the types callers need to build and read a dispatch
pub use aether_agents::AgentRegistry;
pub use aether_core::model::{AgentRole, Message};
pub use aether_engine::{CompletionOptions, EngineHandle};
