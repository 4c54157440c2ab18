//! Heuristic agents for Aether: the fixed agent registry, the rule-based
//! fallback reasoner, and the arithmetic evaluator it uses.

pub mod error;
pub mod expr;
pub mod reasoner;
pub mod registry;
pub mod topics;

pub use error::ExprError;
pub use registry::{AgentDescriptor, AgentKind, AgentRegistry, DEFAULT_AGENTS};
