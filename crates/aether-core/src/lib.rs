//! Core data model, cost model, configuration and the audit log / cost
//! ledger store for Aether.

pub mod config;
pub mod cost;
pub mod error;
pub mod model;
pub mod storage;

pub use config::AetherConfig;
pub use cost::{token_count, CostModel};
pub use error::CoreError;
