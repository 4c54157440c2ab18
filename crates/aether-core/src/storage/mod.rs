pub mod audit;
pub mod file;
pub mod identity;
pub mod kv;
pub mod memory;

pub use audit::{AuditStats, AuditStore};
pub use file::FileStore;
pub use identity::{clear_identity, load_identity, save_identity};
pub use kv::{KeyValueStore, StoreLock, KEY_APP_USER, KEY_COST_TOTAL, KEY_QUERY_LOGS};
pub use memory::MemoryStore;
