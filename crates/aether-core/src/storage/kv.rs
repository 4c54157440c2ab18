use std::fs::File;

use crate::error::CoreError;

/// Persisted key holding the signed-in identity.
pub const KEY_APP_USER: &str = "app_user";
/// Persisted key holding the cumulative cost as a decimal string.
pub const KEY_COST_TOTAL: &str = "cost_total";
/// Persisted key holding the JSON array of log entries, newest first.
pub const KEY_QUERY_LOGS: &str = "query_logs";

/// Storage port: string values under named keys.
///
/// Implementations must make each `set`/`remove` durable before returning.
/// `lock` returns a guard that excludes other writers (including other
/// processes, where the backend supports it) until dropped.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;

    fn lock(&self) -> Result<StoreLock, CoreError> {
        Ok(StoreLock::default())
    }
}

/// Held for the duration of a read-modify-write. Releases on drop.
#[derive(Debug, Default)]
pub struct StoreLock {
    file: Option<File>,
}

impl StoreLock {
    pub(crate) fn file(file: File) -> Self {
        Self { file: Some(file) }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = fs2::FileExt::unlock(file);
        }
    }
}
