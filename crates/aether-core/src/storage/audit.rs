use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::kv::{KeyValueStore, KEY_COST_TOTAL, KEY_QUERY_LOGS};
use crate::config::DEFAULT_LOG_CAPACITY;
use crate::error::CoreError;
use crate::model::{LogEntry, LogType, NewLogEntry};

/// Aggregates over the stored log and the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditStats {
    pub total_entries: usize,
    pub by_type: BTreeMap<LogType, usize>,
    pub by_user: BTreeMap<String, usize>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub ledger_total: f64,
}

/// The audit log (`query_logs`) and cost ledger (`cost_total`).
///
/// This is the only writer of those two keys. Every mutation runs under an
/// in-process mutex plus the backing store's own lock, so concurrent writers
/// never lose an update.
pub struct AuditStore {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
    write_guard: Mutex<()>,
}

impl AuditStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            capacity: DEFAULT_LOG_CAPACITY,
            write_guard: Mutex::new(()),
        }
    }

    /// Override the number of entries retained (minimum 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Stamp `entry`, insert it at the front and evict anything past capacity.
    pub fn append(&self, entry: NewLogEntry) -> Result<LogEntry, CoreError> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.store.lock()?;
        self.append_locked(entry)
    }

    /// Entries newest first. A non-empty filter keeps entries whose JSON form
    /// contains it verbatim, ignoring case. Whitespace is significant.
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<LogEntry>, CoreError> {
        let entries = self.read_logs()?;
        match filter.filter(|f| !f.is_empty()) {
            None => Ok(entries),
            Some(needle) => {
                let needle = needle.to_lowercase();
                Ok(entries.into_iter().filter(|e| e.matches(&needle)).collect())
            }
        }
    }

    pub fn clear(&self) -> Result<(), CoreError> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.store.lock()?;
        self.store.remove(KEY_QUERY_LOGS)?;
        tracing::info!("Audit log cleared");
        Ok(())
    }

    /// Current cumulative cost. Absent or unreadable values count as zero.
    pub fn ledger_total(&self) -> Result<f64, CoreError> {
        let Some(raw) = self.store.get(KEY_COST_TOTAL)? else {
            return Ok(0.0);
        };
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
            Ok(_) => Ok(0.0),
            Err(e) => {
                tracing::warn!("Treating unreadable {KEY_COST_TOTAL} {raw:?} as 0: {e}");
                Ok(0.0)
            }
        }
    }

    /// Add a non-negative delta to the ledger and return the new total.
    pub fn accrue(&self, delta: f64) -> Result<f64, CoreError> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.store.lock()?;
        self.accrue_locked(delta)
    }

    pub fn reset_ledger(&self) -> Result<(), CoreError> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.store.lock()?;
        self.store.set(KEY_COST_TOTAL, "0")?;
        tracing::info!("Cost ledger reset");
        Ok(())
    }

    /// Append a dispatch's log entry and charge its cost as one unit.
    ///
    /// Both writes are attempted even if the first fails; the first error is
    /// returned.
    pub fn record_dispatch(
        &self,
        entry: NewLogEntry,
        delta: f64,
    ) -> Result<(LogEntry, f64), CoreError> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.store.lock()?;
        let appended = self.append_locked(entry);
        let total = self.accrue_locked(delta);
        Ok((appended?, total?))
    }

    pub fn stats(&self) -> Result<AuditStats, CoreError> {
        let entries = self.read_logs()?;
        let mut by_type = BTreeMap::new();
        let mut by_user = BTreeMap::new();
        for e in &entries {
            *by_type.entry(e.log_type.clone()).or_insert(0) += 1;
            let user = e.user.clone().unwrap_or_else(|| "guest".to_string());
            *by_user.entry(user).or_insert(0) += 1;
        }
        Ok(AuditStats {
            total_entries: entries.len(),
            by_type,
            by_user,
            earliest: entries.iter().map(|e| e.time).min(),
            latest: entries.iter().map(|e| e.time).max(),
            ledger_total: self.ledger_total()?,
        })
    }

    fn read_logs(&self) -> Result<Vec<LogEntry>, CoreError> {
        match self.store.get(KEY_QUERY_LOGS)? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| CoreError::Corrupt {
                key: KEY_QUERY_LOGS.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn append_locked(&self, entry: NewLogEntry) -> Result<LogEntry, CoreError> {
        let mut entries = self.read_logs()?;
        let stamped = entry.stamp();
        entries.insert(0, stamped.clone());
        if entries.len() > self.capacity {
            let evicted = entries.len() - self.capacity;
            entries.truncate(self.capacity);
            tracing::debug!("Evicted {evicted} oldest log entr(ies)");
        }
        let json = serde_json::to_string(&entries)?;
        self.store.set(KEY_QUERY_LOGS, &json)?;
        tracing::debug!(id = %stamped.id, log_type = %stamped.log_type, "Log entry appended");
        Ok(stamped)
    }

    fn accrue_locked(&self, delta: f64) -> Result<f64, CoreError> {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        let total = self.ledger_total()? + delta;
        self.store.set(KEY_COST_TOTAL, &total.to_string())?;
        Ok(total)
    }
}
