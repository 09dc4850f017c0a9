//! In-memory status sink
//!
//! Records every message in arrival order. Useful in tests and for embedders that
//! want to forward status messages in batches.

use super::{StatusLevel, StatusSink};
use std::sync::Mutex;

/// A recorded status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub level: StatusLevel,
    pub message: String,
}

/// Status sink that keeps all messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<StatusRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages, oldest first
    pub fn records(&self) -> Vec<StatusRecord> {
        self.lock().clone()
    }

    /// Messages recorded at one level, oldest first
    pub fn messages_at(&self, level: StatusLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether any message at `level` contains `needle`
    pub fn contains(&self, level: StatusLevel, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StatusRecord>> {
        // A panicking reporter must not take the sink down with it
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StatusSink for MemorySink {
    fn report(&self, message: &str, level: StatusLevel) {
        self.lock().push(StatusRecord {
            level,
            message: message.to_string(),
        });
    }
}
