//! Validation ledger
//!
//! Maps each contribution id to the validation records received for it, in arrival
//! order. Entries are created on the first record and are never pruned.

use crate::contribution::ContributionId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// One parsed validation payload
///
/// Arbitrary structured data; nothing beyond successful parsing is checked.
pub type ValidationRecord = Value;

/// Thread-safe, append-only map of validation records
#[derive(Debug, Default)]
pub struct ValidationLedger {
    entries: Mutex<HashMap<ContributionId, Vec<ValidationRecord>>>,
}

impl ValidationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for `id`, creating the entry if needed
    ///
    /// Returns the number of records now held for `id`.
    pub fn append(&self, id: ContributionId, record: ValidationRecord) -> usize {
        let mut entries = self.lock();
        let records = entries.entry(id).or_default();
        records.push(record);
        records.len()
    }

    /// Records for `id`, oldest first (empty if none)
    pub fn validations(&self, id: &ContributionId) -> Vec<ValidationRecord> {
        self.lock().get(id).cloned().unwrap_or_default()
    }

    /// Ids with at least one record, sorted
    pub fn ids(&self) -> Vec<ContributionId> {
        let mut ids: Vec<ContributionId> = self.lock().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of ids with records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total records across all ids
    pub fn total_records(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContributionId, Vec<ValidationRecord>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
