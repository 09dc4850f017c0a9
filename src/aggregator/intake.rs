//! Intake operations
//!
//! Both intake paths are best-effort and at-most-once: there is no acknowledgment to
//! the remote caller, and every failure is captured, reported at WARNING level and
//! dropped. Neither path ever blocks on a running round.

use super::Aggregator;
use crate::contribution::ContributionId;
use crate::error::IntakeError;
use crate::state::ValidationRecord;

impl Aggregator {
    /// A participant announced that a contribution is ready
    ///
    /// Queues the id for the current or next round. Duplicate announcements are
    /// queued (and later processed) once per call.
    pub fn announce(&self, id: impl Into<ContributionId>) {
        let id = id.into();
        self.report_info(&format!("received contribution {}", id));
        self.queue.push(id);
    }

    /// A participant submitted a validation for a contribution
    ///
    /// `raw` must be a JSON document. Parsed records are appended to the ledger in
    /// arrival order; malformed payloads are reported and dropped.
    pub fn record_validation(&self, id: impl Into<ContributionId>, raw: &[u8]) {
        let id = id.into();
        match self.try_record_validation(id.clone(), raw) {
            Ok(count) => self.report_info(&format!(
                "processed validation for contribution {} ({} on record)",
                id, count
            )),
            Err(e) => self.report_warning(&format!("dropped validation: {}", e)),
        }
    }

    /// Parse and store a validation, returning the failure instead of reporting it
    ///
    /// On success returns the number of records now held for `id`.
    pub fn try_record_validation(&self, id: ContributionId, raw: &[u8]) -> Result<usize, IntakeError> {
        let record: ValidationRecord = serde_json::from_slice(raw)
            .map_err(|source| IntakeError::MalformedValidation { id: id.clone(), source })?;

        Ok(self.ledger.append(id, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::MockLoader;
    use crate::status::{MemorySink, StatusLevel};
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn aggregator() -> (Arc<Aggregator>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let aggregator = Aggregator::new("intake", Arc::new(MockLoader::new()), sink.clone());
        (Arc::new(aggregator), sink)
    }

    #[test]
    fn test_announce_queues_and_reports() {
        let (aggregator, sink) = aggregator();
        aggregator.announce("c1");
        aggregator.announce("c1");

        assert_eq!(aggregator.pending_len(), 2);
        assert_eq!(sink.messages_at(StatusLevel::Info).len(), 2);
        assert!(sink.contains(StatusLevel::Info, "received contribution c1"));
    }

    #[test]
    fn test_record_validation_twice_keeps_both_in_order() {
        let (aggregator, sink) = aggregator();
        aggregator.record_validation("m1", br#"{"loss": 0.9}"#);
        aggregator.record_validation("m1", br#"{"loss": 0.4}"#);

        let records = aggregator.validations(&ContributionId::from("m1"));
        assert_eq!(records, vec![json!({"loss": 0.9}), json!({"loss": 0.4})]);
        assert!(sink.contains(StatusLevel::Info, "(2 on record)"));
    }

    #[test]
    fn test_malformed_validation_is_dropped_with_warning() {
        let (aggregator, sink) = aggregator();
        aggregator.record_validation("m1", b"{not json");

        assert!(aggregator.validations(&ContributionId::from("m1")).is_empty());
        assert!(aggregator.ledger().is_empty());
        assert!(sink.contains(StatusLevel::Warning, "malformed validation for contribution m1"));
    }

    #[test]
    fn test_try_record_validation_surfaces_error() {
        let (aggregator, _sink) = aggregator();
        let err = aggregator
            .try_record_validation(ContributionId::from("m2"), b"")
            .unwrap_err();
        assert!(matches!(err, IntakeError::MalformedValidation { .. }));

        let count = aggregator
            .try_record_validation(ContributionId::from("m2"), b"[1, 2]")
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_concurrent_intake() {
        let (aggregator, _sink) = aggregator();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let aggregator = Arc::clone(&aggregator);
                thread::spawn(move || {
                    for i in 0..25 {
                        aggregator.announce(format!("c{}-{}", t, i));
                        aggregator.record_validation(format!("c{}-{}", t, i), br#"{"ok": true}"#);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(aggregator.pending_len(), 200);
        assert_eq!(aggregator.ledger().len(), 200);
        assert_eq!(aggregator.ledger().total_records(), 200);
    }
}
