//! Round aggregator
//!
//! An `Aggregator` owns the shared intake state for one combiner: the pending queue of
//! announced contributions and the validation ledger. Remote participants feed both
//! concurrently through the intake operations; a single caller runs one round at a
//! time with `combine`, which drains the queue, folds each contribution into a running
//! mean and decides whether the round produced a usable model.
//!
//! # Architecture
//!
//! ```text
//! participants ──announce──────────▶ PendingQueue ──▶ combine (one round at a time)
//!              ──record_validation─▶ ValidationLedger        │
//!                                                            ├─ Loader::load
//!                                                            └─ Reducer::decode / fold
//! ```
//!
//! # Carry-over between rounds
//!
//! Ids still queued when a round ends are **not** discarded. The next `combine` call
//! consumes them first. Orchestrators that need a clean slate must drain the queue
//! themselves.
//!
//! # Example
//!
//! ```
//! use roundfold::aggregator::Aggregator;
//! use roundfold::contribution::{DenseVectorReducer, MockLoader};
//! use roundfold::status::MemorySink;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let loader = MockLoader::new();
//! loader.insert("c1", DenseVectorReducer::encode(&[1.0, 2.0]).unwrap());
//! loader.insert("c2", DenseVectorReducer::encode(&[3.0, 4.0]).unwrap());
//!
//! let aggregator = Aggregator::new("combiner", Arc::new(loader), Arc::new(MemorySink::new()));
//! aggregator.announce("c1");
//! aggregator.announce("c2");
//!
//! let result = aggregator.combine(2, 1, &DenseVectorReducer::new(), Duration::from_secs(5));
//! assert_eq!(result.model, Some(vec![2.0, 3.0]));
//! assert_eq!(result.metadata.successful_count, 2);
//! ```

pub mod engine;
pub mod intake;
pub mod round;

pub use round::{CancelHandle, RoundMetadata, RoundOutcome, RoundPolicy, RoundResult, DEFAULT_POLL_INTERVAL};

use crate::config::AggregatorConfig;
use crate::contribution::{ContributionId, Loader};
use crate::state::{PendingQueue, ValidationLedger, ValidationRecord};
use crate::status::{StatusSink, TracingSink};
use std::sync::Arc;

/// Per-combiner intake state and round engine
///
/// Intake operations may be called from any number of threads at once. `combine` must
/// not run concurrently with another `combine` on the same instance; the queue has a
/// single consumer per round and nothing here arbitrates between two rounds.
pub struct Aggregator {
    /// Name used in status messages
    name: String,

    /// Announced contributions awaiting a round
    queue: PendingQueue,

    /// Validation records per contribution
    ledger: ValidationLedger,

    /// Destination for status messages
    sink: Arc<dyn StatusSink>,

    /// Payload source for announced contributions
    loader: Arc<dyn Loader>,

    /// Policy used by `combine_configured`
    policy: RoundPolicy,
}

impl Aggregator {
    /// Create an aggregator with the default round policy
    pub fn new(name: impl Into<String>, loader: Arc<dyn Loader>, sink: Arc<dyn StatusSink>) -> Self {
        let config = AggregatorConfig::default();
        Self {
            name: name.into(),
            queue: PendingQueue::new(),
            ledger: ValidationLedger::new(),
            sink,
            loader,
            policy: config.round.policy(),
        }
    }

    /// Create an aggregator from configuration, reporting through `tracing`
    pub fn from_config(config: &AggregatorConfig, loader: Arc<dyn Loader>) -> Self {
        let sink: Arc<dyn StatusSink> = Arc::new(TracingSink::new(config.name.clone()));
        Self::new(config.name.clone(), loader, sink).with_policy(config.round.policy())
    }

    /// Replace the configured round policy
    pub fn with_policy(mut self, policy: RoundPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Round policy used by `combine_configured`
    pub fn policy(&self) -> &RoundPolicy {
        &self.policy
    }

    /// Number of announced ids not yet consumed by a round
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Validation ledger for external reporting
    pub fn ledger(&self) -> &ValidationLedger {
        &self.ledger
    }

    /// Validation records for one contribution, in arrival order
    pub fn validations(&self, id: &ContributionId) -> Vec<ValidationRecord> {
        self.ledger.validations(id)
    }

    fn report_info(&self, message: &str) {
        self.sink.report(message, crate::status::StatusLevel::Info);
    }

    fn report_warning(&self, message: &str) {
        self.sink.report(message, crate::status::StatusLevel::Warning);
    }

    fn report_error(&self, message: &str) {
        self.sink.report(message, crate::status::StatusLevel::Error);
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("name", &self.name)
            .field("pending", &self.queue.len())
            .field("validated_ids", &self.ledger.len())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoundConfig;
    use crate::contribution::MockLoader;
    use crate::status::MemorySink;
    use std::time::Duration;

    #[test]
    fn test_new_uses_default_policy() {
        let aggregator = Aggregator::new("a", Arc::new(MockLoader::new()), Arc::new(MemorySink::new()));
        assert_eq!(aggregator.name(), "a");
        assert_eq!(aggregator.policy().timeout, Duration::from_secs(180));
        assert_eq!(aggregator.policy().poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(aggregator.pending_len(), 0);
        assert!(aggregator.ledger().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = AggregatorConfig {
            name: "combiner-7".to_string(),
            round: RoundConfig {
                expected_count: 4,
                required_count: 2,
                timeout_secs: 30,
                poll_interval_ms: 100,
            },
        };

        let aggregator = Aggregator::from_config(&config, Arc::new(MockLoader::new()));
        assert_eq!(aggregator.name(), "combiner-7");
        assert_eq!(aggregator.policy().expected_count, 4);
        assert_eq!(aggregator.policy().poll_interval, Duration::from_millis(100));
        assert!(format!("{:?}", aggregator).contains("combiner-7"));
    }
}
