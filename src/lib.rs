//! Roundfold - round-bounded contribution aggregation
//!
//! Roundfold is the decision engine of a federated-averaging combiner. Remote
//! participants announce model updates and submit validations at any time; once per
//! round a coordinator drains the announced updates, folds them into a running mean
//! and decides, under a wall-clock budget and despite individual failures, whether
//! the round produced a usable model.
//!
//! # Architecture
//!
//! - **Intake**: `announce` and `record_validation`, safe from any number of threads
//! - **Shared state**: a pending queue and a validation ledger owned by each aggregator
//! - **Round engine**: `combine` drains, degrades on failures, enforces the timeout
//! - **Injected capabilities**: payload `Loader`, model `Reducer`, `StatusSink`
//!
//! Transport, blob storage and multi-round orchestration live outside this crate.

pub mod aggregator;
pub mod config;
pub mod contribution;
pub mod error;
pub mod state;
pub mod status;
pub mod util;

// Re-export commonly used types
pub use aggregator::{Aggregator, CancelHandle, RoundMetadata, RoundOutcome, RoundPolicy, RoundResult};
pub use config::AggregatorConfig;
pub use contribution::{ContributionId, Loader, Reducer};
pub use status::{StatusLevel, StatusSink};

/// Result type used throughout Roundfold
pub type Result<T> = anyhow::Result<T>;
