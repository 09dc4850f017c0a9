//! Shared aggregator state
//!
//! The pending queue and the validation ledger live as long as the aggregator that
//! owns them and outlive any single round. Each synchronizes internally, so intake
//! callers never contend with the round engine for a lock of their own.

pub mod ledger;
pub mod queue;

pub use ledger::{ValidationLedger, ValidationRecord};
pub use queue::{Dequeue, PendingQueue};
