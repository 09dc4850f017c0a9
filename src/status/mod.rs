//! Status reporting
//!
//! The aggregator reports every intake event, every degraded contribution and every
//! round outcome through a `StatusSink`. The default sink forwards to `tracing`;
//! `MemorySink` keeps the messages in memory so callers can inspect them.
//!
//! # Example
//!
//! ```
//! use roundfold::status::{MemorySink, StatusLevel, StatusSink};
//!
//! let sink = MemorySink::new();
//! sink.report("round started", StatusLevel::Info);
//! assert_eq!(sink.messages_at(StatusLevel::Info), vec!["round started".to_string()]);
//! ```

pub mod memory;

pub use memory::MemorySink;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::Info => write!(f, "INFO"),
            StatusLevel::Warning => write!(f, "WARNING"),
            StatusLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Destination for leveled status messages
///
/// Implementations must be callable from many threads at once and must not fail;
/// there is no return channel.
pub trait StatusSink: Send + Sync {
    /// Report a message at the given level
    fn report(&self, message: &str, level: StatusLevel);
}

/// Status sink backed by `tracing`
///
/// Each message becomes a `tracing` event carrying the aggregator name as a field.
/// No subscriber is installed here.
#[derive(Debug, Clone)]
pub struct TracingSink {
    name: String,
}

impl TracingSink {
    /// Create a sink that tags events with the given aggregator name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Aggregator name attached to every event
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new("aggregator")
    }
}

impl StatusSink for TracingSink {
    fn report(&self, message: &str, level: StatusLevel) {
        match level {
            StatusLevel::Info => tracing::info!(target: "roundfold", aggregator = %self.name, "{}", message),
            StatusLevel::Warning => tracing::warn!(target: "roundfold", aggregator = %self.name, "{}", message),
            StatusLevel::Error => tracing::error!(target: "roundfold", aggregator = %self.name, "{}", message),
        }
    }
}

impl<S: StatusSink + ?Sized> StatusSink for std::sync::Arc<S> {
    fn report(&self, message: &str, level: StatusLevel) {
        (**self).report(message, level)
    }
}
