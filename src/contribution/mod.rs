//! Contributions and the capabilities used to consume them
//!
//! A contribution is one participant's partial result for a round, identified by an
//! opaque `ContributionId`. The aggregator never touches payload storage or model
//! arithmetic itself; it goes through two injected capabilities:
//!
//! - **`Loader`**: fetches payload bytes for an id, signalling failure with `None`
//! - **`Reducer`**: decodes payload bytes into a native model and folds one model
//!   into a running accumulator
//!
//! # Example
//!
//! ```
//! use roundfold::contribution::{ContributionId, Loader, MockLoader};
//!
//! let loader = MockLoader::new();
//! loader.insert("c1", vec![1, 2, 3]);
//!
//! assert_eq!(loader.load(&ContributionId::from("c1")), Some(vec![1, 2, 3]));
//! assert_eq!(loader.load(&ContributionId::from("missing")), None);
//! ```

pub mod mean;
pub mod mock;

pub use mean::{incremental_mean, DenseVectorReducer};
pub use mock::MockLoader;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one submitted contribution
///
/// Ids are not deduplicated: announcing the same id twice queues it twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionId(String);

impl ContributionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContributionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ContributionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Fault-tolerant payload loader
///
/// Implementations own retries and storage errors. They must not panic; a missing or
/// unreadable payload is reported as `None` (an empty payload counts as a failure too).
pub trait Loader: Send + Sync {
    /// Fetch the payload bytes for `id`
    fn load(&self, id: &ContributionId) -> Option<Vec<u8>>;
}

impl<L: Loader + ?Sized> Loader for std::sync::Arc<L> {
    fn load(&self, id: &ContributionId) -> Option<Vec<u8>> {
        (**self).load(id)
    }
}

/// Decode and fold capability, injected per round
///
/// `fold` must be an order-insensitive incremental mean: given samples `x1..xn` folded
/// in any order, the accumulator converges to their equal-weight mean.
pub trait Reducer {
    /// Native model representation
    type Model;

    /// Decode payload bytes into a model
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the payload cannot be decoded. The engine
    /// treats this exactly like a load failure.
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Self::Model, String>;

    /// Fold `next` into `accumulator`
    ///
    /// `sample_index` is the 1-based number of samples including `next`, so the
    /// second sample is folded with `sample_index == 2`.
    fn fold(&self, accumulator: Self::Model, next: Self::Model, sample_index: usize) -> Self::Model;
}
