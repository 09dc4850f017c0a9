//! Error types
//!
//! Round-level failures never surface as errors: the engine reports them through the
//! status sink and encodes them in the `RoundResult`. The types here describe the
//! individual failures the engine and the intake paths capture along the way.

use crate::contribution::ContributionId;
use thiserror::Error;

/// Failure to turn one contribution into a foldable sample
///
/// Both variants degrade the round target by one; neither is retried.
#[derive(Debug, Error)]
pub enum ContributionError {
    /// The loader returned nothing for this contribution
    #[error("failed to load contribution {0}")]
    LoadFailure(ContributionId),

    /// The payload was loaded but the reducer could not decode it
    #[error("failed to decode contribution {id}: {reason}")]
    DecodeFailure { id: ContributionId, reason: String },
}

impl ContributionError {
    /// Identifier of the contribution that failed
    pub fn id(&self) -> &ContributionId {
        match self {
            ContributionError::LoadFailure(id) => id,
            ContributionError::DecodeFailure { id, .. } => id,
        }
    }
}

/// Failure captured on an intake path
///
/// Intake errors are reported at WARNING level and swallowed; they are public so
/// embedders can use `try_record_validation` directly.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("malformed validation for contribution {id}: {source}")]
    MalformedValidation {
        id: ContributionId,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid round policy
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("required_count must be at least 1")]
    ZeroRequired,

    #[error("expected_count ({expected}) must be >= required_count ({required})")]
    ExpectedBelowRequired { expected: usize, required: usize },

    #[error("poll_interval must be non-zero")]
    ZeroPollInterval,

    #[error("timeout must be non-zero")]
    ZeroTimeout,
}
