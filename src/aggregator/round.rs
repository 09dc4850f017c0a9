//! Round policy, state and result types

use crate::contribution::Reducer;
use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default wait granularity between queue polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Immutable configuration of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPolicy {
    /// Target number of contributions
    pub expected_count: usize,
    /// Minimum successful folds for a usable round
    pub required_count: usize,
    /// Wall-clock budget for the round
    pub timeout: Duration,
    /// Upper bound on a single wait for new contributions
    pub poll_interval: Duration,
}

impl RoundPolicy {
    /// Create a policy with the default one second poll interval
    pub fn new(expected_count: usize, required_count: usize, timeout: Duration) -> Self {
        Self {
            expected_count,
            required_count,
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Check the policy before a round starts
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.required_count == 0 {
            return Err(PolicyError::ZeroRequired);
        }
        if self.expected_count < self.required_count {
            return Err(PolicyError::ExpectedBelowRequired {
                expected: self.expected_count,
                required: self.required_count,
            });
        }
        if self.poll_interval.is_zero() {
            return Err(PolicyError::ZeroPollInterval);
        }
        if self.timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }
        Ok(())
    }
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// The (possibly shrunk) target was reached with at least `required_count` successes
    Completed,
    /// Failures shrank the target below `required_count` and the rest were drained
    DegradedAbort,
    /// Timed out with at least `required_count` successes
    TimedOutPartial,
    /// Timed out with fewer than `required_count` successes
    TimedOutAbort,
    /// Failures shrank the target to zero
    StarvedAbort,
    /// Cancelled; the model is kept only with at least `required_count` successes
    Cancelled,
    /// The policy was rejected before the round started
    InvalidPolicy,
}

impl RoundOutcome {
    /// Whether this outcome ended on the timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, RoundOutcome::TimedOutPartial | RoundOutcome::TimedOutAbort)
    }
}

/// Counters and timings reported with every round result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundMetadata {
    /// Total time spent loading and decoding contributions
    pub load_time: Duration,
    /// Total time spent folding contributions
    pub fold_time: Duration,
    /// Contributions folded into the model
    pub successful_count: usize,
    /// Contributions that failed to load or decode
    pub failed_count: usize,
    /// Target after degradation
    pub final_expected: usize,
    /// Wall-clock duration of the round
    pub elapsed: Duration,
    pub outcome: RoundOutcome,
}

/// Result of one round
///
/// `model` is `None` exactly when the round was aborted.
#[derive(Debug, Clone)]
pub struct RoundResult<M> {
    pub model: Option<M>,
    pub metadata: RoundMetadata,
}

impl<M> RoundResult<M> {
    /// Whether the round produced a usable model
    pub fn is_success(&self) -> bool {
        self.model.is_some()
    }

    pub fn outcome(&self) -> RoundOutcome {
        self.metadata.outcome
    }

    pub fn successful_count(&self) -> usize {
        self.metadata.successful_count
    }
}

/// Transient state of the round in flight
#[derive(Debug)]
pub(crate) struct RoundState<M> {
    accumulator: Option<M>,
    processed_count: usize,
    current_expected: usize,
    failed_count: usize,
    load_time: Duration,
    fold_time: Duration,
}

impl<M> RoundState<M> {
    pub(crate) fn new(expected_count: usize) -> Self {
        Self {
            accumulator: None,
            processed_count: 0,
            current_expected: expected_count,
            failed_count: 0,
            load_time: Duration::ZERO,
            fold_time: Duration::ZERO,
        }
    }

    pub(crate) fn processed_count(&self) -> usize {
        self.processed_count
    }

    pub(crate) fn current_expected(&self) -> usize {
        self.current_expected
    }

    /// Target reached
    pub(crate) fn is_complete(&self) -> bool {
        self.processed_count >= self.current_expected
    }

    pub(crate) fn add_load_time(&mut self, elapsed: Duration) {
        self.load_time += elapsed;
    }

    pub(crate) fn add_fold_time(&mut self, elapsed: Duration) {
        self.fold_time += elapsed;
    }

    /// Shrink the target after an unusable contribution
    ///
    /// Returns `true` when the target has collapsed to zero.
    pub(crate) fn degrade(&mut self) -> bool {
        self.failed_count += 1;
        self.current_expected = self.current_expected.saturating_sub(1);
        self.current_expected == 0
    }

    /// Fold a decoded sample into the accumulator
    ///
    /// The first sample seeds the accumulator as-is.
    pub(crate) fn fold<R>(&mut self, reducer: &R, next: M)
    where
        R: Reducer<Model = M> + ?Sized,
    {
        self.accumulator = Some(match self.accumulator.take() {
            None => next,
            Some(acc) => reducer.fold(acc, next, self.processed_count + 1),
        });
        self.processed_count += 1;
    }

    /// Close the round
    ///
    /// The model survives only for outcomes that accept the round, and only with at
    /// least `required_count` successes.
    pub(crate) fn finish(self, outcome: RoundOutcome, required_count: usize, elapsed: Duration) -> RoundResult<M> {
        let model = match outcome {
            RoundOutcome::Completed | RoundOutcome::TimedOutPartial | RoundOutcome::Cancelled
                if self.processed_count >= required_count =>
            {
                self.accumulator
            }
            RoundOutcome::Completed
            | RoundOutcome::TimedOutPartial
            | RoundOutcome::Cancelled
            | RoundOutcome::DegradedAbort
            | RoundOutcome::TimedOutAbort
            | RoundOutcome::StarvedAbort
            | RoundOutcome::InvalidPolicy => None,
        };

        RoundResult {
            model,
            metadata: RoundMetadata {
                load_time: self.load_time,
                fold_time: self.fold_time,
                successful_count: self.processed_count,
                failed_count: self.failed_count,
                final_expected: self.current_expected,
                elapsed,
                outcome,
            },
        }
    }
}

/// Cooperative cancellation signal for a running round
///
/// Clones share the same flag. The engine checks it after every iteration, so a
/// cancelled round stops within one poll interval (plus any load already in flight).
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::DenseVectorReducer;

    #[test]
    fn test_policy_validation() {
        let policy = RoundPolicy::new(3, 2, Duration::from_secs(5));
        assert_eq!(policy.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(policy.validate().is_ok());

        assert_eq!(
            RoundPolicy::new(3, 0, Duration::from_secs(5)).validate(),
            Err(PolicyError::ZeroRequired)
        );
        assert_eq!(
            RoundPolicy::new(1, 2, Duration::from_secs(5)).validate(),
            Err(PolicyError::ExpectedBelowRequired { expected: 1, required: 2 })
        );
        assert_eq!(
            policy.with_poll_interval(Duration::ZERO).validate(),
            Err(PolicyError::ZeroPollInterval)
        );
        assert_eq!(
            RoundPolicy::new(1, 1, Duration::ZERO).validate(),
            Err(PolicyError::ZeroTimeout)
        );
    }

    #[test]
    fn test_state_seeds_then_folds() {
        let reducer = DenseVectorReducer::new();
        let mut state = RoundState::new(3);

        state.fold(&reducer, vec![2.0]);
        assert_eq!(state.processed_count(), 1);
        state.fold(&reducer, vec![4.0]);
        state.fold(&reducer, vec![9.0]);
        assert!(state.is_complete());

        let result = state.finish(RoundOutcome::Completed, 1, Duration::ZERO);
        let model = result.model.unwrap();
        assert!((model[0] - 5.0).abs() < 1e-9);
        assert_eq!(result.metadata.successful_count, 3);
    }

    #[test]
    fn test_degrade_collapses_to_zero() {
        let mut state: RoundState<Vec<f64>> = RoundState::new(2);
        assert!(!state.degrade());
        assert_eq!(state.current_expected(), 1);
        assert!(state.degrade());
        assert_eq!(state.current_expected(), 0);

        let result = state.finish(RoundOutcome::StarvedAbort, 1, Duration::ZERO);
        assert!(result.model.is_none());
        assert_eq!(result.metadata.failed_count, 2);
        assert_eq!(result.metadata.final_expected, 0);
    }

    #[test]
    fn test_abort_drops_model() {
        let reducer = DenseVectorReducer::new();
        let mut state = RoundState::new(5);
        state.fold(&reducer, vec![1.0]);

        let result = state.finish(RoundOutcome::TimedOutAbort, 3, Duration::from_secs(2));
        assert!(!result.is_success());
        assert_eq!(result.successful_count(), 1);
        assert!(result.outcome().is_timeout());
    }

    #[test]
    fn test_cancelled_keeps_model_only_when_required_met() {
        let reducer = DenseVectorReducer::new();
        let mut state = RoundState::new(4);
        state.fold(&reducer, vec![1.0]);
        state.fold(&reducer, vec![3.0]);
        let kept = state.finish(RoundOutcome::Cancelled, 2, Duration::ZERO);
        assert!(kept.is_success());

        let mut state = RoundState::new(4);
        state.fold(&reducer, vec![1.0]);
        let dropped = state.finish(RoundOutcome::Cancelled, 2, Duration::ZERO);
        assert!(!dropped.is_success());
    }

    #[test]
    fn test_model_dropped_below_required_whatever_the_outcome() {
        let reducer = DenseVectorReducer::new();
        for outcome in [RoundOutcome::Completed, RoundOutcome::TimedOutPartial, RoundOutcome::DegradedAbort] {
            let mut state = RoundState::new(3);
            state.fold(&reducer, vec![1.0]);
            state.degrade();
            state.degrade();
            assert!(state.is_complete());

            let result = state.finish(outcome, 3, Duration::ZERO);
            assert!(result.model.is_none(), "{:?} kept a model", outcome);
            assert_eq!(result.metadata.successful_count, 1);
            assert_eq!(result.metadata.failed_count, 2);
        }
    }

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
    }
}
