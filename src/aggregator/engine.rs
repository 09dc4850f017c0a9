//! Round engine
//!
//! Drains the pending queue for one round and folds each contribution into a running
//! mean. The round moves between two working states and ends in one of five
//! terminal ones (plus cancellation):
//!
//! ```text
//!            queue empty                     target reached
//!   WAITING ◀────────────▶ DRAINING ─────────────────────────▶ COMPLETED
//!      │                      │                                (>= required)
//!      │  budget spent        │  failures shrink target to 0   DEGRADED_ABORT
//!      ▼                      ▼                                (< required)
//!   TIMED_OUT_PARTIAL     STARVED_ABORT
//!   (>= required)
//!   TIMED_OUT_ABORT
//!   (< required)
//! ```
//!
//! A contribution that fails to load or decode shrinks the round target by one and is
//! never retried. Once the target drops below `required_count` the round can no longer
//! succeed; the remaining contributions are still drained so they do not carry over,
//! and the round ends as `DegradedAbort` without a model.
//!
//! The timeout is checked after every iteration against the wall-clock
//! time since the round started. Loads already in flight when the budget runs out are
//! allowed to finish, so a round can overrun its budget by the duration of one load.
//!
//! Waiting is event-driven: an empty queue is waited on for at most one poll interval
//! and the engine wakes as soon as an id is announced.

use super::round::{CancelHandle, RoundOutcome, RoundPolicy, RoundResult, RoundState};
use super::Aggregator;
use crate::contribution::{ContributionId, Reducer};
use crate::error::{ContributionError, PolicyError};
use crate::state::Dequeue;
use crate::util::time::{format_duration, Budget, Stopwatch};
use std::sync::Arc;
use std::time::Duration;

/// Result of processing one dequeued id
enum Step {
    /// Folded or degraded; keep draining
    Continue,
    /// The target collapsed to zero
    Starved,
}

impl Aggregator {
    /// Run one round
    ///
    /// Uses the default one second poll interval. Never fails: an invalid policy is
    /// reported at ERROR level and yields an aborted result with outcome
    /// `InvalidPolicy`.
    pub fn combine<R>(
        &self,
        expected_count: usize,
        required_count: usize,
        reducer: &R,
        timeout: Duration,
    ) -> RoundResult<R::Model>
    where
        R: Reducer + ?Sized,
    {
        let policy = RoundPolicy::new(expected_count, required_count, timeout);
        match self.combine_with_policy(&policy, reducer) {
            Ok(result) => result,
            Err(e) => {
                self.report_error(&format!("refusing to start round: {}", e));
                RoundState::new(expected_count).finish(RoundOutcome::InvalidPolicy, required_count, Duration::ZERO)
            }
        }
    }

    /// Run one round with the configured policy
    pub fn combine_configured<R>(&self, reducer: &R) -> Result<RoundResult<R::Model>, PolicyError>
    where
        R: Reducer + ?Sized,
    {
        let policy = self.policy;
        self.combine_with_policy(&policy, reducer)
    }

    /// Run one round with an explicit policy
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if the policy is invalid; nothing is dequeued in that case.
    /// Every round-level failure is reported through the result instead.
    pub fn combine_with_policy<R>(&self, policy: &RoundPolicy, reducer: &R) -> Result<RoundResult<R::Model>, PolicyError>
    where
        R: Reducer + ?Sized,
    {
        self.combine_with_cancel(policy, reducer, &CancelHandle::new())
    }

    /// Run one round that stops early once `cancel` is signalled
    ///
    /// A cancelled round keeps its model only if `required_count` contributions were
    /// folded, the same rule that applies on timeout.
    pub fn combine_with_cancel<R>(
        &self,
        policy: &RoundPolicy,
        reducer: &R,
        cancel: &CancelHandle,
    ) -> Result<RoundResult<R::Model>, PolicyError>
    where
        R: Reducer + ?Sized,
    {
        policy.validate()?;
        Ok(self.run_round(policy, reducer, cancel))
    }

    /// Run one round on tokio's blocking pool
    ///
    /// For callers living inside a tokio runtime. The aggregator is shared, so intake
    /// keeps working while the round runs.
    pub async fn combine_async<R>(
        self: Arc<Self>,
        policy: RoundPolicy,
        reducer: R,
        cancel: CancelHandle,
    ) -> crate::Result<RoundResult<R::Model>>
    where
        R: Reducer + Send + 'static,
        R::Model: Send + 'static,
    {
        let result = tokio::task::spawn_blocking(move || self.combine_with_cancel(&policy, &reducer, &cancel))
            .await
            .map_err(|e| anyhow::anyhow!("round task failed: {}", e))??;

        Ok(result)
    }

    fn run_round<R>(&self, policy: &RoundPolicy, reducer: &R, cancel: &CancelHandle) -> RoundResult<R::Model>
    where
        R: Reducer + ?Sized,
    {
        let budget = Budget::new(policy.timeout);
        let mut state = RoundState::new(policy.expected_count);

        self.report_info(&format!(
            "aggregating contributions: expecting {}, requiring {}, timeout {}",
            policy.expected_count,
            policy.required_count,
            format_duration(budget.limit())
        ));

        while !state.is_complete() {
            let dequeued = match self.queue.try_pop() {
                Dequeue::Item(id) => Some(id),
                Dequeue::Empty => {
                    self.report_info(&format!(
                        "waiting for contributions: {} of {} completed",
                        state.processed_count(),
                        state.current_expected()
                    ));
                    match self.queue.pop_timeout(policy.poll_interval.min(budget.remaining())) {
                        Dequeue::Item(id) => Some(id),
                        Dequeue::Empty => None,
                    }
                }
            };

            if let Some(id) = dequeued {
                if let Step::Starved = self.process(&id, reducer, &mut state) {
                    self.report_error("no usable contributions left, aborting round");
                    return self.close(state, RoundOutcome::StarvedAbort, policy, &budget);
                }
            }

            if state.is_complete() {
                break;
            }

            if cancel.is_cancelled() {
                self.report_warning("round cancelled");
                return self.close(state, RoundOutcome::Cancelled, policy, &budget);
            }

            if budget.is_exhausted() {
                self.report_warning("round timed out");
                let outcome = if state.processed_count() >= policy.required_count {
                    RoundOutcome::TimedOutPartial
                } else {
                    RoundOutcome::TimedOutAbort
                };
                return self.close(state, outcome, policy, &budget);
            }
        }

        let outcome = if state.processed_count() >= policy.required_count {
            RoundOutcome::Completed
        } else {
            RoundOutcome::DegradedAbort
        };
        self.close(state, outcome, policy, &budget)
    }

    /// Load, decode and fold one contribution
    fn process<R>(&self, id: &ContributionId, reducer: &R, state: &mut RoundState<R::Model>) -> Step
    where
        R: Reducer + ?Sized,
    {
        self.report_info(&format!("processing contribution {}", id));

        let watch = Stopwatch::start();
        let decoded = self.load_and_decode(id, reducer);
        state.add_load_time(watch.elapsed());

        match decoded {
            Ok(next) => {
                let watch = Stopwatch::start();
                state.fold(reducer, next);
                state.add_fold_time(watch.elapsed());
                tracing::debug!(
                    contribution = %id,
                    folded = state.processed_count(),
                    "contribution folded"
                );
                Step::Continue
            }
            Err(e) => {
                self.report_warning(&format!("{}, skipping this contribution", e));
                if state.degrade() {
                    Step::Starved
                } else {
                    Step::Continue
                }
            }
        }
    }

    fn load_and_decode<R>(&self, id: &ContributionId, reducer: &R) -> Result<R::Model, ContributionError>
    where
        R: Reducer + ?Sized,
    {
        let bytes = self
            .loader
            .load(id)
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| ContributionError::LoadFailure(id.clone()))?;

        reducer
            .decode(&bytes)
            .map_err(|reason| ContributionError::DecodeFailure { id: id.clone(), reason })
    }

    fn close<M>(&self, state: RoundState<M>, outcome: RoundOutcome, policy: &RoundPolicy, budget: &Budget) -> RoundResult<M> {
        let result = state.finish(outcome, policy.required_count, budget.elapsed());
        let meta = &result.metadata;

        if result.is_success() {
            self.report_info(&format!(
                "round completed ({:?}), aggregated {} contributions",
                outcome, meta.successful_count
            ));
        } else {
            self.report_error(&format!(
                "round aborted ({:?}) with {} of {} required contributions",
                outcome, meta.successful_count, policy.required_count
            ));
        }

        tracing::debug!(
            outcome = ?outcome,
            successful = meta.successful_count,
            failed = meta.failed_count,
            load_time = %format_duration(meta.load_time),
            fold_time = %format_duration(meta.fold_time),
            elapsed = %format_duration(meta.elapsed),
            "round closed"
        );

        result
    }
}
