//! Pending contribution queue
//!
//! Many intake callers push ids concurrently; one round drains them at a time.
//! The queue is an unbounded crossbeam channel owned by the aggregator, so pushes
//! never block and the consumer can either poll or wait with a deadline.
//!
//! Items still queued when a round ends stay queued and are consumed by the next round.

use crate::contribution::ContributionId;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Result of one dequeue attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeue {
    /// An id was available
    Item(ContributionId),
    /// Nothing arrived in time
    Empty,
}

/// Thread-safe FIFO of contribution ids
#[derive(Debug)]
pub struct PendingQueue {
    sender: Sender<ContributionId>,
    receiver: Receiver<ContributionId>,
}

impl PendingQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }

    /// Append an id; never blocks and never fails
    pub fn push(&self, id: ContributionId) {
        // The receiver lives in `self`, so the channel is never disconnected here
        let _ = self.sender.send(id);
    }

    /// Take the oldest id without waiting
    pub fn try_pop(&self) -> Dequeue {
        match self.receiver.try_recv() {
            Ok(id) => Dequeue::Item(id),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Dequeue::Empty,
        }
    }

    /// Take the oldest id, waiting up to `timeout` for one to arrive
    ///
    /// Returns as soon as an id is pushed.
    pub fn pop_timeout(&self, timeout: Duration) -> Dequeue {
        match self.receiver.recv_timeout(timeout) {
            Ok(id) => Dequeue::Item(id),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Dequeue::Empty,
        }
    }

    /// Number of ids waiting
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}
