//! Mock loader for testing
//!
//! Serves payloads from memory without touching storage. Payloads can be registered
//! before or during a round, ids can be forced to fail, and an artificial per-load
//! delay can simulate slow storage.
//!
//! # Example
//!
//! ```
//! use roundfold::contribution::{ContributionId, Loader, MockLoader};
//!
//! let loader = MockLoader::new();
//! loader.insert("c1", vec![7]);
//! loader.fail("c1");
//!
//! assert_eq!(loader.load(&ContributionId::from("c1")), None);
//! assert_eq!(loader.load_count(), 1);
//! ```

use super::{ContributionId, Loader};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// In-memory loader with configurable failures
#[derive(Clone, Default)]
pub struct MockLoader {
    /// Registered payloads
    payloads: Arc<Mutex<HashMap<ContributionId, Vec<u8>>>>,

    /// Ids that always fail to load, even if a payload is registered
    failing: Arc<Mutex<HashSet<ContributionId>>>,

    /// Artificial latency added to every load
    delay: Arc<Mutex<Option<Duration>>>,

    /// Every id passed to `load`, in call order
    loaded: Arc<Mutex<Vec<ContributionId>>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload for an id
    pub fn insert(&self, id: impl Into<ContributionId>, payload: Vec<u8>) {
        lock(&self.payloads).insert(id.into(), payload);
    }

    /// Make every load of `id` fail
    pub fn fail(&self, id: impl Into<ContributionId>) {
        lock(&self.failing).insert(id.into());
    }

    /// Sleep for `delay` on every load
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    /// Ids passed to `load`, in call order
    pub fn loaded_ids(&self) -> Vec<ContributionId> {
        lock(&self.loaded).clone()
    }

    pub fn load_count(&self) -> usize {
        lock(&self.loaded).len()
    }
}

impl Loader for MockLoader {
    fn load(&self, id: &ContributionId) -> Option<Vec<u8>> {
        lock(&self.loaded).push(id.clone());

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if lock(&self.failing).contains(id) {
            return None;
        }

        lock(&self.payloads)
            .get(id)
            .filter(|payload| !payload.is_empty())
            .cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_unknown_and_empty_payloads_fail() {
        let loader = MockLoader::new();
        loader.insert("empty", Vec::new());

        assert_eq!(loader.load(&ContributionId::from("unknown")), None);
        assert_eq!(loader.load(&ContributionId::from("empty")), None);
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let loader = MockLoader::new();
        let handle = loader.clone();
        handle.insert("late", vec![1]);

        assert_eq!(loader.load(&ContributionId::from("late")), Some(vec![1]));
        assert_eq!(handle.loaded_ids(), vec![ContributionId::from("late")]);
    }

    #[test]
    fn test_delay() {
        let loader = MockLoader::new();
        loader.insert("slow", vec![1]);
        loader.set_delay(Some(Duration::from_millis(20)));

        let start = Instant::now();
        assert!(loader.load(&ContributionId::from("slow")).is_some());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
