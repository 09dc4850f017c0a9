//! Configuration module
//!
//! Handles TOML configuration files and validation for an aggregator instance and
//! its default round policy.
//!
//! ```toml
//! name = "combiner-eu-1"
//!
//! [round]
//! expected_count = 10
//! required_count = 6
//! timeout_secs = 180
//! poll_interval_ms = 1000
//! ```

pub mod toml;
pub mod validator;

use crate::aggregator::RoundPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete aggregator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Name used to tag status messages
    #[serde(default = "default_name")]
    pub name: String,
    /// Default policy for rounds run with `combine_with_policy`
    #[serde(default)]
    pub round: RoundConfig,
}

/// Round policy as written in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Number of contributions the round aims for
    #[serde(default = "default_expected_count")]
    pub expected_count: usize,
    /// Minimum successful contributions for a usable round
    #[serde(default = "default_required_count")]
    pub required_count: usize,
    /// Wall-clock budget for the round
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on each wait for new contributions
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_name() -> String {
    "aggregator".to_string()
}

fn default_expected_count() -> usize {
    1
}

fn default_required_count() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            round: RoundConfig::default(),
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            expected_count: default_expected_count(),
            required_count: default_required_count(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl RoundConfig {
    /// Convert to a `Duration`-typed round policy
    pub fn policy(&self) -> RoundPolicy {
        RoundPolicy {
            expected_count: self.expected_count,
            required_count: self.required_count,
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

impl From<&RoundConfig> for RoundPolicy {
    fn from(config: &RoundConfig) -> Self {
        config.policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AggregatorConfig::default();
        assert_eq!(config.name, "aggregator");
        assert_eq!(config.round.required_count, 1);
        assert_eq!(config.round.timeout_secs, 180);
        assert_eq!(config.round.poll_interval_ms, 1000);
    }

    #[test]
    fn test_policy_conversion() {
        let round = RoundConfig {
            expected_count: 5,
            required_count: 3,
            timeout_secs: 2,
            poll_interval_ms: 250,
        };

        let policy = RoundPolicy::from(&round);
        assert_eq!(policy.expected_count, 5);
        assert_eq!(policy.required_count, 3);
        assert_eq!(policy.timeout, Duration::from_secs(2));
        assert_eq!(policy.poll_interval, Duration::from_millis(250));
    }
}
