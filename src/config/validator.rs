//! Configuration validation

use super::*;
use anyhow::{Context, Result};

/// Validate complete configuration
pub fn validate_config(config: &AggregatorConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        anyhow::bail!("name must not be empty");
    }

    validate_round(&config.round)?;

    Ok(())
}

/// Validate round configuration
pub fn validate_round(round: &RoundConfig) -> Result<()> {
    round
        .policy()
        .validate()
        .context("Invalid round configuration")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default() {
        assert!(validate_config(&AggregatorConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        let config = AggregatorConfig {
            name: "  ".to_string(),
            ..AggregatorConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_round_counts() {
        let mut round = RoundConfig {
            expected_count: 5,
            required_count: 3,
            ..RoundConfig::default()
        };
        assert!(validate_round(&round).is_ok());

        round.required_count = 0;
        assert!(validate_round(&round).is_err());

        round.required_count = 6;
        assert!(validate_round(&round).is_err());
    }

    #[test]
    fn test_validate_round_timing() {
        let mut round = RoundConfig::default();
        round.poll_interval_ms = 0;
        assert!(validate_round(&round).is_err());

        let mut round = RoundConfig::default();
        round.timeout_secs = 0;
        assert!(validate_round(&round).is_err());
    }
}
