//! TOML configuration file parsing

use super::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<AggregatorConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<AggregatorConfig> {
    let config: AggregatorConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Parse and validate a configuration file in one step
pub fn load_config(path: &Path) -> Result<AggregatorConfig> {
    let config = parse_toml_file(path)?;
    super::validator::validate_config(&config)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_toml_basic() {
        let toml_str = r#"
name = "combiner-1"

[round]
expected_count = 10
required_count = 6
timeout_secs = 60
poll_interval_ms = 500
"#;

        let config = parse_toml_string(toml_str).unwrap();
        assert_eq!(config.name, "combiner-1");
        assert_eq!(config.round.expected_count, 10);
        assert_eq!(config.round.required_count, 6);
        assert_eq!(config.round.timeout_secs, 60);
        assert_eq!(config.round.poll_interval_ms, 500);
    }

    #[test]
    fn test_parse_toml_defaults() {
        let config = parse_toml_string("[round]\nexpected_count = 4\n").unwrap();
        assert_eq!(config.name, "aggregator");
        assert_eq!(config.round.expected_count, 4);
        assert_eq!(config.round.required_count, 1);
        assert_eq!(config.round.timeout_secs, 180);
    }

    #[test]
    fn test_parse_toml_empty() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config, AggregatorConfig::default());
    }

    #[test]
    fn test_parse_toml_invalid() {
        assert!(parse_toml_string("[round]\nexpected_count = \"many\"\n").is_err());
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"from-file\"\n[round]\nexpected_count = 3\nrequired_count = 2").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.name, "from-file");
        assert_eq!(config.round.required_count, 2);
    }

    #[test]
    fn test_load_config_rejects_invalid_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[round]\nexpected_count = 1\nrequired_count = 2").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("required_count"));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_toml_file(Path::new("/nonexistent/roundfold.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
