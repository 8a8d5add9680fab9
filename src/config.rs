//! Engine configuration
//!
//! Defaults cover the embedded case; a YAML file can override any field:
//!
//! ```yaml
//! max_hops: 4
//! pretty_json: false
//! log_level: debug
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables of the command engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of steps a TRAVERSE may take
    pub max_hops: usize,
    /// Pretty-print exported JSON documents
    pub pretty_json: bool,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_hops: 8,
            pretty_json: true,
            log_level: "warn".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate YAML text
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_hops == 0 {
            return Err(ConfigError::Validation {
                field: "max_hops",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "log_level",
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_hops, 8);
        assert!(config.pretty_json);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml_str("max_hops: 3\n").unwrap();
        assert_eq!(config.max_hops, 3);
        assert!(config.pretty_json);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_yaml_str("max_hops: 0\n"),
            Err(ConfigError::Validation { field: "max_hops", .. })
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("max_hops: [1, 2]\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pretty_json: false\nlog_level: debug").unwrap();

        let config = EngineConfig::from_yaml_file(file.path()).unwrap();
        assert!(!config.pretty_json);
        assert_eq!(config.log_level, "debug");
    }
}
