//! Core configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::WeightUnit;
use crate::schedule::DEFAULT_DUE_SOON_DAYS;

/// Default number of other active medications that triggers a polypharmacy warning.
pub const DEFAULT_POLYPHARMACY_THRESHOLD: usize = 3;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunable thresholds of the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Days ahead of a due date at which it counts as due soon
    pub due_soon_days: i64,
    /// Other active medications needed for a polypharmacy warning
    pub polypharmacy_threshold: usize,
    /// Unit new weight forms start in
    pub preferred_weight_unit: WeightUnit,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
            polypharmacy_threshold: DEFAULT_POLYPHARMACY_THRESHOLD,
            preferred_weight_unit: WeightUnit::Kilograms,
        }
    }
}

impl CoreConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.due_soon_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "due_soon_days must not be negative, got {}",
                self.due_soon_days
            )));
        }
        if self.polypharmacy_threshold == 0 {
            return Err(ConfigError::Invalid(
                "polypharmacy_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = CoreConfig::from_json("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.due_soon_days, 30);
        assert_eq!(config.polypharmacy_threshold, 3);
    }

    #[test]
    fn test_partial_override() {
        let config = CoreConfig::from_json(r#"{"due_soon_days": 14}"#).unwrap();
        assert_eq!(config.due_soon_days, 14);
        assert_eq!(config.polypharmacy_threshold, 3);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CoreConfig::from_json(r#"{"due_soon_days": -1}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json(r#"{"polypharmacy_threshold": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"preferred_weight_unit": "pounds"}}"#).unwrap();

        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.preferred_weight_unit, WeightUnit::Pounds);
    }
}
