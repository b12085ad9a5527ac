//! # Configuration
//!
//! YAML configuration for the device running clubpass. Every field has a
//! default, so a missing file is a valid configuration.
//!
//! ```yaml
//! rotation_interval_ms: 20000
//! max_credential_age_ms: 25000
//! activity_log_path: /var/lib/clubpass/activity.json
//! activity_log_capacity: 200
//! ```
//!
//! Environment overrides, applied after the file:
//!
//! - `CLUBPASS_ROTATION_INTERVAL_MS`
//! - `CLUBPASS_MAX_CREDENTIAL_AGE_MS`

use std::path::{Path, PathBuf};
use std::time::Duration;

use clubpass_state::FreshnessPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `rotation_interval_ms`.
pub const ENV_ROTATION_INTERVAL_MS: &str = "CLUBPASS_ROTATION_INTERVAL_MS";
/// Environment variable overriding `max_credential_age_ms`.
pub const ENV_MAX_CREDENTIAL_AGE_MS: &str = "CLUBPASS_MAX_CREDENTIAL_AGE_MS";

/// Errors while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not valid YAML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An environment override is not a number.
    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClubpassConfig {
    /// Credential rotation window in milliseconds.
    pub rotation_interval_ms: u64,
    /// Maximum credential age accepted by scanners. `None` disables the check.
    pub max_credential_age_ms: Option<u64>,
    /// Where the activity history is persisted. `None` keeps it in memory.
    pub activity_log_path: Option<PathBuf>,
    /// Maximum number of activity records retained.
    pub activity_log_capacity: usize,
}

impl Default for ClubpassConfig {
    fn default() -> Self {
        Self {
            rotation_interval_ms: 20_000,
            max_credential_age_ms: None,
            activity_log_path: None,
            activity_log_capacity: 200,
        }
    }
}

impl ClubpassConfig {
    /// Load from `path` (or defaults), apply process environment overrides,
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML file without overrides or validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ROTATION_INTERVAL_MS) {
            self.rotation_interval_ms = parse_millis(ENV_ROTATION_INTERVAL_MS, value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CREDENTIAL_AGE_MS) {
            self.max_credential_age_ms = Some(parse_millis(ENV_MAX_CREDENTIAL_AGE_MS, value)?);
        }
        Ok(())
    }

    /// Reject zero-length intervals and ages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "rotation_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_credential_age_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "max_credential_age_ms must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Rotation window as a `Duration`.
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    /// Freshness policy for scanners.
    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy {
            max_age: self.max_credential_age_ms.map(Duration::from_millis),
        }
    }
}

fn parse_millis(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClubpassConfig::default();
        assert_eq!(config.rotation_interval(), Duration::from_secs(20));
        assert_eq!(config.freshness_policy(), FreshnessPolicy::disabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ClubpassConfig = serde_yaml::from_str("max_credential_age_ms: 25000\n").unwrap();
        assert_eq!(config.rotation_interval_ms, 20_000);
        assert_eq!(
            config.freshness_policy(),
            FreshnessPolicy::max_age(Duration::from_millis(25_000))
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_yaml::from_str::<ClubpassConfig>("rotation_secs: 3\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rotation_interval_ms: 5000").unwrap();
        writeln!(file, "activity_log_capacity: 10").unwrap();
        let config = ClubpassConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rotation_interval_ms, 5_000);
        assert_eq!(config.activity_log_capacity, 10);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = ClubpassConfig::from_file(Path::new("/nonexistent/clubpass.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClubpassConfig::default();
        config
            .apply_env(|var| match var {
                ENV_ROTATION_INTERVAL_MS => Some("1000".to_string()),
                ENV_MAX_CREDENTIAL_AGE_MS => Some(" 1500 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.rotation_interval_ms, 1_000);
        assert_eq!(config.max_credential_age_ms, Some(1_500));
    }

    #[test]
    fn test_env_override_must_be_numeric() {
        let mut config = ClubpassConfig::default();
        let err = config
            .apply_env(|var| (var == ENV_ROTATION_INTERVAL_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_ROTATION_INTERVAL_MS, .. }));
    }

    #[test]
    fn test_zero_interval_invalid() {
        let config = ClubpassConfig {
            rotation_interval_ms: 0,
            ..ClubpassConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
