//! Provider configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! adopt_existing = false
//! log_filter = "info,rtask_engine=debug"
//! log_json = false
//! ```

use rtask_engine::{EngineConfig, ReconcileMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Behavior and logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Reconcile into existing tasks instead of creating them
    pub adopt_existing: bool,
    /// Log filter directives; `RUST_LOG` takes precedence
    pub log_filter: String,
    /// Emit logs as JSON
    pub log_json: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            adopt_existing: false,
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl ProviderConfig {
    /// Parse and validate configuration text
    ///
    /// # Errors
    /// Returns error on malformed TOML or invalid values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or its content is invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check values
    ///
    /// # Errors
    /// Returns `Invalid` when `log_filter` is empty or does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.env_filter().map(|_| ())
    }

    /// Log filter: `RUST_LOG` when set, `log_filter` otherwise
    ///
    /// # Errors
    /// Returns `Invalid` when `log_filter` is empty or does not parse
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log_filter must not be empty".to_string()));
        }
        EnvFilter::try_new(&self.log_filter)
            .map_err(|e| ConfigError::Invalid(format!("log_filter '{}': {e}", self.log_filter)))
    }

    /// Engine configuration derived from these settings
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let mode = if self.adopt_existing {
            ReconcileMode::Adopt
        } else {
            ReconcileMode::Create
        };
        EngineConfig::new().with_mode(mode)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_text_gives_defaults() {
        let config = ProviderConfig::from_toml_str("").unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.engine_config(), EngineConfig::new());
    }

    #[test]
    fn parses_all_fields() {
        let config = ProviderConfig::from_toml_str(
            r#"
            adopt_existing = true
            log_filter = "warn,rtask_engine=debug"
            log_json = true
            "#,
        )
        .unwrap();

        assert!(config.engine_config().is_adopt());
        assert_eq!(config.log_filter, "warn,rtask_engine=debug");
        assert!(config.log_json);
    }

    #[test]
    fn rejects_empty_log_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let result = ProviderConfig::from_toml_str(r#"log_filter = " ""#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = ProviderConfig::from_toml_str("adopt_exisiting = true");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_wrong_types() {
        let result = ProviderConfig::from_toml_str(r#"log_json = "yes""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "adopt_existing = true").unwrap();

        let config = ProviderConfig::load(file.path()).unwrap();
        assert!(config.adopt_existing);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProviderConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
