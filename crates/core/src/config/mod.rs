//! Configuration loading and management.
//!
//! This module provides the runtime tuning knobs for the platform and the
//! loader that reads them from a TOML file.

pub mod error;

use std::path::Path;

use serde::Deserialize;

pub use error::{ConfigError, ConfigResult};

/// Runtime tuning for the platform and its hosted agents.
///
/// All fields have defaults, so a configuration file may set any subset:
///
/// ```toml
/// inbox_capacity = 100
/// event_capacity = 512
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bounded inbox size of each hosted agent. Senders wait when an inbox
    /// is full.
    pub inbox_capacity: usize,

    /// Bounded capacity of the runtime event channel. Events beyond it are
    /// dropped rather than slowing dispatch.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 50,
            event_capacity: 256,
        }
    }
}

impl RuntimeConfig {
    /// Loads the runtime configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults are returned, matching how
    /// an unconfigured deployment behaves.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read, is not
    /// valid TOML, or sets a capacity to zero.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> ConfigResult<()> {
        if self.inbox_capacity == 0 {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: "inbox_capacity must be at least 1".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: "event_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn defaults_are_sensible() {
        let config = RuntimeConfig::default();
        assert_eq!(config.inbox_capacity, 50);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn loads_a_full_config() {
        let file = config_file("inbox_capacity = 100\nevent_capacity = 512\n");

        let config = RuntimeConfig::from_file(file.path()).expect("loads");

        assert_eq!(config.inbox_capacity, 100);
        assert_eq!(config.event_capacity, 512);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let file = config_file("inbox_capacity = 10\n");

        let config = RuntimeConfig::from_file(file.path()).expect("loads");

        assert_eq!(config.inbox_capacity, 10);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config =
            RuntimeConfig::from_file(Path::new("/nonexistent/colloquy.toml")).expect("defaults");
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn invalid_toml_is_reported_with_the_path() {
        let file = config_file("inbox_capacity = \"lots\"\n");

        let err = RuntimeConfig::from_file(file.path()).expect_err("bad type");

        assert!(matches!(err, ConfigError::TomlParse { .. }));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let file = config_file("inbox_capacity = 0\n");

        let err = RuntimeConfig::from_file(file.path()).expect_err("zero capacity");

        assert!(
            matches!(err, ConfigError::InvalidConfig { reason, .. } if reason.contains("inbox_capacity"))
        );
    }
}
