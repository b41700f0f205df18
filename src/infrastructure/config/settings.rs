//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. Every
//! section is optional; a missing file section falls back to its defaults.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [store]
//! backend = "sqlite"
//! path = "factionkeep.db"
//!
//! [registry]
//! debounce_ms = 3000
//! safety_flush_secs = 300
//! ```
//!
//! # Example
//!
//! ```no_run
//! use factionkeep::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::application::registry::RegistryConfig;
use crate::error::{ConfigError, Result};

/// Environment variable overriding the store path.
pub const STORE_PATH_ENV: &str = "FACTIONKEEP_STORE_PATH";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Storage backend for faction records.
    #[serde(default)]
    pub store: StoreConfig,

    /// Registry tuning and faction defaults.
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Config {
    /// Parse configuration from TOML text, apply environment overrides and
    /// validate it.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] or [`ConfigError::MissingField`] for
    /// values that fail validation.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::ReadFile`] if the file cannot be read, plus
    /// everything [`Config::parse_toml`] returns.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise use defaults.
    ///
    /// # Errors
    /// See [`Config::load`].
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn apply_env(&mut self) {
        let Ok(path) = std::env::var(STORE_PATH_ENV) else {
            return;
        };
        match &mut self.store {
            StoreConfig::Memory => {}
            StoreConfig::Sqlite { path: current } => *current = path,
            StoreConfig::Directory { path: current } => *current = path.into(),
        }
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.store.validate()?;
        self.registry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.registry.debounce_ms, 3_000);
        assert_eq!(config.store.backend(), "sqlite");
    }

    #[test]
    fn parses_every_section() {
        let toml = r#"
            [logging]
            level = "debug"
            format = "json"

            [store]
            backend = "directory"
            path = "data/factions"

            [registry]
            debounce_ms = 500
            safety_flush_secs = 60
            default_warehouse_size = 54
            leader_rank_id = 6
            entry_rank_name = "Rookie"
            leader_permissions = ["faction.kick"]
        "#;

        let config = Config::parse_toml(toml).unwrap();
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.store,
            StoreConfig::Directory {
                path: "data/factions".into()
            }
        );
        assert_eq!(config.registry.debounce_ms, 500);
        assert_eq!(config.registry.default_warehouse_size, 54);
        assert_eq!(config.registry.leader_rank_id, 6);
        assert_eq!(config.registry.entry_rank_name, "Rookie");
        assert_eq!(config.registry.leader_rank_name, "Leader");
        assert_eq!(config.registry.leader_permissions, vec!["faction.kick"]);
    }

    #[test]
    fn example_config_parses() {
        let config = Config::parse_toml(include_str!("../../../config.example.toml")).unwrap();
        assert_eq!(config.registry.leader_permissions.len(), 10);
        assert_eq!(config.store.backend(), "sqlite");
    }

    #[test]
    fn memory_backend_needs_no_path() {
        let config = Config::parse_toml("[store]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let err = Config::parse_toml("[store]\nbackend = \"redis\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_logging_format_is_rejected() {
        let err = Config::parse_toml("[logging]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "logging.format",
                ..
            })
        ));
    }

    #[test]
    fn invalid_registry_values_are_rejected() {
        let err = Config::parse_toml("[registry]\nsafety_flush_secs = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load("/nonexistent/factionkeep.toml").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
    }
}
