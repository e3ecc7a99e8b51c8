//! Configuration system for permatrix
//!
//! Configuration values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment Variables** (`PERMATRIX_*`)
//! 2. **Config File** (`permatrix.toml`)
//! 3. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use permatrix_core::config::PermatrixConfig;
//!
//! let config = PermatrixConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod catalog;
pub mod logging;
pub mod roles;
pub mod source;

pub use catalog::CatalogConfig;
pub use logging::LoggingConfig;
pub use roles::RolesConfig;
pub use source::SourceConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "permatrix.toml";

/// Complete permatrix configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermatrixConfig {
    pub source: SourceConfig,
    pub catalog: CatalogConfig,
    pub roles: RolesConfig,
    pub logging: LoggingConfig,
}

impl PermatrixConfig {
    /// Resolve `permatrix.toml` in the working directory, then `PERMATRIX_*`
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Defaults, overlaid by `path` when it exists, overlaid by the environment.
    ///
    /// A missing file is not an error: the CLI runs on defaults plus environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();

        match path.try_exists() {
            Ok(true) => config.merge(Self::from_file(path)?),
            Ok(false) => log::debug!("No config file at {}; using defaults", path.display()),
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot access {}", path.display()));
            }
        }
        config.apply_env_vars();
        Ok(config)
    }

    /// Read one TOML file without defaults layering or environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read permatrix config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("In {}", path.display()))
    }

    /// Parse a TOML document; sections left out keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid permatrix config")
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.source.merge(other.source);
        self.catalog.merge(other.catalog);
        self.roles.merge(other.roles);
        self.logging.merge(other.logging);
    }

    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.source.apply_env_vars();
        self.catalog.apply_env_vars();
        self.roles.apply_env_vars();
        self.logging.apply_env_vars();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.catalog.validate()?;
        self.roles.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Role;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PermatrixConfig::default();
        assert_eq!(config.source.base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.roles.enabled, Role::ALL.iter().map(|r| r.to_string()).collect::<Vec<_>>());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        let config = PermatrixConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[source]
base_url = "https://backoffice.example.com/api"

[roles]
enabled = ["manager", "cashier"]
"#
        )
        .unwrap();

        let config = PermatrixConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source.base_url, "https://backoffice.example.com/api");
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.roles.roles().unwrap(), vec![Role::Manager, Role::Cashier]);
        assert_eq!(config.logging.format, "human");
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[source\nbase_url = 1").unwrap();

        let err = PermatrixConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid permatrix config"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = PermatrixConfig::load_from("/nonexistent/permatrix.toml").unwrap();
        assert_eq!(config.catalog.path, "catalog.json");
    }
}
