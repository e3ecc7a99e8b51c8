//! Logging configuration

use crate::logging::{LogFormat, LogLevel, LogOutput};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string(), output: "stderr".to_string() }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("PERMATRIX_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("PERMATRIX_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.to_logging_config().map(|_| ())
    }

    /// Build the runtime logger configuration
    pub fn to_logging_config(&self) -> Result<crate::logging::LoggingConfig> {
        let level: LogLevel = self.level.parse().map_err(|e: String| anyhow!(e))?;
        let format: LogFormat = self.format.parse().map_err(|e: String| anyhow!(e))?;
        let output = match self.output.to_ascii_lowercase().as_str() {
            "stdout" => LogOutput::Stdout,
            "stderr" => LogOutput::Stderr,
            other => return Err(anyhow!("unknown log output: {}", other)),
        };
        Ok(crate::logging::LoggingConfig { level, format, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        let config = LoggingConfig {
            level: "DEBUG".into(),
            format: "json".into(),
            output: "stdout".into(),
        };
        let runtime = config.to_logging_config().unwrap();
        assert_eq!(runtime.level, LogLevel::Debug);
        assert_eq!(runtime.format, LogFormat::Json);
        assert_eq!(runtime.output, LogOutput::Stdout);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = LoggingConfig::default();
        config.level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = LoggingConfig::default();
        config.output = "syslog".into();
        assert!(config.validate().is_err());
    }
}
