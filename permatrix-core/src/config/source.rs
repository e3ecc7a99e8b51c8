//! Permission service configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the permission API
    pub base_url: String,
    /// Environment variable holding the bearer token
    pub token_env: Option<String>,
    /// Request timeout handed to the HTTP client
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            token_env: Some("PERMATRIX_TOKEN".to_string()),
            timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(url) = env::var("PERMATRIX_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(timeout) = env::var("PERMATRIX_TIMEOUT_SECS") {
            self.apply_timeout(&timeout);
        }
    }

    /// Unparseable values keep the current timeout and are reported.
    fn apply_timeout(&mut self, raw: &str) {
        match raw.trim().parse() {
            Ok(secs) => self.timeout_secs = secs,
            Err(_) => log::warn!(
                "Ignoring PERMATRIX_TIMEOUT_SECS={:?}; keeping {}s",
                raw,
                self.timeout_secs
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("source.base_url must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("source.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_timeout_keeps_current() {
        let mut config = SourceConfig::default();
        config.apply_timeout("soon");
        assert_eq!(config.timeout_secs, 30);

        config.apply_timeout(" 5 ");
        assert_eq!(config.timeout_secs, 5);
    }
}
