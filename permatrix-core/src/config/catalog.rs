//! Menu catalog location

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file, `.json` or `.toml`
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { path: "catalog.json".to_string() }
    }
}

impl CatalogConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(path) = env::var("PERMATRIX_CATALOG") {
            self.path = path;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            bail!("catalog.path must not be empty");
        }
        Ok(())
    }
}
