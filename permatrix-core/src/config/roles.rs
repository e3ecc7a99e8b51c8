//! Roles to load

use crate::permission::Role;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Role names, as accepted by `Role::from_str`
    pub enabled: Vec<String>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self { enabled: Role::ALL.iter().map(|r| r.to_string()).collect() }
    }
}

impl RolesConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// `PERMATRIX_ROLES=manager,cashier`
    pub fn apply_env_vars(&mut self) {
        if let Ok(roles) = env::var("PERMATRIX_ROLES") {
            self.enabled = roles
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
    }

    /// Parsed role list
    pub fn roles(&self) -> Result<Vec<Role>> {
        let mut roles = Vec::with_capacity(self.enabled.len());
        for name in &self.enabled {
            let role: Role = name.parse()?;
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    pub fn validate(&self) -> Result<()> {
        if self.enabled.is_empty() {
            bail!("roles.enabled must list at least one role");
        }
        self.roles()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_rejected() {
        let config = RolesConfig { enabled: vec!["manager".into(), "owner".into()] };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicates_collapse() {
        let config = RolesConfig { enabled: vec!["admin".into(), "Administrator".into()] };
        assert_eq!(config.roles().unwrap(), vec![Role::Administrator]);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(RolesConfig { enabled: vec![] }.validate().is_err());
    }
}
