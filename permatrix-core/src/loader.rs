//! Concurrent permission loading
//!
//! For every role the template and the overrides are requested concurrently, and all
//! roles are requested concurrently with each other. A role's data is only handed on
//! once both of its requests have settled.
//!
//! Failure policy:
//! - access denied / session expired abort the whole load
//! - anything else degrades that source to an empty map and is logged
//! - a missing role template or override set simply means "no data"

use crate::error::DataSourceKind;
use crate::permission::Role;
use crate::source::{PermissionSource, SourceError};
use crate::template::{ExternalPermissions, TemplateData};
use crate::{MatrixError, Result};
use std::collections::BTreeMap;

/// Raw data for one role, normalized to key -> record maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleData {
    pub template: ExternalPermissions,
    pub overrides: ExternalPermissions,
}

/// Everything one load cycle produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedPermissions {
    pub roles: BTreeMap<Role, RoleData>,
    /// Degraded sources, as [`MatrixError::DataUnavailable`]
    pub warnings: Vec<MatrixError>,
}

impl LoadedPermissions {
    pub fn templates(&self) -> BTreeMap<Role, ExternalPermissions> {
        self.roles.iter().map(|(role, data)| (*role, data.template.clone())).collect()
    }

    pub fn overrides(&self) -> BTreeMap<Role, ExternalPermissions> {
        self.roles.iter().map(|(role, data)| (*role, data.overrides.clone())).collect()
    }
}

/// Loads template and override data through a [`PermissionSource`]
pub struct PermissionLoader<'s, S: PermissionSource + ?Sized> {
    source: &'s S,
}

impl<'s, S: PermissionSource + ?Sized> PermissionLoader<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self { source }
    }

    /// Load every requested role
    pub async fn load(&self, roles: &[Role]) -> Result<LoadedPermissions> {
        let results = futures::future::join_all(roles.iter().map(|&role| self.load_role(role))).await;

        let mut loaded = LoadedPermissions::default();
        for (role, result) in roles.iter().zip(results) {
            let (data, warnings) = result?;
            loaded.roles.insert(*role, data);
            loaded.warnings.extend(warnings);
        }

        log::info!(
            "Loaded permissions for {} roles from {} ({} degraded sources)",
            loaded.roles.len(),
            self.source.name(),
            loaded.warnings.len()
        );
        Ok(loaded)
    }

    /// Load one role; both requests run concurrently
    pub async fn load_role(&self, role: Role) -> Result<(RoleData, Vec<MatrixError>)> {
        let (template, overrides) = tokio::join!(
            self.source.get_role_template(role),
            self.source.get_role_permissions(role)
        );

        let mut warnings = Vec::new();
        let template = settle(role, DataSourceKind::Template, template, &mut warnings)?;
        let overrides = settle(role, DataSourceKind::Override, overrides, &mut warnings)?;
        Ok((RoleData { template, overrides }, warnings))
    }
}

/// Apply the failure policy to one fetch result
fn settle(
    role: Role,
    kind: DataSourceKind,
    result: std::result::Result<TemplateData, SourceError>,
    warnings: &mut Vec<MatrixError>,
) -> Result<ExternalPermissions> {
    match result {
        Ok(data) => Ok(data.into_external()),
        Err(SourceError::NotFound) => {
            log::debug!("No {} data for role {}", kind, role);
            Ok(ExternalPermissions::new())
        }
        Err(SourceError::AccessDenied) => Err(MatrixError::AccessDenied { role }),
        Err(SourceError::SessionExpired) => Err(MatrixError::SessionExpired),
        Err(SourceError::Unavailable(reason)) | Err(SourceError::Malformed(reason)) => {
            log::warn!("Treating {} data for role {} as empty: {}", kind, role, reason);
            warnings.push(MatrixError::DataUnavailable { role, source_kind: kind, reason });
            Ok(ExternalPermissions::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::{Capability, PartialPermissionRecord};
    use crate::source::MemoryPermissionSource;

    fn data(key: &str) -> ExternalPermissions {
        [(key.to_string(), PartialPermissionRecord::default().with(Capability::View, true))].into()
    }

    #[tokio::test]
    async fn test_loads_both_sources() {
        let source = MemoryPermissionSource::new()
            .with_template(Role::Manager, data("pos"))
            .with_overrides(Role::Manager, data("terminals"));

        let loaded = PermissionLoader::new(&source).load(&[Role::Manager, Role::User]).await.unwrap();
        assert_eq!(loaded.roles[&Role::Manager].template, data("pos"));
        assert_eq!(loaded.roles[&Role::Manager].overrides, data("terminals"));
        assert_eq!(loaded.roles[&Role::User], RoleData::default());
        assert!(loaded.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_degrades_to_empty() {
        let source = MemoryPermissionSource::new()
            .with_template(Role::Manager, data("pos"))
            .with_failure(
                Role::Manager,
                DataSourceKind::Override,
                SourceError::Malformed("expected object".into()),
            );

        let loaded = PermissionLoader::new(&source).load(&[Role::Manager]).await.unwrap();
        assert_eq!(loaded.roles[&Role::Manager].template, data("pos"));
        assert!(loaded.roles[&Role::Manager].overrides.is_empty());
        assert_eq!(
            loaded.warnings,
            vec![MatrixError::DataUnavailable {
                role: Role::Manager,
                source_kind: DataSourceKind::Override,
                reason: "expected object".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_access_denied_aborts() {
        let source = MemoryPermissionSource::new()
            .with_template(Role::Manager, data("pos"))
            .with_failure(Role::Cashier, DataSourceKind::Template, SourceError::AccessDenied);

        let result = PermissionLoader::new(&source).load(&[Role::Manager, Role::Cashier]).await;
        assert_eq!(result, Err(MatrixError::AccessDenied { role: Role::Cashier }));
    }

    #[tokio::test]
    async fn test_session_expired_aborts() {
        let source = MemoryPermissionSource::new().with_failure(
            Role::User,
            DataSourceKind::Override,
            SourceError::SessionExpired,
        );

        let result = PermissionLoader::new(&source).load(&[Role::User]).await;
        assert_eq!(result, Err(MatrixError::SessionExpired));
    }
}
