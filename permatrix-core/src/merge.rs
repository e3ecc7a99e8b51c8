//! Template / override merge engine
//!
//! Precedence per node: start from the template record (deny-all if there is none),
//! then overwrite field by field with whatever the override actually carries.
//! Partial overrides leave the remaining template fields intact.

use crate::keys::{CanonicalPermissions, PermissionKeyResolver};
use crate::matrix::{PermissionMatrix, RoleRow};
use crate::permission::{PartialPermissionRecord, PermissionRecord, Role};
use crate::template::ExternalPermissions;
use crate::tree::MenuTree;
use std::collections::{BTreeMap, BTreeSet};

/// Merges template and override data for one menu tree
#[derive(Debug, Clone, Copy)]
pub struct TemplateMergeEngine<'t> {
    tree: &'t MenuTree,
}

impl<'t> TemplateMergeEngine<'t> {
    pub fn new(tree: &'t MenuTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'t MenuTree {
        self.tree
    }

    /// Map externally keyed data into node space
    pub fn canonicalize(&self, external: &ExternalPermissions) -> CanonicalPermissions {
        PermissionKeyResolver::map_external_permissions(external, self.tree)
    }

    /// Merge one role's canonical template and override sets
    pub fn merge_row(
        &self,
        template: &CanonicalPermissions,
        overrides: &CanonicalPermissions,
    ) -> RoleRow {
        RoleRow::from_parts(
            merge_maps(&template.nodes, &overrides.nodes),
            merge_maps(&template.fallback, &overrides.fallback),
        )
    }

    /// Merge externally keyed templates and overrides for every role present in
    /// either map
    pub fn merge(
        &self,
        templates: &BTreeMap<Role, ExternalPermissions>,
        overrides: &BTreeMap<Role, ExternalPermissions>,
    ) -> PermissionMatrix {
        let empty = CanonicalPermissions::default();
        let roles: BTreeSet<Role> = templates.keys().chain(overrides.keys()).copied().collect();

        let mut matrix = PermissionMatrix::new();
        for role in roles {
            let template = templates.get(&role).map(|t| self.canonicalize(t));
            let over = overrides.get(&role).map(|o| self.canonicalize(o));
            let row = self.merge_row(
                template.as_ref().unwrap_or(&empty),
                over.as_ref().unwrap_or(&empty),
            );
            log::debug!("Merged role {}: {} node records", role, row.node_records().len());
            matrix.replace_row(role, row);
        }
        matrix
    }

    /// Reset a role to its template, discarding every override and edit for that
    /// role. Other roles are untouched.
    pub fn apply_template(
        &self,
        mut matrix: PermissionMatrix,
        role: Role,
        template: &CanonicalPermissions,
    ) -> PermissionMatrix {
        let row = self.merge_row(template, &CanonicalPermissions::default());
        log::info!("Applied template to role {}: {} node records", role, row.node_records().len());
        matrix.replace_row(role, row);
        matrix
    }
}

fn merge_maps(
    template: &BTreeMap<String, PartialPermissionRecord>,
    overrides: &BTreeMap<String, PartialPermissionRecord>,
) -> BTreeMap<String, PermissionRecord> {
    let keys: BTreeSet<&String> = template.keys().chain(overrides.keys()).collect();
    keys.into_iter()
        .map(|key| {
            let mut record = template.get(key).map(|t| t.resolve()).unwrap_or_default();
            if let Some(over) = overrides.get(key) {
                record.overlay(over);
            }
            (key.clone(), record)
        })
        .collect()
}
