//! Editing session facade
//!
//! An [`EditingSession`] owns one menu tree, one live [`PermissionMatrix`] and the
//! expand/collapse state of the matrix view. Hosts drive it from UI events.
//!
//! Loads are guarded by a generation counter. A host that spawns a load takes a
//! [`LoadTicket`] first; if the session has moved on by the time the data arrives
//! (another load started, or the host invalidated the session) the result is dropped
//! instead of overwriting newer state.

use crate::catalog::MenuCatalog;
use crate::keys::CanonicalPermissions;
use crate::loader::{LoadedPermissions, PermissionLoader};
use crate::matrix::{BranchState, PermissionMatrix, SaveProjection};
use crate::merge::TemplateMergeEngine;
use crate::permission::{Capability, PermissionRecord, Role};
use crate::source::{BulkSaveResult, PermissionSource, SourceError};
use crate::tree::{MenuNode, MenuTree};
use crate::visibility::VisibilityController;
use crate::{MatrixError, Result};
use std::collections::BTreeMap;

/// Proof that a load was started against a particular session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// What happened to a finished load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// The session moved on while the load was in flight
    Discarded,
}

/// Key drift observed while canonicalizing the last load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Degraded sources
    pub warnings: Vec<MatrixError>,
    /// External keys without a tree placement, per role
    pub unmatched: BTreeMap<Role, Vec<String>>,
}

impl LoadReport {
    pub fn unmatched_count(&self) -> usize {
        self.unmatched.values().map(Vec::len).sum()
    }

    /// Unmatched keys as [`MatrixError::KeyAmbiguity`] values
    pub fn key_ambiguities(&self) -> Vec<MatrixError> {
        self.unmatched
            .values()
            .flatten()
            .map(|key| MatrixError::KeyAmbiguity { key: key.clone() })
            .collect()
    }
}

pub struct EditingSession {
    tree: MenuTree,
    visibility: VisibilityController,
    matrix: PermissionMatrix,
    templates: BTreeMap<Role, CanonicalPermissions>,
    report: LoadReport,
    generation: u64,
    halted: Option<MatrixError>,
}

impl EditingSession {
    pub fn new(tree: MenuTree) -> Self {
        let visibility = VisibilityController::new(&tree);
        Self {
            tree,
            visibility,
            matrix: PermissionMatrix::new(),
            templates: BTreeMap::new(),
            report: LoadReport::default(),
            generation: 0,
            halted: None,
        }
    }

    pub fn from_catalog(catalog: &MenuCatalog) -> Self {
        Self::new(MenuTree::from_catalog(catalog))
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    pub fn visibility(&self) -> &VisibilityController {
        &self.visibility
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Set once an access-denied load has halted the session
    pub fn halted(&self) -> Option<&MatrixError> {
        self.halted.as_ref()
    }

    /// Start a load. Fails once the session has been halted by an access denial.
    pub fn begin_load(&mut self) -> Result<LoadTicket> {
        if let Some(err) = &self.halted {
            return Err(err.clone());
        }
        self.generation += 1;
        Ok(LoadTicket { generation: self.generation })
    }

    /// Abandon any in-flight load
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply the result of a load started with `ticket`.
    ///
    /// Stale results are discarded whatever they contain. Access-denied and
    /// session-expired errors are returned to the caller; access denied also halts
    /// the session.
    pub fn commit(
        &mut self,
        ticket: LoadTicket,
        loaded: Result<LoadedPermissions>,
    ) -> Result<CommitOutcome> {
        if !self.is_current(ticket) {
            log::info!("Discarding stale permission load (generation {})", ticket.generation);
            return Ok(CommitOutcome::Discarded);
        }

        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                if err.is_fatal() {
                    log::warn!("Permission load aborted: {}", err);
                }
                self.halt_on(&err);
                return Err(err);
            }
        };

        let engine = TemplateMergeEngine::new(&self.tree);
        let mut matrix = PermissionMatrix::new();
        let mut templates = BTreeMap::new();
        let mut report = LoadReport { warnings: loaded.warnings, ..Default::default() };

        for (role, data) in loaded.roles {
            let template = engine.canonicalize(&data.template);
            let overrides = engine.canonicalize(&data.overrides);

            let mut unmatched: Vec<String> =
                template.unmatched.iter().chain(&overrides.unmatched).cloned().collect();
            unmatched.sort();
            unmatched.dedup();
            if !unmatched.is_empty() {
                report.unmatched.insert(role, unmatched);
            }

            matrix.replace_row(role, engine.merge_row(&template, &overrides));
            templates.insert(role, template);
        }

        log::info!(
            "Committed permission matrix: {} roles, {} unmatched keys, {} degraded sources",
            templates.len(),
            report.unmatched_count(),
            report.warnings.len()
        );
        self.matrix = matrix;
        self.templates = templates;
        self.report = report;
        Ok(CommitOutcome::Applied)
    }

    /// Load and commit in one step
    pub async fn load<S: PermissionSource + ?Sized>(
        &mut self,
        source: &S,
        roles: &[Role],
    ) -> Result<CommitOutcome> {
        let ticket = self.begin_load()?;
        let loaded = PermissionLoader::new(source).load(roles).await;
        self.commit(ticket, loaded)
    }

    /// Nodes the view should currently render, in tree order
    pub fn visible_nodes(&self) -> Vec<&MenuNode> {
        self.visibility.visible_nodes(&self.tree)
    }

    pub fn effective_record(&self, role: Role, node_id: &str) -> Result<PermissionRecord> {
        Ok(self.matrix.effective(role, self.node(node_id)?))
    }

    pub fn get_effective_permission(
        &self,
        role: Role,
        node_id: &str,
        capability: Capability,
    ) -> Result<bool> {
        Ok(self.matrix.get_effective_permission(role, self.node(node_id)?, capability))
    }

    pub fn set_permission(
        &mut self,
        role: Role,
        node_id: &str,
        capability: Capability,
        value: bool,
    ) -> Result<()> {
        let node = self
            .tree
            .get(node_id)
            .ok_or_else(|| MatrixError::UnknownNode(node_id.to_string()))?;
        self.matrix.set_permission(role, node, capability, value);
        Ok(())
    }

    /// Set a capability on a category or subcategory and everything below it
    pub fn set_branch(
        &mut self,
        role: Role,
        node_id: &str,
        capability: Capability,
        value: bool,
    ) -> Result<usize> {
        self.matrix.set_branch(&self.tree, role, node_id, capability, value)
    }

    pub fn branch_state(
        &self,
        role: Role,
        node_id: &str,
        capability: Capability,
    ) -> Result<BranchState> {
        self.matrix.branch_state(&self.tree, role, node_id, capability)
    }

    pub fn toggle_category(&mut self, node_id: &str) -> Result<bool> {
        self.visibility.toggle_category(&self.tree, node_id)
    }

    pub fn toggle_subcategory(&mut self, node_id: &str) -> Result<bool> {
        self.visibility.toggle_subcategory(&self.tree, node_id)
    }

    pub fn expand_all(&mut self) {
        self.visibility.expand_all(&self.tree);
    }

    pub fn collapse_all(&mut self) {
        self.visibility.collapse_all();
    }

    /// Reset a role to the template from the last load, dropping its overrides and
    /// edits. A role without a loaded template resets to deny-all.
    pub fn apply_template(&mut self, role: Role) {
        let empty = CanonicalPermissions::default();
        let template = self.templates.get(&role).unwrap_or(&empty);
        let engine = TemplateMergeEngine::new(&self.tree);
        let matrix = std::mem::take(&mut self.matrix);
        self.matrix = engine.apply_template(matrix, role, template);
    }

    /// Project the matrix to the bulk save payload
    pub fn save_projection(&self) -> SaveProjection {
        self.matrix.project_for_save(&self.tree)
    }

    /// Persist the matrix through the source. A refused save halts the session like
    /// an access-denied load.
    pub async fn save<S: PermissionSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<BulkSaveResult> {
        let projection = self.save_projection();
        if !projection.divergences.is_empty() {
            log::warn!(
                "Saving with {} diverging catalog keys; first placement wins",
                projection.divergences.len()
            );
        }

        let result = match source.save_bulk_role_permissions(&projection.payload).await {
            Ok(result) => result,
            Err(err) => {
                let err = match err {
                    SourceError::AccessDenied => MatrixError::SaveDenied,
                    SourceError::SessionExpired => MatrixError::SessionExpired,
                    other => MatrixError::Transport(other.to_string()),
                };
                log::warn!("Permission save failed: {}", err);
                self.halt_on(&err);
                return Err(err);
            }
        };
        log::info!("Saved permissions: {} created, {} updated", result.created, result.updated);
        Ok(result)
    }

    fn halt_on(&mut self, err: &MatrixError) {
        if err.halts_session() {
            self.halted = Some(err.clone());
        }
    }

    fn node(&self, node_id: &str) -> Result<&MenuNode> {
        self.tree.get(node_id).ok_or_else(|| MatrixError::UnknownNode(node_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogCategory;
    use crate::error::DataSourceKind;
    use crate::permission::PartialPermissionRecord;
    use crate::source::MemoryPermissionSource;
    use crate::template::ExternalPermissions;

    fn catalog() -> MenuCatalog {
        MenuCatalog::new().with_category(
            CatalogCategory::new("inventory", "Inventory")
                .with_child("Stock", "stock_adjust", "Adjust Stock")
                .with_item("stock_count", "Count"),
        )
    }

    fn view(key: &str) -> ExternalPermissions {
        [(key.to_string(), PartialPermissionRecord::default().with(Capability::View, true))].into()
    }

    fn id(session: &EditingSession, key: &str) -> String {
        session.tree().nodes_for_key(key).next().unwrap().id().to_string()
    }

    #[tokio::test]
    async fn test_load_and_edit() {
        let source = MemoryPermissionSource::new().with_template(Role::Manager, view("stock_count"));
        let mut session = EditingSession::from_catalog(&catalog());

        let outcome = session.load(&source, &[Role::Manager]).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Applied);

        let count = id(&session, "stock_count");
        assert!(session.get_effective_permission(Role::Manager, &count, Capability::View).unwrap());

        session.set_permission(Role::Manager, &count, Capability::View, false).unwrap();
        assert!(!session.get_effective_permission(Role::Manager, &count, Capability::View).unwrap());

        session.apply_template(Role::Manager);
        assert!(session.get_effective_permission(Role::Manager, &count, Capability::View).unwrap());
    }

    #[tokio::test]
    async fn test_stale_commit_is_discarded() {
        let source = MemoryPermissionSource::new().with_template(Role::Manager, view("stock_count"));
        let mut session = EditingSession::from_catalog(&catalog());

        let ticket = session.begin_load().unwrap();
        let loaded = PermissionLoader::new(&source).load(&[Role::Manager]).await;
        session.invalidate();

        assert_eq!(session.commit(ticket, loaded).unwrap(), CommitOutcome::Discarded);
        assert!(session.matrix().row(Role::Manager).is_none());
    }

    #[tokio::test]
    async fn test_access_denied_halts_session() {
        let source = MemoryPermissionSource::new().with_failure(
            Role::Manager,
            DataSourceKind::Template,
            SourceError::AccessDenied,
        );
        let mut session = EditingSession::from_catalog(&catalog());

        let err = session.load(&source, &[Role::Manager]).await.unwrap_err();
        assert_eq!(err, MatrixError::AccessDenied { role: Role::Manager });
        assert!(session.halted().is_some());
        assert_eq!(session.begin_load(), Err(MatrixError::AccessDenied { role: Role::Manager }));
    }

    #[tokio::test]
    async fn test_session_expired_does_not_halt() {
        let source = MemoryPermissionSource::new().with_failure(
            Role::Manager,
            DataSourceKind::Override,
            SourceError::SessionExpired,
        );
        let mut session = EditingSession::from_catalog(&catalog());

        let err = session.load(&source, &[Role::Manager]).await.unwrap_err();
        assert_eq!(err, MatrixError::SessionExpired);
        assert!(session.halted().is_none());
        assert!(session.begin_load().is_ok());
    }

    #[tokio::test]
    async fn test_unmatched_keys_are_reported() {
        let source = MemoryPermissionSource::new()
            .with_template(Role::Cashier, view("retired_menu"))
            .with_overrides(Role::Cashier, view("item-retired_menu"));
        let mut session = EditingSession::from_catalog(&catalog());
        session.load(&source, &[Role::Cashier]).await.unwrap();

        assert_eq!(
            session.report().unmatched[&Role::Cashier],
            vec!["item-retired_menu".to_string(), "retired_menu".to_string()]
        );
        assert_eq!(session.report().key_ambiguities().len(), 2);
    }

    #[tokio::test]
    async fn test_refused_save_halts_session() {
        let source = MemoryPermissionSource::new()
            .with_template(Role::Manager, view("stock_count"))
            .with_save_failure(SourceError::AccessDenied);
        let mut session = EditingSession::from_catalog(&catalog());
        session.load(&source, &[Role::Manager]).await.unwrap();

        assert_eq!(session.save(&source).await, Err(MatrixError::SaveDenied));
        assert_eq!(session.halted(), Some(&MatrixError::SaveDenied));
        assert_eq!(session.begin_load(), Err(MatrixError::SaveDenied));
        assert!(source.saved_payloads().is_empty());
    }

    #[tokio::test]
    async fn test_empty_save_denial_names_no_role() {
        let source = MemoryPermissionSource::new().with_save_failure(SourceError::AccessDenied);
        let mut session = EditingSession::from_catalog(&catalog());

        let err = session.save(&source).await.unwrap_err();
        assert_eq!(err.to_string(), "Access denied when saving permission data");
    }

    #[tokio::test]
    async fn test_save_round_trip() {
        let source = MemoryPermissionSource::new().with_template(Role::Manager, view("stock_count"));
        let mut session = EditingSession::from_catalog(&catalog());
        session.load(&source, &[Role::Manager]).await.unwrap();

        let adjust = id(&session, "stock_adjust");
        session.set_permission(Role::Manager, &adjust, Capability::Edit, true).unwrap();
        let result = session.save(&source).await.unwrap();
        assert_eq!(result.created, session.tree().catalog_keys().len());

        let mut reloaded = EditingSession::from_catalog(&catalog());
        reloaded.load(&source, &[Role::Manager]).await.unwrap();
        assert!(reloaded.get_effective_permission(Role::Manager, &adjust, Capability::Edit).unwrap());
        let count = id(&reloaded, "stock_count");
        assert!(reloaded.get_effective_permission(Role::Manager, &count, Capability::View).unwrap());
    }

    #[test]
    fn test_unknown_node() {
        let mut session = EditingSession::from_catalog(&catalog());
        assert!(matches!(
            session.set_permission(Role::User, "nope", Capability::View, true),
            Err(MatrixError::UnknownNode(_))
        ));
        assert!(session.toggle_category("nope").is_err());
    }
}
