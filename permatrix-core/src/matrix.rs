//! Live permission matrix
//!
//! `role -> node -> record`. Built fresh by the merge engine on every load, then
//! mutated in place by edits until a template is re-applied.

use crate::keys::{split_key, CanonicalPermissions, KeyForm, PermissionKeyResolver};
use crate::permission::{Capability, PartialPermissionRecord, PermissionRecord, Role};
use crate::tree::{MenuNode, MenuTree, NodeId};
use crate::{MatrixError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One role's permissions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRow {
    nodes: BTreeMap<NodeId, PermissionRecord>,
    fallback: BTreeMap<String, PermissionRecord>,
}

impl RoleRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        nodes: BTreeMap<NodeId, PermissionRecord>,
        fallback: BTreeMap<String, PermissionRecord>,
    ) -> Self {
        Self { nodes, fallback }
    }

    /// Records stored against node ids
    pub fn node_records(&self) -> &BTreeMap<NodeId, PermissionRecord> {
        &self.nodes
    }

    /// Records retained for keys without a tree placement
    pub fn fallback_records(&self) -> &BTreeMap<String, PermissionRecord> {
        &self.fallback
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.fallback.is_empty()
    }

    /// Stored record for a node under resolver precedence
    pub fn lookup(&self, node: &MenuNode) -> Option<&PermissionRecord> {
        self.nodes
            .get(node.id())
            .or_else(|| PermissionKeyResolver::first_match(&self.fallback, node).map(|(_, r)| r))
    }

    /// Effective record; deny-all when nothing is reachable
    pub fn effective(&self, node: &MenuNode) -> PermissionRecord {
        self.lookup(node).copied().unwrap_or_default()
    }

    /// Flip one capability of one node, starting from its effective record
    pub fn set(&mut self, node: &MenuNode, capability: Capability, value: bool) {
        let mut record = self.effective(node);
        record.set(capability, value);
        self.nodes.insert(node.id().to_string(), record);
    }

    pub fn set_record(&mut self, node: &MenuNode, record: PermissionRecord) {
        self.nodes.insert(node.id().to_string(), record);
    }

    /// View the row as complete external-style records, e.g. to feed it back through
    /// the merge engine as a template
    pub fn as_partial(&self) -> CanonicalPermissions {
        CanonicalPermissions {
            nodes: self
                .nodes
                .iter()
                .map(|(k, r)| (k.clone(), PartialPermissionRecord::from(*r)))
                .collect(),
            fallback: self
                .fallback
                .iter()
                .map(|(k, r)| (k.clone(), PartialPermissionRecord::from(*r)))
                .collect(),
            ..Default::default()
        }
    }
}

/// Aggregate state of a capability across a branch's menu items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchState {
    All,
    None,
    Partial,
}

/// Merged in-memory permission state for all loaded roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
    rows: BTreeMap<Role, RoleRow>,
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, role: Role) -> Option<&RoleRow> {
        self.rows.get(&role)
    }

    /// Replace a role's row wholesale
    pub fn replace_row(&mut self, role: Role, row: RoleRow) -> Option<RoleRow> {
        self.rows.insert(role, row)
    }

    pub fn effective(&self, role: Role, node: &MenuNode) -> PermissionRecord {
        self.rows.get(&role).map(|row| row.effective(node)).unwrap_or_default()
    }

    pub fn get_effective_permission(
        &self,
        role: Role,
        node: &MenuNode,
        capability: Capability,
    ) -> bool {
        self.effective(role, node).get(capability)
    }

    pub fn set_permission(
        &mut self,
        role: Role,
        node: &MenuNode,
        capability: Capability,
        value: bool,
    ) {
        self.rows.entry(role).or_default().set(node, capability, value);
    }

    /// Value-passing variant of [`PermissionMatrix::set_permission`]
    pub fn with_permission(
        mut self,
        role: Role,
        node: &MenuNode,
        capability: Capability,
        value: bool,
    ) -> Self {
        self.set_permission(role, node, capability, value);
        self
    }

    /// Set a capability on a node and every descendant, visible or not.
    /// Returns the number of nodes written.
    pub fn set_branch(
        &mut self,
        tree: &MenuTree,
        role: Role,
        node_id: &str,
        capability: Capability,
        value: bool,
    ) -> Result<usize> {
        let node = tree.get(node_id).ok_or_else(|| MatrixError::UnknownNode(node_id.to_string()))?;
        let row = self.rows.entry(role).or_default();
        row.set(node, capability, value);

        let descendants = tree.descendants(node_id);
        for descendant in descendants {
            row.set(descendant, capability, value);
        }
        Ok(descendants.len() + 1)
    }

    /// Summarize a capability over the menu items below a node.
    /// A node without items reports its own value.
    pub fn branch_state(
        &self,
        tree: &MenuTree,
        role: Role,
        node_id: &str,
        capability: Capability,
    ) -> Result<BranchState> {
        let node = tree.get(node_id).ok_or_else(|| MatrixError::UnknownNode(node_id.to_string()))?;
        let values: Vec<bool> = tree
            .descendants(node_id)
            .iter()
            .filter(|n| n.is_menu_item())
            .map(|n| self.get_effective_permission(role, n, capability))
            .collect();

        if values.is_empty() {
            let own = self.get_effective_permission(role, node, capability);
            return Ok(if own { BranchState::All } else { BranchState::None });
        }
        Ok(match (values.iter().all(|v| *v), values.iter().any(|v| *v)) {
            (true, _) => BranchState::All,
            (false, false) => BranchState::None,
            (false, true) => BranchState::Partial,
        })
    }

    /// Project the matrix back to catalog-key space for persistence.
    ///
    /// Each catalog key takes the record of its first placement in tree order. Other
    /// placements that disagree are reported, not silently dropped. Keys retained
    /// without a placement are written back under their bare key, except `cat-K`
    /// records, which keep the prefix.
    pub fn project_for_save(&self, tree: &MenuTree) -> SaveProjection {
        let mut projection = SaveProjection::default();

        for (&role, row) in &self.rows {
            let mut permissions: BTreeMap<String, PermissionRecord> = BTreeMap::new();
            let mut representatives: BTreeMap<&str, &str> = BTreeMap::new();
            let mut divergent: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();

            for node in tree {
                let record = row.effective(node);
                let key = node.catalog_key();
                match permissions.get(key) {
                    None => {
                        permissions.insert(key.to_string(), record);
                        representatives.insert(key, node.id());
                    }
                    Some(existing) if *existing != record => {
                        divergent.entry(key).or_default().push(node.id().to_string());
                    }
                    Some(_) => {}
                }
            }

            for (key, record) in &row.fallback {
                // Category-only records keep their prefix so items never pick them up
                let saved_key = match split_key(key) {
                    (KeyForm::PrefixedCategory, _) => key.as_str(),
                    (_, bare) => bare,
                };
                permissions.entry(saved_key.to_string()).or_insert(*record);
            }

            for (key, nodes) in divergent {
                let representative = representatives.get(key).copied().unwrap_or_default();
                log::warn!(
                    "Role {} has diverging values for {:?}; saving {} and ignoring {:?}",
                    role,
                    key,
                    representative,
                    nodes
                );
                projection.divergences.push(Divergence {
                    role,
                    catalog_key: key.to_string(),
                    representative: representative.to_string(),
                    divergent: nodes,
                });
            }

            projection.payload.push(RolePermissions { role, permissions });
        }

        projection
    }
}

/// Save payload entry for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub role: Role,
    pub permissions: BTreeMap<String, PermissionRecord>,
}

/// A catalog key whose placements disagree within one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub role: Role,
    pub catalog_key: String,
    /// Node whose value was saved
    pub representative: NodeId,
    /// Placements whose value differs from the saved one
    pub divergent: Vec<NodeId>,
}

/// Result of projecting the matrix for persistence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveProjection {
    pub payload: Vec<RolePermissions>,
    pub divergences: Vec<Divergence>,
}
