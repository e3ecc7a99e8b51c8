//! Expand/collapse state for the matrix view
//!
//! Purely a presentation filter: collapsing a branch never touches permission data,
//! and collapsed nodes still take part in branch-wide operations.

use crate::tree::{MenuNode, MenuTree, NodeLevel};
use crate::{MatrixError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityController {
    expanded_categories: HashSet<String>,
    expanded_subcategories: HashSet<String>,
}

impl VisibilityController {
    /// Everything that can be expanded starts expanded
    pub fn new(tree: &MenuTree) -> Self {
        let mut controller = Self::default();
        controller.expand_all(tree);
        controller
    }

    /// Whether a node offers a toggle at all: categories and subcategories with at
    /// least one menu item below them
    pub fn is_togglable(tree: &MenuTree, node: &MenuNode) -> bool {
        node.level() != NodeLevel::MenuItem && tree.item_count(node.id()) > 0
    }

    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.expanded_categories.contains(node_id) || self.expanded_subcategories.contains(node_id)
    }

    /// Flip a category or subcategory. Returns the new expanded state.
    pub fn toggle(&mut self, tree: &MenuTree, node_id: &str) -> Result<bool> {
        let node = tree.get(node_id).ok_or_else(|| MatrixError::UnknownNode(node_id.to_string()))?;
        if !Self::is_togglable(tree, node) {
            return Err(MatrixError::NotTogglable(node_id.to_string()));
        }

        let set = match node.level() {
            NodeLevel::Category => &mut self.expanded_categories,
            _ => &mut self.expanded_subcategories,
        };
        let expanded = if set.remove(node_id) {
            false
        } else {
            set.insert(node_id.to_string());
            true
        };
        log::debug!("Toggled {} -> expanded={}", node_id, expanded);
        Ok(expanded)
    }

    /// Like [`VisibilityController::toggle`] but only accepts category nodes
    pub fn toggle_category(&mut self, tree: &MenuTree, node_id: &str) -> Result<bool> {
        self.toggle_level(tree, node_id, NodeLevel::Category)
    }

    /// Like [`VisibilityController::toggle`] but only accepts subcategory nodes
    pub fn toggle_subcategory(&mut self, tree: &MenuTree, node_id: &str) -> Result<bool> {
        self.toggle_level(tree, node_id, NodeLevel::Subcategory)
    }

    fn toggle_level(&mut self, tree: &MenuTree, node_id: &str, level: NodeLevel) -> Result<bool> {
        match tree.get(node_id) {
            Some(node) if node.level() == level => self.toggle(tree, node_id),
            Some(_) => Err(MatrixError::NotTogglable(node_id.to_string())),
            None => Err(MatrixError::UnknownNode(node_id.to_string())),
        }
    }

    pub fn expand_all(&mut self, tree: &MenuTree) {
        for node in tree.iter().filter(|n| Self::is_togglable(tree, n)) {
            match node.level() {
                NodeLevel::Category => self.expanded_categories.insert(node.id().to_string()),
                _ => self.expanded_subcategories.insert(node.id().to_string()),
            };
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded_categories.clear();
        self.expanded_subcategories.clear();
    }

    /// Categories are always visible; anything else needs every ancestor expanded
    pub fn is_visible(&self, node: &MenuNode) -> bool {
        match node.level() {
            NodeLevel::Category => true,
            NodeLevel::Subcategory | NodeLevel::MenuItem => {
                node.category_id().is_some_and(|id| self.expanded_categories.contains(id))
                    && node
                        .subcategory_id()
                        .map_or(true, |id| self.expanded_subcategories.contains(id))
            }
        }
    }

    /// Visible nodes in tree order
    pub fn visible_nodes<'t>(&self, tree: &'t MenuTree) -> Vec<&'t MenuNode> {
        tree.iter().filter(|n| self.is_visible(n)).collect()
    }
}
