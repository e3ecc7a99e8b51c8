//! Menu tree construction
//!
//! Flattens a [`MenuCatalog`] into an ordered list of category, subcategory and menu
//! item nodes. The list is a pre-order walk: every node's ancestors precede it, and a
//! node's descendants form one contiguous run directly after it. That order is the
//! render and iteration order for the rest of the engine and is never re-sorted.
//!
//! The builder never deduplicates. A catalog key declared in two places yields two
//! nodes with distinct ids, so one catalog key maps to one or more nodes.

use crate::catalog::{CatalogCategory, CatalogItem, MenuCatalog};
use serde::Serialize;
use std::collections::HashMap;

/// Globally unique node identifier
pub type NodeId = String;

/// Depth of a node in the three-level menu tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLevel {
    Category,
    Subcategory,
    MenuItem,
}

/// One entry of the flattened tree.
///
/// Level and subcategory membership are fixed at construction, so the fields are
/// read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuNode {
    id: NodeId,
    level: NodeLevel,
    label: String,
    category: String,
    subcategory: Option<String>,
    catalog_key: String,
    category_id: Option<NodeId>,
    subcategory_id: Option<NodeId>,
}

impl MenuNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn level(&self) -> NodeLevel {
        self.level
    }

    /// Display label of this node
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Display name of the owning category (its own name for a category node)
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Display name of the owning subcategory, if the node lives under one
    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    /// External identifier from the catalog; may repeat across nodes
    pub fn catalog_key(&self) -> &str {
        &self.catalog_key
    }

    /// Id of the ancestor category node; `None` for category nodes
    pub fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }

    /// Id of the ancestor subcategory node; only set for items under a subcategory
    pub fn subcategory_id(&self) -> Option<&str> {
        self.subcategory_id.as_deref()
    }

    /// Immediate parent
    pub fn parent_id(&self) -> Option<&str> {
        self.subcategory_id().or(self.category_id())
    }

    /// Ancestor ids from the root down
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.category_id().into_iter().chain(self.subcategory_id())
    }

    pub fn is_category(&self) -> bool {
        self.level == NodeLevel::Category
    }

    pub fn is_menu_item(&self) -> bool {
        self.level == NodeLevel::MenuItem
    }

    fn is_descendant_of(&self, ancestor: &str) -> bool {
        self.ancestors().any(|id| id == ancestor)
    }
}

/// Derive a node id from its placement.
///
/// The ordinal is the node's position in the flattened list, which keeps ids unique
/// even when the same catalog key is declared twice in one subcategory.
pub fn node_id(
    category: &str,
    subcategory: Option<&str>,
    item: Option<&str>,
    ordinal: usize,
) -> NodeId {
    let mut path = category.to_string();
    for segment in subcategory.into_iter().chain(item) {
        path.push('/');
        path.push_str(segment);
    }
    format!("{}@{}", path, ordinal)
}

/// Immutable flattened menu tree with lookup indexes
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
    positions: HashMap<NodeId, usize>,
    by_catalog_key: HashMap<String, Vec<usize>>,
    subtree_end: Vec<usize>,
}

impl MenuTree {
    /// Build a tree from a catalog
    pub fn from_catalog(catalog: &MenuCatalog) -> Self {
        MenuTreeBuilder::new().build(catalog)
    }

    fn from_nodes(nodes: Vec<MenuNode>) -> Self {
        let mut positions = HashMap::with_capacity(nodes.len());
        let mut by_catalog_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, node) in nodes.iter().enumerate() {
            positions.insert(node.id.clone(), pos);
            by_catalog_key.entry(node.catalog_key.clone()).or_default().push(pos);
        }

        // Descendants are contiguous in pre-order
        let subtree_end = (0..nodes.len())
            .map(|pos| {
                let id = &nodes[pos].id;
                let mut end = pos + 1;
                while end < nodes.len() && nodes[end].is_descendant_of(id) {
                    end += 1;
                }
                end
            })
            .collect();

        Self { nodes, positions, by_catalog_key, subtree_end }
    }

    /// Nodes in authoritative order
    pub fn nodes(&self) -> &[MenuNode] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MenuNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MenuNode> {
        self.positions.get(id).map(|&pos| &self.nodes[pos])
    }

    /// Position of a node in tree order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id()).collect()
    }

    /// Every placement of a catalog key, in tree order
    pub fn nodes_for_key<'a>(&'a self, catalog_key: &str) -> impl Iterator<Item = &'a MenuNode> {
        self.by_catalog_key
            .get(catalog_key)
            .into_iter()
            .flatten()
            .map(move |&pos| &self.nodes[pos])
    }

    /// Distinct catalog keys in order of first placement
    pub fn catalog_keys(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.nodes
            .iter()
            .map(|n| n.catalog_key())
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// All descendants of a node, in tree order
    pub fn descendants(&self, id: &str) -> &[MenuNode] {
        match self.position(id) {
            Some(pos) => &self.nodes[pos + 1..self.subtree_end[pos]],
            None => &[],
        }
    }

    /// Number of menu items below a node
    pub fn item_count(&self, id: &str) -> usize {
        self.descendants(id).iter().filter(|n| n.is_menu_item()).count()
    }

    pub fn categories(&self) -> impl Iterator<Item = &MenuNode> {
        self.nodes.iter().filter(|n| n.is_category())
    }
}

impl<'a> IntoIterator for &'a MenuTree {
    type Item = &'a MenuNode;
    type IntoIter = std::slice::Iter<'a, MenuNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Single-pass catalog flattener
#[derive(Debug, Default)]
pub struct MenuTreeBuilder {
    nodes: Vec<MenuNode>,
}

impl MenuTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten the catalog. Deterministic: the same catalog always yields the same ids.
    pub fn build(mut self, catalog: &MenuCatalog) -> MenuTree {
        for category in &catalog.categories {
            self.push_category(category);
        }
        log::debug!(
            "Built menu tree: {} nodes from {} categories",
            self.nodes.len(),
            catalog.categories.len()
        );
        MenuTree::from_nodes(self.nodes)
    }

    fn push_category(&mut self, category: &CatalogCategory) {
        if category.items.is_empty() {
            log::debug!("Skipping empty category {}", category.key);
            return;
        }

        let (children, mut direct): (Vec<&CatalogItem>, Vec<&CatalogItem>) =
            category.items.iter().partition(|item| parent_of(item).is_some());

        let mut parents: Vec<&str> = Vec::new();
        for item in &children {
            if let Some(parent) = parent_of(item) {
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
        }

        let category_id = node_id(&category.key, None, None, self.nodes.len());
        self.nodes.push(MenuNode {
            id: category_id.clone(),
            level: NodeLevel::Category,
            label: category.name.clone(),
            category: category.name.clone(),
            subcategory: None,
            catalog_key: category.key.clone(),
            category_id: None,
            subcategory_id: None,
        });

        for parent in parents {
            // A direct sibling whose key names the subcategory becomes its header
            let header_pos = direct.iter().position(|item| item.key == parent);
            let header = header_pos.map(|pos| direct.remove(pos));
            let (sub_label, sub_key) = match header {
                Some(item) => (item.name.clone(), item.key.clone()),
                None => (parent.to_string(), parent.to_string()),
            };

            let subcategory_id =
                node_id(&category.key, Some(&sub_key), None, self.nodes.len());
            self.nodes.push(MenuNode {
                id: subcategory_id.clone(),
                level: NodeLevel::Subcategory,
                label: sub_label.clone(),
                category: category.name.clone(),
                subcategory: Some(sub_label.clone()),
                catalog_key: sub_key.clone(),
                category_id: Some(category_id.clone()),
                subcategory_id: None,
            });

            for item in children.iter().filter(|item| parent_of(item) == Some(parent)) {
                let id = node_id(&category.key, Some(&sub_key), Some(&item.key), self.nodes.len());
                self.nodes.push(MenuNode {
                    id,
                    level: NodeLevel::MenuItem,
                    label: item.name.clone(),
                    category: category.name.clone(),
                    subcategory: Some(sub_label.clone()),
                    catalog_key: item.key.clone(),
                    category_id: Some(category_id.clone()),
                    subcategory_id: Some(subcategory_id.clone()),
                });
            }
        }

        for item in direct {
            let id = node_id(&category.key, None, Some(&item.key), self.nodes.len());
            self.nodes.push(MenuNode {
                id,
                level: NodeLevel::MenuItem,
                label: item.name.clone(),
                category: category.name.clone(),
                subcategory: None,
                catalog_key: item.key.clone(),
                category_id: Some(category_id.clone()),
                subcategory_id: None,
            });
        }
    }
}

fn parent_of(item: &CatalogItem) -> Option<&str> {
    item.parent_category.as_deref().map(str::trim).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory_catalog() -> MenuCatalog {
        MenuCatalog::new()
            .with_category(
                CatalogCategory::new("inventory", "Inventory")
                    .with_child("Stock", "stock_adjust", "Adjust Stock")
                    .with_item("stock_count", "Stock Count")
                    .with_child("Stock", "stock_transfer", "Transfer Stock"),
            )
            .with_category(CatalogCategory::new("empty", "Empty"))
            .with_category(
                CatalogCategory::new("sales", "Sales").with_item("terminals", "Terminals"),
            )
    }

    #[test]
    fn test_preorder_layout() {
        let tree = MenuTree::from_catalog(&inventory_catalog());
        let levels: Vec<(NodeLevel, &str)> =
            tree.iter().map(|n| (n.level(), n.catalog_key())).collect();

        assert_eq!(
            levels,
            vec![
                (NodeLevel::Category, "inventory"),
                (NodeLevel::Subcategory, "Stock"),
                (NodeLevel::MenuItem, "stock_adjust"),
                (NodeLevel::MenuItem, "stock_transfer"),
                (NodeLevel::MenuItem, "stock_count"),
                (NodeLevel::Category, "sales"),
                (NodeLevel::MenuItem, "terminals"),
            ]
        );
    }

    #[test]
    fn test_ancestors_precede_nodes() {
        let tree = MenuTree::from_catalog(&inventory_catalog());
        for (pos, node) in tree.iter().enumerate() {
            for ancestor in node.ancestors() {
                assert!(tree.position(ancestor).unwrap() < pos);
            }
        }
    }

    #[test]
    fn test_ids_are_stable_and_unique() {
        let catalog = inventory_catalog();
        let first = MenuTree::from_catalog(&catalog);
        let second = MenuTree::from_catalog(&catalog);
        assert_eq!(first.node_ids(), second.node_ids());

        let unique: std::collections::HashSet<_> = first.node_ids().into_iter().collect();
        assert_eq!(unique.len(), first.len());
        assert_eq!(first.nodes()[2].id(), "inventory/Stock/stock_adjust@2");
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let catalog = MenuCatalog::new()
            .with_category(
                CatalogCategory::new("reports", "Reports").with_item("reports_export", "Export"),
            )
            .with_category(
                CatalogCategory::new("admin", "Admin")
                    .with_item("reports_export", "Export")
                    .with_item("reports_export", "Export again"),
            );
        let tree = MenuTree::from_catalog(&catalog);
        let placements: Vec<&str> = tree.nodes_for_key("reports_export").map(|n| n.id()).collect();
        assert_eq!(placements.len(), 3);
        assert_eq!(tree.catalog_keys(), vec!["reports", "reports_export", "admin"]);
    }

    #[test]
    fn test_sibling_header_is_absorbed() {
        let catalog = MenuCatalog::new().with_category(
            CatalogCategory::new("purchasing", "Purchasing")
                .with_item("orders", "Purchase Orders")
                .with_child("orders", "orders_receive", "Receive")
                .with_item("suppliers", "Suppliers"),
        );
        let tree = MenuTree::from_catalog(&catalog);
        let sub = &tree.nodes()[1];
        assert_eq!(sub.level(), NodeLevel::Subcategory);
        assert_eq!(sub.label(), "Purchase Orders");
        assert_eq!(sub.catalog_key(), "orders");
        assert_eq!(tree.nodes_for_key("orders").count(), 1);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_blank_parent_is_direct() {
        let catalog = MenuCatalog::new().with_category(
            CatalogCategory::new("c", "C").with_child("  ", "x", "X"),
        );
        let tree = MenuTree::from_catalog(&catalog);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.nodes()[1].subcategory(), None);
    }

    #[test]
    fn test_descendants() {
        let tree = MenuTree::from_catalog(&inventory_catalog());
        let inventory = tree.nodes()[0].id().to_string();
        let stock = tree.nodes()[1].id().to_string();

        assert_eq!(tree.descendants(&inventory).len(), 4);
        assert_eq!(tree.item_count(&inventory), 3);
        assert_eq!(tree.item_count(&stock), 2);
        assert_eq!(tree.item_count(tree.nodes()[4].id()), 0);
        assert!(tree.descendants("missing").is_empty());
    }
}
