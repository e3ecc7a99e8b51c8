//! Declarative menu catalog
//!
//! The catalog is the only structural input of the engine. It lists categories, each
//! holding menu items. An item that names a `parent_category` belongs to a subcategory
//! of its category; every other item hangs directly off the category.
//!
//! Catalogs are plain data and can be written in JSON or TOML:
//!
//! ```toml
//! [[categories]]
//! key = "inventory"
//! name = "Inventory"
//!
//! [[categories.items]]
//! key = "stock_adjust"
//! name = "Adjust Stock"
//! parent_category = "Stock"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete menu catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCatalog {
    #[serde(default)]
    pub categories: Vec<CatalogCategory>,
}

/// Top-level menu grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    /// External identifier of the category
    #[serde(alias = "id")]
    pub key: String,
    /// Display name
    #[serde(alias = "label")]
    pub name: String,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

/// A single menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// External identifier; not unique across the catalog
    #[serde(alias = "id", alias = "catalogKey")]
    pub key: String,
    #[serde(alias = "label")]
    pub name: String,
    /// Subcategory this item belongs to: a sibling item's key or a free label
    #[serde(default, alias = "parentCategory", skip_serializing_if = "Option::is_none")]
    pub parent_category: Option<String>,
}

impl MenuCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category
    pub fn with_category(mut self, category: CatalogCategory) -> Self {
        self.categories.push(category);
        self
    }

    /// Parse a JSON catalog
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse JSON catalog")
    }

    /// Parse a TOML catalog
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML catalog")
    }

    /// Load a catalog file; the format follows the extension (`.toml`, otherwise JSON)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

        let is_toml = path.extension().and_then(|ext| ext.to_str()) == Some("toml");
        let catalog = if is_toml { Self::from_toml(&content) } else { Self::from_json(&content) };
        catalog.with_context(|| format!("Invalid catalog: {}", path.display()))
    }

    /// Total number of declared items across all categories
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

impl CatalogCategory {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self { key: key.into(), name: name.into(), items: Vec::new() }
    }

    /// Add an item directly under the category
    pub fn with_item(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.items.push(CatalogItem::new(key, name));
        self
    }

    /// Add an item under a subcategory
    pub fn with_child(
        mut self,
        parent: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.items.push(CatalogItem::new(key, name).with_parent(parent));
        self
    }
}

impl CatalogItem {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self { key: key.into(), name: name.into(), parent_category: None }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_category = Some(parent.into());
        self
    }
}
