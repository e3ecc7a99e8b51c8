use anyhow::Result;
use permatrix_core::prelude::*;
use std::path::Path;

use super::indent;

pub fn lines(tree: &MenuTree) -> Vec<String> {
    tree.iter()
        .map(|node| {
            let level = match node.level() {
                NodeLevel::Category => "category",
                NodeLevel::Subcategory => "subcategory",
                NodeLevel::MenuItem => "item",
            };
            format!(
                "{:pad$}{} [{}] key={} id={}",
                "",
                node.label(),
                level,
                node.catalog_key(),
                node.id(),
                pad = indent(node)
            )
        })
        .collect()
}

/// Print the flattened tree of a catalog file
pub fn run(catalog: &Path) -> Result<()> {
    let catalog = MenuCatalog::from_path(catalog)?;
    let tree = MenuTreeBuilder::new().build(&catalog);

    for line in lines(&tree) {
        println!("{}", line);
    }
    println!();
    println!("{} nodes, {} distinct catalog keys", tree.len(), tree.catalog_keys().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_lines_show_levels() {
        let catalog = MenuCatalog::new().with_category(
            CatalogCategory::new("inventory", "Inventory")
                .with_child("Stock", "stock_adjust", "Adjust Stock"),
        );
        let tree = MenuTree::from_catalog(&catalog);
        let lines = lines(&tree);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Inventory [category] key=inventory"));
        assert!(lines[1].starts_with("  Stock [subcategory]"));
        assert!(lines[2].starts_with("    Adjust Stock [item] key=stock_adjust"));
    }
}
