pub mod fetch;
pub mod resolve;
pub mod tree;

use clap::Args;
use permatrix_core::prelude::*;
use std::path::PathBuf;

/// File inputs for the offline commands
#[derive(Args, Debug, Clone)]
pub struct OfflineArgs {
    /// Catalog file (.json or .toml)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Role template, dict or list shaped JSON
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Persisted overrides JSON
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Role the files belong to
    #[arg(long)]
    pub role: String,
}

fn flags(record: &PermissionRecord) -> String {
    Capability::ALL
        .iter()
        .map(|&cap| {
            if !record.get(cap) {
                '-'
            } else {
                match cap {
                    Capability::Access => 'A',
                    Capability::View => 'V',
                    Capability::Create => 'C',
                    Capability::Edit => 'E',
                    Capability::Delete => 'D',
                }
            }
        })
        .collect()
}

fn indent(node: &MenuNode) -> usize {
    match node.level() {
        NodeLevel::Category => 0,
        NodeLevel::Subcategory => 2,
        NodeLevel::MenuItem if node.subcategory_id().is_some() => 4,
        NodeLevel::MenuItem => 2,
    }
}

/// One line per node: label, capability flags (`AVCED`, `-` when denied), node id
pub fn render_rows(session: &EditingSession, role: Role) -> Vec<String> {
    session
        .visible_nodes()
        .into_iter()
        .map(|node| {
            let pad = indent(node);
            let record = session.matrix().effective(role, node);
            format!(
                "{:pad$}{:<width$} {}  {}",
                "",
                node.label(),
                flags(&record),
                node.id(),
                pad = pad,
                width = 36usize.saturating_sub(pad)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_capability_order() {
        let record = PermissionRecord::deny_all()
            .with(Capability::View, true)
            .with(Capability::Delete, true);
        assert_eq!(flags(&record), "-V--D");
        assert_eq!(flags(&PermissionRecord::allow_all()), "AVCED");
    }
}
