use anyhow::{Context, Result};
use permatrix_core::prelude::*;
use std::path::Path;

use super::{render_rows, OfflineArgs};

fn read_template(path: &Path) -> Result<TemplateData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    TemplateData::from_json(&content)
        .with_context(|| format!("Invalid permission data: {}", path.display()))
}

/// Build a loaded session from the offline file inputs
pub async fn load_session(input: &OfflineArgs) -> Result<(EditingSession, Role)> {
    let role: Role = input.role.parse()?;
    let catalog = MenuCatalog::from_path(&input.catalog)?;

    let mut source = MemoryPermissionSource::new();
    if let Some(path) = &input.template {
        source = source.with_template(role, read_template(path)?);
    }
    if let Some(path) = &input.overrides {
        source = source.with_overrides(role, read_template(path)?);
    }

    let mut session = EditingSession::from_catalog(&catalog);
    session.load(&source, &[role]).await?;
    Ok((session, role))
}

/// Print the merged matrix row for one role
pub async fn run(input: &OfflineArgs) -> Result<()> {
    let (session, role) = load_session(input).await?;

    println!("Role: {}", role);
    for line in render_rows(&session, role) {
        println!("{}", line);
    }

    let unmatched = session.report().unmatched_count();
    if unmatched > 0 {
        println!();
        println!("{} permission keys match no menu node:", unmatched);
        for err in session.report().key_ambiguities() {
            println!("  {}", err);
        }
    }
    Ok(())
}

/// Print the bulk save payload; divergences go to stderr
pub async fn export(input: &OfflineArgs) -> Result<()> {
    let (session, _) = load_session(input).await?;
    let projection = session.save_projection();

    println!("{}", serde_json::to_string_pretty(&projection.payload)?);
    for divergence in &projection.divergences {
        eprintln!(
            "warning: {} {:?} differs across placements; saved {}, ignored {}",
            divergence.role,
            divergence.catalog_key,
            divergence.representative,
            divergence.divergent.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn inputs(dir: &Path) -> OfflineArgs {
        let catalog = write(
            dir,
            "catalog.toml",
            r#"
[[categories]]
key = "inventory"
name = "Inventory"

[[categories.items]]
key = "stock_adjust"
name = "Adjust Stock"
parent_category = "Stock"

[[categories.items]]
key = "stock_count"
name = "Stock Count"
"#,
        );
        let template = write(
            dir,
            "template.json",
            r#"[{"catalog_key": "stock_adjust", "can_view": true, "can_edit": true}]"#,
        );
        let overrides = write(
            dir,
            "overrides.json",
            r#"{"stock_adjust": {"can_delete": true}, "item-legacy": {"can_view": true}}"#,
        );
        OfflineArgs {
            catalog,
            template: Some(template),
            overrides: Some(overrides),
            role: "Manager".into(),
        }
    }

    #[tokio::test]
    async fn resolves_file_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let (session, role) = load_session(&inputs(tmp.path())).await.unwrap();
        assert_eq!(role, Role::Manager);

        let rows = render_rows(&session, role);
        assert_eq!(rows.len(), session.tree().len());
        let adjust = rows.iter().find(|r| r.contains("Adjust Stock")).unwrap();
        assert!(adjust.contains("-V-ED"));
        assert_eq!(session.report().unmatched_count(), 1);
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut input = inputs(tmp.path());
        input.role = "owner".into();
        assert!(load_session(&input).await.is_err());
    }

    #[tokio::test]
    async fn export_payload_keeps_unplaced_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let (session, _) = load_session(&inputs(tmp.path())).await.unwrap();
        let payload = session.save_projection().payload;
        assert_eq!(payload.len(), 1);
        assert!(payload[0].permissions["legacy"].view);
        assert!(payload[0].permissions["stock_adjust"].delete);
    }
}
