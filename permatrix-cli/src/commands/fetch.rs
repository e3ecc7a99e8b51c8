use anyhow::{anyhow, Result};
use permatrix_core::logging::init_logging;
use permatrix_core::prelude::*;
use std::path::Path;

use super::render_rows;

/// Load through the permission API and print every requested role
pub async fn run(config_path: &Path, role: Option<&str>) -> Result<()> {
    let config = PermatrixConfig::load_from(config_path)?;
    config.validate()?;
    init_logging(&config.logging.to_logging_config()?)?;

    let roles = match role {
        Some(name) => vec![name.parse::<Role>()?],
        None => config.roles.roles()?,
    };

    let catalog = MenuCatalog::from_path(&config.catalog.path)?;
    let source = HttpPermissionSource::from_config(&config.source)?;
    log::info!("Fetching {} roles from {}", roles.len(), config.source.base_url);

    let mut session = EditingSession::from_catalog(&catalog);
    session.load(&source, &roles).await.map_err(describe)?;

    for warning in &session.report().warnings {
        eprintln!("warning: {}", warning);
    }
    for role in roles {
        println!("Role: {}", role);
        for line in render_rows(&session, role) {
            println!("{}", line);
        }
        println!();
    }
    if session.report().unmatched_count() > 0 {
        println!("{} permission keys match no menu node", session.report().unmatched_count());
    }
    Ok(())
}

fn describe(err: MatrixError) -> anyhow::Error {
    match err {
        MatrixError::AccessDenied { role } => {
            anyhow!("access denied while loading permissions for role {}; nothing was loaded", role)
        }
        MatrixError::SessionExpired => {
            anyhow!("session expired; refresh the API token and run the command again")
        }
        other => other.into(),
    }
}
