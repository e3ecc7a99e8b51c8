//! Permatrix - Core
//!
//! Role permission matrix engine for a hierarchical back-office menu.
//!
//! # Overview
//!
//! A flat menu catalog (categories, optional subcategories, menu items) is turned into
//! an ordered tree with stable node identities. Per-role permission templates and
//! persisted overrides arrive keyed in several inconsistent ways; they are resolved onto
//! tree nodes, merged (template first, override wins per field, anything unknown is
//! denied) and edited per node. On save the matrix is projected back to catalog keys.
//!
//! ```rust,ignore
//! use permatrix_core::prelude::*;
//!
//! let catalog = MenuCatalog::from_path("catalog.json")?;
//! let source = HttpPermissionSource::from_config(&config.source)?;
//!
//! let mut session = EditingSession::from_catalog(&catalog);
//! session.load(&source, &Role::ALL).await?;
//! session.set_permission(Role::Cashier, node_id, Capability::Edit, true)?;
//! session.save(&source).await?;
//! ```
//!
//! # Architecture
//!
//! - [`tree`] - `MenuTreeBuilder`, flattening the catalog in pre-order
//! - [`keys`] - `PermissionKeyResolver`, canonicalizing external keys onto nodes
//! - [`merge`] - `TemplateMergeEngine`, template/override merging and template resets
//! - [`matrix`] - the per-role, per-node permission matrix and save projection
//! - [`visibility`] - `VisibilityController`, expand/collapse state
//! - [`source`] / [`loader`] - the external permission service and concurrent loading
//! - [`session`] - an editing session tying the above together

pub mod catalog; // Menu catalog input (JSON / TOML)
pub mod config; // Configuration system with TOML support
pub mod error;
pub mod keys;
pub mod loader;
pub mod logging; // `log` backend with human and JSON output
pub mod matrix;
pub mod merge;
pub mod permission;
pub mod session;
pub mod source; // External permission service (HTTP and in-memory)
pub mod template;
pub mod tree;
pub mod visibility;

// Prelude module for convenient imports
pub mod prelude;

// Re-exports of main types
pub use catalog::MenuCatalog;
pub use error::{DataSourceKind, MatrixError, Result};
pub use keys::PermissionKeyResolver;
pub use matrix::PermissionMatrix;
pub use merge::TemplateMergeEngine;
pub use permission::{Capability, PartialPermissionRecord, PermissionRecord, Role};
pub use session::EditingSession;
pub use tree::{MenuNode, MenuTree, MenuTreeBuilder};
pub use visibility::VisibilityController;
