//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use permatrix_core::prelude::*;
//! ```

// === Catalog and tree ===
pub use crate::catalog::{CatalogCategory, CatalogItem, MenuCatalog};
pub use crate::tree::{MenuNode, MenuTree, MenuTreeBuilder, NodeId, NodeLevel};

// === Permissions ===
pub use crate::keys::{CanonicalPermissions, PermissionKeyResolver};
pub use crate::matrix::{BranchState, PermissionMatrix, RolePermissions, SaveProjection};
pub use crate::merge::TemplateMergeEngine;
pub use crate::permission::{Capability, PartialPermissionRecord, PermissionRecord, Role};
pub use crate::template::{ExternalPermissions, TemplateData};

// === Session and data sources ===
pub use crate::loader::{LoadedPermissions, PermissionLoader};
pub use crate::session::{CommitOutcome, EditingSession, LoadTicket};
pub use crate::source::{
    HttpPermissionSource, MemoryPermissionSource, PermissionSource, SourceError,
};
pub use crate::visibility::VisibilityController;

// === Configuration ===
pub use crate::config::PermatrixConfig;
pub use crate::logging::LoggingConfig;

// === Errors ===
pub use crate::error::{DataSourceKind, MatrixError, Result};
