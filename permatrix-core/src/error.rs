//! Error taxonomy for permission loading and matrix editing

use crate::permission::Role;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, MatrixError>;

/// Which external collaborator a piece of permission data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataSourceKind {
    /// Role template defaults
    Template,
    /// Persisted per-role overrides
    Override,
}

impl std::fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSourceKind::Template => write!(f, "template"),
            DataSourceKind::Override => write!(f, "override"),
        }
    }
}

/// Matrix error type
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// The caller may not read role permission data at all.
    /// Halts further loads for the session.
    #[error("Access denied to permission data for role {role}")]
    AccessDenied { role: Role },
    /// The bulk save was refused. Halts further loads for the session.
    #[error("Access denied when saving permission data")]
    SaveDenied,
    /// Authentication expired mid-operation; the host must re-authenticate.
    #[error("Session expired")]
    SessionExpired,
    /// A template or override fetch failed for another reason.
    /// Absorbed by the loader, which treats the source as empty.
    #[error("{source_kind} data unavailable for role {role}: {reason}")]
    DataUnavailable { role: Role, source_kind: DataSourceKind, reason: String },
    /// An external catalog key matched no tree node. Never fatal.
    #[error("Catalog key {key:?} matches no menu node")]
    KeyAmbiguity { key: String },
    #[error("Unknown menu node: {0}")]
    UnknownNode(String),
    #[error("Menu node {0} has nothing to expand")]
    NotTogglable(String),
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl MatrixError {
    /// Errors that must abort the in-progress load and reach the host
    pub fn is_fatal(&self) -> bool {
        self.halts_session() || matches!(self, MatrixError::SessionExpired)
    }

    /// Access denials on either path; the session refuses further loads afterwards
    pub fn halts_session(&self) -> bool {
        matches!(self, MatrixError::AccessDenied { .. } | MatrixError::SaveDenied)
    }
}
