//! Roles, capabilities and permission records

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Back-office role. The set is fixed; roles are never created at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Manager,
    Supervisor,
    Cashier,
    User,
}

impl Role {
    /// Every role, in display order
    pub const ALL: [Role; 5] =
        [Role::Administrator, Role::Manager, Role::Supervisor, Role::Cashier, Role::User];

    /// Wire name used by the permission API
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Manager => "manager",
            Role::Supervisor => "supervisor",
            Role::Cashier => "cashier",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "administrator" | "admin" => Ok(Role::Administrator),
            "manager" => Ok(Role::Manager),
            "supervisor" => Ok(Role::Supervisor),
            "cashier" => Ok(Role::Cashier),
            "user" => Ok(Role::User),
            _ => Err(crate::MatrixError::UnknownRole(s.to_string())),
        }
    }
}

/// One of the five independent capabilities of a permission cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Access,
    View,
    Create,
    Edit,
    Delete,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Access,
        Capability::View,
        Capability::Create,
        Capability::Edit,
        Capability::Delete,
    ];
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::Access => "access",
            Capability::View => "view",
            Capability::Create => "create",
            Capability::Edit => "edit",
            Capability::Delete => "delete",
        };
        f.write_str(name)
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "access" => Ok(Capability::Access),
            "view" => Ok(Capability::View),
            "create" => Ok(Capability::Create),
            "edit" => Ok(Capability::Edit),
            "delete" => Ok(Capability::Delete),
            other => Err(format!("unknown capability: {}", other)),
        }
    }
}

/// Five boolean capabilities for one `(role, node)` cell.
///
/// The default value denies everything; a missing record means the same thing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRecord {
    #[serde(rename = "can_access", default)]
    pub access: bool,
    #[serde(rename = "can_view", default)]
    pub view: bool,
    #[serde(rename = "can_create", default)]
    pub create: bool,
    #[serde(rename = "can_edit", default)]
    pub edit: bool,
    #[serde(rename = "can_delete", default)]
    pub delete: bool,
}

impl PermissionRecord {
    /// All five capabilities denied
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// All five capabilities granted
    pub fn allow_all() -> Self {
        Self { access: true, view: true, create: true, edit: true, delete: true }
    }

    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::Access => self.access,
            Capability::View => self.view,
            Capability::Create => self.create,
            Capability::Edit => self.edit,
            Capability::Delete => self.delete,
        }
    }

    pub fn set(&mut self, capability: Capability, value: bool) {
        match capability {
            Capability::Access => self.access = value,
            Capability::View => self.view = value,
            Capability::Create => self.create = value,
            Capability::Edit => self.edit = value,
            Capability::Delete => self.delete = value,
        }
    }

    /// Builder-style variant of [`PermissionRecord::set`]
    pub fn with(mut self, capability: Capability, value: bool) -> Self {
        self.set(capability, value);
        self
    }

    pub fn is_deny_all(&self) -> bool {
        *self == Self::deny_all()
    }

    /// Overwrite only the fields the partial record actually carries
    pub fn overlay(&mut self, partial: &PartialPermissionRecord) {
        for capability in Capability::ALL {
            if let Some(value) = partial.get(capability) {
                self.set(capability, value);
            }
        }
    }
}

/// A permission record as delivered by external data: any field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialPermissionRecord {
    #[serde(rename = "can_access", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<bool>,
    #[serde(rename = "can_view", default, skip_serializing_if = "Option::is_none")]
    pub view: Option<bool>,
    #[serde(rename = "can_create", default, skip_serializing_if = "Option::is_none")]
    pub create: Option<bool>,
    #[serde(rename = "can_edit", default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<bool>,
    #[serde(rename = "can_delete", default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

impl PartialPermissionRecord {
    pub fn get(&self, capability: Capability) -> Option<bool> {
        match capability {
            Capability::Access => self.access,
            Capability::View => self.view,
            Capability::Create => self.create,
            Capability::Edit => self.edit,
            Capability::Delete => self.delete,
        }
    }

    pub fn set(&mut self, capability: Capability, value: Option<bool>) {
        match capability {
            Capability::Access => self.access = value,
            Capability::View => self.view = value,
            Capability::Create => self.create = value,
            Capability::Edit => self.edit = value,
            Capability::Delete => self.delete = value,
        }
    }

    pub fn with(mut self, capability: Capability, value: bool) -> Self {
        self.set(capability, Some(value));
        self
    }

    /// Missing fields resolve to `false`
    pub fn resolve(&self) -> PermissionRecord {
        let mut record = PermissionRecord::deny_all();
        record.overlay(self);
        record
    }
}

impl From<PermissionRecord> for PartialPermissionRecord {
    fn from(record: PermissionRecord) -> Self {
        Self {
            access: Some(record.access),
            view: Some(record.view),
            create: Some(record.create),
            edit: Some(record.edit),
            delete: Some(record.delete),
        }
    }
}
