//! External permission payload shapes
//!
//! The template API answers either with a dictionary keyed by catalog key or with an
//! array of records that carry their own key. Both shapes are normalized here into one
//! [`ExternalPermissions`] map before any key resolution happens.

use crate::permission::PartialPermissionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Permission data keyed by an external identifier (catalog key, possibly prefixed)
pub type ExternalPermissions = BTreeMap<String, PartialPermissionRecord>;

/// Raw template or override payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateData {
    /// `{"stock_adjust": {"can_view": true, ...}, ...}`
    Dict(BTreeMap<String, PartialPermissionRecord>),
    /// `[{"catalog_key": "stock_adjust", "can_view": true, ...}, ...]`
    List(Vec<TemplateEntry>),
}

/// One record of the array-shaped payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    #[serde(alias = "catalogKey", alias = "menu_key", alias = "key")]
    pub catalog_key: String,
    #[serde(flatten)]
    pub record: PartialPermissionRecord,
}

impl Default for TemplateData {
    fn default() -> Self {
        TemplateData::Dict(BTreeMap::new())
    }
}

impl TemplateData {
    /// Parse a JSON payload of either shape. `null` is treated as empty.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    pub fn len(&self) -> usize {
        match self {
            TemplateData::Dict(map) => map.len(),
            TemplateData::List(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize to a key -> record map. For repeated keys in the array shape the
    /// later entry wins.
    pub fn into_external(self) -> ExternalPermissions {
        match self {
            TemplateData::Dict(map) => map,
            TemplateData::List(entries) => {
                let mut map = ExternalPermissions::new();
                for entry in entries {
                    if map.insert(entry.catalog_key.clone(), entry.record).is_some() {
                        log::debug!("Repeated template entry for {}", entry.catalog_key);
                    }
                }
                map
            }
        }
    }
}

impl From<ExternalPermissions> for TemplateData {
    fn from(map: ExternalPermissions) -> Self {
        TemplateData::Dict(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Capability;

    #[test]
    fn test_dict_shape() {
        let data = TemplateData::from_json(
            r#"{"stock_adjust": {"can_view": true, "can_edit": true}}"#,
        )
        .unwrap();
        assert!(matches!(data, TemplateData::Dict(_)));

        let map = data.into_external();
        let record = map["stock_adjust"];
        assert_eq!(record.get(Capability::View), Some(true));
        assert_eq!(record.get(Capability::Delete), None);
    }

    #[test]
    fn test_list_shape() {
        let data = TemplateData::from_json(
            r#"[
                {"catalogKey": "terminals", "can_access": true},
                {"catalog_key": "categories", "can_view": false},
                {"catalog_key": "terminals", "can_access": false, "can_view": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(data.len(), 3);

        let map = data.into_external();
        assert_eq!(map.len(), 2);
        assert_eq!(map["terminals"].access, Some(false));
        assert_eq!(map["terminals"].view, Some(true));
        assert_eq!(map["categories"].view, Some(false));
    }

    #[test]
    fn test_null_and_empty() {
        assert!(TemplateData::from_json("null").unwrap().is_empty());
        assert!(TemplateData::from_json("{}").unwrap().is_empty());
        assert!(TemplateData::from_json("[]").unwrap().is_empty());
        assert!(TemplateData::from_json("42").is_err());
    }
}
