//! Permission key resolution
//!
//! Three producers name the same permission cell differently: the tree uses node ids,
//! while template and override payloads use `item-{key}`, the bare catalog key, or
//! `cat-{key}` for categories. Rather than force one scheme, the resolver fixes a total
//! order over the forms:
//!
//! 1. exact node id
//! 2. `item-{catalog_key}`
//! 3. bare `catalog_key`
//! 4. `cat-{catalog_key}` (category nodes only)
//!
//! The first hit wins and no hit means deny-all. Everything here is a pure function of
//! its inputs.

use crate::permission::PartialPermissionRecord;
use crate::template::ExternalPermissions;
use crate::tree::{MenuNode, MenuTree, NodeId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const ITEM_PREFIX: &str = "item-";
pub const CATEGORY_PREFIX: &str = "cat-";

/// Key formats, ordered by lookup precedence (highest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum KeyForm {
    NodeId,
    PrefixedItem,
    Bare,
    PrefixedCategory,
}

/// One candidate key for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub form: KeyForm,
    pub key: String,
}

pub fn item_key(catalog_key: &str) -> String {
    format!("{}{}", ITEM_PREFIX, catalog_key)
}

pub fn category_key(catalog_key: &str) -> String {
    format!("{}{}", CATEGORY_PREFIX, catalog_key)
}

/// Split an external key into its form and bare catalog key.
///
/// Unprefixed keys report [`KeyForm::Bare`]; whether they are really node ids can only
/// be told against a tree.
pub fn split_key(key: &str) -> (KeyForm, &str) {
    if let Some(bare) = key.strip_prefix(ITEM_PREFIX) {
        (KeyForm::PrefixedItem, bare)
    } else if let Some(bare) = key.strip_prefix(CATEGORY_PREFIX) {
        (KeyForm::PrefixedCategory, bare)
    } else {
        (KeyForm::Bare, key)
    }
}

/// External data mapped into node space
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalPermissions {
    /// Records written to every placement of their key
    pub nodes: BTreeMap<NodeId, PartialPermissionRecord>,
    /// Records for keys with no placement, kept under `item-K` and `K` (`cat-K` for
    /// category keys)
    pub fallback: BTreeMap<String, PartialPermissionRecord>,
    /// External keys that matched no node
    pub unmatched: Vec<String>,
    /// External keys that matched nodes but lost to a higher-precedence form
    pub shadowed: Vec<String>,
}

impl CanonicalPermissions {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.fallback.is_empty()
    }

    /// Record for a node under the resolver's precedence
    pub fn lookup(&self, node: &MenuNode) -> Option<&PartialPermissionRecord> {
        self.nodes
            .get(node.id())
            .or_else(|| PermissionKeyResolver::first_match(&self.fallback, node).map(|(_, r)| r))
    }
}

/// Stateless key resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionKeyResolver;

impl PermissionKeyResolver {
    /// Fallback keys under which an external record for `external_key` is retained.
    ///
    /// Item and bare forms share `item-K` and `K`. A `cat-K` record stays under `cat-K`
    /// alone so that only category nodes can ever reach it.
    pub fn resolve(external_key: &str) -> BTreeSet<String> {
        match split_key(external_key) {
            (KeyForm::PrefixedCategory, bare) => [category_key(bare)].into_iter().collect(),
            (_, bare) => [item_key(bare), bare.to_string()].into_iter().collect(),
        }
    }

    /// Lookup keys for a node, highest precedence first
    pub fn candidate_keys(node: &MenuNode) -> Vec<LookupKey> {
        let catalog_key = node.catalog_key();
        let mut keys = vec![
            LookupKey { form: KeyForm::NodeId, key: node.id().to_string() },
            LookupKey { form: KeyForm::PrefixedItem, key: item_key(catalog_key) },
            LookupKey { form: KeyForm::Bare, key: catalog_key.to_string() },
        ];
        if node.is_category() {
            keys.push(LookupKey { form: KeyForm::PrefixedCategory, key: category_key(catalog_key) });
        }
        keys
    }

    /// First candidate key of `node` present in `map`
    pub fn first_match<'m, V>(
        map: &'m BTreeMap<String, V>,
        node: &MenuNode,
    ) -> Option<(LookupKey, &'m V)> {
        Self::candidate_keys(node)
            .into_iter()
            .find_map(|candidate| map.get(&candidate.key).map(|value| (candidate, value)))
    }

    /// Map an externally keyed permission set into node-id space.
    ///
    /// Every node takes the record of its first matching candidate key, so a record for
    /// catalog key `K` lands on all placements of `K`. Keys that match no node are kept
    /// under the fallback forms and reported as unmatched.
    pub fn map_external_permissions(
        external: &ExternalPermissions,
        tree: &MenuTree,
    ) -> CanonicalPermissions {
        let mut canonical = CanonicalPermissions::default();
        if external.is_empty() {
            return canonical;
        }

        let mut consumed: BTreeSet<&str> = BTreeSet::new();
        for node in tree {
            if let Some((candidate, record)) = Self::first_match(external, node) {
                canonical.nodes.insert(node.id().to_string(), *record);
                if let Some((key, _)) = external.get_key_value(&candidate.key) {
                    consumed.insert(key.as_str());
                }
            }
        }

        // Lowest precedence first so higher forms overwrite shared fallback slots
        let mut leftovers: Vec<(KeyForm, &String, &PartialPermissionRecord)> = external
            .iter()
            .filter(|(key, _)| !consumed.contains(key.as_str()))
            .map(|(key, record)| (split_key(key).0, key, record))
            .collect();
        leftovers.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        for (form, key, record) in leftovers {
            if Self::has_placement(key, form, tree) {
                canonical.shadowed.push(key.clone());
                continue;
            }

            log::warn!("Permission key {:?} matches no menu node; keeping it as fallback", key);
            canonical.unmatched.push(key.clone());
            for fallback in Self::resolve(key) {
                canonical.fallback.insert(fallback, *record);
            }
        }
        canonical.unmatched.sort();
        canonical.shadowed.sort();

        log::debug!(
            "Canonicalized {} external keys: {} nodes, {} unmatched, {} shadowed",
            external.len(),
            canonical.nodes.len(),
            canonical.unmatched.len(),
            canonical.shadowed.len()
        );
        canonical
    }

    fn has_placement(key: &str, form: KeyForm, tree: &MenuTree) -> bool {
        if tree.get(key).is_some() {
            return true;
        }
        let (_, bare) = split_key(key);
        match form {
            KeyForm::PrefixedCategory => tree.nodes_for_key(bare).any(|n| n.is_category()),
            _ => tree.nodes_for_key(bare).next().is_some(),
        }
    }
}
