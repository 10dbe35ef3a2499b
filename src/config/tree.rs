//! Immutable nested key tree produced by the taskrc parser.
//!
//! A `ConfigTree` maps each key segment to either a scalar string or a nested
//! tree. Trees are assembled through [`TreeBuilder`] and frozen; the public
//! type exposes no way to change its contents, and the mutator-shaped methods
//! (`set`, `remove`, `update`) always fail with [`Error::ImmutableMutation`].

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A node in the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(String),
    Tree(ConfigTree),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(s) => Some(s),
            ConfigValue::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            ConfigValue::Tree(t) => Some(t),
            ConfigValue::Scalar(_) => None,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, ConfigValue::Tree(_))
    }
}

/// Read-only view of a merged taskrc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigTree {
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from dotted `key = value` pairs, applied in order.
    ///
    /// ```
    /// use taskw::config::ConfigTree;
    ///
    /// let tree = ConfigTree::from_pairs([("data.location", "/tmp/tasks")]);
    /// assert_eq!(tree.get_path("data.location"), Some("/tmp/tasks"));
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = TreeBuilder::new();
        for (key, value) in pairs {
            builder.set_dotted(key.as_ref(), value.into());
        }
        builder.freeze()
    }

    /// Build a tree from a loose JSON object.
    ///
    /// Object keys containing dots are split into path segments, nested objects
    /// become subtrees, `null` entries are skipped, and any other value is
    /// stored as its string form.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::validation(
                "overrides",
                value.to_string(),
                "config overrides must be a JSON object",
            ));
        };
        let mut builder = TreeBuilder::new();
        for (key, value) in map {
            builder.set_json(key, value);
        }
        Ok(builder.freeze())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Scalar at a dotted path, if the path ends in a scalar.
    pub fn get_path(&self, dotted: &str) -> Option<&str> {
        self.lookup(dotted).and_then(ConfigValue::as_str)
    }

    /// Subtree at a dotted path, if the path ends in a tree.
    pub fn subtree(&self, dotted: &str) -> Option<&ConfigTree> {
        self.lookup(dotted).and_then(ConfigValue::as_tree)
    }

    /// Node at a dotted path.
    pub fn lookup(&self, dotted: &str) -> Option<&ConfigValue> {
        let mut parts = dotted.split('.');
        let mut node = self.entries.get(parts.next()?)?;
        for part in parts {
            node = node.as_tree()?.entries.get(part)?;
        }
        Some(node)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten back into dotted `key=value` pairs, sorted by key.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        flatten_into(self, "", &mut out);
        out
    }

    /// Always fails: built trees cannot be written to.
    pub fn set(&self, key: &str, _value: impl Into<String>) -> Result<()> {
        Err(Error::immutable("set", key))
    }

    /// Always fails: built trees cannot be written to.
    pub fn remove(&self, key: &str) -> Result<()> {
        Err(Error::immutable("remove", key))
    }

    /// Always fails: built trees cannot be written to.
    pub fn update(&self, other: &ConfigTree) -> Result<()> {
        let key = other.keys().next().unwrap_or_default().to_string();
        Err(Error::immutable("update", key))
    }

    pub(crate) fn into_builder(self) -> TreeBuilder {
        TreeBuilder {
            entries: self.entries,
        }
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, ConfigValue> {
        self.entries
    }

    pub(crate) fn from_entries(entries: BTreeMap<String, ConfigValue>) -> Self {
        Self { entries }
    }
}

fn flatten_into(tree: &ConfigTree, prefix: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in &tree.entries {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            ConfigValue::Scalar(s) => out.push((full, s.clone())),
            ConfigValue::Tree(t) => flatten_into(t, &full, out),
        }
    }
}

/// Mutable staging area used while a tree is being parsed and merged.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    entries: BTreeMap<String, ConfigValue>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Set `a.b.c = value`, creating intermediate trees and replacing any
    /// scalar that sits where a tree is needed.
    pub(crate) fn set_dotted(&mut self, dotted: &str, value: String) {
        let parts: Vec<&str> = dotted.split('.').collect();
        set_path(&mut self.entries, &parts, ConfigValue::Scalar(value));
    }

    fn set_json(&mut self, key: &str, value: &Value) {
        let parts: Vec<&str> = key.split('.').collect();
        let node = match value {
            // null means "not specified"
            Value::Null => return,
            Value::Object(map) => {
                let mut child = TreeBuilder::new();
                for (k, v) in map {
                    child.set_json(k, v);
                }
                ConfigValue::Tree(child.freeze())
            }
            Value::String(s) => ConfigValue::Scalar(s.clone()),
            other => ConfigValue::Scalar(other.to_string()),
        };
        set_path(&mut self.entries, &parts, node);
    }

    pub(crate) fn freeze(self) -> ConfigTree {
        ConfigTree {
            entries: self.entries,
        }
    }
}

fn set_path(entries: &mut BTreeMap<String, ConfigValue>, parts: &[&str], value: ConfigValue) {
    let Some((last, parents)) = parts.split_last() else {
        return;
    };
    let mut cursor = entries;
    for part in parents {
        let slot = cursor
            .entry((*part).to_string())
            .or_insert_with(|| ConfigValue::Tree(ConfigTree::new()));
        // A scalar cannot also hold children; the subtree wins.
        if !slot.is_tree() {
            *slot = ConfigValue::Tree(ConfigTree::new());
        }
        let ConfigValue::Tree(tree) = slot else {
            return;
        };
        cursor = &mut tree.entries;
    }
    cursor.insert((*last).to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_key_builds_nested_trees() {
        let tree = ConfigTree::from_pairs([("a.b.c", "v")]);
        let a = tree.get("a").and_then(ConfigValue::as_tree).unwrap();
        let b = a.get("b").unwrap();
        assert!(b.is_tree());
        assert_eq!(b.as_tree().unwrap().get("c").unwrap().as_str(), Some("v"));
        assert_eq!(tree.get_path("a.b.c"), Some("v"));
    }

    #[test]
    fn test_later_subkey_replaces_scalar() {
        let tree = ConfigTree::from_pairs([("x", "1"), ("x.y", "2")]);
        assert_eq!(tree.subtree("x").unwrap(), &ConfigTree::from_pairs([("y", "2")]));
    }

    #[test]
    fn test_later_scalar_replaces_subtree() {
        let tree = ConfigTree::from_pairs([("color.header", "red"), ("color", "on")]);
        assert_eq!(tree.get_path("color"), Some("on"));
        assert!(tree.subtree("color").is_none());
    }

    #[test]
    fn test_mutators_fail_and_leave_tree_unchanged() {
        let tree = ConfigTree::from_pairs([("data.location", "/tmp")]);
        let before = tree.clone();

        assert!(matches!(
            tree.set("data.location", "/elsewhere"),
            Err(Error::ImmutableMutation { operation: "set", .. })
        ));
        assert!(matches!(
            tree.remove("data"),
            Err(Error::ImmutableMutation { operation: "remove", .. })
        ));
        assert!(matches!(
            tree.update(&ConfigTree::from_pairs([("a", "b")])),
            Err(Error::ImmutableMutation { operation: "update", .. })
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_from_json_splits_dotted_keys() {
        let tree = ConfigTree::from_json(&json!({
            "data.location": "/tmp/data",
            "uda": {"someurl": {"label": "Some URL", "type": "string"}},
            "verbose": false
        }))
        .unwrap();
        assert_eq!(tree.get_path("data.location"), Some("/tmp/data"));
        assert_eq!(tree.get_path("uda.someurl.label"), Some("Some URL"));
        assert_eq!(tree.get_path("verbose"), Some("false"));
    }

    #[test]
    fn test_from_json_skips_nulls() {
        let tree = ConfigTree::from_json(&json!({
            "data.location": null,
            "uda": {"someurl": {"label": null, "type": "string"}}
        }))
        .unwrap();
        assert!(tree.lookup("data.location").is_none());
        assert!(tree.lookup("uda.someurl.label").is_none());
        assert_eq!(tree.get_path("uda.someurl.type"), Some("string"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(ConfigTree::from_json(&json!(["a"])).is_err());
    }

    #[test]
    fn test_flatten_round_trip() {
        let pairs = vec![
            ("data.location".to_string(), "/tmp".to_string()),
            ("uda.estimate.type".to_string(), "numeric".to_string()),
        ];
        let tree = ConfigTree::from_pairs(pairs.clone());
        assert_eq!(tree.flatten(), pairs);
    }

    #[test]
    fn test_serializes_as_nested_object() {
        let tree = ConfigTree::from_pairs([("a.b", "1"), ("c", "2")]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"a": {"b": "1"}, "c": "2"})
        );
    }
}
