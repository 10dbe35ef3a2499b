//! User-defined attribute registry derived from the `uda.*` subtree.

use super::codec::{FieldCodec, FieldKind};
use crate::config::{ConfigTree, ConfigValue};
use std::collections::BTreeMap;
use tracing::debug;

/// Map a declared `uda.<name>.type` to a codec kind.
///
/// Unknown types degrade to `String` so newer rc files still load.
pub fn kind_for_type(type_name: &str) -> FieldKind {
    match type_name.trim() {
        "string" | "" => FieldKind::String,
        "numeric" => FieldKind::Numeric,
        "date" => FieldKind::Date,
        "duration" => FieldKind::Duration,
        other => {
            debug!("Unknown UDA type '{}', treating as string", other);
            FieldKind::String
        }
    }
}

/// Codecs for every user-defined attribute, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UdaRegistry {
    fields: BTreeMap<String, FieldCodec>,
}

impl UdaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a merged taskrc tree.
    ///
    /// For each `uda.<name>`: `type` picks the codec (default string),
    /// `label` sets the display label, and a non-empty comma-separated
    /// `values` forces a choice codec regardless of `type`.
    pub fn from_config(config: &ConfigTree) -> Self {
        let Some(udas) = config.subtree("uda") else {
            return Self::new();
        };

        let mut fields = BTreeMap::new();
        for (name, node) in udas.iter() {
            let codec = match node {
                ConfigValue::Tree(def) => codec_from_definition(def),
                // `uda.name = x` carries no definition.
                ConfigValue::Scalar(_) => FieldCodec::string(),
            };
            fields.insert(name.to_string(), codec);
        }
        Self { fields }
    }

    /// Add or replace one attribute.
    pub fn with_field(mut self, name: impl Into<String>, codec: FieldCodec) -> Self {
        self.fields.insert(name.into(), codec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldCodec> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldCodec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn codec_from_definition(def: &ConfigTree) -> FieldCodec {
    let kind = match def.get_path("values").filter(|v| !v.is_empty()) {
        Some(values) => FieldKind::Choice(values.split(',').map(|v| v.trim().to_string()).collect()),
        None => kind_for_type(def.get_path("type").unwrap_or("string")),
    };
    let codec = FieldCodec::new(kind);
    match def.get_path("label").filter(|l| !l.is_empty()) {
        Some(label) => codec.with_label(label),
        None => codec,
    }
}
