//! Conversion between task records and the engine's JSON export/import form.

use super::record::{Status, TaskRecord};
use crate::config::TaskRc;
use crate::error::{Error, Result};
use crate::fields::{Annotation, FieldCodec, FieldKind, FieldValue, UdaRegistry, format_date, parse_date};
use serde_json::{Map, Value};

/// Attributes with a fixed codec, independent of any taskrc.
pub const CORE_FIELDS: &[&str] = &[
    "annotations",
    "depends",
    "description",
    "due",
    "end",
    "entry",
    "id",
    "imask",
    "mask",
    "modified",
    "parent",
    "project",
    "recur",
    "scheduled",
    "start",
    "status",
    "tags",
    "until",
    "urgency",
    "uuid",
    "wait",
];

/// Computed by the engine; never sent back in modifications.
const READ_ONLY_FIELDS: &[&str] = &["id", "urgency"];

/// Codec for a built-in attribute. `annotations` has its own structured form
/// and returns `None` here.
pub fn core_codec(name: &str) -> Option<FieldCodec> {
    let kind = match name {
        "uuid" | "parent" => FieldKind::Uuid,
        "status" => FieldKind::Choice(Status::ALL.iter().map(|s| s.as_str().to_string()).collect()),
        "description" | "project" | "mask" => FieldKind::String,
        "entry" | "start" | "end" | "due" | "until" | "wait" | "modified" | "scheduled" => {
            FieldKind::Date
        }
        "recur" => FieldKind::Duration,
        "depends" => FieldKind::UuidList,
        "tags" => FieldKind::Array,
        "id" | "urgency" | "imask" => FieldKind::Numeric,
        _ => return None,
    };
    Some(FieldCodec::new(kind))
}

/// Encodes and decodes whole task records.
#[derive(Debug, Clone, Default)]
pub struct TaskCodec {
    registry: UdaRegistry,
}

impl TaskCodec {
    pub fn new(registry: UdaRegistry) -> Self {
        Self { registry }
    }

    /// Codec using the UDAs declared in `taskrc`.
    pub fn from_taskrc(taskrc: &TaskRc) -> Self {
        Self::new(taskrc.udas())
    }

    pub fn registry(&self) -> &UdaRegistry {
        &self.registry
    }

    /// Codec for `name`: built-in first, then the UDA registry.
    ///
    /// `None` means the attribute is passed through untyped.
    pub fn codec_for(&self, name: &str) -> Option<FieldCodec> {
        core_codec(name).or_else(|| self.registry.get(name).cloned())
    }

    /// Decode one exported task object.
    pub fn decode(&self, raw: &Map<String, Value>) -> Result<TaskRecord> {
        let mut record = TaskRecord::empty();
        for (name, value) in raw {
            let decoded = self.decode_value(name, value)?;
            if !decoded.is_absent() {
                record.insert(name, decoded);
            }
        }
        Ok(record)
    }

    /// Decode one task from JSON text.
    pub fn decode_str(&self, json: &str) -> Result<TaskRecord> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => self.decode(&map),
            other => Err(Error::validation("task", other.to_string(), "expected a JSON object")),
        }
    }

    /// Decode the output of `task export`: a JSON array of task objects.
    pub fn decode_export(&self, json: &str) -> Result<Vec<TaskRecord>> {
        let tasks: Vec<Map<String, Value>> = serde_json::from_str(json)?;
        tasks.iter().map(|task| self.decode(task)).collect()
    }

    pub fn decode_value(&self, name: &str, value: &Value) -> Result<FieldValue> {
        if name == "annotations" {
            return decode_annotations(value);
        }
        match self.codec_for(name) {
            Some(codec) => codec.decode_json(name, value),
            None => Ok(decode_opaque(value)),
        }
    }

    /// Encode a record for import. Cleared attributes are left out.
    pub fn encode(&self, record: &TaskRecord) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for (name, value) in record.iter() {
            if let Some(encoded) = self.encode_value(name, value)? {
                out.insert(name.to_string(), encoded);
            }
        }
        Ok(out)
    }

    /// Encode a record as a JSON object string.
    pub fn encode_string(&self, record: &TaskRecord) -> Result<String> {
        Ok(serde_json::to_string(&Value::Object(self.encode(record)?))?)
    }

    pub fn encode_value(&self, name: &str, value: &FieldValue) -> Result<Option<Value>> {
        if value.is_absent() {
            return Ok(None);
        }
        if name == "annotations" {
            return encode_annotations(value).map(Some);
        }
        match self.codec_for(name) {
            Some(codec) => codec.encode_json(name, value),
            None => Ok(encode_opaque(value)),
        }
    }

    /// Text form of one attribute, or `None` when it is cleared.
    pub fn encode_text(&self, name: &str, value: &FieldValue) -> Result<Option<String>> {
        if value.is_absent() {
            return Ok(None);
        }
        match self.codec_for(name) {
            Some(codec) => codec.encode(name, value),
            None => Ok(opaque_text(value)),
        }
    }

    /// Render a record as `key:"value"` arguments for an add/modify command.
    ///
    /// Cleared attributes become the bare `key:` form, which tells the engine
    /// to remove them. Annotations and computed attributes are not included.
    pub fn encode_args(&self, record: &TaskRecord) -> Result<Vec<String>> {
        let mut args = Vec::new();
        for (name, value) in record.iter() {
            if name == "annotations" || READ_ONLY_FIELDS.contains(&name) {
                continue;
            }
            match self.encode_text(name, value)? {
                None => args.push(format!("{}:", name)),
                Some(text) => args.push(format!("{}:\"{}\"", name, super::escape_entities(&text))),
            }
        }
        Ok(args)
    }
}

fn decode_annotations(value: &Value) -> Result<FieldValue> {
    let items = match value {
        Value::Null => return Ok(FieldValue::Absent),
        Value::Array(items) => items,
        other => {
            return Err(Error::validation(
                "annotations",
                other.to_string(),
                "expected a list of annotations",
            ));
        }
    };

    let mut annotations = Vec::with_capacity(items.len());
    for item in items {
        let invalid = |reason: &str| Error::validation("annotations", item.to_string(), reason);
        let entry = match item.get("entry") {
            Some(Value::String(s)) => parse_date(s),
            Some(Value::Number(n)) => n.as_i64().and_then(|s| chrono::DateTime::from_timestamp(s, 0)),
            _ => None,
        }
        .ok_or_else(|| invalid("annotation entry must be a timestamp"))?;
        let description = item
            .get("description")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("annotation needs a description"))?;
        annotations.push(Annotation::new(entry, description));
    }
    Ok(FieldValue::Annotations(annotations))
}

fn encode_annotations(value: &FieldValue) -> Result<Value> {
    let FieldValue::Annotations(list) = value else {
        return Err(Error::validation(
            "annotations",
            value.variant_name(),
            "expected annotations",
        ));
    };
    Ok(Value::Array(
        list.iter()
            .map(|a| {
                let mut obj = Map::new();
                obj.insert("entry".to_string(), Value::String(format_date(&a.entry)));
                obj.insert("description".to_string(), Value::String(a.description.clone()));
                Value::Object(obj)
            })
            .collect(),
    ))
}

/// Untyped attribute: keep the JSON shape as closely as a `FieldValue` allows.
fn decode_opaque(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Absent,
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Number(n) => FieldValue::Number(n.clone()),
        Value::Array(items) if items.iter().all(Value::is_string) => FieldValue::List(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        other => FieldValue::Text(other.to_string()),
    }
}

fn encode_opaque(value: &FieldValue) -> Option<Value> {
    match value {
        FieldValue::Number(n) => Some(Value::Number(n.clone())),
        FieldValue::List(items) => Some(Value::Array(
            items.iter().cloned().map(Value::String).collect(),
        )),
        FieldValue::UuidList(ids) => Some(Value::Array(
            ids.iter().map(|u| Value::String(u.to_string())).collect(),
        )),
        FieldValue::Annotations(_) => encode_annotations(value).ok(),
        other => opaque_text(other).map(Value::String),
    }
}

pub(crate) fn opaque_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Absent => None,
        FieldValue::Text(s) | FieldValue::Duration(s) => Some(s.clone()),
        FieldValue::Number(n) => Some(n.to_string()),
        FieldValue::Date(d) => Some(format_date(d)),
        FieldValue::Uuid(u) => Some(u.to_string()),
        FieldValue::UuidList(ids) => Some(
            ids.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        FieldValue::List(items) => Some(items.join(",")),
        FieldValue::Annotations(list) => Some(
            list.iter()
                .map(|a| a.description.clone())
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}
