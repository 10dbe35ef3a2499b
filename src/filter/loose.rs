//! Adapter for the loose JSON filter shape.
//!
//! ```json
//! {
//!   "description.contains": "foo",
//!   "and": [["description", "foobar1"]],
//!   "or": [["status", "pending"], {"status": "waiting"}]
//! }
//! ```
//!
//! Top-level keys are read in document order. `and`/`or` take a list whose
//! members are `[key, value]` pairs, objects (each key a condition, or a
//! nested `and`/`or`) or nested lists.

use super::{Filter, FilterExpr, Junction};
use crate::error::{Error, Result};
use crate::fields::FieldValue;
use serde_json::{Map, Value};

impl Filter {
    /// Build a filter from the loose JSON shape.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_filter("filter must be a JSON object"))?;
        Ok(object_terms(object)?.into_iter().collect())
    }

    /// Parse and convert a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

fn object_terms(object: &Map<String, Value>) -> Result<Vec<FilterExpr>> {
    object
        .iter()
        .map(|(key, value)| match Junction::from_key(key) {
            Some(junction) => group(junction, value),
            None => Ok(FilterExpr::leaf(key, leaf_value(key, value)?)),
        })
        .collect()
}

fn group(junction: Junction, value: &Value) -> Result<FilterExpr> {
    let items = value.as_array().ok_or_else(|| {
        Error::invalid_filter(format!("'{}' must hold a list of conditions", junction))
    })?;
    let members = items
        .iter()
        .map(|item| member(junction, item))
        .collect::<Result<Vec<_>>>()?;
    Ok(FilterExpr::Group { junction, members })
}

fn member(junction: Junction, item: &Value) -> Result<FilterExpr> {
    match item {
        Value::Array(pair) if pair.len() == 2 && pair[0].is_string() => {
            let key = pair[0].as_str().unwrap_or_default();
            Ok(FilterExpr::leaf(key, leaf_value(key, &pair[1])?))
        }
        Value::Array(_) => group(junction, item),
        Value::Object(object) => {
            let mut terms = object_terms(object)?;
            if terms.len() == 1 {
                Ok(terms.remove(0))
            } else {
                Ok(FilterExpr::all(terms))
            }
        }
        other => Err(Error::invalid_filter(format!(
            "unsupported '{}' member: {}",
            junction, other
        ))),
    }
}

fn leaf_value(key: &str, value: &Value) -> Result<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Absent),
        Value::String(s) => Ok(FieldValue::Text(s.clone())),
        Value::Number(n) => Ok(FieldValue::Number(n.clone())),
        Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::invalid_filter(format!("{} list values must be strings", key))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(FieldValue::List),
        Value::Object(_) => Err(Error::invalid_filter(format!(
            "{} cannot take an object value",
            key
        ))),
    }
}
