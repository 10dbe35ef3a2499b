//! Legacy data-file lines: `[key:"value" key:"value" ...]`.
//!
//! Values use entity escapes for the characters that delimit the format, and
//! dates are stored as epoch seconds. Annotations are spread over
//! `annotation_<epoch>` keys.

use super::codec::{TaskCodec, opaque_text};
use super::record::TaskRecord;
use crate::error::{Error, Result};
use crate::fields::{Annotation, FieldKind, FieldValue, parse_date};
use chrono::DateTime;
use regex_lite::Regex;
use std::sync::LazyLock;

static PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+):"([^"]*)""#).expect("valid data line pattern"));

const ANNOTATION_PREFIX: &str = "annotation_";

/// Escape sequences, applied in order when encoding and reversed when decoding.
const ENTITIES: &[(&str, &str)] = &[("\"", "&dquot;"), ("[", "&open;"), ("]", "&close;")];

/// Replace `"`, `[` and `]` with the engine's entity escapes.
pub fn escape_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (raw, entity)| acc.replace(raw, entity))
}

/// Undo [`escape_entities`].
pub fn unescape_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (raw, entity)| acc.replace(entity, raw))
}

impl TaskCodec {
    /// Decode one data-file line.
    pub fn decode_line(&self, line: &str) -> Result<TaskRecord> {
        let body = line.trim();
        let body = body
            .strip_prefix('[')
            .and_then(|b| b.strip_suffix(']'))
            .ok_or_else(|| Error::validation("task", line, "data line must be wrapped in [ ]"))?;

        let mut record = TaskRecord::empty();
        let mut annotations = Vec::new();

        for caps in PAIR.captures_iter(body) {
            let key = &caps[1];
            let value = unescape_entities(&caps[2]);

            if let Some(stamp) = key.strip_prefix(ANNOTATION_PREFIX) {
                let entry = stamp
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .ok_or_else(|| Error::validation(key, stamp, "annotation key needs epoch seconds"))?;
                annotations.push(Annotation::new(entry, value));
                continue;
            }

            let decoded = match self.codec_for(key) {
                Some(codec) => codec.decode(key, &value)?,
                None => FieldValue::Text(value),
            };
            record.insert(key, decoded);
        }

        if !annotations.is_empty() {
            annotations.sort_by_key(|a| a.entry);
            record.insert("annotations", FieldValue::Annotations(annotations));
        }
        Ok(record)
    }

    /// Encode a record as one data-file line (without trailing newline).
    pub fn encode_line(&self, record: &TaskRecord) -> Result<String> {
        let mut pairs: Vec<(String, String)> = Vec::new();

        for (name, value) in record.iter() {
            if value.is_absent() {
                continue;
            }
            if let FieldValue::Annotations(list) = value {
                for annotation in list {
                    pairs.push((
                        format!("{}{}", ANNOTATION_PREFIX, annotation.entry.timestamp()),
                        annotation.description.clone(),
                    ));
                }
                continue;
            }

            let text = match self.codec_for(name) {
                Some(codec) if codec.kind() == &FieldKind::Date => codec
                    .encode(name, value)?
                    .and_then(|t| parse_date(&t))
                    .map(|d| d.timestamp().to_string()),
                Some(codec) => codec.encode(name, value)?,
                None => opaque_text(value),
            };
            if let Some(text) = text {
                pairs.push((name.to_string(), text));
            }
        }

        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{}:\"{}\"", k, escape_entities(v)))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(format!("[{}]", body))
    }
}
