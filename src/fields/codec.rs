//! Attribute codecs: validate, decode and encode one attribute type.
//!
//! External values are the engine's text (or its JSON export form); internal
//! values are [`FieldValue`]s. Every codec encodes [`FieldValue::Absent`] to
//! `None`, meaning "omit this attribute".

use super::value::{FieldValue, whole_seconds};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex_lite::Regex;
use serde_json::{Number, Value};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Canonical timestamp layout used by the engine.
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:\d+Y)?(?:\d+M)?(?:\d+W)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?$",
    )
    .expect("valid ISO duration pattern")
});

static NAMED_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[-+]?(?:\d+(?:\.\d+)?)?\s*(?:annual|biannual|bimonthly|biweekly|biyearly|daily|days|day|d|fortnight|hourly|hours|hour|hrs|hr|h|minutes|minute|mins|min|monthly|months|month|mnths|mths|mth|mo|quarterly|quarters|quarter|qrtrs|qtrs|qtr|q|seconds|second|secs|sec|s|semiannual|sennight|weekdays|weekly|weeks|week|wks|wk|w|yearly|years|year|yrs|yr|y)$",
    )
    .expect("valid named duration pattern")
});

/// The closed set of attribute types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Numeric,
    Date,
    Duration,
    /// Text restricted to an enumerated set
    Choice(Vec<String>),
    Uuid,
    /// Comma-joined UUIDs
    UuidList,
    /// Comma-joined strings
    Array,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Numeric => "numeric",
            FieldKind::Date => "date",
            FieldKind::Duration => "duration",
            FieldKind::Choice(_) => "choice",
            FieldKind::Uuid => "uuid",
            FieldKind::UuidList => "uuid list",
            FieldKind::Array => "array",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Choice(values) => write!(f, "choice({})", values.join(",")),
            other => f.write_str(other.name()),
        }
    }
}

/// Codec for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCodec {
    kind: FieldKind,
    label: Option<String>,
}

impl FieldCodec {
    pub fn new(kind: FieldKind) -> Self {
        Self { kind, label: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn choice<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(FieldKind::Choice(values.into_iter().map(Into::into).collect()))
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Decode external text into a native value.
    pub fn decode(&self, attribute: &str, raw: &str) -> Result<FieldValue> {
        let invalid = |reason: &str| Error::validation(attribute, raw, reason);
        match &self.kind {
            FieldKind::String => Ok(FieldValue::Text(strip_nul(raw))),
            FieldKind::Numeric => parse_number(raw)
                .map(FieldValue::Number)
                .ok_or_else(|| invalid("not a number")),
            FieldKind::Date => parse_date(raw)
                .map(FieldValue::Date)
                .ok_or_else(|| invalid("not a timestamp (expected YYYYMMDDTHHMMSSZ, epoch seconds or RFC 3339)")),
            FieldKind::Duration => {
                let trimmed = raw.trim();
                if is_duration(trimmed) {
                    Ok(FieldValue::Duration(trimmed.to_string()))
                } else {
                    Err(invalid("not a duration"))
                }
            }
            FieldKind::Choice(values) => {
                if values.iter().any(|v| v == raw) {
                    Ok(FieldValue::Text(raw.to_string()))
                } else {
                    Err(invalid(&format!("not one of {}", values.join(", "))))
                }
            }
            FieldKind::Uuid => Uuid::parse_str(raw.trim())
                .map(FieldValue::Uuid)
                .map_err(|e| invalid(&e.to_string())),
            FieldKind::UuidList => split_list(raw)
                .map(|item| Uuid::parse_str(item).map_err(|e| Error::validation(attribute, item, e.to_string())))
                .collect::<Result<Vec<_>>>()
                .map(FieldValue::UuidList),
            FieldKind::Array => Ok(FieldValue::List(
                split_list(raw).map(str::to_string).collect(),
            )),
        }
    }

    /// Encode a native value into external text.
    ///
    /// `Ok(None)` means the attribute must be omitted.
    pub fn encode(&self, attribute: &str, value: &FieldValue) -> Result<Option<String>> {
        let value = self.coerce(attribute, value)?;
        Ok(match value {
            FieldValue::Absent => None,
            FieldValue::Text(s) | FieldValue::Duration(s) => Some(s),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Date(d) => Some(format_date(&d)),
            FieldValue::Uuid(u) => Some(u.to_string()),
            FieldValue::UuidList(ids) => Some(
                ids.iter()
                    .map(Uuid::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            FieldValue::List(items) => Some(items.join(",")),
            FieldValue::Annotations(_) => None,
        })
    }

    /// Check that `value` is acceptable for this codec.
    pub fn validate(&self, attribute: &str, value: &FieldValue) -> Result<()> {
        self.coerce(attribute, value).map(|_| ())
    }

    /// Decode a value from the engine's JSON export.
    pub fn decode_json(&self, attribute: &str, raw: &Value) -> Result<FieldValue> {
        match (raw, &self.kind) {
            (Value::Null, _) => Ok(FieldValue::Absent),
            (Value::String(s), _) => self.decode(attribute, s),
            (Value::Number(n), FieldKind::Numeric) => Ok(FieldValue::Number(n.clone())),
            (Value::Array(items), FieldKind::UuidList | FieldKind::Array) => {
                let mut texts = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => texts.push(s.as_str()),
                        other => {
                            return Err(Error::validation(
                                attribute,
                                other.to_string(),
                                "list items must be strings",
                            ));
                        }
                    }
                }
                self.decode(attribute, &texts.join(","))
            }
            (Value::Number(_) | Value::Bool(_), _) => self.decode(attribute, &raw.to_string()),
            (other, kind) => Err(Error::validation(
                attribute,
                other.to_string(),
                format!("cannot decode into {}", kind.name()),
            )),
        }
    }

    /// Encode a value into the engine's JSON import form.
    ///
    /// Numbers stay numbers and lists stay arrays; everything else is a string.
    pub fn encode_json(&self, attribute: &str, value: &FieldValue) -> Result<Option<Value>> {
        let value = self.coerce(attribute, value)?;
        Ok(match value {
            FieldValue::Absent => None,
            FieldValue::Number(n) => Some(Value::Number(n)),
            FieldValue::UuidList(ids) => Some(Value::Array(
                ids.iter().map(|u| Value::String(u.to_string())).collect(),
            )),
            FieldValue::List(items) => Some(Value::Array(
                items.into_iter().map(Value::String).collect(),
            )),
            other => self
                .encode(attribute, &other)?
                .map(Value::String),
        })
    }

    /// Bring `value` into the canonical variant for this codec.
    ///
    /// Text is decoded, so callers may pass `"20110101T000000Z"` for a date.
    fn coerce(&self, attribute: &str, value: &FieldValue) -> Result<FieldValue> {
        if value.is_absent() {
            return Ok(FieldValue::Absent);
        }
        let mismatch = || {
            Error::validation(
                attribute,
                describe(value),
                format!("expected {} value, got {}", self.kind.name(), value.variant_name()),
            )
        };

        match (&self.kind, value) {
            (_, FieldValue::Text(s)) => self.decode(attribute, s),
            (FieldKind::String, FieldValue::Number(n)) => Ok(FieldValue::Text(n.to_string())),
            (FieldKind::String, FieldValue::Date(d)) => Ok(FieldValue::Text(format_date(d))),
            (FieldKind::String, FieldValue::Uuid(u)) => Ok(FieldValue::Text(u.to_string())),
            (FieldKind::String | FieldKind::Duration, FieldValue::Duration(s)) => {
                self.decode(attribute, s)
            }
            (FieldKind::Date, FieldValue::Date(d)) if d.timestamp_subsec_nanos() != 0 => {
                Err(Error::validation(
                    attribute,
                    d.to_rfc3339(),
                    "dates are stored in whole seconds",
                ))
            }
            (FieldKind::Array, FieldValue::List(items)) => {
                check_list_items(attribute, items)?;
                Ok(value.clone())
            }
            (FieldKind::Numeric, FieldValue::Number(_))
            | (FieldKind::Date, FieldValue::Date(_))
            | (FieldKind::Uuid, FieldValue::Uuid(_))
            | (FieldKind::UuidList, FieldValue::UuidList(_)) => Ok(value.clone()),
            (FieldKind::UuidList, FieldValue::List(items)) => {
                check_list_items(attribute, items)?;
                self.decode(attribute, &items.join(","))
            }
            (FieldKind::UuidList, FieldValue::Uuid(u)) => Ok(FieldValue::UuidList(vec![*u])),
            _ => Err(mismatch()),
        }
    }
}

/// Format an instant in the engine's canonical layout.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse the engine's timestamp forms into a UTC instant.
///
/// Accepts `YYYYMMDDTHHMMSSZ`, integer epoch seconds and RFC 3339.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| whole_seconds(d.with_timezone(&Utc)))
}

/// Integers first, then finite floats.
pub fn parse_number(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Number::from(i));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

pub fn is_duration(raw: &str) -> bool {
    let iso = raw.len() > 1 && !raw.ends_with('T') && ISO_DURATION.is_match(raw);
    iso || NAMED_DURATION.is_match(raw)
}

/// Drop NUL characters, which the engine cannot store.
pub fn strip_nul(raw: &str) -> String {
    raw.chars().filter(|c| *c != '\0').collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// List items must survive the comma-joined text form unchanged.
fn check_list_items(attribute: &str, items: &[String]) -> Result<()> {
    for item in items {
        let reason = if item.is_empty() {
            "list items cannot be empty"
        } else if item.contains(',') {
            "list items cannot contain ','"
        } else if item.trim() != item {
            "list items cannot start or end with whitespace"
        } else {
            continue;
        };
        return Err(Error::validation(attribute, item.as_str(), reason));
    }
    Ok(())
}

fn describe(value: &FieldValue) -> String {
    match value {
        FieldValue::Absent => String::new(),
        FieldValue::Text(s) | FieldValue::Duration(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Date(d) => format_date(d),
        FieldValue::Uuid(u) => u.to_string(),
        FieldValue::UuidList(ids) => format!("{:?}", ids),
        FieldValue::List(items) => items.join(","),
        FieldValue::Annotations(a) => format!("{} annotation(s)", a.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn codec(kind: FieldKind) -> FieldCodec {
        FieldCodec::new(kind)
    }

    #[test]
    fn test_string_round_trip_and_empty_is_not_absent() {
        let c = FieldCodec::string();
        let v = c.decode("somestring", "this is a uda").unwrap();
        assert_eq!(c.encode("somestring", &v).unwrap().as_deref(), Some("this is a uda"));
        assert_eq!(c.encode("somestring", &FieldValue::from("")).unwrap().as_deref(), Some(""));
        assert_eq!(c.encode("somestring", &FieldValue::Absent).unwrap(), None);
    }

    #[test]
    fn test_string_drops_nul() {
        let c = FieldCodec::string();
        assert_eq!(
            c.decode("description", "foo\0bar").unwrap(),
            FieldValue::from("foobar")
        );
        assert_eq!(
            c.encode("description", &FieldValue::from("foo\0bar")).unwrap().as_deref(),
            Some("foobar")
        );
    }

    #[test]
    fn test_numeric() {
        let c = codec(FieldKind::Numeric);
        assert_eq!(c.decode("n", "15").unwrap(), FieldValue::from(15));
        assert_eq!(c.encode("n", &FieldValue::from(15)).unwrap().as_deref(), Some("15"));
        assert_eq!(c.encode("n", &FieldValue::number(2.5).unwrap()).unwrap().as_deref(), Some("2.5"));
        assert_eq!(c.encode("n", &FieldValue::from("7")).unwrap().as_deref(), Some("7"));
        assert_eq!(c.encode("n", &FieldValue::Absent).unwrap(), None);

        match c.decode("somenumber", "fifteen") {
            Err(Error::Validation { attribute, value, .. }) => {
                assert_eq!(attribute, "somenumber");
                assert_eq!(value, "fifteen");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(c.decode("n", "NaN").is_err());
    }

    #[test]
    fn test_date_shapes_agree() {
        let c = codec(FieldKind::Date);
        let from_text = c.decode("entry", "20110101T000000Z").unwrap();
        let from_calendar = FieldValue::from(Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(from_text, from_calendar);

        let eastern = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2010, 12, 31, 19, 0, 0)
            .unwrap();
        assert_eq!(
            c.encode("entry", &FieldValue::from(eastern)).unwrap().as_deref(),
            Some("20110101T000000Z")
        );
    }

    #[test]
    fn test_date_accepts_epoch_and_rfc3339() {
        let c = codec(FieldKind::Date);
        assert_eq!(
            c.decode("entry", "1325011643").unwrap(),
            FieldValue::Date(Utc.timestamp_opt(1325011643, 0).unwrap())
        );
        assert_eq!(
            c.decode("due", "2011-01-01T01:00:00+01:00").unwrap(),
            c.decode("due", "20110101T000000Z").unwrap()
        );
        assert!(c.decode("due", "tomorrow").is_err());
        assert!(c.decode("due", "").is_err());
    }

    #[test]
    fn test_date_text_is_canonicalized() {
        let c = codec(FieldKind::Date);
        assert_eq!(
            c.encode("entry", &FieldValue::from("1293840000")).unwrap().as_deref(),
            Some("20110101T000000Z")
        );
    }

    #[test]
    fn test_duration() {
        let c = codec(FieldKind::Duration);
        for ok in ["P1W", "PT1H30M", "P1Y2M3DT4H5M6S", "weekly", "3d", "2 weeks", "-1w"] {
            assert!(c.decode("recur", ok).is_ok(), "{} should be a duration", ok);
        }
        for bad in ["P", "PT", "sometimes", "3", "1 fortnights"] {
            assert!(c.decode("recur", bad).is_err(), "{} should not be a duration", bad);
        }
        assert_eq!(
            c.encode("recur", &FieldValue::from("weekly")).unwrap().as_deref(),
            Some("weekly")
        );
    }

    #[test]
    fn test_choice() {
        let c = FieldCodec::choice(["H", "M", "L"]);
        assert_eq!(c.decode("priority", "H").unwrap(), FieldValue::from("H"));
        assert_eq!(c.encode("priority", &FieldValue::from("L")).unwrap().as_deref(), Some("L"));
        assert!(c.decode("priority", "X").is_err());
        assert!(c.encode("priority", &FieldValue::from("X")).is_err());
        assert_eq!(c.encode("priority", &FieldValue::Absent).unwrap(), None);
    }

    #[test]
    fn test_uuid_shape_only() {
        let c = codec(FieldKind::Uuid);
        let raw = "c1c431ea-f0dc-4683-9a20-e64fcfa65fd1";
        let v = c.decode("uuid", raw).unwrap();
        assert_eq!(c.encode("uuid", &v).unwrap().as_deref(), Some(raw));
        assert!(c.decode("uuid", "1234-1234").is_err());
    }

    #[test]
    fn test_uuid_list() {
        let c = codec(FieldKind::UuidList);
        let a = "c1c431ea-f0dc-4683-9a20-e64fcfa65fd1";
        let b = "9e0c0d55-0e5c-4b8d-9f40-3c0b0bd5a3c2";
        let v = c.decode("depends", &format!("{},{}", a, b)).unwrap();
        assert_eq!(
            c.encode("depends", &v).unwrap().unwrap(),
            format!("{},{}", a, b)
        );
        assert_eq!(
            c.encode_json("depends", &v).unwrap().unwrap(),
            json!([a, b])
        );
        assert!(c.decode("depends", "c1c431ea,nope").is_err());
        assert_eq!(c.decode("depends", "").unwrap(), FieldValue::UuidList(vec![]));
    }

    #[test]
    fn test_array() {
        let c = codec(FieldKind::Array);
        let v = c.decode("tags", "home,garden").unwrap();
        assert_eq!(v, FieldValue::List(vec!["home".into(), "garden".into()]));
        assert_eq!(c.encode("tags", &v).unwrap().as_deref(), Some("home,garden"));
        assert_eq!(
            c.decode_json("tags", &json!(["home", "garden"])).unwrap(),
            v
        );
        assert!(c.decode_json("tags", &json!([1, 2])).is_err());
    }

    #[test]
    fn test_array_rejects_items_that_cannot_round_trip() {
        let c = codec(FieldKind::Array);
        for bad in ["a,b", " padded ", ""] {
            let v = FieldValue::List(vec!["ok".into(), bad.into()]);
            match c.encode("tags", &v).unwrap_err() {
                Error::Validation { attribute, value, .. } => {
                    assert_eq!(attribute, "tags");
                    assert_eq!(value, bad);
                }
                other => panic!("expected Validation, got {other:?}"),
            }
            assert!(c.encode_json("tags", &v).is_err());
        }

        let v = FieldValue::List(vec!["home".into(), "two words".into()]);
        let text = c.encode("tags", &v).unwrap().unwrap();
        assert_eq!(c.decode("tags", &text).unwrap(), v);
    }

    #[test]
    fn test_uuid_list_from_strings_checks_items() {
        let c = codec(FieldKind::UuidList);
        let a = "c1c431ea-f0dc-4683-9a20-e64fcfa65fd1";
        let b = "9e0c0d55-0e5c-4b8d-9f40-3c0b0bd5a3c2";
        let joined = FieldValue::List(vec![format!("{},{}", a, b)]);
        assert!(c.encode("depends", &joined).is_err());
        let split = FieldValue::List(vec![a.to_string(), b.to_string()]);
        assert_eq!(
            c.encode("depends", &split).unwrap().unwrap(),
            format!("{},{}", a, b)
        );
    }

    #[test]
    fn test_date_round_trip_keeps_the_instant() {
        let c = codec(FieldKind::Date);
        let v = FieldValue::from(Utc.timestamp_opt(1293840000, 500_000_000).unwrap());
        let text = c.encode("due", &v).unwrap().unwrap();
        assert_eq!(c.decode("due", &text).unwrap(), v);

        let precise = FieldValue::Date(Utc.timestamp_opt(1293840000, 500_000_000).unwrap());
        let err = c.encode("due", &precise).unwrap_err();
        assert!(matches!(err, Error::Validation { ref attribute, .. } if attribute == "due"));

        assert_eq!(
            c.decode("due", "2011-01-01T00:00:00.750Z").unwrap(),
            FieldValue::Date(Utc.timestamp_opt(1293840000, 0).unwrap())
        );
    }

    #[test]
    fn test_decode_json_scalars() {
        assert_eq!(
            codec(FieldKind::Numeric).decode_json("urgency", &json!(4.9)).unwrap(),
            FieldValue::number(4.9).unwrap()
        );
        assert_eq!(
            codec(FieldKind::Date).decode_json("entry", &json!(1325011643)).unwrap(),
            FieldValue::Date(Utc.timestamp_opt(1325011643, 0).unwrap())
        );
        assert_eq!(
            FieldCodec::string().decode_json("x", &Value::Null).unwrap(),
            FieldValue::Absent
        );
        assert!(FieldCodec::string().decode_json("x", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_encode_json_keeps_numbers() {
        let c = codec(FieldKind::Numeric);
        assert_eq!(c.encode_json("n", &FieldValue::from(15)).unwrap(), Some(json!(15)));
        assert_eq!(c.encode_json("n", &FieldValue::Absent).unwrap(), None);
    }

    #[test]
    fn test_kind_mismatch_is_validation_error() {
        let err = codec(FieldKind::Date)
            .encode("due", &FieldValue::from(15))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref attribute, .. } if attribute == "due"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FieldKind::Numeric.to_string(), "numeric");
        assert_eq!(
            FieldKind::Choice(vec!["H".into(), "L".into()]).to_string(),
            "choice(H,L)"
        );
    }
}
