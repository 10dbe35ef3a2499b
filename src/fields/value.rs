//! Native attribute values.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike, Utc};
use serde_json::Number;
use uuid::Uuid;

/// A typed attribute value.
///
/// `Absent` is the "no value" sentinel: encoding it removes the attribute
/// instead of writing an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Number(Number),
    /// Canonical UTC instant, in whole seconds
    Date(DateTime<Utc>),
    /// Validated duration text, e.g. `P1W` or `weekly`
    Duration(String),
    Uuid(Uuid),
    UuidList(Vec<Uuid>),
    List(Vec<String>),
    Annotations(Vec<Annotation>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Duration(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            FieldValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Float value, for finite floats only.
    pub fn number(value: f64) -> Option<Self> {
        Number::from_f64(value).map(FieldValue::Number)
    }

    /// Interpret a naive date-time in the system time zone.
    ///
    /// Times that fall in a DST gap are taken as UTC.
    pub fn local(naive: NaiveDateTime) -> Self {
        let instant = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc());
        FieldValue::Date(whole_seconds(instant))
    }

    /// Short variant name used in error messages.
    pub fn variant_name(&self) -> &'static str {
        match self {
            FieldValue::Absent => "absent",
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Date(_) => "date",
            FieldValue::Duration(_) => "duration",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::UuidList(_) => "uuid list",
            FieldValue::List(_) => "list",
            FieldValue::Annotations(_) => "annotations",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FieldValue {
    fn from(value: DateTime<Tz>) -> Self {
        FieldValue::Date(whole_seconds(value.with_timezone(&Utc)))
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<Vec<Uuid>> for FieldValue {
    fn from(value: Vec<Uuid>) -> Self {
        FieldValue::UuidList(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Vec<Annotation>> for FieldValue {
    fn from(value: Vec<Annotation>) -> Self {
        FieldValue::Annotations(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Absent, Into::into)
    }
}

/// A timestamped note attached to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub entry: DateTime<Utc>,
    pub description: String,
}

impl Annotation {
    /// `entry` is truncated to whole seconds.
    pub fn new(entry: DateTime<Utc>, description: impl Into<String>) -> Self {
        Self {
            entry: whole_seconds(entry),
            description: description.into(),
        }
    }

    /// Annotation stamped with the current time.
    pub fn now(description: impl Into<String>) -> Self {
        Self::new(Utc::now(), description)
    }
}

/// Drop sub-second precision; the engine stores whole seconds.
pub fn whole_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.with_nanosecond(0).unwrap_or(instant)
}
