//! Native task records.

use crate::error::{Error, Result};
use crate::fields::{Annotation, FieldValue};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Pending,
    Completed,
    Deleted,
    Waiting,
    Recurring,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Pending,
        Status::Completed,
        Status::Deleted,
        Status::Waiting,
        Status::Recurring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Deleted => "deleted",
            Status::Waiting => "waiting",
            Status::Recurring => "recurring",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                Error::validation(
                    "status",
                    s,
                    "not one of pending, completed, deleted, waiting, recurring",
                )
            })
    }
}

impl From<Status> for FieldValue {
    fn from(value: Status) -> Self {
        FieldValue::Text(value.as_str().to_string())
    }
}

/// A task as a map from attribute name to typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl TaskRecord {
    /// A new pending task with a fresh UUID and entry time.
    pub fn new(description: impl Into<String>) -> Self {
        let mut record = Self::default();
        record.insert("uuid", Uuid::new_v4().into());
        record.insert("status", Status::Pending.into());
        record.insert("entry", Utc::now().into());
        record.insert("description", FieldValue::Text(description.into()));
        record
    }

    /// A record with no attributes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set an attribute.
    ///
    /// A record's `uuid` is fixed once assigned; setting a different one fails.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        if name == "uuid"
            && let Some(current) = self.uuid()
        {
            let replacement = match &value {
                FieldValue::Uuid(u) => Some(*u),
                FieldValue::Text(s) => Uuid::parse_str(s).ok(),
                _ => None,
            };
            if replacement != Some(current) {
                return Err(Error::validation(
                    "uuid",
                    describe_uuid(&value),
                    format!("task already has uuid {}", current),
                ));
            }
        }
        self.fields.insert(name, value);
        Ok(())
    }

    /// Mark an attribute as cleared; it is dropped when the record is encoded.
    ///
    /// An assigned `uuid` cannot be cleared.
    pub fn clear(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.guard_identity(&name, "cleared")?;
        self.fields.insert(name, FieldValue::Absent);
        Ok(())
    }

    /// Forget an attribute entirely. An assigned `uuid` cannot be removed.
    pub fn remove(&mut self, name: &str) -> Result<Option<FieldValue>> {
        self.guard_identity(name, "removed")?;
        Ok(self.fields.remove(name))
    }

    fn guard_identity(&self, name: &str, action: &str) -> Result<()> {
        if name == "uuid"
            && let Some(current) = self.uuid()
        {
            return Err(Error::validation(
                "uuid",
                current.to_string(),
                format!("an assigned uuid cannot be {}", action),
            ));
        }
        Ok(())
    }

    pub fn uuid(&self) -> Option<Uuid> {
        match self.fields.get("uuid")? {
            FieldValue::Uuid(u) => Some(*u),
            FieldValue::Text(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<Status> {
        self.fields.get("status")?.as_text()?.parse().ok()
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.get("description")?.as_text()
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self.fields.get("annotations") {
            Some(FieldValue::Annotations(list)) => list,
            _ => &[],
        }
    }

    /// Attach an annotation, keeping any existing ones.
    pub fn annotate(&mut self, annotation: Annotation) {
        match self.fields.get_mut("annotations") {
            Some(FieldValue::Annotations(list)) => list.push(annotation),
            _ => {
                self.fields
                    .insert("annotations".to_string(), FieldValue::Annotations(vec![annotation]));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Insert without the uuid guard; used by decoders building fresh records.
    pub(crate) fn insert(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }
}

fn describe_uuid(value: &FieldValue) -> String {
    match value {
        FieldValue::Uuid(u) => u.to_string(),
        FieldValue::Text(s) => s.clone(),
        other => other.variant_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_identity() {
        let task = TaskRecord::new("foobar");
        assert!(task.uuid().is_some());
        assert_eq!(task.status(), Some(Status::Pending));
        assert_eq!(task.description(), Some("foobar"));
        assert!(matches!(task.get("entry"), Some(FieldValue::Date(_))));
    }

    #[test]
    fn test_uuid_is_fixed_once_assigned() {
        let mut task = TaskRecord::new("foobar");
        let original = task.uuid().unwrap();

        assert!(task.set("uuid", original).is_ok());
        assert!(task.set("uuid", original.to_string()).is_ok());
        let err = task.set("uuid", Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::Validation { ref attribute, .. } if attribute == "uuid"));
        assert_eq!(task.uuid(), Some(original));
    }

    #[test]
    fn test_uuid_survives_clear_and_remove() {
        let mut task = TaskRecord::new("foobar");
        let original = task.uuid().unwrap();

        let err = task.clear("uuid").unwrap_err();
        assert!(matches!(err, Error::Validation { ref attribute, .. } if attribute == "uuid"));
        assert!(task.remove("uuid").is_err());
        assert_eq!(task.uuid(), Some(original));

        assert!(task.set("uuid", Uuid::new_v4()).is_err());
        assert!(task.set("uuid", FieldValue::Absent).is_err());
        assert_eq!(task.uuid(), Some(original));
    }

    #[test]
    fn test_remove_other_attributes() {
        let mut task = TaskRecord::new("foobar");
        task.set("project", "home").unwrap();
        assert_eq!(task.remove("project").unwrap(), Some(FieldValue::from("home")));
        assert!(!task.contains("project"));
        assert_eq!(task.remove("project").unwrap(), None);
    }

    #[test]
    fn test_uuid_can_be_assigned_when_missing() {
        let mut task = TaskRecord::empty();
        let id = Uuid::new_v4();
        task.set("uuid", id).unwrap();
        assert_eq!(task.uuid(), Some(id));
    }

    #[test]
    fn test_clear_keeps_sentinel() {
        let mut task = TaskRecord::new("foobar");
        task.set("somestring", "this is a uda").unwrap();
        task.clear("somestring").unwrap();
        assert_eq!(task.get("somestring"), Some(&FieldValue::Absent));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("waiting".parse::<Status>().unwrap(), Status::Waiting);
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn test_annotate_appends() {
        let mut task = TaskRecord::new("foobar");
        task.annotate(Annotation::now("first"));
        task.annotate(Annotation::now("second"));
        let descriptions: Vec<_> = task.annotations().iter().map(|a| a.description.as_str()).collect();
        assert_eq!(descriptions, vec!["first", "second"]);
    }
}
