//! Token generation and value quoting.

use super::{Condition, FilterExpr};
use crate::error::{Error, Result};
use crate::fields::{FieldValue, format_date, strip_nul};
use tracing::debug;

/// Characters the query grammar treats specially inside a value.
const SPECIAL: &[char] = &['"', '\'', '[', ']', '(', ')', ';', '?'];

pub(super) fn compile_terms(terms: &[FilterExpr]) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    for term in terms {
        compile_expr(term, &mut tokens)?;
    }
    debug!(count = tokens.len(), "Compiled filter");
    Ok(tokens)
}

fn compile_expr(expr: &FilterExpr, tokens: &mut Vec<String>) -> Result<()> {
    match expr {
        FilterExpr::Condition(condition) => tokens.push(compile_condition(condition)?),
        FilterExpr::Group { junction, members } => {
            if members.is_empty() {
                return Ok(());
            }
            tokens.push("(".to_string());
            for (index, member) in members.iter().enumerate() {
                if index > 0 {
                    tokens.push(junction.as_str().to_string());
                }
                compile_expr(member, tokens)?;
            }
            tokens.push(")".to_string());
        }
    }
    Ok(())
}

fn compile_condition(condition: &Condition) -> Result<String> {
    let text = value_text(&condition.key(), &condition.value)?;
    Ok(format!("{}:{}", condition.key(), quote_value(&text)))
}

fn value_text(key: &str, value: &FieldValue) -> Result<String> {
    let text = match value {
        FieldValue::Absent => String::new(),
        FieldValue::Text(s) | FieldValue::Duration(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Date(d) => format_date(d),
        FieldValue::Uuid(u) => u.to_string(),
        FieldValue::UuidList(list) => list
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(","),
        FieldValue::List(list) => list.join(","),
        FieldValue::Annotations(_) => {
            return Err(Error::invalid_filter(format!(
                "{} cannot be filtered by an annotation list",
                key
            )));
        }
    };
    Ok(strip_nul(&text))
}

/// Whether the caller already wrapped the whole value in `"..."` or `[...]`.
fn is_prequoted(value: &str) -> bool {
    value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('[') && value.ends_with(']')))
}

/// Whether `value` must be quoted to parse as a single literal.
pub fn requires_quoting(value: &str) -> bool {
    !is_prequoted(value) && value.chars().any(|c| c.is_whitespace() || SPECIAL.contains(&c))
}

/// Quote a value for the query grammar.
///
/// Inside the quotes `\` becomes `\\` and `"` becomes `\"`. Pre-quoted values
/// pass through untouched.
pub fn quote_value(value: &str) -> String {
    if !requires_quoting(value) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_plain_values_are_bare() {
        assert_eq!(quote_value("foobar2"), "foobar2");
        assert_eq!(quote_value("foo/bar"), "foo/bar");
        assert_eq!(quote_value(""), "");
    }

    #[test]
    fn test_special_characters_are_quoted() {
        assert_eq!(quote_value("foo bar"), "\"foo bar\"");
        assert_eq!(quote_value("[foo"), "\"[foo\"");
        assert_eq!(quote_value("a;b"), "\"a;b\"");
        assert_eq!(quote_value("why?"), "\"why?\"");
        assert_eq!(quote_value(r#"say "hi""#), r#""say \"hi\"""#);
    }

    #[test]
    fn test_backslashes_are_escaped_inside_quotes() {
        assert_eq!(quote_value("dir C:\\"), r#""dir C:\\""#);
        assert_eq!(quote_value("a\\\"b"), r#""a\\\"b""#);
        assert_eq!(quote_value(r"C:\tmp"), r"C:\tmp");

        let filter = Filter::from(FilterExpr::leaf("description", "ends with \\"));
        assert_eq!(filter.compile().unwrap(), vec![r#"description:"ends with \\""#]);
    }

    #[test]
    fn test_prequoted_values_pass_through() {
        assert_eq!(quote_value("\"foo/bar\""), "\"foo/bar\"");
        assert_eq!(quote_value("[a b]"), "[a b]");
        assert!(requires_quoting("\""));
    }

    #[test]
    fn test_typed_values() {
        let date = Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap();
        let filter = Filter::new()
            .and(FilterExpr::leaf("due.before", date))
            .and(FilterExpr::leaf("tags", vec!["a".to_string(), "b".to_string()]))
            .and(FilterExpr::leaf("urgency.above", 5))
            .and(FilterExpr::leaf("project", FieldValue::Absent));
        assert_eq!(
            filter.compile().unwrap(),
            vec!["due.before:20110101T000000Z", "tags:a,b", "urgency.above:5", "project:"]
        );
    }

    #[test]
    fn test_nul_is_stripped() {
        let filter = Filter::from(FilterExpr::leaf("description", "foo\0bar"));
        assert_eq!(filter.compile().unwrap(), vec!["description:foobar"]);
    }

    #[test]
    fn test_annotations_rejected() {
        let filter = Filter::from(FilterExpr::leaf("annotations", FieldValue::Annotations(Vec::new())));
        let err = filter.compile().unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn test_nested_groups_and_empty_group() {
        let filter = Filter::new()
            .and(FilterExpr::all(Vec::new()))
            .and(FilterExpr::any(vec![
                FilterExpr::leaf("project", "home"),
                FilterExpr::all(vec![
                    FilterExpr::leaf("project", "work"),
                    FilterExpr::leaf("priority", "H"),
                ]),
            ]));
        assert_eq!(
            filter.compile().unwrap(),
            vec![
                "(", "project:home", "or", "(", "project:work", "and", "priority:H", ")", ")"
            ]
        );
    }
}
