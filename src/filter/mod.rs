//! Structured filter expressions and their compilation to query arguments.
//!
//! A [`Filter`] is a list of terms that must all hold. Each term is a
//! [`FilterExpr`]: either a single `attribute[.modifier]:value` condition or
//! an explicit `and`/`or` group of further expressions.
//!
//! ```
//! use taskw::filter::{Filter, FilterExpr};
//!
//! let filter = Filter::new()
//!     .and(FilterExpr::leaf("description.contains", "foobar2"))
//!     .and(FilterExpr::any(vec![
//!         FilterExpr::leaf("status", "pending"),
//!         FilterExpr::leaf("status", "waiting"),
//!     ]));
//! assert_eq!(
//!     filter.compile().unwrap(),
//!     vec!["description.contains:foobar2", "(", "status:pending", "or", "status:waiting", ")"]
//! );
//! ```

mod compile;
mod loose;

pub use compile::{quote_value, requires_quoting};

use crate::error::Result;
use crate::fields::FieldValue;
use std::fmt;

/// Logical joiner for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
}

impl Junction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Junction::And => "and",
            Junction::Or => "or",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "and" => Some(Junction::And),
            "or" => Some(Junction::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `attribute[.modifier]:value` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub modifier: Option<String>,
    pub value: FieldValue,
}

impl Condition {
    /// Split `key` into attribute and modifier at the first `.`.
    pub fn new(key: &str, value: impl Into<FieldValue>) -> Self {
        let (attribute, modifier) = match key.split_once('.') {
            Some((attribute, modifier)) => (attribute, Some(modifier.to_string())),
            None => (key, None),
        };
        Self {
            attribute: attribute.to_string(),
            modifier,
            value: value.into(),
        }
    }

    /// The `attribute` or `attribute.modifier` prefix of the token.
    pub fn key(&self) -> String {
        match &self.modifier {
            Some(modifier) => format!("{}.{}", self.attribute, modifier),
            None => self.attribute.clone(),
        }
    }
}

/// A filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Condition(Condition),
    Group {
        junction: Junction,
        members: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn leaf(key: &str, value: impl Into<FieldValue>) -> Self {
        FilterExpr::Condition(Condition::new(key, value))
    }

    /// Every member must hold.
    pub fn all(members: Vec<FilterExpr>) -> Self {
        FilterExpr::Group {
            junction: Junction::And,
            members,
        }
    }

    /// At least one member must hold.
    pub fn any(members: Vec<FilterExpr>) -> Self {
        FilterExpr::Group {
            junction: Junction::Or,
            members,
        }
    }
}

/// Top-level filter: an implicit conjunction of terms, compiled in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    terms: Vec<FilterExpr>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term.
    pub fn and(mut self, expr: FilterExpr) -> Self {
        self.terms.push(expr);
        self
    }

    pub fn terms(&self) -> &[FilterExpr] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Compile into query arguments.
    pub fn compile(&self) -> Result<Vec<String>> {
        compile::compile_terms(&self.terms)
    }
}

impl From<FilterExpr> for Filter {
    fn from(expr: FilterExpr) -> Self {
        Filter::new().and(expr)
    }
}

impl FromIterator<FilterExpr> for Filter {
    fn from_iter<I: IntoIterator<Item = FilterExpr>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}
