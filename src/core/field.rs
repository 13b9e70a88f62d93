//! Field value types and formats

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    List(Vec<String>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Case-insensitive substring test used by free-text search.
    ///
    /// `needle` must already be lowercased. Lists match if any element matches;
    /// non-textual values never match.
    pub fn contains_folded(&self, needle: &str) -> bool {
        match self {
            FieldValue::String(s) => s.to_lowercase().contains(needle),
            FieldValue::List(items) => items.iter().any(|s| s.to_lowercase().contains(needle)),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

/// Field format checks used by validators
#[derive(Debug, Clone)]
pub enum FieldFormat {
    /// ISO-4217 style three letter code (`USD`, `EUR`)
    CurrencyCode,
    /// Lowercase words joined by dashes (`general`, `off-topic`)
    Slug,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a string against this format
    pub fn matches(&self, value: &str) -> bool {
        match self {
            FieldFormat::CurrencyCode => Self::currency_regex().is_match(value),
            FieldFormat::Slug => Self::slug_regex().is_match(value),
            FieldFormat::Custom(regex) => regex.is_match(value),
        }
    }

    /// Validate a field value against this format; non-strings never match
    pub fn validate(&self, value: &FieldValue) -> bool {
        value.as_string().is_some_and(|s| self.matches(s))
    }

    fn currency_regex() -> &'static Regex {
        static CURRENCY_REGEX: OnceLock<Regex> = OnceLock::new();
        CURRENCY_REGEX.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("static regex"))
    }

    fn slug_regex() -> &'static Regex {
        static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
        SLUG_REGEX.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("static regex"))
    }
}
