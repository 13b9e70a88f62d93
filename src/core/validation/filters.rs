//! Reusable field filters
//!
//! These filters transform field values before validation

use anyhow::{Result, bail};
use serde_json::{Value, json};

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Ok(Value::String(s.trim().to_string()))
        } else {
            Ok(value)
        }
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Ok(Value::String(s.to_uppercase()))
        } else {
            Ok(value)
        }
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Ok(Value::String(s.to_lowercase()))
        } else {
            Ok(value)
        }
    }
}

/// Filter: round number to specified decimal places
pub fn round_decimals(decimals: u32) -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    move |_: &str, value: Value| {
        if let Some(num) = value.as_f64() {
            let factor = 10_f64.powi(decimals as i32);
            let rounded = (num * factor).round() / factor;
            Ok(json!(rounded))
        } else {
            Ok(value)
        }
    }
}

/// Filter: blank strings become `null` so optional fields fall back to their default
pub fn blank_to_null() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        if value.as_str().is_some_and(|s| s.trim().is_empty()) {
            Ok(Value::Null)
        } else {
            Ok(value)
        }
    }
}

/// Filter: parse numeric strings (`"12.50"`) into numbers
pub fn parse_number() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |field: &str, value: Value| match value.as_str().map(str::trim) {
        Some("") => Ok(Value::Null),
        Some(s) => match s.parse::<f64>() {
            Ok(num) if num.is_finite() => Ok(json!(num)),
            _ => bail!("'{}' is not a number: {}", field, s),
        },
        None => Ok(value),
    }
}

/// Filter: accept a comma-separated string as a tag list; trims, drops blanks
/// and duplicates while keeping first-seen order
pub fn tag_list() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| {
        let raw: Vec<String> = match &value {
            Value::String(s) => s.split(',').map(str::to_string).collect(),
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => return Ok(value),
        };

        let mut tags: Vec<String> = Vec::with_capacity(raw.len());
        for tag in raw {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Ok(json!(tags))
    }
}
