//! Reusable field validators
//!
//! A validator receives the field name and its (already filtered) value and
//! returns a human-readable message on failure. Absent fields arrive as `null`.

use crate::core::field::FieldFormat;
use serde_json::Value;

/// Validator: field is present and not empty.
///
/// Rejects `null`, whitespace-only strings and empty arrays.
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |_: &str, value: &Value| {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if empty {
            Err("is required".to_string())
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be zero or greater
pub fn non_negative() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |_: &str, value: &Value| match value {
        Value::Null => Ok(()),
        Value::Number(n) => match n.as_f64() {
            Some(num) if num < 0.0 => Err(format!("must not be negative (value: {})", num)),
            _ => Ok(()),
        },
        _ => Err("must be a number".to_string()),
    }
}

/// Validator: string length (in characters) must not exceed `max`
pub fn max_length(max: usize) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if len > max {
                return Err(format!(
                    "must not exceed {} characters (currently: {})",
                    max, len
                ));
            }
        }
        Ok(())
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if !allowed.iter().any(|a| a == s) {
                return Err(format!("must be one of {:?} (got: {})", allowed, s));
            }
        }
        Ok(())
    }
}

/// Validator: string must match a [`FieldFormat`]
pub fn format(format: FieldFormat) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if !format.matches(s) {
                return Err(format!("has an invalid format: {}", s));
            }
        }
        Ok(())
    }
}

/// Validator: array elements must all be non-empty strings
pub fn string_list() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |_: &str, value: &Value| match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            if items
                .iter()
                .all(|item| item.as_str().is_some_and(|s| !s.trim().is_empty()))
            {
                Ok(())
            } else {
                Err("must contain only non-empty strings".to_string())
            }
        }
        _ => Err("must be a list".to_string()),
    }
}
