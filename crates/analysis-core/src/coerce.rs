//! Numeric coercion for untrusted upstream payloads.
//!
//! Provider responses carry numbers as JSON numbers, numeric strings, empty
//! strings, nulls, or the literal `"None"` marker. Everything read from a raw
//! payload goes through [`coerce`] exactly once before it reaches a typed
//! snapshot.

use serde_json::{Map, Value};

/// Literal marker some providers emit in place of a missing value.
pub const MISSING_SENTINEL: &str = "None";

/// Convert an arbitrary JSON value to `f64`, or `default` when the value is
/// absent or cannot be parsed. Never panics.
pub fn coerce(value: &Value, default: Option<f64>) -> Option<f64> {
    match value {
        Value::Null => default,
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Some(v),
            _ => default,
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
                return default;
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => default,
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => default,
    }
}

/// Read `key` from a raw object and coerce it. Missing keys are absent.
pub fn coerce_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(|v| coerce(v, None))
}

/// Read a non-empty text field from a raw object.
pub fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

/// Coerce every element of a raw array, dropping the ones that are absent.
pub fn coerce_series(value: Option<&Value>) -> Vec<f64> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| coerce(v, None)).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_markers_return_default() {
        assert_eq!(coerce(&Value::Null, None), None);
        assert_eq!(coerce(&json!(""), Some(0.0)), Some(0.0));
        assert_eq!(coerce(&json!("None"), None), None);
        assert_eq!(coerce(&json!("   "), Some(1.5)), Some(1.5));
    }

    #[test]
    fn test_numeric_strings_parse() {
        assert_eq!(coerce(&json!("42.5"), None), Some(42.5));
        assert_eq!(coerce(&json!(" -3 "), None), Some(-3.0));
        assert_eq!(coerce(&json!("1e9"), None), Some(1e9));
    }

    #[test]
    fn test_numbers_pass_through_and_zero_is_data() {
        assert_eq!(coerce(&json!(0), Some(7.0)), Some(0.0));
        assert_eq!(coerce(&json!(12.25), None), Some(12.25));
    }

    #[test]
    fn test_garbage_never_raises() {
        assert_eq!(coerce(&json!("abc"), None), None);
        assert_eq!(coerce(&json!("NaN"), None), None);
        assert_eq!(coerce(&json!("inf"), Some(2.0)), Some(2.0));
        assert_eq!(coerce(&json!(true), None), None);
        assert_eq!(coerce(&json!([1, 2]), None), None);
        assert_eq!(coerce(&json!({"v": 1}), Some(9.0)), Some(9.0));
    }

    #[test]
    fn test_field_and_series_helpers() {
        let raw = json!({"pe": "18.2", "name": " Apple ", "blank": "", "closes": [1, "2", null, "x", 3.5]});
        let map = raw.as_object().unwrap();
        assert_eq!(coerce_field(map, "pe"), Some(18.2));
        assert_eq!(coerce_field(map, "missing"), None);
        assert_eq!(text_field(map, "name").as_deref(), Some("Apple"));
        assert_eq!(text_field(map, "blank"), None);
        assert_eq!(coerce_series(map.get("closes")), vec![1.0, 2.0, 3.5]);
        assert!(coerce_series(None).is_empty());
    }
}
