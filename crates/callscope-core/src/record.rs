//! Schemaless report rows
//!
//! Report rows are not statically typed: each report kind carries its own
//! columns, and the projection can change upstream without notice. Rows are
//! kept as raw JSON objects and only the handful of fields the normalizer
//! touches are interpreted.

use serde_json::Value;

/// One report row: a mapping from column name to scalar/array/object value.
pub type Record = serde_json::Map<String, Value>;

/// Read a field as an integer, coercing loosely typed scalars.
///
/// The upstream API emits timestamps and durations as JSON numbers or as
/// numeric strings depending on the report; both are accepted. Fractional
/// numbers are truncated.
pub fn field_i64(record: &Record, field: &str) -> Option<i64> {
    match record.get(field)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Read a field as a string slice, if it is a string.
pub fn field_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_field_i64_number() {
        let rec = record(json!({"called_time": 1700000000}));
        assert_eq!(field_i64(&rec, "called_time"), Some(1_700_000_000));
    }

    #[test]
    fn test_field_i64_numeric_string() {
        let rec = record(json!({"called_time": " 1700000000 "}));
        assert_eq!(field_i64(&rec, "called_time"), Some(1_700_000_000));
    }

    #[test]
    fn test_field_i64_float_truncates() {
        let rec = record(json!({"wait_duration": 12.9}));
        assert_eq!(field_i64(&rec, "wait_duration"), Some(12));
    }

    #[test]
    fn test_field_i64_rejects_non_numeric() {
        let rec = record(json!({"called_time": "soon", "agent_history": []}));
        assert_eq!(field_i64(&rec, "called_time"), None);
        assert_eq!(field_i64(&rec, "agent_history"), None);
        assert_eq!(field_i64(&rec, "missing"), None);
    }

    #[test]
    fn test_field_str() {
        let rec = record(json!({"call_id": "abc-123", "count": 7}));
        assert_eq!(field_str(&rec, "call_id"), Some("abc-123"));
        assert_eq!(field_str(&rec, "count"), None);
    }
}
