//! Response-shape extraction
//!
//! The upstream API is inconsistent about how it wraps page records: most
//! endpoints return `{"data": [...]}`, some return a bare array, older ones
//! return `{"rows": [...]}`, and a few return an object keyed by record ID.
//! Extraction is an ordered list of strategies tried in sequence; the first
//! one that recognizes the body wins.

use callscope_core::Record;
use serde_json::Value;
use tracing::{debug, warn};

type Extractor = fn(&Value) -> Option<Vec<Record>>;

/// Extraction strategies in priority order. The object-of-objects flatten
/// is the best-effort fallback for otherwise unrecognized bodies; it may
/// produce semantically wrong records, which is accepted as a soft-failure
/// mode rather than a hard error.
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("data_field", extract_data_field),
    ("bare_array", extract_bare_array),
    ("rows_field", extract_rows_field),
    ("object_map", extract_object_map),
];

/// Extract one page's records from a response body.
///
/// Returns an empty vec (with a warning) for bodies matching no strategy;
/// an empty page is not an error.
pub fn extract_records(body: &Value) -> Vec<Record> {
    for (name, extractor) in EXTRACTORS {
        if let Some(records) = extractor(body) {
            debug!(
                strategy = name,
                count = records.len(),
                "Extracted page records"
            );
            return records;
        }
    }

    warn!("Response body matches no known report shape, treating as empty page");
    Vec::new()
}

fn collect_objects(values: &[Value]) -> Vec<Record> {
    values.iter().filter_map(|v| v.as_object().cloned()).collect()
}

fn extract_data_field(body: &Value) -> Option<Vec<Record>> {
    body.get("data")?.as_array().map(|a| collect_objects(a))
}

fn extract_bare_array(body: &Value) -> Option<Vec<Record>> {
    body.as_array().map(|a| collect_objects(a))
}

fn extract_rows_field(body: &Value) -> Option<Vec<Record>> {
    body.get("rows")?.as_array().map(|a| collect_objects(a))
}

/// Flatten an object-of-objects into records, annotating each record with
/// its map key under `"key"` (kept out of the way of any existing field).
fn extract_object_map(body: &Value) -> Option<Vec<Record>> {
    let obj = body.as_object()?;
    let mut records = Vec::new();
    for (key, value) in obj {
        if let Some(record) = value.as_object() {
            let mut record = record.clone();
            record
                .entry("key".to_string())
                .or_insert_with(|| Value::String(key.clone()));
            records.push(record);
        }
    }
    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_field_wins() {
        let body = json!({"data": [{"a": 1}], "rows": [{"b": 2}]});
        let records = extract_records(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_bare_array() {
        let body = json!([{"a": 1}, {"a": 2}]);
        let records = extract_records(&body);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_rows_field() {
        let body = json!({"rows": [{"b": 2}], "next_start_key": "cursor"});
        let records = extract_records(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_object_map_fallback_annotates_key() {
        let body = json!({
            "call-1": {"duration": 10},
            "call-2": {"duration": 20, "key": "preexisting"},
            "count": 2
        });
        let records = extract_records(&body);
        assert_eq!(records.len(), 2);

        let first = records
            .iter()
            .find(|r| r.get("duration") == Some(&json!(10)))
            .unwrap();
        assert_eq!(first.get("key"), Some(&json!("call-1")));

        // An existing "key" field is left untouched
        let second = records
            .iter()
            .find(|r| r.get("duration") == Some(&json!(20)))
            .unwrap();
        assert_eq!(second.get("key"), Some(&json!("preexisting")));
    }

    #[test]
    fn test_non_object_array_members_skipped() {
        let body = json!({"data": [{"a": 1}, 42, "noise", null]});
        assert_eq!(extract_records(&body).len(), 1);
    }

    #[test]
    fn test_data_field_non_array_falls_through() {
        // "data" present but not an array: the object-map fallback applies
        let body = json!({"data": {"call-1": {"a": 1}}});
        let records = extract_records(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("key"), Some(&json!("data")));
    }

    #[test]
    fn test_unrecognized_scalar_body() {
        assert!(extract_records(&json!("nope")).is_empty());
        assert!(extract_records(&json!(42)).is_empty());
        assert!(extract_records(&json!(null)).is_empty());
    }

    #[test]
    fn test_empty_shapes() {
        assert!(extract_records(&json!({"data": []})).is_empty());
        assert!(extract_records(&json!([])).is_empty());
        assert!(extract_records(&json!({})).is_empty());
    }
}
