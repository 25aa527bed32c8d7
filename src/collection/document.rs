//! Canonical document shape.

use serde_json::{Map, Value};

use crate::store::RawDocument;

/// A document in application shape: a JSON object whose `_id` (if any) is a
/// string and whose application identifier lives in `id`.
pub type Document = Map<String, Value>;

/// Field holding the store-assigned identifier.
pub const INTERNAL_ID: &str = "_id";

/// Converts a raw store document to application shape.
///
/// The store-assigned identifier is rewritten to a plain string:
/// `{"$oid": "..."}` is unwrapped, numbers and other values are stringified.
/// The application `id` is never touched.
pub fn normalize(mut raw: RawDocument) -> Document {
    let normalized = match raw.remove(INTERNAL_ID) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(obj)) => match obj.get("$oid").and_then(Value::as_str) {
            Some(oid) => Some(oid.to_string()),
            None => Some(Value::Object(obj).to_string()),
        },
        Some(other) => Some(other.to_string()),
    };

    if let Some(internal_id) = normalized {
        raw.insert(INTERNAL_ID.to_string(), Value::String(internal_id));
    }
    raw
}

/// Turns documents into the JSON array that is cached and served.
pub fn to_value(docs: &[Document]) -> Value {
    Value::Array(docs.iter().cloned().map(Value::Object).collect())
}

/// Reads documents back from a cached JSON array. Non-object items are
/// dropped. Anything other than an array is not a listing.
pub fn from_value(value: Value) -> Option<Vec<Document>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(doc) => Some(doc),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawDocument {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_internal_id_variants() {
        let oid = normalize(raw(json!({"_id": {"$oid": "65f0c0ffee"}, "id": "1"})));
        assert_eq!(oid["_id"], "65f0c0ffee");
        assert_eq!(oid["id"], "1");

        let number = normalize(raw(json!({"_id": 17, "id": "2"})));
        assert_eq!(number["_id"], "17");

        let string = normalize(raw(json!({"_id": "abc"})));
        assert_eq!(string["_id"], "abc");

        let missing = normalize(raw(json!({"id": "3", "_id": null})));
        assert!(missing.get("_id").is_none());
    }

    #[test]
    fn test_value_conversion_keeps_objects_only() {
        let docs = from_value(json!([{"id": "1"}, 5, {"id": "2"}])).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(to_value(&docs), json!([{"id": "1"}, {"id": "2"}]));
    }

    #[test]
    fn test_single_object_is_not_a_listing() {
        assert_eq!(from_value(json!({"id": "all"})), None);
        assert_eq!(from_value(json!("text")), None);
    }
}
