//! Untyped records exchanged with the API and the UI.

use serde_json::{Map, Value};

/// A string-keyed JSON object.
///
/// The same type carries both the wire shape (API field names) and the UI
/// shape (UI field names). Transformations always build a new record.
pub type Record = Map<String, Value>;

/// Returns `true` for values a form treats as "not filled in".
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Unwrap a JSON object into a [`Record`]; any other value yields `None`.
pub fn as_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
