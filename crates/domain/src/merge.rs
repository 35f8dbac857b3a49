//! Shallow default merging for persisted records.
//!
//! Persisted records may have been written by an older build that did not
//! know about every field. Merging the stored record over a default record
//! before decoding guarantees that missing fields never surface.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Merges `record` over `defaults`.
///
/// Every top-level key present in `record` wins, including explicit `null`s.
/// Keys only present in `defaults` are filled in. Nested objects are not
/// merged recursively. When either side is not an object, `record` is
/// returned unchanged.
#[must_use]
pub fn merge_defaults(record: Value, defaults: &Value) -> Value {
    match (record, defaults) {
        (Value::Object(fields), Value::Object(default_fields)) => {
            let mut merged = default_fields.clone();
            merged.extend(fields);
            Value::Object(merged)
        }
        (record, _) => record,
    }
}

/// Merges `record` over the serialized form of `T::default()` and decodes it.
///
/// Returns `None` when the merged value does not decode as `T`.
#[must_use]
pub fn decode_with_defaults<T>(record: Value) -> Option<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    let defaults = serde_json::to_value(T::default()).ok()?;
    serde_json::from_value(merge_defaults(record, &defaults)).ok()
}
