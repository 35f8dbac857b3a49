//! JSON serialization helpers for deterministic output.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serializes a value to deterministic JSON.
///
/// Output format:
/// - 2-space indentation
/// - Trailing newline
/// - Keys sorted alphabetically (maps are `BTreeMap`s)
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable<T: Serialize + ?Sized>(value: &T) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json)
}

/// Serializes a value to deterministic JSON bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable_bytes<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Vec<u8>, SerializationError> {
    to_json_stable(value).map(String::into_bytes)
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_stable_serialization_has_trailing_newline() {
        let mut map = BTreeMap::new();
        map.insert("lastActiveRepo", "/repo");

        let json = to_json_stable(&map).expect("serialization should work");
        assert!(json.ends_with('\n'));
        assert!(json.contains("  \"lastActiveRepo\""));
    }

    #[test]
    fn test_value_keys_are_sorted() {
        let value = serde_json::json!({ "repoStates": {}, "avatarCache": {}, "codeReviews": {} });

        let json = to_json_stable(&value).expect("serialization should work");
        let avatar_pos = json.find("avatarCache").expect("avatarCache should be in json");
        let review_pos = json.find("codeReviews").expect("codeReviews should be in json");
        let repo_pos = json.find("repoStates").expect("repoStates should be in json");

        assert!(avatar_pos < review_pos);
        assert!(review_pos < repo_pos);
    }

    #[test]
    fn test_from_json_bytes_rejects_garbage() {
        let result: Result<serde_json::Value, _> = from_json_bytes(b"{\"open\": ");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
