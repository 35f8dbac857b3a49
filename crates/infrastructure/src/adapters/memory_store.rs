//! In-process key/value scope.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use repograph_application::ports::{KeyValueStore, StoreError};
use serde_json::Value;

/// Key/value scope held in memory only.
///
/// Useful for hosts that persist state themselves and for tests. Writes can
/// be made to fail to simulate a full or read-only store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<BTreeMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope pre-populated with `values`.
    #[must_use]
    pub fn with_values(values: BTreeMap<String, Value>) -> Self {
        Self {
            values: RwLock::new(values),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every following write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of everything stored.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.read().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    async fn update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("writes to '{key}' are disabled")));
        }
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn update_replaces_whole_value() {
        let store = MemoryKeyValueStore::new();
        store.update("ignoredRepos", json!(["/a"])).await.unwrap();
        store.update("ignoredRepos", json!(["/b"])).await.unwrap();

        assert_eq!(store.get("ignoredRepos"), Some(json!(["/b"])));
    }

    #[tokio::test]
    async fn failing_writes_leave_value_untouched() {
        let store = MemoryKeyValueStore::with_values(BTreeMap::from([(
            "lastActiveRepo".to_string(),
            json!("/a"),
        )]));
        store.set_fail_writes(true);

        let result = store.update("lastActiveRepo", json!("/b")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.get("lastActiveRepo"), Some(json!("/a")));

        store.set_fail_writes(false);
        store.update("lastActiveRepo", json!("/b")).await.unwrap();
        assert_eq!(store.snapshot().len(), 1);
    }
}
