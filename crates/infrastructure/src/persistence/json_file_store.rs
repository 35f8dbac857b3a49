//! File-backed persistence scope.
//!
//! A scope is a single JSON object on disk. It is read once when opened;
//! afterwards reads are served from memory and every update rewrites the
//! whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use repograph_application::ports::{KeyValueStore, StoreError};
use serde_json::Value;
use tokio::fs;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// Key/value scope persisted as one JSON file.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, Value>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileKeyValueStore {
    /// Opens the scope stored at `path`.
    ///
    /// A missing file yields an empty scope; it is created on the first update.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path).await {
            Ok(content) => from_json_bytes(&content)
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        tracing::debug!(path = %path.display(), "Opened state scope");
        Ok(Self {
            path,
            values: RwLock::new(values),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, snapshot: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content =
            to_json_stable_bytes(snapshot).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    async fn update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.values.read().clone();
        snapshot.insert(key.to_string(), value);
        self.persist(&snapshot).await?;

        *self.values.write() = snapshot;
        Ok(())
    }
}
