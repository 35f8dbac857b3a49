//! Wires the state store to the file-backed adapters.

use std::sync::Arc;

use repograph_application::StateStore;
use repograph_application::ports::StoreError;
use tokio::sync::watch;

use crate::adapters::SystemClock;
use crate::config::StorageLocations;
use crate::persistence::{JsonFileKeyValueStore, TokioFileSystem};

/// State store backed by JSON files, the real file system and the system clock.
pub type FileStateStore = StateStore<TokioFileSystem, SystemClock>;

/// Opens both scopes and starts the state store.
///
/// Avatar storage is prepared in the background. When `git_path_changes` is
/// given, every path published on it is recorded as the last known git path.
///
/// # Errors
/// Returns an error if either scope file exists but cannot be read.
pub async fn open_state_store(
    locations: &StorageLocations,
    git_path_changes: Option<watch::Receiver<String>>,
) -> Result<Arc<FileStateStore>, StoreError> {
    let global = JsonFileKeyValueStore::open(locations.global_state_file()).await?;
    let workspace = JsonFileKeyValueStore::open(locations.workspace_state_file()).await?;

    let store = Arc::new(StateStore::new(
        &locations.global_storage_path(),
        Arc::new(global),
        Arc::new(workspace),
        TokioFileSystem::new(),
        SystemClock::new(),
    ));

    store.spawn_avatar_storage_preparation();
    if let Some(changes) = git_path_changes {
        store.listen_for_git_path_changes(changes);
    }

    tracing::info!(
        global = %locations.global_storage_dir.display(),
        workspace = %locations.workspace_storage_dir.display(),
        "State store opened"
    );
    Ok(store)
}
