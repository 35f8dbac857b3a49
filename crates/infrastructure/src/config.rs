//! Storage locations.
//!
//! By default state lives in the platform-specific config directory:
//! - Linux: ~/.config/repograph
//! - macOS: ~/Library/Application Support/repograph
//! - Windows: %APPDATA%/repograph
//!
//! Workspace scopes live under `workspaces/<name>` inside it.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "repograph";
const WORKSPACES_DIR: &str = "workspaces";
const GLOBAL_STATE_FILE: &str = "global-state.json";
const WORKSPACE_STATE_FILE: &str = "workspace-state.json";

/// Error type for resolving storage locations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Where the global and workspace scopes are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocations {
    /// Directory shared by every workspace. Avatars are stored below it.
    pub global_storage_dir: PathBuf,
    /// Directory private to the current workspace.
    pub workspace_storage_dir: PathBuf,
}

impl StorageLocations {
    /// Creates storage locations from explicit directories.
    #[must_use]
    pub fn new(global_storage_dir: impl Into<PathBuf>, workspace_storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_storage_dir: global_storage_dir.into(),
            workspace_storage_dir: workspace_storage_dir.into(),
        }
    }

    /// Returns the default locations for the workspace called `workspace_name`.
    ///
    /// # Errors
    /// Returns `ConfigError::NoConfigDir` if the platform has no config directory.
    pub fn for_workspace(workspace_name: &str) -> Result<Self, ConfigError> {
        let global = dirs::config_dir()
            .map(|p| p.join(APP_DIR))
            .ok_or(ConfigError::NoConfigDir)?;
        let workspace = global
            .join(WORKSPACES_DIR)
            .join(sanitize_dir_name(workspace_name));
        Ok(Self::new(global, workspace))
    }

    /// Returns the file backing the global scope.
    #[must_use]
    pub fn global_state_file(&self) -> PathBuf {
        self.global_storage_dir.join(GLOBAL_STATE_FILE)
    }

    /// Returns the file backing the workspace scope.
    #[must_use]
    pub fn workspace_state_file(&self) -> PathBuf {
        self.workspace_storage_dir.join(WORKSPACE_STATE_FILE)
    }

    /// Returns the global storage directory as a normalized path string.
    #[must_use]
    pub fn global_storage_path(&self) -> String {
        normalize_path(&self.global_storage_dir)
    }
}

/// Converts a path to a string with forward slashes and no trailing slash.
///
/// The filesystem root stays `/`.
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    match normalized.trim_end_matches('/') {
        "" if normalized.starts_with('/') => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn sanitize_dir_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "default".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_uses_forward_slashes() {
        assert_eq!(normalize_path(Path::new("C:\\Users\\dev\\state\\")), "C:/Users/dev/state");
        assert_eq!(normalize_path(Path::new("/home/dev/state/")), "/home/dev/state");
        assert_eq!(normalize_path(Path::new("/")), "/");
    }

    #[test]
    fn state_files_live_in_their_directories() {
        let locations = StorageLocations::new("/g", "/w");
        assert_eq!(locations.global_state_file(), PathBuf::from("/g/global-state.json"));
        assert_eq!(locations.workspace_state_file(), PathBuf::from("/w/workspace-state.json"));
        assert_eq!(locations.global_storage_path(), "/g");
    }

    #[test]
    fn workspace_names_are_sanitized() {
        assert_eq!(sanitize_dir_name("my project/α"), "my_project_α");
        assert_eq!(sanitize_dir_name(".."), "default");
        assert_eq!(sanitize_dir_name(""), "default");
    }

    #[test]
    fn default_locations_are_under_config_dir() {
        if let Ok(locations) = StorageLocations::for_workspace("demo") {
            assert!(locations.global_storage_dir.ends_with("repograph"));
            assert!(locations.workspace_storage_dir.ends_with("repograph/workspaces/demo"));
        }
    }
}
