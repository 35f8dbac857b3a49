//! File system abstraction port.

use std::path::{Path, PathBuf};

/// Error type for file system operations.
#[derive(Debug, thiserror::Error)]
pub enum FileSystemError {
    /// File not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Path already exists.
    #[error("Path already exists: {0}")]
    AlreadyExists(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over the file system operations used for avatar storage.
///
/// This trait allows mocking file system access in tests.
pub trait FileSystem: Send + Sync {
    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> impl std::future::Future<Output = bool> + Send;

    /// Creates a single directory. The parent must already exist.
    ///
    /// # Errors
    ///
    /// Returns `FileSystemError::AlreadyExists` if the path is already taken,
    /// or another error if the directory cannot be created.
    fn create_dir(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<(), FileSystemError>> + Send;

    /// Lists entries in a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn read_dir(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<Vec<PathBuf>, FileSystemError>> + Send;

    /// Removes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<(), FileSystemError>> + Send;
}
