//! Application error types

use thiserror::Error;

use crate::ports::StoreError;

/// A state write that did not reach the host store.
///
/// The message is meant to be shown to the user as is.
#[derive(Debug, Error)]
pub enum StateError {
    /// Writing to the global scope failed.
    #[error("Unable to save the global state. The change was not persisted.")]
    GlobalSave(#[source] StoreError),

    /// Writing to the workspace scope failed.
    #[error("Unable to save the workspace state. The change was not persisted.")]
    WorkspaceSave(#[source] StoreError),
}

/// Result type alias for state writes.
pub type StateResult<T> = Result<T, StateError>;
