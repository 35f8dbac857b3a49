//! Persistence implementations for file-based storage.

mod file_system;
mod json_file_store;

pub use file_system::*;
pub use json_file_store::*;
