//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the state store and the host.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod clock;
mod file_system;
mod key_value_store;

pub use clock::Clock;
pub use file_system::{FileSystem, FileSystemError};
pub use key_value_store::{KeyValueStore, StoreError};
