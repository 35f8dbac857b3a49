//! Repograph Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, and wires them into a ready
//! to use state store.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{MemoryKeyValueStore, SystemClock};
pub use bootstrap::{FileStateStore, open_state_store};
pub use config::{ConfigError, StorageLocations, normalize_path};
pub use persistence::{JsonFileKeyValueStore, TokioFileSystem};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
