//! Repograph Application - State store and ports
//!
//! This crate defines the application layer with:
//! - Port traits (host key/value scopes, file system, clock)
//! - The state store facade built on them
//! - Application-level error handling

pub mod error;
pub mod ports;
pub mod state_store;

pub use error::{StateError, StateResult};
pub use state_store::{StartedCodeReview, StateStore};
