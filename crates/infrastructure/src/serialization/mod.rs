//! Deterministic JSON serialization for persisted scopes.
//!
//! Scope files are rewritten on every update, so output is kept stable:
//! - Object keys sorted alphabetically
//! - 2-space indentation
//! - Trailing newline

mod json;

pub use json::*;
