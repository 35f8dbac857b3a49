//! Adapters for the application ports that are not file based.

mod memory_store;
mod system_clock;

pub use memory_store::MemoryKeyValueStore;
pub use system_clock::SystemClock;
