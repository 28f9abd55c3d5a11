//! In-memory repository implementations for testing and development.

mod kv;

pub use kv::InMemoryKeyValueStore;
