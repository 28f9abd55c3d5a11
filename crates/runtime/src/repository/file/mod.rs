//! File-based repository implementations.

mod kv;

pub use kv::FileKeyValueStore;
