//! Repository layer for durable client-side data.
//!
//! The only value that outlives a session is the reward cooldown. It is kept
//! in a small string key-value store so any host "prefs" facility can back
//! it.

mod cooldown;
mod error;
mod file;
mod memory;
mod traits;

pub use cooldown::{CooldownStore, DEFAULT_COOLDOWN_PREFIX, latest_storable};
pub use error::{RepositoryError, Result};
pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use traits::KeyValueStore;
