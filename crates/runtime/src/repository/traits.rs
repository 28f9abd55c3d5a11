//! Repository contracts for small durable values.

use super::error::Result;

/// Durable string key-value storage, the host's "player prefs".
///
/// Values written with [`KeyValueStore::set`] must survive a process restart
/// for file-backed implementations. In-memory implementations exist for tests.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Check if a key exists
    fn contains(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }

    /// List all stored keys in ascending order.
    fn keys(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
