//! In-memory KeyValueStore implementation for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::repository::{KeyValueStore, RepositoryError, Result};

/// In-memory implementation of KeyValueStore.
///
/// Nothing is persisted; values live as long as the store.
pub struct InMemoryKeyValueStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.values
            .read()
            .map(|values| values.contains_key(key))
            .unwrap_or(false)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(values.keys().cloned().collect())
    }
}
