//! File-based KeyValueStore implementation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::repository::{KeyValueStore, RepositoryError, Result};

/// File-based implementation of KeyValueStore.
///
/// # File Format
///
/// All entries live in a single pretty-printed JSON object of string to
/// string. The whole document is rewritten on every change: written to a
/// `.tmp` sibling first, then renamed over the original so a crash never
/// leaves a half-written file behind.
pub struct FileKeyValueStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(RepositoryError::Io)?;
        }

        let values = if path.exists() {
            let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&bytes).map_err(|e| {
                    RepositoryError::CorruptedData(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Opened key-value store {} ({} entries)", path.display(), values.len());

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");

        let bytes =
            serde_json::to_vec_pretty(values).map_err(|e| RepositoryError::Json(e.to_string()))?;

        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &self.path).map_err(RepositoryError::Io)?;

        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
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
        self.persist(&values)?;

        tracing::debug!("Saved {} to {}", key, self.path.display());

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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs").join("ads.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("RewardCooldownTime", "2026-01-01T00:00:00Z").unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("RewardCooldownTime").unwrap().as_deref(),
            Some("2026-01-01T00:00:00Z")
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn keys_are_sorted_after_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.keys().unwrap(), vec!["a".to_owned(), "b".to_owned()]);
        assert!(reopened.contains("a"));
    }

    #[test]
    fn garbage_file_is_reported_as_corrupted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.json");
        fs::write(&path, b"not json").unwrap();

        let err = FileKeyValueStore::open(&path).err().unwrap();
        assert!(matches!(err, RepositoryError::CorruptedData(_)));
    }
}
