//! Durable reward cooldown timestamps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use super::{KeyValueStore, Result};
use crate::clock::Clock;

/// Key prefix used when none is configured.
pub const DEFAULT_COOLDOWN_PREFIX: &str = "RewardCooldownTime";

/// 9999-12-31T23:59:59Z as a Unix timestamp.
const LATEST_STORABLE_SECS: i64 = 253_402_300_799;

/// Latest timestamp whose RFC 3339 form parses back. Later values are
/// clamped to it on write.
pub fn latest_storable() -> DateTime<Utc> {
    DateTime::from_timestamp(LATEST_STORABLE_SECS, 0).expect("year 9999 is within chrono's range")
}

/// UTC "available again at" timestamps, one per cooldown key.
///
/// A key with no record has never been rewarded and is never blocking. Reads
/// are cached after the first lookup; only [`CooldownStore::set`] writes
/// through to the backing store.
pub struct CooldownStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
    cache: Mutex<HashMap<String, Option<DateTime<Utc>>>>,
}

impl CooldownStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_prefix(store, clock, DEFAULT_COOLDOWN_PREFIX)
    }

    pub fn with_prefix(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            prefix: prefix.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// True if `key` has no record or its timestamp is not in the future.
    pub fn elapsed(&self, key: &str) -> bool {
        match self.record(key) {
            Some(until) => until <= self.clock.now(),
            None => true,
        }
    }

    /// Stored timestamp for `key`, or now when there is none.
    ///
    /// Reading never creates a record.
    pub fn get(&self, key: &str) -> DateTime<Utc> {
        self.record(key).unwrap_or_else(|| self.clock.now())
    }

    /// Overwrite the timestamp for `key`.
    pub fn set(&self, key: &str, until: DateTime<Utc>) -> Result<()> {
        let until = until.min(latest_storable());
        self.store.set(&self.storage_key(key), &until.to_rfc3339())?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), Some(until));

        tracing::debug!("Cooldown {} set to {}", self.display_key(key), until);
        Ok(())
    }

    /// Make `key` available immediately.
    pub fn reset(&self, key: &str) -> Result<()> {
        tracing::info!("Reset reward cooldown time for {}", self.display_key(key));
        self.set(key, self.clock.now())
    }

    /// Cooldown keys with a persisted record under this store's prefix.
    pub fn keys(&self) -> Result<Vec<String>> {
        let nested = format!("{}:", self.prefix);
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| {
                if k == self.prefix {
                    Some(String::new())
                } else {
                    k.strip_prefix(&nested).map(str::to_owned)
                }
            })
            .collect())
    }

    fn record(&self, key: &str) -> Option<DateTime<Utc>> {
        if let Some(cached) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return *cached;
        }

        // A failed read is not cached, so the next lookup retries the store.
        let raw = match self.store.get(&self.storage_key(key)) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    "Failed to read cooldown {}: {}. Treating it as elapsed.",
                    self.display_key(key),
                    e
                );
                return None;
            }
        };

        let loaded = raw.and_then(|raw| self.parse(key, &raw));
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), loaded);
        loaded
    }

    fn parse(&self, key: &str, raw: &str) -> Option<DateTime<Utc>> {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable cooldown {} ({:?}): {}",
                    self.display_key(key),
                    raw,
                    e
                );
                None
            }
        }
    }

    fn storage_key(&self, key: &str) -> String {
        if key.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }

    fn display_key<'a>(&self, key: &'a str) -> &'a str {
        if key.is_empty() { "default" } else { key }
    }
}
