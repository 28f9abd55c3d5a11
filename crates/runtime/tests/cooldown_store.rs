use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tempfile::TempDir;

use ads_runtime::repository::latest_storable;
use ads_runtime::{
    Clock, CooldownStore, FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, ManualClock,
    RepositoryError,
};

fn fixed_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
}

#[test]
fn absent_key_is_elapsed_and_reads_as_now_without_persisting() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let clock = fixed_clock();
    let store = CooldownStore::new(kv.clone(), Arc::new(clock.clone()));

    assert!(store.elapsed("button"));
    assert_eq!(store.get("button"), clock.now());
    assert!(kv.keys().unwrap().is_empty());
}

#[test]
fn timestamp_equal_to_now_counts_as_elapsed() {
    let clock = fixed_clock();
    let store = CooldownStore::new(Arc::new(InMemoryKeyValueStore::new()), Arc::new(clock.clone()));

    store.set("button", clock.now() + TimeDelta::seconds(10)).unwrap();
    assert!(!store.elapsed("button"));

    clock.advance(TimeDelta::seconds(10));
    assert!(store.elapsed("button"));
}

#[test]
fn values_are_namespaced_rfc3339_strings() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let clock = fixed_clock();
    let store = CooldownStore::new(kv.clone(), Arc::new(clock.clone()));

    store.set("", clock.now()).unwrap();
    store.set("button", clock.now()).unwrap();

    assert_eq!(
        kv.keys().unwrap(),
        vec![
            "RewardCooldownTime".to_owned(),
            "RewardCooldownTime:button".to_owned()
        ]
    );
    assert_eq!(
        kv.get("RewardCooldownTime").unwrap().as_deref(),
        Some("2026-03-01T12:00:00+00:00")
    );
}

#[test]
fn unreadable_value_is_treated_as_absent() {
    let kv = Arc::new(InMemoryKeyValueStore::with_entries([(
        "RewardCooldownTime:button",
        "next tuesday",
    )]));
    let store = CooldownStore::new(kv, Arc::new(fixed_clock()));

    assert!(store.elapsed("button"));
}

#[test]
fn cooldown_survives_reopening_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prefs.json");
    let clock = fixed_clock();
    let until = clock.now() + TimeDelta::seconds(300);

    {
        let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
        let store = CooldownStore::new(kv, Arc::new(clock.clone()));
        store.set("button", until).unwrap();
    }

    let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
    let store = CooldownStore::new(kv, Arc::new(clock.clone()));

    assert!(!store.elapsed("button"));
    assert_eq!(store.get("button"), until);

    clock.advance(TimeDelta::seconds(300));
    assert!(store.elapsed("button"));
}

#[test]
fn reset_writes_now() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let clock = fixed_clock();
    let store = CooldownStore::new(kv.clone(), Arc::new(clock.clone()));
    store.set("button", clock.now() + TimeDelta::hours(1)).unwrap();

    store.reset("button").unwrap();

    assert!(store.elapsed("button"));
    assert_eq!(store.get("button"), clock.now());
    assert!(kv.contains("RewardCooldownTime:button"));
}

#[test]
fn keys_lists_only_this_prefix() {
    let kv = Arc::new(InMemoryKeyValueStore::with_entries([
        ("RewardCooldownTime", "2026-03-01T12:00:00+00:00"),
        ("RewardCooldownTime:button", "2026-03-01T12:00:00+00:00"),
        ("SoundVolume", "0.8"),
    ]));
    let store = CooldownStore::new(kv, Arc::new(fixed_clock()));

    assert_eq!(store.keys().unwrap(), vec![String::new(), "button".to_owned()]);
}

/// Fails the first `failures` reads, then serves from memory.
struct FlakyStore {
    inner: InMemoryKeyValueStore,
    failures: AtomicU32,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RepositoryError::LockPoisoned);
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.inner.set(key, value)
    }
}

#[test]
fn failed_read_is_retried_instead_of_remembered() {
    let clock = fixed_clock();
    let until = clock.now() + TimeDelta::seconds(300);
    let kv = Arc::new(FlakyStore {
        inner: InMemoryKeyValueStore::with_entries([(
            "RewardCooldownTime:button".to_owned(),
            until.to_rfc3339(),
        )]),
        failures: AtomicU32::new(1),
    });
    let store = CooldownStore::new(kv, Arc::new(clock.clone()));

    assert!(store.elapsed("button"));
    assert!(!store.elapsed("button"));
    assert_eq!(store.get("button"), until);
}

#[test]
fn unbounded_cooldown_still_blocks_after_reopening() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prefs.json");
    let clock = fixed_clock();

    {
        let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
        let store = CooldownStore::new(kv, Arc::new(clock.clone()));
        store.set("button", DateTime::<Utc>::MAX_UTC).unwrap();
        assert!(!store.elapsed("button"));
    }

    let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
    let store = CooldownStore::new(kv.clone(), Arc::new(clock));

    assert!(!store.elapsed("button"));
    assert_eq!(store.get("button"), latest_storable());
    assert_eq!(
        kv.get("RewardCooldownTime:button").unwrap().as_deref(),
        Some("9999-12-31T23:59:59+00:00")
    );
}
