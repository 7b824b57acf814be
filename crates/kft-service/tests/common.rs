//! Shared helpers for the service integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use kft_core::Month;
use kft_service::Ledger;
use kft_store::schema::table;
use kft_store::{KvStore, MemoryStore, Scan, StoreError};

pub fn january() -> Month {
    Month::new(2024, 1).unwrap()
}

/// Noon on `day` of January 2024, offset by `secs`.
pub fn jan(day: u32, secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, secs).unwrap()
}

/// A ledger over a fresh in-memory store, with alice (1) and bob (2) registered.
pub fn memory_ledger() -> (Arc<MemoryStore>, Ledger) {
    let store = Arc::new(MemoryStore::new());
    let ledger = Ledger::open(store.clone()).unwrap();
    ledger.register_users(&["alice", "bob"], Some("alice")).unwrap();
    (store, ledger)
}

/// Wraps a store and fails writes to the cache table while `fail_cache` is set.
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_cache: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_cache: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl KvStore for FlakyStore {
    fn get(&self, key: &[u8]) -> kft_store::Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> kft_store::Result<()> {
        if key.first() == Some(&table::CACHE) && self.fail_cache.load(Ordering::SeqCst) {
            return Err(StoreError::Database("disk full".to_string()));
        }
        self.inner.set(key, value)
    }

    fn iterate_prefix(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> kft_store::Result<Scan>,
    ) -> kft_store::Result<()> {
        self.inner.iterate_prefix(prefix, visit)
    }
}
