//! Common test utilities for kvsettings integration tests
//!
//! Provides a fixture wiring a manager to observable test doubles: a store
//! that counts group loads and can be told to fail, and a cache that can be
//! told to refuse or error on invalidation.

#![allow(dead_code)]

use kvsettings::{
    CacheBackend, Error, MemoryStore, MemoryTagCache, Result, Setting, SettingsManager,
    SettingsMap, SettingsStore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Store double
// =============================================================================

/// [`MemoryStore`] that counts group loads and fails on demand
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    loads: Mutex<HashMap<String, usize>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `select_group` calls for `group` so far
    pub fn loads(&self, group: &str) -> usize {
        self.loads.lock().unwrap().get(group).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().unwrap().values().sum()
    }

    pub fn reset_loads(&self) {
        self.loads.lock().unwrap().clear();
    }

    pub fn rows(&self) -> usize {
        self.inner.len()
    }

    fn check(flag: &AtomicBool, operation: &'static str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::Store {
                operation,
                reason: "store unavailable".into(),
            });
        }
        Ok(())
    }
}

impl SettingsStore for CountingStore {
    fn find(&self, group: &str, key: &str) -> Result<Option<Setting>> {
        Self::check(&self.fail_reads, "find")?;
        self.inner.find(group, key)
    }

    fn select_group(&self, group: &str) -> Result<Vec<(String, String)>> {
        Self::check(&self.fail_reads, "select")?;
        *self
            .loads
            .lock()
            .unwrap()
            .entry(group.to_string())
            .or_insert(0) += 1;
        self.inner.select_group(group)
    }

    fn select_distinct_groups(&self) -> Result<Vec<String>> {
        Self::check(&self.fail_reads, "select distinct")?;
        self.inner.select_distinct_groups()
    }

    fn upsert_many(&self, rows: Vec<Setting>) -> Result<()> {
        Self::check(&self.fail_writes, "upsert")?;
        self.inner.upsert_many(rows)
    }

    fn delete_where(&self, group: &str, key: &str) -> Result<u64> {
        Self::check(&self.fail_deletes, "delete")?;
        self.inner.delete_where(group, key)
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

// =============================================================================
// Cache double
// =============================================================================

/// How [`FlakyCache`] answers flush requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    #[default]
    Normal,
    /// Report `Ok(false)` without flushing
    Decline,
    /// Report an error without flushing
    Fail,
}

/// [`MemoryTagCache`] whose flushes and reads can be sabotaged
#[derive(Default)]
pub struct FlakyCache {
    pub inner: MemoryTagCache,
    flush_mode: Mutex<FlushMode>,
    pub fail_reads: AtomicBool,
    pub flushes: AtomicUsize,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flush_mode(&self, mode: FlushMode) {
        *self.flush_mode.lock().unwrap() = mode;
    }
}

impl CacheBackend for FlakyCache {
    fn remember_forever(
        &self,
        tags: &[&str],
        key: &str,
        loader: &dyn Fn() -> Result<SettingsMap>,
    ) -> Result<Arc<SettingsMap>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Cache("connection refused".into()));
        }
        self.inner.remember_forever(tags, key, loader)
    }

    fn flush_tag(&self, tag: &str) -> Result<bool> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        match *self.flush_mode.lock().unwrap() {
            FlushMode::Normal => self.inner.flush_tag(tag),
            FlushMode::Decline => Ok(false),
            FlushMode::Fail => Err(Error::Cache("flush timed out".into())),
        }
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

// =============================================================================
// Fixture
// =============================================================================

/// A manager wired to a [`CountingStore`] and a [`FlakyCache`]
pub struct TestFixture {
    pub store: Arc<CountingStore>,
    pub cache: Arc<FlakyCache>,
    pub manager: SettingsManager,
}

impl TestFixture {
    pub fn new() -> Self {
        init_logging();

        let store = Arc::new(CountingStore::new());
        let cache = Arc::new(FlakyCache::new());
        let manager = SettingsManager::builder()
            .shared_store(store.clone())
            .shared_cache(cache.clone())
            .build()
            .unwrap();

        Self {
            store,
            cache,
            manager,
        }
    }

    /// A second manager over the same store and cache, as another process would see them
    pub fn peer(&self) -> SettingsManager {
        SettingsManager::builder()
            .shared_store(self.store.clone())
            .shared_cache(self.cache.clone())
            .build()
            .unwrap()
    }
}
