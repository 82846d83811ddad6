//! In-process tagged cache
//!
//! Each tag has a generation counter. An entry remembers the generations of
//! its tags as they were when its load started; flushing a tag bumps the
//! counter, which turns every entry carrying it into a miss. Flushing is O(1)
//! regardless of how many entries or groups exist.

use super::{CacheBackend, CacheStrategy};
use crate::SettingsMap;
use crate::error::Result;
use crate::sync::MutexExt;

use log::{debug, trace};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

struct Entry {
    value: Arc<SettingsMap>,
    /// `(tag, generation)` observed when the load began
    stamp: Vec<(String, u64)>,
}

enum Slots {
    Full(HashMap<String, Entry>),
    Lru(LruCache<String, Entry>),
    Off,
}

impl Slots {
    fn new(strategy: CacheStrategy) -> Self {
        match strategy {
            CacheStrategy::Full => Slots::Full(HashMap::new()),
            CacheStrategy::Lru(size) => match NonZeroUsize::new(size) {
                Some(cap) => Slots::Lru(LruCache::new(cap)),
                None => Slots::Off,
            },
            CacheStrategy::None => Slots::Off,
        }
    }

    fn get(&mut self, id: &str) -> Option<&Entry> {
        match self {
            Slots::Full(map) => map.get(id),
            Slots::Lru(lru) => lru.get(id),
            Slots::Off => None,
        }
    }

    fn insert(&mut self, id: String, entry: Entry) {
        match self {
            Slots::Full(map) => {
                map.insert(id, entry);
            }
            Slots::Lru(lru) => {
                lru.put(id, entry);
            }
            Slots::Off => {}
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        match self {
            Slots::Full(map) => map.remove(id).is_some(),
            Slots::Lru(lru) => lru.pop(id).is_some(),
            Slots::Off => false,
        }
    }

    fn len(&self) -> usize {
        match self {
            Slots::Full(map) => map.len(),
            Slots::Lru(lru) => lru.len(),
            Slots::Off => 0,
        }
    }
}

struct State {
    generations: HashMap<String, u64>,
    slots: Slots,
}

impl State {
    fn generation(&self, tag: &str) -> u64 {
        self.generations.get(tag).copied().unwrap_or(0)
    }

    fn stamp(&self, tags: &[&str]) -> Vec<(String, u64)> {
        tags.iter()
            .map(|tag| ((*tag).to_string(), self.generation(tag)))
            .collect()
    }

    fn is_current(&self, stamp: &[(String, u64)]) -> bool {
        stamp
            .iter()
            .all(|(tag, seen)| self.generation(tag) == *seen)
    }

    /// Fresh entry for `id`, dropping it if one of its tags was flushed
    fn lookup(&mut self, id: &str) -> Option<Arc<SettingsMap>> {
        let current = match self.slots.get(id) {
            Some(entry) => {
                let stamp = entry.stamp.clone();
                let value = Arc::clone(&entry.value);
                self.is_current(&stamp).then_some(value)
            }
            None => return None,
        };
        if current.is_none() {
            self.slots.remove(id);
        }
        current
    }
}

/// Entry identity: order-independent tag set plus key
fn entry_id(tags: &[&str], key: &str) -> String {
    let mut sorted: Vec<&str> = tags.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    format!("{}::{key}", sorted.join("|"))
}

/// In-memory [`CacheBackend`] with tag generations
pub struct MemoryTagCache {
    strategy: CacheStrategy,
    state: Mutex<State>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryTagCache {
    /// Create a cache honoring `strategy`
    ///
    /// An `Lru(0)` strategy behaves like [`CacheStrategy::None`]; validate the
    /// strategy first to reject it instead.
    #[must_use]
    pub fn new(strategy: CacheStrategy) -> Self {
        Self {
            strategy,
            state: Mutex::new(State {
                generations: HashMap::new(),
                slots: Slots::new(strategy),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The strategy this cache was built with
    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    /// Peek at a fresh entry without loading anything
    pub fn get(&self, tags: &[&str], key: &str) -> Option<Arc<SettingsMap>> {
        let id = entry_id(tags, key);
        self.state.lock_recovered("tag cache").lookup(&id)
    }

    /// Drop the single entry stored under `tags` + `key`, returning whether one existed
    pub fn forget(&self, tags: &[&str], key: &str) -> bool {
        let id = entry_id(tags, key);
        self.state.lock_recovered("tag cache").slots.remove(&id)
    }

    /// Number of stored entries, including ones already invalidated but not yet evicted
    pub fn len(&self) -> usize {
        self.state.lock_recovered("tag cache").slots.len()
    }

    /// Whether no entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads served from a stored entry
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Reads that had to run the loader
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for MemoryTagCache {
    fn default() -> Self {
        Self::new(CacheStrategy::default())
    }
}

impl CacheBackend for MemoryTagCache {
    fn remember_forever(
        &self,
        tags: &[&str],
        key: &str,
        loader: &dyn Fn() -> Result<SettingsMap>,
    ) -> Result<Arc<SettingsMap>> {
        let id = entry_id(tags, key);

        let stamp = {
            let mut state = self.state.lock_recovered("tag cache");
            if let Some(value) = state.lookup(&id) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!("Cache hit for {id}");
                return Ok(value);
            }
            state.stamp(tags)
        };

        // The loader runs unlocked. A flush that lands while it runs bumps a
        // generation past `stamp`, so the result is returned but not stored.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(loader()?);

        let mut state = self.state.lock_recovered("tag cache");
        if state.is_current(&stamp) {
            state.slots.insert(
                id,
                Entry {
                    value: Arc::clone(&value),
                    stamp,
                },
            );
        } else {
            debug!("Tag flushed during load of {id}, result not cached");
        }
        Ok(value)
    }

    fn flush_tag(&self, tag: &str) -> Result<bool> {
        let mut state = self.state.lock_recovered("tag cache");
        let generation = state.generations.entry(tag.to_string()).or_insert(0);
        *generation = generation.wrapping_add(1);
        debug!("Flushed cache tag '{tag}' (generation {generation})");
        Ok(true)
    }

    fn flush_tags(&self, tags: &[&str]) -> Result<bool> {
        let mut state = self.state.lock_recovered("tag cache");
        for tag in tags {
            let generation = state.generations.entry((*tag).to_string()).or_insert(0);
            *generation = generation.wrapping_add(1);
        }
        debug!("Flushed cache tags {tags:?}");
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
