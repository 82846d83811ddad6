//! Cache backend types
//!
//! A cache entry is identified by its key plus the set of tags attached to
//! it. Flushing a tag invalidates every entry carrying that tag, without the
//! caller knowing which keys exist.

mod memory;

pub use memory::MemoryTagCache;

use crate::SettingsMap;
use crate::error::Result;
use std::sync::Arc;

/// Cache strategy for the in-memory backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Keep every loaded group until it is invalidated (default)
    #[default]
    Full,
    /// Keep at most this many loaded groups, evicting the least recently used
    Lru(usize),
    /// No caching - every read goes to the store
    None,
}

impl CacheStrategy {
    /// Validate cache strategy configuration
    ///
    /// # Errors
    ///
    /// Returns error if LRU size is 0
    pub fn validate(&self) -> Result<()> {
        match self {
            CacheStrategy::Lru(0) => Err(crate::Error::Config(
                "LRU cache size must be greater than 0".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Trait for tag-aware cache backends
///
/// Entries never expire on their own. They are dropped when a tag they carry
/// is flushed or when the backend evicts them.
pub trait CacheBackend: Send + Sync {
    /// Return the entry stored under `tags` + `key`, loading and storing it on a miss
    ///
    /// If `loader` fails nothing is stored and its error is returned.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, or an error if the backend is unreachable.
    fn remember_forever(
        &self,
        tags: &[&str],
        key: &str,
        loader: &dyn Fn() -> Result<SettingsMap>,
    ) -> Result<Arc<SettingsMap>>;

    /// Invalidate every entry carrying `tag`
    ///
    /// Returns `false` if the backend declined the flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable.
    fn flush_tag(&self, tag: &str) -> Result<bool>;

    /// Invalidate every entry carrying any of `tags`
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`CacheBackend::flush_tag`].
    fn flush_tags(&self, tags: &[&str]) -> Result<bool> {
        let mut flushed = true;
        for tag in tags {
            flushed &= self.flush_tag(tag)?;
        }
        Ok(flushed)
    }

    /// Backend name for logging/debugging
    fn backend_name(&self) -> &'static str;
}
