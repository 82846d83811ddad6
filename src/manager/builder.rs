//! Builder for SettingsManager
//!
//! This module contains [`SettingsManagerBuilder`] which provides a fluent API
//! for creating a [`SettingsManager`](super::SettingsManager).

use crate::cache::{CacheBackend, CacheStrategy, MemoryTagCache};
use crate::codec::{CastingCodec, ValueCodec};
use crate::config::{SettingsConfig, SettingsConfigBuilder};
use crate::error::Result;
use crate::store::{MemoryStore, SettingsStore};

use log::{debug, info};
use std::sync::Arc;

use super::SettingsManager;

/// Builder for creating a [`SettingsManager`] with a fluent API.
///
/// Every collaborator is optional:
/// - store: [`MemoryStore`]
/// - cache: [`MemoryTagCache`] honoring the configured [`CacheStrategy`]
/// - codec: [`CastingCodec`]
///
/// # Example
///
/// ```rust,no_run
/// use kvsettings::{CacheStrategy, FileStore, SettingsManager};
///
/// let settings = SettingsManager::builder()
///     .store(FileStore::builder("my-app").dir("~/.config/my-app").build()?)
///     .cache_strategy(CacheStrategy::Lru(64))
///     .build()?;
/// # Ok::<(), kvsettings::Error>(())
/// ```
#[derive(Default)]
pub struct SettingsManagerBuilder {
    config_builder: SettingsConfigBuilder,
    store: Option<Arc<dyn SettingsStore>>,
    cache: Option<Arc<dyn CacheBackend>>,
    codec: Option<Arc<dyn ValueCodec>>,
}

impl SettingsManagerBuilder {
    /// Create a new builder with default collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `store` as the durable settings table.
    pub fn store(mut self, store: impl SettingsStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Use a store shared with other managers.
    pub fn shared_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `cache` instead of the built-in in-memory cache.
    ///
    /// The configured [`CacheStrategy`] only applies to the built-in cache.
    pub fn cache(mut self, cache: impl CacheBackend + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Use a cache shared with other managers.
    ///
    /// Managers built separately over the same store must share a cache to
    /// see each other's invalidations.
    pub fn shared_cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use `codec` to encode and decode values.
    pub fn codec(mut self, codec: impl ValueCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Set the group a fresh manager is scoped to (default: "default").
    pub fn default_group(mut self, group: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.default_group(group);
        self
    }

    /// Set the cache namespace, used as the global tag (default: "settings").
    pub fn cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.cache_namespace(namespace);
        self
    }

    /// Set the cache key each group mapping is stored under (default: "data").
    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.data_key(key);
        self
    }

    /// Set the strategy of the built-in cache.
    pub fn cache_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.config_builder = self.config_builder.cache_strategy(strategy);
        self
    }

    /// Build the [`SettingsManager`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (blank names,
    /// `CacheStrategy::Lru(0)`).
    pub fn build(self) -> Result<SettingsManager> {
        let config: SettingsConfig = self.config_builder.build()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn SettingsStore>);
        let cache: Arc<dyn CacheBackend> = match self.cache {
            Some(cache) => {
                debug!(
                    "Using external {} cache, strategy {:?} ignored",
                    cache.backend_name(),
                    config.cache_strategy
                );
                cache
            }
            None => Arc::new(MemoryTagCache::new(config.cache_strategy)),
        };
        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(CastingCodec::new()) as Arc<dyn ValueCodec>);

        info!(
            "Settings manager ready ({} store, {} cache, group '{}')",
            store.backend_name(),
            cache.backend_name(),
            config.default_group
        );

        Ok(SettingsManager::from_parts(
            store,
            cache,
            codec,
            Arc::new(config),
        ))
    }
}
