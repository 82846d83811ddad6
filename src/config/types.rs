//! Core types for kvsettings

use crate::cache::CacheStrategy;
use crate::error::{Error, Result};

/// Group used when none (or a blank one) is given
pub const DEFAULT_GROUP: &str = "default";

/// Configuration shared by every group-scoped [`SettingsManager`](crate::SettingsManager)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsConfig {
    /// Group a fresh manager is scoped to (default: "default")
    pub default_group: String,

    /// Global cache tag; group tags are `<namespace>.group.<group>` (default: "settings")
    pub cache_namespace: String,

    /// Cache key the decoded group mapping is stored under (default: "data")
    pub data_key: String,

    /// Strategy for the built-in in-memory cache
    pub cache_strategy: CacheStrategy,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            default_group: DEFAULT_GROUP.into(),
            cache_namespace: "settings".into(),
            data_key: "data".into(),
            cache_strategy: CacheStrategy::default(),
        }
    }
}

impl SettingsConfig {
    /// Create a new builder for SettingsConfig
    ///
    /// # Example
    /// ```rust
    /// use kvsettings::{CacheStrategy, SettingsConfig};
    ///
    /// let config = SettingsConfig::builder()
    ///     .cache_namespace("app-settings")
    ///     .cache_strategy(CacheStrategy::Lru(32))
    ///     .build()?;
    /// # Ok::<(), kvsettings::Error>(())
    /// ```
    pub fn builder() -> SettingsConfigBuilder {
        SettingsConfigBuilder::new()
    }

    /// Tag spanning every group's cache entry
    pub fn global_tag(&self) -> &str {
        &self.cache_namespace
    }

    /// Tag of a single group's cache entry
    pub fn group_tag(&self, group: &str) -> String {
        format!("{}.group.{group}", self.cache_namespace)
    }

    /// Normalize a group name: trimmed, blank becomes the default group
    pub fn normalize_group(&self, group: &str) -> String {
        match group.trim() {
            "" => self.default_group.clone(),
            trimmed => trimmed.to_string(),
        }
    }

    /// Check the configuration for values that would break tagging
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for blank names or an invalid cache strategy.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("default_group", &self.default_group),
            ("cache_namespace", &self.cache_namespace),
            ("data_key", &self.data_key),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{field} must not be blank")));
            }
        }
        self.cache_strategy.validate()
    }
}

/// Builder for creating SettingsConfig with a fluent API
#[derive(Debug, Clone, Default)]
pub struct SettingsConfigBuilder {
    config: SettingsConfig,
}

impl SettingsConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the group fresh managers are scoped to
    pub fn default_group(mut self, group: impl Into<String>) -> Self {
        self.config.default_group = group.into().trim().to_string();
        self
    }

    /// Set the cache namespace (the global tag)
    pub fn cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.cache_namespace = namespace.into();
        self
    }

    /// Set the cache key a group mapping is stored under
    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.config.data_key = key.into();
        self
    }

    /// Set the strategy of the built-in cache
    pub fn cache_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.config.cache_strategy = strategy;
        self
    }

    /// Build the SettingsConfig
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn build(self) -> Result<SettingsConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
