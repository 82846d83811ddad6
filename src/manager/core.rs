use crate::SettingsMap;
use crate::cache::CacheBackend;
use crate::codec::ValueCodec;
use crate::config::SettingsConfig;
use crate::error::{Error, Result};
use crate::store::SettingsStore;

use log::{trace, warn};
use std::sync::Arc;

use super::SettingsManagerBuilder;

/// Group-scoped access to the settings table through a tagged read-through cache.
///
/// Every manager is bound to one group. Reads go through the cache entry of
/// that group; writes hit the store first and then invalidate the group's
/// cache tag, so a reader never sees a value older than the last
/// acknowledged write.
///
/// Managers are cheap to clone: the store, cache, codec and configuration are
/// shared, only the group name is owned. [`SettingsManager::group`] returns a
/// new manager and never changes the one it was called on.
///
/// # Example
///
/// ```rust
/// use kvsettings::SettingsManager;
///
/// let settings = SettingsManager::builder().build()?;
/// settings.set("app.locale", "ro")?;
///
/// let mail = settings.group("mail");
/// mail.set("smtp.port", 25)?;
///
/// assert_eq!(settings.get("app.locale")?, "ro");
/// assert!(!settings.has("smtp.port"));
/// # Ok::<(), kvsettings::Error>(())
/// ```
#[derive(Clone)]
pub struct SettingsManager {
    pub(crate) store: Arc<dyn SettingsStore>,
    pub(crate) cache: Arc<dyn CacheBackend>,
    pub(crate) codec: Arc<dyn ValueCodec>,
    pub(crate) config: Arc<SettingsConfig>,
    pub(crate) group: String,
}

impl std::fmt::Debug for SettingsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsManager")
            .field("group", &self.group)
            .field("store", &self.store.backend_name())
            .field("cache", &self.cache.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl SettingsManager {
    /// Create a builder
    ///
    /// Without further options the manager uses an in-memory store, an
    /// in-memory tag cache and the casting codec.
    pub fn builder() -> SettingsManagerBuilder {
        SettingsManagerBuilder::new()
    }

    pub(crate) fn from_parts(
        store: Arc<dyn SettingsStore>,
        cache: Arc<dyn CacheBackend>,
        codec: Arc<dyn ValueCodec>,
        config: Arc<SettingsConfig>,
    ) -> Self {
        let group = config.default_group.clone();
        Self {
            store,
            cache,
            codec,
            config,
            group,
        }
    }

    /// A manager scoped to `name`
    ///
    /// The name is trimmed; a blank name selects the default group.
    #[must_use]
    pub fn group(&self, name: &str) -> Self {
        Self {
            group: self.config.normalize_group(name),
            ..self.clone()
        }
    }

    /// Group this manager reads and writes
    pub fn group_name(&self) -> &str {
        &self.group
    }

    /// Shared configuration
    pub fn config(&self) -> &SettingsConfig {
        &self.config
    }

    pub(crate) fn group_tag(&self) -> String {
        self.config.group_tag(&self.group)
    }

    /// Read every row of the group straight from the store and decode it
    pub(crate) fn load_group(&self) -> Result<SettingsMap> {
        let rows = self.store.select_group(&self.group)?;
        trace!(
            "Loaded {} row(s) for group '{}' from {} store",
            rows.len(),
            self.group,
            self.store.backend_name()
        );

        Ok(rows
            .into_iter()
            .map(|(key, raw)| {
                let value = self.codec.decode(Some(&raw));
                (key, value)
            })
            .collect())
    }

    /// Cached mapping of the group, loading it on a miss
    ///
    /// A failing cache backend degrades to a direct store read.
    pub(crate) fn cached_group(&self) -> Result<Arc<SettingsMap>> {
        let group_tag = self.group_tag();
        let tags = [self.config.global_tag(), group_tag.as_str()];

        match self
            .cache
            .remember_forever(&tags, &self.config.data_key, &|| self.load_group())
        {
            Ok(map) => Ok(map),
            Err(Error::Cache(reason)) => {
                warn!(
                    "Cache read for group '{}' failed, reading store directly: {reason}",
                    self.group
                );
                self.load_group().map(Arc::new)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn not_found(&self, key: &str) -> Error {
        Error::SettingNotFound {
            group: self.group.clone(),
            key: key.to_string(),
        }
    }
}
