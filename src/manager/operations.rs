use crate::SettingsMap;
use crate::error::{Error, Result};
use crate::manager::core::SettingsManager;
use crate::store::Setting;

use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

impl SettingsManager {
    /// Get every setting of the group as a decoded key -> value mapping.
    ///
    /// Served from the group's cache entry; on a miss the group is loaded
    /// from the store once and cached until the group (or everything) is
    /// invalidated.
    ///
    /// # Errors
    ///
    /// Returns an error if the group has to be loaded and the store fails.
    pub fn all(&self) -> Result<Arc<SettingsMap>> {
        self.cached_group()
    }

    /// Get a single setting value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SettingNotFound`] if the key does not exist in the
    /// group, or a store error if the group cannot be loaded.
    pub fn get(&self, key: &str) -> Result<Value> {
        self.all()?
            .get(key)
            .cloned()
            .ok_or_else(|| self.not_found(key))
    }

    /// Get a single setting value, falling back to `default` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be loaded.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Result<Value> {
        Ok(self
            .all()?
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into()))
    }

    /// Get a single setting deserialized into `T`.
    ///
    /// # Type Parameters
    ///
    /// * `T` - The type to deserialize the value into
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The setting doesn't exist
    /// - The value cannot be deserialized to type `T`
    /// - The store read fails
    pub fn get_as<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self.get(key)?;
        serde_json::from_value(value).map_err(|e| Error::Parse(format!("{key}: {e}")))
    }

    /// Get several settings from a single load of the group.
    ///
    /// All-or-nothing: if any key is missing the call fails naming the
    /// first missing key, in the order requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SettingNotFound`] for the first missing key, or a
    /// store error if the group cannot be loaded.
    pub fn get_many<I, K>(&self, keys: I) -> Result<SettingsMap>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let all = self.all()?;
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                all.get(key)
                    .map(|value| (key.to_string(), value.clone()))
                    .ok_or_else(|| self.not_found(key))
            })
            .collect()
    }

    /// Check whether `key` exists in the group.
    ///
    /// A failing store is logged and reported as `false`.
    pub fn has(&self, key: &str) -> bool {
        match self.all() {
            Ok(all) => all.contains_key(key),
            Err(e) => {
                warn!("Could not check '{key}' in group '{}': {e}", self.group);
                false
            }
        }
    }

    /// Get the raw persisted row for `key`, bypassing the cache.
    ///
    /// Useful to inspect the encoded value or the row timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn find(&self, key: &str) -> Result<Option<Setting>> {
        self.store.find(&self.group, key)
    }

    /// List the distinct groups present in the store.
    ///
    /// Never cached. Order is whatever the store returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn all_groups(&self) -> Result<Vec<String>> {
        let groups = self.store.select_distinct_groups()?;
        debug!("Found {} group(s)", groups.len());
        Ok(groups)
    }
}
