use crate::error::{Error, Result};
use crate::manager::core::SettingsManager;
use crate::store::Setting;

use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

impl SettingsManager {
    /// Save a single setting value.
    ///
    /// The row is upserted on `(group, key)` and the group's cache tag is
    /// invalidated afterwards, so the next read reloads from the store.
    ///
    /// Returns `Ok(true)` once both steps succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * `key` is blank
    /// * The value cannot be encoded
    /// * The store write fails
    /// * The cache tag cannot be invalidated (the write itself is persisted)
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        validate_key(key)?;
        let encoded = self.codec.encode(&value.into())?;

        self.store.upsert_one(&self.group, key, &encoded)?;
        debug!("Saved '{key}' in group '{}'", self.group);

        self.invalidate_group()?;
        Ok(true)
    }

    /// Save several settings of the group in one store operation.
    ///
    /// Duplicate keys keep the last value. The group tag is invalidated
    /// once, after the batch is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * `values` is empty or contains a blank key
    /// * A value cannot be encoded
    /// * The store write fails (no row is applied)
    /// * The cache tag cannot be invalidated (the batch itself is persisted)
    pub fn set_many<I, K, V>(&self, values: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values: BTreeMap<String, Value> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if values.is_empty() {
            return Err(Error::InvalidInput(
                "values to set cannot be empty".into(),
            ));
        }

        let rows = values
            .iter()
            .map(|(key, value)| {
                validate_key(key)?;
                let encoded = self.codec.encode(value)?;
                Ok(Setting::new(self.group.as_str(), key.as_str(), encoded))
            })
            .collect::<Result<Vec<_>>>()?;

        let count = rows.len();
        self.store.upsert_many(rows)?;
        info!("Saved {count} setting(s) in group '{}'", self.group);

        self.invalidate_group()?;
        Ok(true)
    }

    /// Delete a setting.
    ///
    /// Returns `false` when no row matched. Store and cache failures are
    /// logged and also reported as `false`; a cache entry left behind by a
    /// failed invalidation is replaced on the next flush of its tags.
    pub fn forget(&self, key: &str) -> bool {
        let deleted = match self.store.delete_where(&self.group, key) {
            Ok(deleted) => deleted,
            Err(e) => {
                error!("Failed to delete '{key}' from group '{}': {e}", self.group);
                return false;
            }
        };

        if deleted == 0 {
            debug!("Nothing to delete for '{key}' in group '{}'", self.group);
            return false;
        }

        match self.invalidate_group() {
            Ok(()) => {
                debug!("Deleted '{key}' from group '{}'", self.group);
                true
            }
            Err(e) => {
                warn!("Deleted '{key}' from group '{}' but {e}", self.group);
                false
            }
        }
    }

    /// Invalidate the cache entry of this manager's group only.
    ///
    /// Best-effort: backend errors are logged and reported as `false`.
    pub fn flush_cache(&self) -> bool {
        let tag = self.group_tag();
        self.flush_best_effort(&tag)
    }

    /// Invalidate the cache entries of every group at once.
    ///
    /// Flushes the single global tag, independent of how many groups exist.
    /// Best-effort: backend errors are logged and reported as `false`.
    pub fn flush_all_cache(&self) -> bool {
        let tag = self.config.global_tag().to_string();
        self.flush_best_effort(&tag)
    }

    fn flush_best_effort(&self, tag: &str) -> bool {
        match self.cache.flush_tag(tag) {
            Ok(flushed) => {
                if !flushed {
                    warn!("Cache backend declined to flush tag '{tag}'");
                }
                flushed
            }
            Err(e) => {
                warn!("Failed to flush cache tag '{tag}': {e}");
                false
            }
        }
    }

    /// Invalidate the group tag after a write, failing loudly
    fn invalidate_group(&self) -> Result<()> {
        let tag = self.group_tag();
        match self.cache.flush_tag(&tag) {
            Ok(true) => Ok(()),
            Ok(false) => {
                error!("Cache backend declined to flush tag '{tag}' after a write");
                Err(Error::CacheInvalidation { tag })
            }
            Err(e) => {
                error!("Failed to flush cache tag '{tag}' after a write: {e}");
                Err(e)
            }
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidInput("setting key must not be blank".into()));
    }
    Ok(())
}
