//! Durable settings table
//!
//! The store holds `(group, key, value)` rows with `(group, key)` unique.
//! Backends:
//! - **Memory**: process-local table, for tests and ephemeral setups
//! - **File**: the whole table in one JSON/TOML/YAML document

mod file;
mod memory;

pub use file::{FileStore, FileStoreBuilder};
pub use memory::MemoryStore;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A persisted settings row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub group: String,
    pub key: String,
    /// Encoded form, see [`crate::codec::ValueCodec`]
    pub value: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Setting {
    /// Build a fresh row stamped with the current time
    pub fn new(group: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            group: group.into(),
            key: key.into(),
            value: value.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an upsert on top of an existing row: new value, same `created_at`
    pub(crate) fn merge_into(self, existing: Option<&Setting>) -> Setting {
        match existing {
            Some(old) => Setting {
                created_at: old.created_at,
                ..self
            },
            None => self,
        }
    }
}

/// Trait for settings table backends
///
/// Implementations must keep `(group, key)` unique. Every method is a
/// blocking call; timeouts and retries belong to the implementation.
pub trait SettingsStore: Send + Sync {
    /// Point lookup of a single row
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn find(&self, group: &str, key: &str) -> Result<Option<Setting>>;

    /// All `(key, value)` pairs of one group
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn select_group(&self, group: &str) -> Result<Vec<(String, String)>>;

    /// Distinct group names present in the table, in backend order
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn select_distinct_groups(&self) -> Result<Vec<String>>;

    /// Insert or update one row keyed by `(group, key)`
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the table is left unchanged.
    fn upsert_one(&self, group: &str, key: &str, value: &str) -> Result<()> {
        self.upsert_many(vec![Setting::new(group, key, value)])
    }

    /// Insert or update many rows in one operation, all or nothing
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; none of the rows are applied.
    fn upsert_many(&self, rows: Vec<Setting>) -> Result<()>;

    /// Delete the row matching `(group, key)`, returning the number of rows removed
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn delete_where(&self, group: &str, key: &str) -> Result<u64>;

    /// Backend name for logging/debugging
    fn backend_name(&self) -> &'static str;
}
