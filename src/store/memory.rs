//! In-memory settings table

use super::{Setting, SettingsStore};
use crate::error::Result;
use crate::sync::RwLockExt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

type RowKey = (String, String);

/// Process-local settings table (not persisted)
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<RowKey, Setting>>,
}

impl MemoryStore {
    /// Create an empty memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all groups
    pub fn len(&self) -> usize {
        self.rows.read_recovered("memory store").len()
    }

    /// Whether the table holds no rows at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SettingsStore for MemoryStore {
    fn find(&self, group: &str, key: &str) -> Result<Option<Setting>> {
        let rows = self.rows.read_recovered("memory store");
        Ok(rows.get(&(group.to_string(), key.to_string())).cloned())
    }

    fn select_group(&self, group: &str) -> Result<Vec<(String, String)>> {
        let rows = self.rows.read_recovered("memory store");
        Ok(rows
            .values()
            .filter(|row| row.group == group)
            .map(|row| (row.key.clone(), row.value.clone()))
            .collect())
    }

    fn select_distinct_groups(&self) -> Result<Vec<String>> {
        let rows = self.rows.read_recovered("memory store");
        let groups: BTreeSet<&str> = rows.keys().map(|(group, _)| group.as_str()).collect();
        Ok(groups.into_iter().map(str::to_string).collect())
    }

    fn upsert_many(&self, new_rows: Vec<Setting>) -> Result<()> {
        let mut rows = self.rows.write_recovered("memory store");
        for row in new_rows {
            let id = (row.group.clone(), row.key.clone());
            let merged = row.merge_into(rows.get(&id));
            rows.insert(id, merged);
        }
        Ok(())
    }

    fn delete_where(&self, group: &str, key: &str) -> Result<u64> {
        let mut rows = self.rows.write_recovered("memory store");
        Ok(u64::from(
            rows.remove(&(group.to_string(), key.to_string())).is_some(),
        ))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
