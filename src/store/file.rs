//! File-backed settings table
//!
//! The whole table lives in one document. Every write rewrites that document
//! atomically, which makes `upsert_many` a single transaction.
//!
//! Nothing is kept in memory: reads parse the current document, and writes
//! re-read it while holding an exclusive advisory lock on `<file>.lock`. Any
//! number of stores, in this process or others, can share one file without
//! losing each other's rows.

use super::{Setting, SettingsStore};
use crate::error::{Error, Result};
use crate::storage::{JsonStorage, StorageBackend};

use fd_lock::RwLock as FileLock;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};

type RowKey = (String, String);
type Table = BTreeMap<RowKey, Setting>;

/// On-disk layout
#[derive(Serialize, Deserialize, Default)]
struct SettingsDocument {
    #[serde(default)]
    settings: Vec<Setting>,
}

/// Settings table persisted to a single JSON/TOML/YAML file
pub struct FileStore<S: StorageBackend = JsonStorage> {
    path: PathBuf,
    lock_path: PathBuf,
    storage: S,
}

impl FileStore<JsonStorage> {
    /// Create a builder for a store owned by `app_name`
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use kvsettings::FileStore;
    ///
    /// let store = FileStore::builder("my-app")
    ///     .dir("~/.config/my-app")
    ///     .build()?;
    /// # Ok::<(), kvsettings::Error>(())
    /// ```
    pub fn builder(app_name: impl Into<String>) -> FileStoreBuilder<JsonStorage> {
        FileStoreBuilder::new(app_name)
    }
}

impl<S: StorageBackend> FileStore<S> {
    /// Open (or lazily create) the table at `path` using `storage` as the format
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>, storage: S) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                crate::security::ensure_secure_dir(parent)?;
            }
        }

        let mut lock_name = path.file_name().map(|n| n.to_os_string()).ok_or_else(|| {
            Error::Config(format!(
                "Invalid path '{}': must have a filename",
                path.display()
            ))
        })?;
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);

        info!("Opened settings file store at: {}", path.display());
        Ok(Self {
            path,
            lock_path,
            storage,
        })
    }

    /// Location of the table document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the lock file writers hold while rewriting the table
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn read_table(&self) -> Result<Table> {
        let document: SettingsDocument = match std::fs::metadata(&self.path) {
            Ok(_) => self.storage.read(&self.path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsDocument::default(),
            Err(e) => {
                return Err(Error::FileRead {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        Ok(document
            .settings
            .into_iter()
            .map(|row| ((row.group.clone(), row.key.clone()), row))
            .collect())
    }

    fn write_table(&self, table: &Table) -> Result<()> {
        let document = SettingsDocument {
            settings: table.values().cloned().collect(),
        };
        self.storage.write(&self.path, &document)
    }

    fn open_lock(&self) -> Result<FileLock<File>> {
        let file = crate::security::private_open_options()
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| Error::FileWrite {
                path: self.lock_path.clone(),
                source: e,
            })?;
        Ok(FileLock::new(file))
    }

    /// Apply `f` to the current table and persist the result
    ///
    /// The table is re-read under the exclusive lock, so `f` always sees the
    /// latest rows written by any store sharing the file. When `f` returns
    /// `None` nothing is written.
    fn mutate<T>(&self, f: impl FnOnce(&mut Table) -> Option<T>) -> Result<Option<T>> {
        let mut lock = self.open_lock()?;
        let _guard = lock.write().map_err(|e| Error::FileWrite {
            path: self.lock_path.clone(),
            source: e,
        })?;
        trace!("Locked {}", self.lock_path.display());

        let mut table = self.read_table()?;
        let Some(out) = f(&mut table) else {
            return Ok(None);
        };
        self.write_table(&table)?;
        Ok(Some(out))
    }
}

impl<S: StorageBackend> SettingsStore for FileStore<S> {
    fn find(&self, group: &str, key: &str) -> Result<Option<Setting>> {
        let mut table = self.read_table()?;
        Ok(table.remove(&(group.to_string(), key.to_string())))
    }

    fn select_group(&self, group: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .read_table()?
            .into_values()
            .filter(|row| row.group == group)
            .map(|row| (row.key, row.value))
            .collect())
    }

    fn select_distinct_groups(&self) -> Result<Vec<String>> {
        let groups: BTreeSet<String> = self.read_table()?.into_keys().map(|(g, _)| g).collect();
        Ok(groups.into_iter().collect())
    }

    fn upsert_many(&self, rows: Vec<Setting>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let count = rows.len();
        self.mutate(|table| {
            for row in rows {
                let id = (row.group.clone(), row.key.clone());
                let merged = row.merge_into(table.get(&id));
                table.insert(id, merged);
            }
            Some(())
        })?;
        debug!("Upserted {count} row(s) into {}", self.path.display());
        Ok(())
    }

    fn delete_where(&self, group: &str, key: &str) -> Result<u64> {
        let id = (group.to_string(), key.to_string());

        // Skip locking when there is nothing to delete
        if !self.read_table()?.contains_key(&id) {
            return Ok(0);
        }

        let removed = self.mutate(|table| table.remove(&id).map(|_| 1))?;
        Ok(removed.unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`FileStore`]
pub struct FileStoreBuilder<S: StorageBackend = JsonStorage> {
    app_name: String,
    dir: Option<PathBuf>,
    file_stem: String,
    storage: S,
}

impl FileStoreBuilder<JsonStorage> {
    /// Create a builder; defaults to pretty JSON in the system config dir
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            dir: None,
            file_stem: "settings".into(),
            storage: JsonStorage::new(),
        }
    }

    /// Use compact JSON (no pretty printing)
    pub fn compact_json(mut self) -> Self {
        self.storage = JsonStorage::compact();
        self
    }
}

impl<S: StorageBackend> FileStoreBuilder<S> {
    /// Set the directory holding the table file
    ///
    /// Supports `~` expansion for home directory.
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let expanded = match (path.strip_prefix("~"), dirs::home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path,
        };
        self.dir = Some(expanded);
        self
    }

    /// Set the file name without extension (default: "settings")
    pub fn file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    /// Switch the document format
    pub fn format<T: StorageBackend>(self, storage: T) -> FileStoreBuilder<T> {
        FileStoreBuilder {
            app_name: self.app_name,
            dir: self.dir,
            file_stem: self.file_stem,
            storage,
        }
    }

    /// Full path the built store will use
    pub fn resolved_path(&self) -> PathBuf {
        let dir = self.dir.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .map(|d| d.join(&self.app_name))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        dir.join(format!("{}.{}", self.file_stem, self.storage.extension()))
    }

    /// Build the [`FileStore`]
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn build(self) -> Result<FileStore<S>> {
        let path = self.resolved_path();
        FileStore::open(path, self.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let store = FileStore::open(&path, JsonStorage::new()).unwrap();
            store.upsert_one("default", "app.locale", "ro").unwrap();
            store.upsert_one("mail", "smtp.port", "25").unwrap();
        }

        let store = FileStore::open(&path, JsonStorage::new()).unwrap();
        assert_eq!(store.find("default", "app.locale").unwrap().unwrap().value, "ro");
        assert_eq!(
            store.select_distinct_groups().unwrap(),
            vec!["default".to_string(), "mail".to_string()]
        );
    }

    #[test]
    fn test_missing_file_is_an_empty_table() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("none.json"), JsonStorage::new()).unwrap();

        assert!(store.select_group("default").unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_delete_of_missing_row_does_not_touch_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileStore::open(&path, JsonStorage::new()).unwrap();

        assert_eq!(store.delete_where("default", "missing").unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_two_stores_on_one_file_keep_each_others_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let first = FileStore::open(&path, JsonStorage::new()).unwrap();
        let second = FileStore::open(&path, JsonStorage::new()).unwrap();

        // Both have read the (empty) table before either writes
        assert!(first.find("default", "a").unwrap().is_none());
        assert!(second.find("default", "b").unwrap().is_none());

        first.upsert_one("default", "a", "1").unwrap();
        second.upsert_one("default", "b", "2").unwrap();
        first.upsert_one("default", "a", "3").unwrap();

        let reopened = FileStore::open(&path, JsonStorage::new()).unwrap();
        assert_eq!(
            reopened.select_group("default").unwrap(),
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
        assert_eq!(second.find("default", "a").unwrap().unwrap().value, "3");
    }

    #[test]
    fn test_delete_from_one_store_is_seen_by_another() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let first = FileStore::open(&path, JsonStorage::new()).unwrap();
        let second = FileStore::open(&path, JsonStorage::new()).unwrap();
        first.upsert_one("default", "a", "1").unwrap();
        first.upsert_one("default", "b", "2").unwrap();

        assert_eq!(second.delete_where("default", "a").unwrap(), 1);
        assert_eq!(first.delete_where("default", "a").unwrap(), 0);
        assert!(first.find("default", "a").unwrap().is_none());
        assert_eq!(first.find("default", "b").unwrap().unwrap().value, "2");
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = FileStore::open(&path, JsonStorage::compact()).unwrap();
                    for i in 0..10 {
                        store
                            .upsert_one("default", &format!("w{writer}.k{i}"), "x")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = FileStore::open(&path, JsonStorage::new()).unwrap();
        assert_eq!(store.select_group("default").unwrap().len(), 40);
    }

    #[test]
    fn test_lock_file_sits_beside_table() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("settings.json"), JsonStorage::new()).unwrap();
        store.upsert_one("default", "a", "1").unwrap();

        assert_eq!(store.lock_path(), dir.path().join("settings.json.lock"));
        assert!(store.lock_path().exists());
    }

    #[test]
    fn test_corrupted_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ broken").unwrap();

        let store = FileStore::open(&path, JsonStorage::new()).unwrap();
        assert!(store.select_group("default").is_err());
    }

    #[test]
    fn test_builder_resolves_path() {
        let dir = tempdir().unwrap();
        let builder = FileStore::builder("my-app")
            .dir(dir.path())
            .file_stem("config");

        assert_eq!(builder.resolved_path(), dir.path().join("config.json"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_format() {
        use crate::storage::TomlStorage;

        let dir = tempdir().unwrap();
        let store = FileStore::builder("my-app")
            .dir(dir.path())
            .format(TomlStorage::new())
            .build()
            .unwrap();
        store.upsert_one("default", "app.name", "Demo").unwrap();

        let text = std::fs::read_to_string(dir.path().join("settings.toml")).unwrap();
        assert!(text.contains("[[settings]]"));
        assert!(text.contains("app.name"));
    }
}
