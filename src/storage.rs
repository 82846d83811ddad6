//! Document formats for the file-backed settings table

use crate::error::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::io::Write;
use std::path::Path;

/// Trait for on-disk document formats
///
/// [`crate::store::FileStore`] keeps the whole table in a single document and
/// delegates encoding to one of these.
pub trait StorageBackend: Clone + Send + Sync {
    /// File extension for this format (e.g., "json", "toml")
    fn extension(&self) -> &str;

    /// Serialize data to string
    fn serialize<T: Serialize>(&self, data: &T) -> Result<String>;

    /// Deserialize data from string
    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T>;

    /// Read and deserialize from file
    fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.deserialize(&content)
    }

    /// Serialize and write to file
    ///
    /// Writes to `<name>.tmp` next to the target and renames it over the
    /// original, so readers never observe a half-written table.
    fn write<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let content = self.serialize(data)?;

        let file_name = path.file_name().ok_or_else(|| {
            Error::Config(format!(
                "Invalid path '{}': must have a filename",
                path.display()
            ))
        })?;
        let mut temp_filename = file_name.to_os_string();
        temp_filename.push(".tmp");
        let temp_path = path.with_file_name(temp_filename);

        let write_err = |e| Error::FileWrite {
            path: temp_path.clone(),
            source: e,
        };
        let mut file = crate::security::private_open_options()
            .truncate(true)
            .open(&temp_path)
            .map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        // A leftover temp file keeps its old mode
        crate::security::set_secure_file_permissions(&temp_path)?;

        std::fs::rename(&temp_path, path).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// =============================================================================
// JSON
// =============================================================================

/// JSON document format (default)
#[derive(Clone, Default)]
pub struct JsonStorage {
    pretty: bool,
}

impl JsonStorage {
    /// Pretty printed JSON
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Compact JSON (no pretty printing)
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl StorageBackend for JsonStorage {
    fn extension(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, data: &T) -> Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(data).map_err(Error::from)
        } else {
            serde_json::to_string(data).map_err(Error::from)
        }
    }

    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        serde_json::from_str(content).map_err(Error::from)
    }
}

// =============================================================================
// TOML
// =============================================================================

/// TOML document format
#[cfg(feature = "toml")]
#[derive(Clone, Default)]
pub struct TomlStorage;

#[cfg(feature = "toml")]
impl TomlStorage {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "toml")]
impl StorageBackend for TomlStorage {
    fn extension(&self) -> &str {
        "toml"
    }

    fn serialize<T: Serialize>(&self, data: &T) -> Result<String> {
        toml::to_string_pretty(data).map_err(|e| Error::Parse(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        toml::from_str(content).map_err(|e| Error::Parse(e.to_string()))
    }
}

// =============================================================================
// YAML
// =============================================================================

/// YAML document format
#[cfg(feature = "yaml")]
#[derive(Clone, Default)]
pub struct YamlStorage;

#[cfg(feature = "yaml")]
impl YamlStorage {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "yaml")]
impl StorageBackend for YamlStorage {
    fn extension(&self) -> &str {
        "yaml"
    }

    fn serialize<T: Serialize>(&self, data: &T) -> Result<String> {
        serde_yaml::to_string(data).map_err(|e| Error::Parse(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        serde_yaml::from_str(content).map_err(|e| Error::Parse(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Table {
        rows: Vec<Row>,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        group: String,
        key: String,
        value: String,
    }

    fn sample() -> Table {
        Table {
            rows: vec![Row {
                group: "default".into(),
                key: "app.locale".into(),
                value: "ro".into(),
            }],
        }
    }

    #[test]
    fn test_json_pretty_and_compact() {
        let pretty = JsonStorage::new().serialize(&sample()).unwrap();
        assert!(pretty.contains('\n'));
        assert!(pretty.contains("\"key\": \"app.locale\""));

        let compact = JsonStorage::compact().serialize(&sample()).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let storage = JsonStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        storage.write(&path, &sample()).unwrap();
        let loaded: Table = storage.read(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_replaces_stale_temp_file_privately() {
        use std::os::unix::fs::PermissionsExt;

        let storage = JsonStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let temp = dir.path().join("settings.json.tmp");
        std::fs::write(&temp, "left over by a crashed writer").unwrap();
        std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o644)).unwrap();

        storage.write(&path, &sample()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let loaded: Table = storage.read(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_read_nonexistent_file() {
        let storage = JsonStorage::new();
        let result: Result<Table> = storage.read(Path::new("/nonexistent/settings.json"));

        assert!(matches!(result.unwrap_err(), Error::FileRead { .. }));
    }

    #[test]
    fn test_corrupted_document_is_a_parse_error() {
        let storage = JsonStorage::new();
        let result: Result<Table> = storage.deserialize("{ not json");
        assert!(matches!(result.unwrap_err(), Error::Serialize(_)));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_document() {
        let storage = TomlStorage::new();
        let text = storage.serialize(&sample()).unwrap();
        assert!(text.contains("[[rows]]"));
        let back: Table = storage.deserialize(&text).unwrap();
        assert_eq!(back, sample());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_yaml_document() {
        let storage = YamlStorage::new();
        let text = storage.serialize(&sample()).unwrap();
        assert!(text.contains("key: app.locale"));
        let back: Table = storage.deserialize(&text).unwrap();
        assert_eq!(back, sample());
    }
}
