//! Error types for kvsettings

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kvsettings operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for kvsettings
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Usage Errors (caller mistakes, never retried)
    // -------------------------------------------------------------------------
    #[error("Settings key '{key}' doesn't exist for group '{group}'")]
    SettingNotFound { group: String, key: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // -------------------------------------------------------------------------
    // Operational Errors (store or cache backend failing)
    // -------------------------------------------------------------------------
    #[error("Store {operation} failed: {reason}")]
    Store {
        operation: &'static str,
        reason: String,
    },

    #[error("Failed to invalidate cache tag '{tag}'")]
    CacheInvalidation { tag: String },

    #[error("Cache error: {0}")]
    Cache(String),

    // -------------------------------------------------------------------------
    // I/O Errors (file store)
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Global settings handle not initialized")]
    NotInitialized,
}

impl Error {
    /// Check if this is a "not found" type error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SettingNotFound { .. })
    }

    /// Check if this error was caused by the caller (missing key, empty batch, blank key)
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::SettingNotFound { .. } | Error::InvalidInput(_)
        )
    }

    /// Check if this error came from a failing store or cache backend
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Error::Store { .. }
                | Error::CacheInvalidation { .. }
                | Error::Cache(_)
                | Error::FileRead { .. }
                | Error::FileWrite { .. }
                | Error::DirectoryCreate { .. }
        )
    }
}
