//! # kvsettings - grouped key-value settings
//!
//! A key-value settings store with optional grouping, backed by a durable
//! table and a tag-invalidated read-through cache.
//!
//! ## Features
//!
//! - **Groups**: every setting lives in a named group (`"default"` unless given)
//! - **Typed values**: stored text is decoded back to bool, integer, float,
//!   null, JSON or string
//! - **Read-through cache**: each group is loaded once and cached until it is
//!   invalidated; no TTL
//! - **Tagged invalidation**: flush one group, or every group at once in O(1)
//! - **Write-then-invalidate**: a write is only reported as successful once
//!   the store accepted it and the group's cache entry was invalidated
//! - **Pluggable collaborators**: [`SettingsStore`], [`CacheBackend`] and
//!   [`ValueCodec`] are traits; in-memory and file-backed implementations ship
//!   with the crate
//!
//! ## Quick Start
//!
//! ```rust
//! use kvsettings::SettingsManager;
//! use serde_json::json;
//!
//! let settings = SettingsManager::builder().build()?;
//!
//! settings.set("app.locale", "ro")?;
//! settings.set_many([("app.debug", json!(true)), ("app.retries", json!(3))])?;
//!
//! assert_eq!(settings.get("app.locale")?, json!("ro"));
//! assert_eq!(settings.get_as::<u32>("app.retries")?, 3);
//!
//! assert!(settings.forget("app.locale"));
//! assert_eq!(settings.get_or("app.locale", "en")?, json!("en"));
//! # Ok::<(), kvsettings::Error>(())
//! ```
//!
//! ## Groups
//!
//! ```rust
//! use kvsettings::SettingsManager;
//!
//! let settings = SettingsManager::builder().build()?;
//! let mail = settings.group("mail");
//!
//! mail.set("smtp.host", "localhost")?;
//! assert!(mail.has("smtp.host"));
//! assert!(!settings.has("smtp.host"));
//!
//! assert_eq!(settings.all_groups()?, vec!["mail".to_string()]);
//! # Ok::<(), kvsettings::Error>(())
//! ```
//!
//! ## Persistent storage
//!
//! ```rust,no_run
//! use kvsettings::{FileStore, SettingsManager};
//!
//! let store = FileStore::builder("my-app")
//!     .dir("~/.config/my-app")
//!     .build()?;
//!
//! let settings = SettingsManager::builder().store(store).build()?;
//! settings.set("ui.theme", "dark")?;
//! # Ok::<(), kvsettings::Error>(())
//! ```
//!
//! Enable the `toml` or `yaml` feature to persist the table in those formats.

mod error;
mod manager;
mod sync;

pub mod cache;
pub mod codec;
pub mod config;
pub mod global;
pub mod security;
pub mod storage;
pub mod store;

use std::collections::BTreeMap;

/// Decoded key -> value mapping of one group
pub type SettingsMap = BTreeMap<String, serde_json::Value>;

pub use cache::{CacheBackend, CacheStrategy, MemoryTagCache};
pub use codec::{CastingCodec, ValueCodec};
pub use config::{SettingsConfig, SettingsConfigBuilder};
pub use error::{Error, Result};
pub use manager::{SettingsManager, SettingsManagerBuilder};
pub use storage::{JsonStorage, StorageBackend};
pub use store::{FileStore, FileStoreBuilder, MemoryStore, Setting, SettingsStore};

#[cfg(feature = "toml")]
pub use storage::TomlStorage;

#[cfg(feature = "yaml")]
pub use storage::YamlStorage;
