//! Manager configuration
//!
//! - `SettingsConfig` - default group, cache namespace/key and cache strategy
//! - `SettingsConfigBuilder` - fluent builder validating the above

mod types;

pub use types::{DEFAULT_GROUP, SettingsConfig, SettingsConfigBuilder};
