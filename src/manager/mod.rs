//! Main settings manager module
//!
//! This module contains the [`SettingsManager`] struct which is the primary entry point
//! for reading and writing grouped settings.
//!
//! - `core` - the manager value, group scoping and the read-through load
//! - `operations` - reads (`all`, `get`, `get_many`, `has`, `all_groups`)
//! - `io` - writes and invalidation (`set`, `set_many`, `forget`, `flush_*`)
//! - `builder` - wiring of store, cache, codec and configuration

mod builder;
mod core;
mod io;
mod operations;

pub use builder::SettingsManagerBuilder;
pub use core::SettingsManager;
