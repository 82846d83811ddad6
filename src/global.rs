//! Process-wide settings handle
//!
//! The manager itself carries no global state. Applications that want a
//! single ambient instance install one here; tests call [`reset`] between
//! cases.

use crate::error::{Error, Result};
use crate::manager::SettingsManager;
use crate::sync::RwLockExt;

use log::debug;
use serde_json::Value;
use std::sync::RwLock;

static GLOBAL: RwLock<Option<SettingsManager>> = RwLock::new(None);

/// Install `manager` as the process-wide handle, returning the previous one
pub fn install(manager: SettingsManager) -> Option<SettingsManager> {
    debug!("Installing global settings handle");
    GLOBAL.write_recovered("global settings").replace(manager)
}

/// Return the installed handle, installing the result of `init` if none is set
///
/// `init` runs without the slot locked, so it may call [`handle`] or
/// [`setting`] (which report [`Error::NotInitialized`] until it returns).
/// When two callers race on an empty slot both initializers run and the
/// first result to be installed wins; the other is dropped.
///
/// # Errors
///
/// Returns the error produced by `init`; nothing is installed in that case.
pub fn get_or_init<F>(init: F) -> Result<SettingsManager>
where
    F: FnOnce() -> Result<SettingsManager>,
{
    if let Ok(manager) = handle() {
        return Ok(manager);
    }

    let manager = init()?;

    let mut slot = GLOBAL.write_recovered("global settings");
    match slot.as_ref() {
        Some(installed) => {
            debug!("Global settings handle installed concurrently, keeping it");
            Ok(installed.clone())
        }
        None => {
            debug!("Initialized global settings handle");
            Ok(slot.insert(manager).clone())
        }
    }
}

/// The installed handle, scoped to the default group
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if nothing was installed.
pub fn handle() -> Result<SettingsManager> {
    GLOBAL
        .read_recovered("global settings")
        .as_ref()
        .cloned()
        .ok_or(Error::NotInitialized)
}

/// Remove the installed handle
pub fn reset() -> Option<SettingsManager> {
    GLOBAL.write_recovered("global settings").take()
}

/// Look up `key` in the default group of the installed handle
///
/// With a `default`, an absent key yields the default instead of an error.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if nothing was installed,
/// [`Error::SettingNotFound`] if the key is absent and no default was given,
/// or a store error.
pub fn setting(key: &str, default: Option<Value>) -> Result<Value> {
    let manager = handle()?;
    match default {
        Some(default) => manager.get_or(key, default),
        None => manager.get(key),
    }
}
