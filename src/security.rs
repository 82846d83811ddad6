//! File permission helpers for the file-backed store
//!
//! Settings tables may hold credentials, so on Unix the table file is
//! `0o600` and its directory `0o700`. Elsewhere these are no-ops.

use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    perms.set_mode(mode);

    fs::set_permissions(path, perms).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Restrict a file to its owner (Unix: 0o600)
///
/// # Errors
///
/// Returns an error if the permissions cannot be read or changed.
#[cfg(unix)]
pub fn set_secure_file_permissions(path: &Path) -> Result<()> {
    set_mode(path, 0o600)
}

/// Restrict a directory to its owner (Unix: 0o700)
///
/// # Errors
///
/// Returns an error if the permissions cannot be read or changed.
#[cfg(unix)]
pub fn set_secure_dir_permissions(path: &Path) -> Result<()> {
    set_mode(path, 0o700)
}

/// No-op on non-Unix platforms
#[cfg(not(unix))]
pub fn set_secure_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// No-op on non-Unix platforms
#[cfg(not(unix))]
pub fn set_secure_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Write-mode [`OpenOptions`] that create new files owner-only (Unix: 0o600)
///
/// The mode applies at creation, so the file is never readable by others,
/// not even between creation and a later permission change. Existing files
/// keep their mode.
pub fn private_open_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

/// Create a directory (and parents) and restrict it to its owner
///
/// # Errors
///
/// Returns an error if the directory cannot be created or secured.
pub fn ensure_secure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreate {
        path: path.to_path_buf(),
        source: e,
    })?;
    set_secure_dir_permissions(path)
}
