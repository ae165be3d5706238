//! Scan and target directories for launcher entries.

use std::path::PathBuf;

use crate::error::RegistryError;

const SYSTEM_APPLICATIONS_DIR: &str = "/usr/share/applications";
const USER_APPLICATIONS_SUBDIR: &str = ".local/share/applications";

/// The user-writable entry directory. Mutations only ever target this one.
pub fn user_applications_dir() -> Result<PathBuf, RegistryError> {
    let home = dirs::home_dir().ok_or(RegistryError::NoHomeDir)?;
    Ok(home.join(USER_APPLICATIONS_SUBDIR))
}

/// All directories scanned for .desktop files, in scan order: the
/// system-wide tree first, then the user directory.
pub fn application_directories() -> Result<Vec<PathBuf>, RegistryError> {
    Ok(vec![
        PathBuf::from(SYSTEM_APPLICATIONS_DIR),
        user_applications_dir()?,
    ])
}
