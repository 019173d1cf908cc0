//! Data root resolution.

use std::env;
use std::path::PathBuf;

use super::ensure::ensure_directory;
use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "VIDFETCH_DATA_DIR";

const APP_DIR_NAME: &str = "vidfetch";
const DATABASE_FILE: &str = "vidfetch.db";
const SETTINGS_FILE: &str = "settings.json";

/// Get the root directory for application data (database, settings).
///
/// Resolution order:
/// 1. `VIDFETCH_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/vidfetch`)
///
/// The directory is created if missing.
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = match env::var(DATA_DIR_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => dirs::data_dir()
            .ok_or(PathError::NoDataDir)?
            .join(APP_DIR_NAME),
    };

    ensure_directory(&root)?;
    Ok(root)
}

/// Path to the history database, `vidfetch.db` under the data root.
pub fn database_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(DATABASE_FILE))
}

/// Path to the settings file, `settings.json` under the data root.
pub fn settings_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(SETTINGS_FILE))
}
