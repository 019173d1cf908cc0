//! Path utilities for vidfetch data directories.
//!
//! Every component resolves its files (database, settings) through this
//! module so that `VIDFETCH_DATA_DIR` redirects all of them at once.

mod ensure;
mod error;
mod platform;

#[cfg(test)]
mod test_utils;

pub use ensure::ensure_directory;
pub use error::PathError;
pub use platform::{DATA_DIR_ENV, data_root, database_path, settings_path};
