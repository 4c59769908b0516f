//! Platform directories.

use std::path::PathBuf;

const APP_DIR: &str = "playlistd";

/// `<platform cache dir>/playlistd`, falling back to the system temp dir
/// when the platform reports no cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}
