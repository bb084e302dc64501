//! Path utilities for crossdeck configuration files

use std::path::PathBuf;

/// Get the default configuration directory
///
/// Returns: `<config dir>/crossdeck` (e.g. `~/.config/crossdeck` on Linux),
/// falling back to `./crossdeck` when the platform reports no config dir.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crossdeck")
}

/// Get the default config file path for a given file name
///
/// # Arguments
/// * `filename` - Config file name (e.g., "engine.yaml")
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}
