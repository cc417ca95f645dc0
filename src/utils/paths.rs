//! Cross-Platform Path Utilities
//!
//! Resolves the application's configuration directory.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Directory name under the platform config directory.
const APP_DIR_NAME: &str = "contract-guard";

/// Get the application config directory (e.g. ~/.config/contract-guard/)
pub fn app_config_dir() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::config("Could not determine config directory"))
}

/// Get the default config file path (<config_dir>/contract-guard/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(app_config_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
