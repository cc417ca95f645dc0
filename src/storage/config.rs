//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load the config file at `path`, or the default location when `None`.
    ///
    /// A missing file at the default location is created with defaults; a
    /// missing explicit path is an error.
    pub fn load(path: Option<PathBuf>) -> AppResult<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p, true),
            None => (config_path()?, false),
        };

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else if explicit {
            return Err(AppError::config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        } else {
            if let Some(parent) = config_path.parent() {
                ensure_dir(parent)?;
            }
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            tracing::info!(path = %config_path.display(), "created default config");
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting, without secrets
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(&config.without_secrets())?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The configuration with environment secrets overlaid
    pub fn effective_config(&self) -> AppConfig {
        let mut config = self.config.clone();
        config.apply_env_overrides();
        config
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
