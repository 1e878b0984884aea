//! Configuration service implementation.
//!
//! Loads `AppConfig` from `~/.config/mockmate/config.toml`. A missing file
//! means defaults; the file is never created implicitly.

use crate::paths::MockmatePaths;
use mockmate_core::config::AppConfig;
use mockmate_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &MockmatePaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the configuration, reading the file on first access.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` when the file exists but cannot be
    /// read or parsed. A broken config is reported rather than silently
    /// replaced with defaults.
    pub fn get_config(&self) -> Result<AppConfig> {
        if let Some(cached) = self.read_cache() {
            return Ok(cached);
        }

        let loaded = self.load()?;
        let mut cache = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cache = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cache = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }

    fn read_cache(&self) -> Option<AppConfig> {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let config: AppConfig = toml::from_str(&content)?;
        tracing::info!(path = %self.path.display(), "Loaded configuration");
        Ok(config)
    }
}
