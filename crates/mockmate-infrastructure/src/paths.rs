//! Unified path management for MockMate configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/mockmate/          # Config directory
//! ├── config.toml              # Application configuration
//! ├── secret.json              # API key and identity token
//! ├── history.json             # Past session summaries
//! └── logs/                    # Application logs
//!     └── mockmate.log.YYYY-MM-DD
//! ```

use mockmate_core::config::{GeminiConfig, SecretConfig};
use mockmate_core::error::{MockmateError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mockmate";

/// Resolves every file MockMate reads or writes.
///
/// A base path replaces the config directory entirely, which is how tests
/// point the services at a temporary directory.
#[derive(Debug, Clone, Default)]
pub struct MockmatePaths {
    base: Option<PathBuf>,
}

impl MockmatePaths {
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            base: base_path.map(Path::to_path_buf),
        }
    }

    /// Returns the MockMate configuration directory (`~/.config/mockmate/`).
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| MockmateError::config("Cannot find home directory"))?;
        Ok(home.join(".config").join(APP_DIR))
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn history_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("history.json"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("logs"))
    }

    /// Ensures the secret file exists, creating a template if it doesn't.
    ///
    /// The template has an empty Gemini key and no backend token. On Unix the
    /// file is created with mode 600.
    pub fn ensure_secret_file(&self) -> Result<PathBuf> {
        let secret_path = self.secret_file()?;
        if secret_path.exists() {
            return Ok(secret_path);
        }
        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: None,
            }),
            backend: None,
        };
        std::fs::write(&secret_path, serde_json::to_string_pretty(&template)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        tracing::info!(path = %secret_path.display(), "Created secret file template");
        Ok(secret_path)
    }
}
