//! Secret service implementation.
//!
//! Reads `secret.json` and caches it. When the file carries no Gemini key,
//! `GEMINI_API_KEY` from the environment is used instead.

use crate::paths::MockmatePaths;
use mockmate_core::config::{GeminiConfig, SecretConfig};
use mockmate_core::error::Result;
use mockmate_core::secret::SecretService;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Service for loading the secret configuration.
///
/// # Example
///
/// ```ignore
/// use mockmate_infrastructure::{MockmatePaths, SecretServiceImpl};
/// use mockmate_core::secret::SecretService;
///
/// let service = SecretServiceImpl::new(&MockmatePaths::default())?;
/// let secrets = service.load_secrets().await?;
/// ```
#[derive(Clone)]
pub struct SecretServiceImpl {
    path: PathBuf,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretServiceImpl {
    pub fn new(paths: &MockmatePaths) -> Result<Self> {
        Ok(Self::with_path(paths.secret_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    async fn read_file(&self) -> Result<SecretConfig> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(SecretConfig::default());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Fills in the Gemini key from `env_key` when the file has none.
fn with_env_fallback(mut secrets: SecretConfig, env_key: Option<String>) -> SecretConfig {
    let has_key = secrets
        .gemini
        .as_ref()
        .is_some_and(|g| !g.api_key.trim().is_empty());
    if has_key {
        return secrets;
    }
    if let Some(api_key) = env_key.filter(|k| !k.trim().is_empty()) {
        tracing::debug!("Using Gemini API key from {GEMINI_API_KEY_ENV}");
        let model_name = secrets.gemini.take().and_then(|g| g.model_name);
        secrets.gemini = Some(GeminiConfig {
            api_key,
            model_name,
        });
    }
    secrets
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        if let Some(cached) = self.secrets.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let loaded = with_env_fallback(
            self.read_file().await?,
            std::env::var(GEMINI_API_KEY_ENV).ok(),
        );
        *self.secrets.write().await = Some(loaded.clone());
        Ok(loaded)
    }

    async fn secret_file_exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockmate_core::config::BackendAuthConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.json");
        std::fs::write(
            &path,
            r#"{"gemini": {"api_key": "file-key"}, "backend": {"id_token": "tok"}}"#,
        )
        .unwrap();

        let service = SecretServiceImpl::with_path(path);
        assert!(service.secret_file_exists().await);
        let secrets = service.load_secrets().await.unwrap();
        assert_eq!(secrets.gemini.unwrap().api_key, "file-key");
        assert_eq!(secrets.backend.unwrap().id_token, "tok");
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let service = SecretServiceImpl::with_path(dir.path().join("secret.json"));
        assert!(!service.secret_file_exists().await);
        assert!(service.load_secrets().await.is_ok());
    }

    #[test]
    fn env_key_fills_blank_file_key() {
        let secrets = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: " ".into(),
                model_name: Some("gemini-3-flash-preview".into()),
            }),
            backend: Some(BackendAuthConfig {
                id_token: "tok".into(),
            }),
        };
        let merged = with_env_fallback(secrets, Some("env-key".into()));
        let gemini = merged.gemini.unwrap();
        assert_eq!(gemini.api_key, "env-key");
        assert_eq!(gemini.model_name.as_deref(), Some("gemini-3-flash-preview"));
    }

    #[test]
    fn file_key_wins_over_env() {
        let secrets = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "file-key".into(),
                model_name: None,
            }),
            backend: None,
        };
        let merged = with_env_fallback(secrets, Some("env-key".into()));
        assert_eq!(merged.gemini.unwrap().api_key, "file-key");

        let empty = with_env_fallback(SecretConfig::default(), None);
        assert!(empty.gemini.is_none());
    }
}
