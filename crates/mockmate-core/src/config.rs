//! Application and secret configuration models.
//!
//! `AppConfig` mirrors `config.toml`; `SecretConfig` mirrors `secret.json`.
//! Loading lives in `mockmate-infrastructure`.

use crate::interview::DEFAULT_TOTAL_QUESTIONS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_QUESTION_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_REPORT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_FALLBACK_REPORT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub backend: BackendSettings,
}

/// Time budgets and retry limits for a rehearsal session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub question_timeout_secs: u64,
    pub report_timeout_secs: u64,
    pub default_total_questions: usize,
    /// Attempts per question request, first try included.
    pub question_attempts: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            question_timeout_secs: 30,
            report_timeout_secs: 90,
            default_total_questions: DEFAULT_TOTAL_QUESTIONS,
            question_attempts: 2,
        }
    }
}

impl SessionSettings {
    pub fn question_timeout(&self) -> Duration {
        Duration::from_secs(self.question_timeout_secs)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub question_model: String,
    pub report_model: String,
    pub fallback_report_model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            question_model: DEFAULT_QUESTION_MODEL.to_string(),
            report_model: DEFAULT_REPORT_MODEL.to_string(),
            fallback_report_model: DEFAULT_FALLBACK_REPORT_MODEL.to_string(),
        }
    }
}

/// Authenticated report backend. Without a `base_url` reports are
/// synthesized directly against Gemini.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct BackendSettings {
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Root structure of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub backend: Option<BackendAuthConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BackendAuthConfig {
    pub id_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session.question_timeout(), Duration::from_secs(30));
        assert_eq!(config.session.report_timeout(), Duration::from_secs(90));
        assert_eq!(config.session.default_total_questions, 7);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [session]
            report_timeout_secs = 120

            [backend]
            base_url = "https://reports.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.report_timeout_secs, 120);
        assert_eq!(config.session.question_attempts, 2);
        assert_eq!(config.models.report_model, DEFAULT_REPORT_MODEL);
        assert_eq!(
            config.backend.base_url.as_deref(),
            Some("https://reports.example.com")
        );
    }

    #[test]
    fn secret_json_sections_are_optional() {
        let secrets: SecretConfig =
            serde_json::from_str(r#"{"gemini": {"api_key": "k"}}"#).unwrap();
        assert_eq!(secrets.gemini.unwrap().api_key, "k");
        assert!(secrets.backend.is_none());
    }
}
