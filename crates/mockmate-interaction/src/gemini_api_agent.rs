//! GeminiApiAgent - Direct REST API client for Gemini.
//!
//! Calls `generateContent` and maps HTTP failures onto the MockMate error
//! taxonomy: usage limits become `QuotaExceeded`, rejected credentials
//! become `AuthFailure`, server errors are retryable generation failures.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use mockmate_core::error::{MockmateError, Result};
use mockmate_core::interview::ResearchLink;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Text and grounding sources returned by one call.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiReply {
    pub text: String,
    pub sources: Vec<ResearchLink>,
}

/// Client for one Gemini model.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: Option<String>,
    json_output: bool,
    search_grounding: bool,
}

impl GeminiApiAgent {
    /// Creates a new agent with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
            system_instruction: None,
            json_output: false,
            search_grounding: false,
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the agent at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Adds a system instruction that will be sent alongside every request.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Requests `application/json` output.
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Enables Google Search grounding.
    pub fn with_search_grounding(mut self) -> Self {
        self.search_grounding = true;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeminiReply> {
        self.send(vec![Part::Text {
            text: prompt.to_string(),
        }])
        .await
    }

    /// Sends audio inline together with an instruction.
    pub async fn generate_with_audio(
        &self,
        prompt: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<GeminiReply> {
        if audio.is_empty() {
            return Err(MockmateError::InvalidInput("audio capture is empty".into()));
        }
        self.send(vec![
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: mime_type.to_string(),
                    data: BASE64_STANDARD.encode(audio),
                },
            },
            Part::Text {
                text: prompt.to_string(),
            },
        ])
        .await
    }

    async fn send(&self, parts: Vec<Part>) -> Result<GeminiReply> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            system_instruction: self.system_instruction.as_ref().map(|text| Content {
                role: "system".to_string(),
                parts: vec![Part::Text { text: text.clone() }],
            }),
            generation_config: self.json_output.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
            tools: if self.search_grounding {
                vec![Tool {
                    google_search: EmptyObject {},
                }]
            } else {
                Vec::new()
            },
        };

        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        tracing::debug!(model = %self.model, "Sending Gemini request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                let message = format!("Gemini API request failed: {err}");
                if err.is_connect() || err.is_timeout() {
                    MockmateError::generation_retryable(message)
                } else {
                    MockmateError::generation(message)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            let error = map_http_error(status, &body_text);
            tracing::warn!(model = %self.model, %status, error = %error, "Gemini request failed");
            return Err(error);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| MockmateError::malformed("gemini", err.to_string()))?;

        extract_reply(parsed)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Serialize)]
struct Tool {
    google_search: EmptyObject,
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_reply(response: GenerateContentResponse) -> Result<GeminiReply> {
    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or_else(|| MockmateError::generation("Gemini API returned no candidates"))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(MockmateError::generation(
            "Gemini API returned no text in the response candidates",
        ));
    }

    let sources = candidate
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| {
                    let uri = web.uri?;
                    Some(ResearchLink {
                        title: web.title.unwrap_or_else(|| uri.clone()),
                        uri,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(GeminiReply { text, sources })
}

fn map_http_error(status: StatusCode, body: &str) -> MockmateError {
    let (status_text, message) = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            (
                wrapper.error.status.unwrap_or_default(),
                wrapper.error.message.unwrap_or_else(|| body.to_string()),
            )
        })
        .unwrap_or_else(|_| (String::new(), body.to_string()));

    let message = if status_text.is_empty() {
        message
    } else {
        format!("{status_text}: {message}")
    };

    if status == StatusCode::TOO_MANY_REQUESTS || status_text == "RESOURCE_EXHAUSTED" {
        return MockmateError::QuotaExceeded(message);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MockmateError::AuthFailure(message),
        s if s.is_server_error() => MockmateError::generation_retryable(message),
        _ => MockmateError::generation(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_map_to_quota() {
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(err.is_quota_exceeded());

        let body = r#"{"error": {"code": 400, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = map_http_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err,
            MockmateError::QuotaExceeded("RESOURCE_EXHAUSTED: quota".into())
        );
    }

    #[test]
    fn credential_errors_map_to_auth_failure() {
        assert!(map_http_error(StatusCode::UNAUTHORIZED, "").is_auth_failure());
        assert!(map_http_error(StatusCode::FORBIDDEN, "").is_auth_failure());
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = map_http_error(StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        assert!(err.is_retryable());
        let err = map_http_error(StatusCode::BAD_REQUEST, "bad field");
        assert!(!err.is_retryable());
    }

    #[test]
    fn reply_joins_text_parts_and_collects_sources() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "there"}]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://example.com/a", "title": "A"}},
                    {"retrievedContext": {}},
                    {"web": {"uri": "https://example.com/b"}}
                ]}
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let reply = extract_reply(parsed).unwrap();
        assert_eq!(reply.text, "Hello there");
        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[1].title, "https://example.com/b");
    }

    #[test]
    fn empty_candidates_are_generation_failures() {
        let parsed: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            extract_reply(parsed),
            Err(MockmateError::GenerationFailure { .. })
        ));

        let parsed: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#)
                .unwrap();
        assert!(extract_reply(parsed).is_err());
    }

    #[test]
    fn request_body_uses_json_mode_and_grounding() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part::Text { text: "hi".into() }],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".into(),
            }),
            tools: vec![Tool {
                google_search: EmptyObject {},
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(value["tools"][0]["google_search"].is_object());
        assert!(value.get("system_instruction").is_none());
    }
}
