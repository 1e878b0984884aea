//! Authenticated report backend.
//!
//! The backend persists the session server-side and synthesizes the report
//! with its own model budget. Every request carries the candidate's identity
//! token; the report request id doubles as the idempotency key so a resent
//! request never produces a second report.

use crate::response::parse_json;
use async_trait::async_trait;
use mockmate_core::error::{MockmateError, Result};
use mockmate_core::interview::FinalReport;
use mockmate_core::service::{ReportRequest, ReportSynthesizer};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const BACKEND_CHANNEL: &str = "backend";

#[derive(Clone)]
pub struct BackendReportClient {
    client: Client,
    base_url: String,
    id_token: Option<String>,
}

impl BackendReportClient {
    pub fn new(base_url: impl Into<String>, id_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            id_token: id_token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn endpoint(&self, session_id: &str) -> String {
        format!("{}/api/reports/{}/generate", self.base_url, session_id)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReportBody<'a> {
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_brief: Option<&'a str>,
    history: Vec<HistoryEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry<'a> {
    question: &'a str,
    candidate_response: &'a str,
}

#[derive(Deserialize)]
struct BackendError {
    error: String,
}

impl<'a> GenerateReportBody<'a> {
    fn from_request(request: &'a ReportRequest) -> Self {
        Self {
            role: &request.context.candidate_role,
            company_brief: request.context.company_brief.as_deref(),
            history: request
                .transcript
                .iter()
                .map(|turn| HistoryEntry {
                    question: &turn.question,
                    candidate_response: &turn.candidate_response,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ReportSynthesizer for BackendReportClient {
    fn channel(&self) -> &str {
        BACKEND_CHANNEL
    }

    async fn synthesize(&self, request: &ReportRequest) -> Result<FinalReport> {
        let token = self.id_token.as_deref().ok_or_else(|| {
            MockmateError::AuthFailure("no identity token configured for the report backend".into())
        })?;

        let body = GenerateReportBody::from_request(request);
        tracing::debug!(
            session_id = %request.session_id,
            request_id = %request.request_id,
            turns = body.history.len(),
            "Requesting report from backend"
        );

        let response = self
            .client
            .post(self.endpoint(&request.session_id))
            .bearer_auth(token)
            .header("Idempotency-Key", &request.request_id)
            .json(&body)
            .send()
            .await
            .map_err(|err| MockmateError::SynthesisFailure {
                message: format!("report backend unreachable: {err}"),
                retryable: err.is_connect() || err.is_timeout(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| MockmateError::malformed(BACKEND_CHANNEL, err.to_string()))?;

        if !status.is_success() {
            let error = map_status(status, &text);
            tracing::warn!(%status, error = %error, "Report backend refused request");
            return Err(error);
        }
        parse_json(BACKEND_CHANNEL, &text)
    }
}

fn map_status(status: StatusCode, body: &str) -> MockmateError {
    let message = serde_json::from_str::<BackendError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| status.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MockmateError::AuthFailure(message),
        StatusCode::TOO_MANY_REQUESTS => MockmateError::QuotaExceeded(message),
        s if s.is_server_error() => MockmateError::SynthesisFailure {
            message,
            retryable: true,
        },
        _ => MockmateError::synthesis(message),
    }
}
