//! Service boundaries of the rehearsal core.
//!
//! Question generation, report synthesis, transcription and coaching are
//! opaque remote services. The core only sees these traits; concrete
//! adapters live in `mockmate-interaction`.

use crate::error::Result;
use crate::interview::{FinalReport, InterviewTurn, SessionContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request for the first question of a conversational session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRequest {
    /// Reused across retries of the same logical request.
    pub request_id: String,
    pub context: SessionContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningQuestion {
    pub question: String,
    pub interviewer_id: String,
    /// Context to use from here on; may carry a negotiated panel or plan.
    pub updated_context: SessionContext,
}

/// Request for the next question given the transcript so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupRequest {
    pub request_id: String,
    pub transcript: Vec<InterviewTurn>,
    pub context: SessionContext,
    /// Panelist who will ask the question.
    pub interviewer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FollowupQuestion {
    Question { text: String },
    /// The generator has nothing further to ask.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub request_id: String,
    pub session_id: String,
    pub transcript: Vec<InterviewTurn>,
    pub context: SessionContext,
}

/// Captured audio awaiting transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCapture {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl RawCapture {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_opening(&self, request: &OpeningRequest) -> Result<OpeningQuestion>;

    async fn generate_followup(&self, request: &FollowupRequest) -> Result<FollowupQuestion>;
}

/// Produces a structured report from a transcript.
///
/// Primary and fallback channels share this trait.
#[async_trait]
pub trait ReportSynthesizer: Send + Sync {
    /// Name of the channel, used in logs and outcomes.
    fn channel(&self) -> &str;

    async fn synthesize(&self, request: &ReportRequest) -> Result<FinalReport>;
}

#[async_trait]
pub trait AnswerTranscriber: Send + Sync {
    async fn transcribe(&self, capture: &RawCapture) -> Result<String>;
}

/// In-session assistance: hints in coach mode and critiques of submitted code.
#[async_trait]
pub trait CoachingAssistant: Send + Sync {
    /// A nudge for `question`, steered by the signals a strong answer shows.
    async fn hint(
        &self,
        question: &str,
        expected_signals: &[String],
        context: &SessionContext,
    ) -> Result<String>;

    async fn review_code(
        &self,
        question: &str,
        code: &str,
        context: &SessionContext,
    ) -> Result<String>;
}
