//! Report synthesis over Gemini.

use crate::gemini_api_agent::GeminiApiAgent;
use crate::prompts;
use crate::response::parse_json;
use async_trait::async_trait;
use minijinja::context;
use mockmate_core::error::{MockmateError, Result};
use mockmate_core::interview::FinalReport;
use mockmate_core::persona::PersonaRoster;
use mockmate_core::service::{ReportRequest, ReportSynthesizer};

/// Synthesizes a [`FinalReport`] with one Gemini model.
///
/// The same type backs the primary (pro model) and fallback (flash model)
/// channels; `channel` tells them apart in logs.
#[derive(Clone)]
pub struct GeminiReportSynthesizer {
    agent: GeminiApiAgent,
    roster: PersonaRoster,
    channel: String,
}

impl GeminiReportSynthesizer {
    pub fn new(agent: GeminiApiAgent, roster: PersonaRoster, channel: impl Into<String>) -> Self {
        Self {
            agent: agent.with_json_output(),
            roster,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl ReportSynthesizer for GeminiReportSynthesizer {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn synthesize(&self, request: &ReportRequest) -> Result<FinalReport> {
        let context = &request.context;
        let panel: Vec<String> = context
            .selected_panel_ids
            .iter()
            .map(|id| self.roster.label_for(id))
            .collect();
        let prompt = prompts::render(
            prompts::REPORT,
            context! {
                role => &context.candidate_role,
                company_brief => &context.company_brief,
                panel => panel,
                transcript => &request.transcript,
            },
        )?;

        tracing::debug!(
            channel = %self.channel,
            model = %self.agent.model(),
            session_id = %request.session_id,
            turns = request.transcript.len(),
            "Synthesizing report"
        );
        let reply = self.agent.generate(&prompt).await.map_err(into_synthesis)?;
        parse_json("gemini", &reply.text)
    }
}

/// Report paths surface generation errors as synthesis errors; quota and
/// auth refusals pass through untouched.
fn into_synthesis(err: MockmateError) -> MockmateError {
    match err {
        MockmateError::GenerationFailure { message, retryable } => {
            MockmateError::SynthesisFailure { message, retryable }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_errors_become_synthesis_errors() {
        let err = into_synthesis(MockmateError::generation_retryable("503"));
        assert_eq!(
            err,
            MockmateError::SynthesisFailure {
                message: "503".into(),
                retryable: true
            }
        );
        assert!(into_synthesis(MockmateError::QuotaExceeded("429".into())).is_quota_exceeded());
    }

    #[test]
    fn channel_name_is_kept() {
        let agent = GeminiApiAgent::new("key", "gemini-3-flash-preview");
        let synth = GeminiReportSynthesizer::new(agent, PersonaRoster::default(), "fallback");
        assert_eq!(synth.channel(), "fallback");
    }
}
