//! Wiring of the remote services a session needs.

use crate::backend_report_client::BackendReportClient;
use crate::gemini_api_agent::GeminiApiAgent;
use crate::gemini_interviewer::GeminiInterviewer;
use crate::report_synthesizer::GeminiReportSynthesizer;
use mockmate_core::config::{AppConfig, SecretConfig};
use mockmate_core::error::{MockmateError, Result};
use mockmate_core::interview::{SessionContext, SessionType};
use mockmate_core::persona::PersonaRoster;
use mockmate_core::service::ReportSynthesizer;
use mockmate_core::session::{
    ConversationalSource, ReportRequester, SessionRunner, SessionStateMachine,
};
use std::sync::Arc;

/// Gemini-backed services shared by every session of one process.
#[derive(Clone)]
pub struct MockmateServices {
    interviewer: Arc<GeminiInterviewer>,
    reports: ReportRequester,
    roster: PersonaRoster,
    config: AppConfig,
}

impl MockmateServices {
    /// Builds the services from configuration.
    ///
    /// With a backend URL configured the backend is the primary report
    /// channel and the fallback model the secondary one. Without it, reports
    /// go to the report model with the fallback model behind it.
    ///
    /// # Errors
    ///
    /// Returns `Config` when no Gemini API key is available.
    pub fn from_config(
        config: &AppConfig,
        secrets: &SecretConfig,
        roster: PersonaRoster,
    ) -> Result<Self> {
        let gemini = secrets
            .gemini
            .as_ref()
            .filter(|g| !g.api_key.trim().is_empty())
            .ok_or_else(|| MockmateError::config("Gemini API key is not configured"))?;

        let models = &config.models;
        let question_model = gemini
            .model_name
            .clone()
            .unwrap_or_else(|| models.question_model.clone());
        let agent = GeminiApiAgent::new(&gemini.api_key, question_model);
        let planner = agent
            .clone()
            .with_model(&models.report_model)
            .with_search_grounding();
        let interviewer = GeminiInterviewer::new(agent.clone(), roster.clone()).with_planner(planner);

        let fallback: Arc<dyn ReportSynthesizer> = Arc::new(GeminiReportSynthesizer::new(
            agent.clone().with_model(&models.fallback_report_model),
            roster.clone(),
            "gemini-fallback",
        ));
        let primary: Arc<dyn ReportSynthesizer> = match &config.backend.base_url {
            Some(base_url) => {
                let token = secrets.backend.as_ref().map(|b| b.id_token.clone());
                tracing::info!(%base_url, "Reports go through the authenticated backend");
                Arc::new(BackendReportClient::new(base_url, token))
            }
            None => Arc::new(GeminiReportSynthesizer::new(
                agent.with_model(&models.report_model),
                roster.clone(),
                "gemini",
            )),
        };

        let reports = ReportRequester::new(primary)
            .with_fallback(fallback)
            .with_timeout(config.session.report_timeout());

        Ok(Self::from_parts(Arc::new(interviewer), reports, roster, config.clone()))
    }

    pub fn from_parts(
        interviewer: Arc<GeminiInterviewer>,
        reports: ReportRequester,
        roster: PersonaRoster,
        config: AppConfig,
    ) -> Self {
        Self {
            interviewer,
            reports,
            roster,
            config,
        }
    }

    pub fn interviewer(&self) -> &GeminiInterviewer {
        &self.interviewer
    }

    pub fn roster(&self) -> &PersonaRoster {
        &self.roster
    }

    /// A runner for a new session over `context`.
    ///
    /// Conversational sessions get the generator-backed question source;
    /// hints, code review and transcription are always attached.
    pub fn session_runner(&self, context: SessionContext) -> SessionRunner {
        let is_conversational = context.session_type == SessionType::Conversational;
        let settings = &self.config.session;
        let machine = SessionStateMachine::new(context, self.roster.clone())
            .with_default_total_questions(settings.default_total_questions);

        let mut runner = SessionRunner::new(machine, self.reports.clone())
            .with_coach(self.interviewer.clone())
            .with_transcriber(self.interviewer.clone())
            .with_assist_timeout(settings.question_timeout());
        if is_conversational {
            runner = runner.with_question_source(ConversationalSource::with_settings(
                self.interviewer.clone(),
                settings,
            ));
        }
        runner
    }
}
