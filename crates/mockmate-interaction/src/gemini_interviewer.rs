//! Gemini-backed interviewer.
//!
//! One type serves every in-session call the rehearsal core makes:
//! opening and follow-up questions, hints, code review and transcription.
//! It also runs the pre-session helpers that calibrate a panel from the
//! candidate's stated goal and generate a structured plan.

use crate::gemini_api_agent::GeminiApiAgent;
use crate::prompts::{self, END_OF_INTERVIEW};
use crate::response::parse_json;
use async_trait::async_trait;
use minijinja::context;
use mockmate_core::error::{MockmateError, Result};
use mockmate_core::interview::{
    InterviewPlan, PlanMode, QuestionBlueprint, ResearchLink, SessionContext, SessionControls,
};
use mockmate_core::persona::{Persona, PersonaRoster};
use mockmate_core::service::{
    AnswerTranscriber, CoachingAssistant, FollowupQuestion, FollowupRequest, OpeningQuestion,
    OpeningRequest, QuestionGenerator, RawCapture,
};
use serde::Deserialize;
use std::collections::HashSet;

/// Panel and role suggested for a free-text rehearsal goal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCalibration {
    #[serde(rename = "recommendedPanelIDs", default)]
    pub recommended_panel_ids: Vec<String>,
    #[serde(default)]
    pub recommended_role: String,
}

#[derive(Clone)]
pub struct GeminiInterviewer {
    agent: GeminiApiAgent,
    planner: GeminiApiAgent,
    roster: PersonaRoster,
}

impl GeminiInterviewer {
    /// Uses `agent` for every call; plans get Google Search grounding on
    /// top of it.
    pub fn new(agent: GeminiApiAgent, roster: PersonaRoster) -> Self {
        let planner = agent.clone().with_search_grounding();
        Self {
            agent,
            planner,
            roster,
        }
    }

    /// Replaces the agent used for plan generation.
    pub fn with_planner(mut self, planner: GeminiApiAgent) -> Self {
        self.planner = planner;
        self
    }

    pub fn roster(&self) -> &PersonaRoster {
        &self.roster
    }

    fn persona(&self, id: &str) -> Result<&Persona> {
        self.roster
            .get(id)
            .ok_or_else(|| MockmateError::not_found("persona", id))
    }

    /// Suggests panelists and a role title for `intent`.
    ///
    /// Ids the roster does not know are dropped. When none survive the lead
    /// roster persona is recommended alone.
    pub async fn calibrate_intent(&self, intent: &str) -> Result<IntentCalibration> {
        if intent.trim().is_empty() {
            return Err(MockmateError::InvalidInput(
                "intent must not be empty".into(),
            ));
        }
        let prompt = prompts::render(
            prompts::CALIBRATE,
            context! { intent => intent, personas => self.roster.all() },
        )?;
        let reply = self.agent.clone().with_json_output().generate(&prompt).await?;
        let calibration: IntentCalibration = parse_json("gemini", &reply.text)?;
        Ok(restrict_to_roster(calibration, &self.roster))
    }

    /// Generates a structured plan.
    ///
    /// The returned plan always carries `controls` and `role`, whatever the
    /// model put in its own meta block, plus the web sources that grounded
    /// it.
    pub async fn generate_plan(
        &self,
        intent: &str,
        role: &str,
        jd_text: Option<&str>,
        controls: SessionControls,
        panel: &[String],
    ) -> Result<InterviewPlan> {
        let prompt = prompts::render(
            prompts::PLAN,
            context! {
                intent => intent,
                role => role,
                jd_text => jd_text,
                controls => &controls,
                panel => panel,
            },
        )?;
        let reply = self.planner.generate(&prompt).await?;
        let payload: PlanPayload = parse_json("gemini", &reply.text)?;
        let plan = payload.into_plan(role, controls, reply.sources)?;

        tracing::info!(
            role,
            questions = plan.question_set.len(),
            sources = plan.research_links.len(),
            "Generated interview plan"
        );
        Ok(plan)
    }
}

#[async_trait]
impl QuestionGenerator for GeminiInterviewer {
    async fn generate_opening(&self, request: &OpeningRequest) -> Result<OpeningQuestion> {
        let context = &request.context;
        let lead = context
            .lead_panelist()
            .ok_or_else(|| MockmateError::InvalidInput("panel is empty".into()))?;
        let interviewer = self.persona(lead)?;

        let prompt = prompts::render(
            prompts::OPENING,
            context! {
                interviewer => interviewer,
                role => &context.candidate_role,
                intent => &context.intent_text,
                company_brief => &context.company_brief,
            },
        )?;
        tracing::debug!(request_id = %request.request_id, interviewer = lead, "Requesting opening question");
        let reply = self.agent.generate(&prompt).await?;

        Ok(OpeningQuestion {
            question: reply.text.trim().to_string(),
            interviewer_id: lead.to_string(),
            updated_context: context.clone(),
        })
    }

    async fn generate_followup(&self, request: &FollowupRequest) -> Result<FollowupQuestion> {
        let interviewer = self.persona(&request.interviewer_id)?;
        let prompt = prompts::render(
            prompts::FOLLOWUP,
            context! {
                interviewer => interviewer,
                role => &request.context.candidate_role,
                company_brief => &request.context.company_brief,
                transcript => &request.transcript,
                end_marker => END_OF_INTERVIEW,
            },
        )?;
        tracing::debug!(
            request_id = %request.request_id,
            interviewer = %request.interviewer_id,
            turns = request.transcript.len(),
            "Requesting follow-up question"
        );
        let reply = self.agent.generate(&prompt).await?;
        Ok(interpret_followup(&reply.text))
    }
}

#[async_trait]
impl CoachingAssistant for GeminiInterviewer {
    async fn hint(
        &self,
        question: &str,
        expected_signals: &[String],
        _context: &SessionContext,
    ) -> Result<String> {
        let prompt = prompts::render(
            prompts::HINT,
            context! { question => question, signals => expected_signals },
        )?;
        let reply = self.agent.generate(&prompt).await?;
        Ok(reply.text.trim().to_string())
    }

    async fn review_code(
        &self,
        question: &str,
        code: &str,
        context: &SessionContext,
    ) -> Result<String> {
        let prompt = prompts::render(
            prompts::CODE_REVIEW,
            context! { role => &context.candidate_role, question => question, code => code },
        )?;
        let reply = self.agent.generate(&prompt).await?;
        Ok(reply.text.trim().to_string())
    }
}

#[async_trait]
impl AnswerTranscriber for GeminiInterviewer {
    async fn transcribe(&self, capture: &RawCapture) -> Result<String> {
        let prompt = prompts::render(prompts::TRANSCRIBE, context! {})?;
        let reply = self
            .agent
            .generate_with_audio(&prompt, &capture.data, &capture.mime_type)
            .await?;
        Ok(reply.text.trim().to_string())
    }
}

fn interpret_followup(text: &str) -> FollowupQuestion {
    let text = text.trim();
    if text.contains(END_OF_INTERVIEW) {
        FollowupQuestion::Exhausted
    } else {
        FollowupQuestion::Question {
            text: text.to_string(),
        }
    }
}

fn restrict_to_roster(mut calibration: IntentCalibration, roster: &PersonaRoster) -> IntentCalibration {
    let mut seen = HashSet::new();
    calibration
        .recommended_panel_ids
        .retain(|id| roster.contains(id) && seen.insert(id.clone()));
    if calibration.recommended_panel_ids.is_empty()
        && let Some(lead) = roster.all().first()
    {
        tracing::warn!("Calibration recommended no known panelists, using the lead persona");
        calibration.recommended_panel_ids.push(lead.id.clone());
    }
    calibration.recommended_role = calibration.recommended_role.trim().to_string();
    calibration
}

/// Plan JSON as models actually return it: every block optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlanPayload {
    meta: Option<PlanMetaPayload>,
    question_set: Vec<QuestionBlueprint>,
    ordering_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlanMetaPayload {
    mode: Option<PlanMode>,
    language: Option<String>,
}

impl PlanPayload {
    fn into_plan(
        self,
        role: &str,
        controls: SessionControls,
        sources: Vec<ResearchLink>,
    ) -> Result<InterviewPlan> {
        if self.question_set.is_empty() {
            return Err(MockmateError::malformed(
                "gemini",
                "plan contains no questions",
            ));
        }
        let mut plan = InterviewPlan::new(role, controls).with_questions(self.question_set);
        if let Some(meta) = self.meta {
            if let Some(mode) = meta.mode {
                plan.meta.mode = mode;
            }
            if let Some(language) = meta.language.filter(|l| !l.trim().is_empty()) {
                plan.meta.language = language;
            }
        }
        plan.ordering_notes = self.ordering_notes.unwrap_or_default();
        plan.research_links = sources;
        Ok(plan)
    }
}
