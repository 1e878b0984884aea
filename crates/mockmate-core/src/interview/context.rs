//! Session context and interview plan.
//!
//! The context is created once per rehearsal by whoever sets up the session
//! (role capture, panel selection, plan generation) and is read-only for the
//! state machine, apart from being replaced by the context a conversational
//! question source hands back when it opens the interview.

use super::blueprint::QuestionBlueprint;
use crate::error::{MockmateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::{Display, EnumString};

/// Turn budget used when a session carries no plan controls.
pub const DEFAULT_TOTAL_QUESTIONS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionType {
    /// Questions come from a precomputed plan.
    Structured,
    /// Questions are generated turn by turn from the transcript.
    Conversational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionMode {
    /// No assistance during the session.
    #[default]
    Exam,
    /// Hints are available while a question is presented.
    Coach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlanDifficulty {
    Beginner,
    #[default]
    Mixed,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimePerQuestion {
    #[serde(rename = "45s")]
    Short,
    #[default]
    #[serde(rename = "90s")]
    Standard,
    #[serde(rename = "120s")]
    Long,
    #[serde(rename = "none")]
    Unlimited,
}

/// Relative share of each phase in a generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseMix {
    pub knowledge: u32,
    pub process: u32,
    pub scenario: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coding: Option<u32>,
}

impl Default for PhaseMix {
    fn default() -> Self {
        Self {
            knowledge: 40,
            process: 30,
            scenario: 30,
            coding: None,
        }
    }
}

/// Knobs the candidate sets before a plan is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionControls {
    /// Hard turn budget for the session.
    pub total_questions: usize,
    pub difficulty: PlanDifficulty,
    pub start_with_basics: bool,
    pub include_behavioral: bool,
    pub include_coding: bool,
    pub phase_mix: PhaseMix,
    pub time_per_question: TimePerQuestion,
    pub session_mode: SessionMode,
}

impl Default for SessionControls {
    fn default() -> Self {
        Self {
            total_questions: DEFAULT_TOTAL_QUESTIONS,
            difficulty: PlanDifficulty::default(),
            start_with_basics: true,
            include_behavioral: true,
            include_coding: false,
            phase_mix: PhaseMix::default(),
            time_per_question: TimePerQuestion::default(),
            session_mode: SessionMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    Tailored,
    #[default]
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMeta {
    #[serde(default)]
    pub mode: PlanMode,
    #[serde(default)]
    pub candidate_role: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub controls: SessionControls,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchLink {
    pub uri: String,
    pub title: String,
}

/// A precomputed, ordered interview plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPlan {
    pub meta: PlanMeta,
    pub question_set: Vec<QuestionBlueprint>,
    #[serde(default)]
    pub ordering_notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub research_links: Vec<ResearchLink>,
}

impl InterviewPlan {
    pub fn new(candidate_role: impl Into<String>, controls: SessionControls) -> Self {
        Self {
            meta: PlanMeta {
                mode: PlanMode::Generic,
                candidate_role: candidate_role.into(),
                language: default_language(),
                controls,
            },
            question_set: Vec::new(),
            ordering_notes: String::new(),
            research_links: Vec::new(),
        }
    }

    pub fn with_questions(mut self, questions: Vec<QuestionBlueprint>) -> Self {
        self.question_set = questions;
        self
    }
}

/// Per-session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub candidate_role: String,
    #[serde(default)]
    pub intent_text: String,
    pub session_type: SessionType,
    #[serde(default)]
    pub session_mode: SessionMode,
    #[serde(rename = "selectedPanelIDs")]
    pub selected_panel_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_plan: Option<InterviewPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_brief: Option<String>,
}

impl SessionContext {
    pub fn new(
        candidate_role: impl Into<String>,
        session_type: SessionType,
        selected_panel_ids: Vec<String>,
    ) -> Self {
        Self {
            candidate_role: candidate_role.into(),
            intent_text: String::new(),
            session_type,
            session_mode: SessionMode::default(),
            selected_panel_ids,
            interview_plan: None,
            company_name: None,
            company_url: None,
            company_brief: None,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent_text = intent.into();
        self
    }

    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.session_mode = mode;
        self
    }

    pub fn with_plan(mut self, plan: InterviewPlan) -> Self {
        self.interview_plan = Some(plan);
        self
    }

    pub fn with_company_brief(mut self, brief: impl Into<String>) -> Self {
        self.company_brief = Some(brief.into());
        self
    }

    /// The session's turn budget.
    ///
    /// Plan controls win; `fallback` (the configured default, normally
    /// [`DEFAULT_TOTAL_QUESTIONS`]) applies when there is no plan.
    pub fn total_questions(&self, fallback: usize) -> usize {
        self.interview_plan
            .as_ref()
            .map(|plan| plan.meta.controls.total_questions)
            .unwrap_or(fallback)
    }

    /// First panelist; the default speaker when nothing else decides.
    pub fn lead_panelist(&self) -> Option<&str> {
        self.selected_panel_ids.first().map(String::as_str)
    }

    /// Round-robin panelist for the turn at `index`.
    pub fn panelist_for_turn(&self, index: usize) -> Option<&str> {
        if self.selected_panel_ids.is_empty() {
            return None;
        }
        let slot = index % self.selected_panel_ids.len();
        Some(self.selected_panel_ids[slot].as_str())
    }

    pub fn is_coach_mode(&self) -> bool {
        self.session_mode == SessionMode::Coach
    }

    /// Checks the invariants the state machine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.candidate_role.trim().is_empty() {
            return Err(MockmateError::InvalidInput(
                "candidate role must not be empty".into(),
            ));
        }
        if self.selected_panel_ids.is_empty() {
            return Err(MockmateError::InvalidInput(
                "at least one panel member must be selected".into(),
            ));
        }
        if self.selected_panel_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(MockmateError::InvalidInput(
                "panel member ids must not be blank".into(),
            ));
        }
        if let Some(plan) = &self.interview_plan
            && plan.meta.controls.total_questions == 0
        {
            return Err(MockmateError::InvalidInput(
                "plan controls must allow at least one question".into(),
            ));
        }

        let mut seen = HashSet::new();
        for id in &self.selected_panel_ids {
            if !seen.insert(id.as_str()) {
                tracing::warn!(panelist = %id, "Panel member selected more than once");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn total_questions_prefers_plan_controls() {
        let ctx = SessionContext::new("SRE", SessionType::Conversational, panel(&["p1"]));
        assert_eq!(ctx.total_questions(DEFAULT_TOTAL_QUESTIONS), 7);

        let controls = SessionControls {
            total_questions: 3,
            ..SessionControls::default()
        };
        let ctx = ctx.with_plan(InterviewPlan::new("SRE", controls));
        assert_eq!(ctx.total_questions(DEFAULT_TOTAL_QUESTIONS), 3);
    }

    #[test]
    fn round_robin_wraps_over_panel() {
        let ctx = SessionContext::new("PM", SessionType::Conversational, panel(&["p1", "p3", "s4"]));
        let picks: Vec<_> = (0..5).map(|i| ctx.panelist_for_turn(i).unwrap()).collect();
        assert_eq!(picks, vec!["p1", "p3", "s4", "p1", "p3"]);
    }

    #[test]
    fn validate_rejects_empty_panel() {
        let ctx = SessionContext::new("PM", SessionType::Structured, Vec::new());
        assert!(matches!(ctx.validate(), Err(MockmateError::InvalidInput(_))));
    }

    #[test]
    fn validate_accepts_duplicates_with_warning() {
        let ctx = SessionContext::new("PM", SessionType::Structured, panel(&["p1", "p1"]));
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn context_uses_original_wire_names() {
        let json = r#"{
            "candidateRole": "Data Analyst",
            "intentText": "Fintech analyst loop",
            "sessionType": "conversational",
            "sessionMode": "coach",
            "selectedPanelIDs": ["p1", "s2"],
            "companyBrief": "Payments startup"
        }"#;
        let ctx: SessionContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.session_type, SessionType::Conversational);
        assert!(ctx.is_coach_mode());
        assert_eq!(ctx.lead_panelist(), Some("p1"));
        assert_eq!(ctx.company_brief.as_deref(), Some("Payments startup"));
    }

    #[test]
    fn controls_parse_time_labels() {
        let json = r#"{"totalQuestions": 5, "timePerQuestion": "120s", "difficulty": "advanced"}"#;
        let controls: SessionControls = serde_json::from_str(json).unwrap();
        assert_eq!(controls.total_questions, 5);
        assert_eq!(controls.time_per_question, TimePerQuestion::Long);
        assert_eq!(controls.difficulty, PlanDifficulty::Advanced);
        assert!(controls.include_behavioral);
    }
}
