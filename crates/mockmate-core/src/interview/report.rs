//! Final performance report.
//!
//! Field names follow the JSON the synthesis services return: camelCase at
//! the top level, snake_case inside per-question entries and drills.

use super::turn::{InterviewTurn, Transcript};
use serde::{Deserialize, Serialize};

const MISSING_ASSESSMENT: &str = "No assessment was returned for this answer.";

/// Behaviourally anchored rating scale for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bars {
    pub criteria: String,
    pub score_5_description: String,
    pub score_3_description: String,
    pub score_1_description: String,
}

/// Assessment of one transcript turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPerformance {
    #[serde(default)]
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_phase: Option<String>,
    #[serde(default)]
    pub user_transcript: String,
    #[serde(default)]
    pub max_impact_response: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bars_rubric: Option<Vec<Bars>>,
}

impl QuestionPerformance {
    /// Placeholder entry for a turn the synthesis step did not cover.
    pub fn from_turn(turn: &InterviewTurn) -> Self {
        Self {
            question_text: turn.question.clone(),
            question_phase: turn
                .question_blueprint
                .as_ref()
                .map(|bp| bp.phase.to_string()),
            user_transcript: turn.candidate_response.clone(),
            max_impact_response: String::new(),
            feedback: MISSING_ASSESSMENT.to_string(),
            bars_rubric: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillScore {
    pub skill: String,
    pub score: f64,
}

/// One panelist's view of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorAssessment {
    pub persona: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub scores: Vec<SkillScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readiness {
    pub status: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskArea {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedoNow {
    pub question: String,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroDrill {
    pub weakness: String,
    pub drill_prompt: String,
    pub focus_point: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachPack {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "redoNow", default)]
    pub redo_now: RedoNow,
    #[serde(default)]
    pub micro_drills: Vec<MicroDrill>,
}

/// Structured assessment of a full or partial transcript.
///
/// `overallSummary` and `questionPerformance` are required on the wire, so
/// an empty `{}` payload fails to parse instead of becoming an empty report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub overall_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness: Option<Readiness>,
    #[serde(default)]
    pub advisory_panel: Vec<AdvisorAssessment>,
    pub question_performance: Vec<QuestionPerformance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biggest_risk_area: Option<RiskArea>,
    #[serde(default)]
    pub coach_pack: CoachPack,
}

impl FinalReport {
    /// Rejects payloads that parsed but carry no assessment.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.overall_summary.trim().is_empty() {
            return Err("report has no overall summary".to_string());
        }
        Ok(())
    }

    /// Aligns `question_performance` with the ground-truth transcript.
    ///
    /// Afterwards there is exactly one entry per turn, in turn order, and
    /// each entry's `user_transcript` is the recorded response. Missing
    /// question texts are filled from the turn. Returns how many entries had
    /// to be corrected, padded or dropped.
    pub fn reconcile(&mut self, transcript: &Transcript) -> usize {
        let mut corrections = 0;

        if self.question_performance.len() > transcript.len() {
            let surplus = self.question_performance.len() - transcript.len();
            tracing::warn!(surplus, "Report has more performance entries than turns; truncating");
            self.question_performance.truncate(transcript.len());
            corrections += surplus;
        }

        for (index, turn) in transcript.iter().enumerate() {
            match self.question_performance.get_mut(index) {
                Some(entry) => {
                    if entry.user_transcript != turn.candidate_response {
                        if !is_missing_text(&entry.user_transcript) {
                            tracing::debug!(index, "Replacing rewritten transcript text in report");
                        }
                        entry.user_transcript = turn.candidate_response.clone();
                        corrections += 1;
                    }
                    if is_missing_text(&entry.question_text) {
                        entry.question_text = turn.question.clone();
                    }
                }
                None => {
                    self.question_performance
                        .push(QuestionPerformance::from_turn(turn));
                    corrections += 1;
                }
            }
        }

        corrections
    }

    /// Mean of every advisor skill score, `None` when there are none.
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .advisory_panel
            .iter()
            .flat_map(|a| a.scores.iter().map(|s| s.score))
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }
}

/// Generation output sometimes carries JS-isms instead of text.
fn is_missing_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == "undefined" || trimmed == "null"
}
