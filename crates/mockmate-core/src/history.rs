//! Session history: one summary record per completed rehearsal.

use crate::error::Result;
use crate::interview::{FinalReport, SessionType};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of records a history keeps.
pub const HISTORY_LIMIT: usize = 50;

const DEFAULT_READINESS: &str = "NOT_READY";
const DEFAULT_RISK: &str = "No major risk identified";
const UNKNOWN_ROLE: &str = "Unknown Role";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryRecord {
    pub id: String,
    /// RFC3339 completion time.
    pub timestamp: String,
    pub role: String,
    /// Mean advisory score, one decimal place; 0.0 when nothing was scored.
    pub avg_score: f64,
    pub readiness_status: String,
    pub biggest_risk: String,
    pub session_type: SessionType,
}

impl SessionHistoryRecord {
    pub fn from_report(report: &FinalReport, role: &str, session_type: SessionType) -> Self {
        let now = Utc::now();
        let avg = report.average_score().unwrap_or(0.0);
        let role = role.trim();

        Self {
            id: format!("session_{}", now.timestamp_millis()),
            timestamp: now.to_rfc3339(),
            role: if role.is_empty() {
                UNKNOWN_ROLE.to_string()
            } else {
                role.to_string()
            },
            avg_score: (avg * 10.0).round() / 10.0,
            readiness_status: report
                .readiness
                .as_ref()
                .map(|r| r.status.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_READINESS.to_string()),
            biggest_risk: report
                .biggest_risk_area
                .as_ref()
                .map(|r| r.title.clone())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_RISK.to_string()),
            session_type,
        }
    }
}

/// Persistence for session history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// All records, newest first.
    async fn list(&self) -> Result<Vec<SessionHistoryRecord>>;

    /// Prepends a record, dropping the oldest beyond [`HISTORY_LIMIT`].
    async fn append(&self, record: SessionHistoryRecord) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::{AdvisorAssessment, CoachPack, Readiness, SkillScore};

    fn report(scores: &[f64]) -> FinalReport {
        FinalReport {
            overall_summary: "Summary".into(),
            readiness: None,
            advisory_panel: vec![AdvisorAssessment {
                persona: "Asha".into(),
                summary: String::new(),
                scores: scores
                    .iter()
                    .map(|s| SkillScore {
                        skill: "Clarity".into(),
                        score: *s,
                    })
                    .collect(),
            }],
            question_performance: Vec::new(),
            biggest_risk_area: None,
            coach_pack: CoachPack::default(),
        }
    }

    #[test]
    fn from_report_rounds_average_and_applies_defaults() {
        let record = SessionHistoryRecord::from_report(
            &report(&[3.0, 4.0, 4.0]),
            "  ",
            SessionType::Structured,
        );
        assert_eq!(record.avg_score, 3.7);
        assert_eq!(record.readiness_status, "NOT_READY");
        assert_eq!(record.biggest_risk, "No major risk identified");
        assert_eq!(record.role, "Unknown Role");
        assert!(record.id.starts_with("session_"));
    }

    #[test]
    fn from_report_keeps_reported_readiness() {
        let mut r = report(&[]);
        r.readiness = Some(Readiness {
            status: "READY".into(),
            reasoning: String::new(),
        });
        let record = SessionHistoryRecord::from_report(&r, "SRE", SessionType::Conversational);
        assert_eq!(record.avg_score, 0.0);
        assert_eq!(record.readiness_status, "READY");
        assert_eq!(record.session_type, SessionType::Conversational);
    }
}
