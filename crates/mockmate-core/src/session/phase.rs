//! Session phases, operation ids and terminal outcomes.

use crate::error::MockmateError;
use crate::interview::FinalReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::Display;

/// Phase of a rehearsal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the first question.
    Initializing,
    /// A question is shown and an answer can be captured.
    Presenting,
    /// A captured answer awaits confirmation.
    Reviewing,
    ConfirmingSkip,
    ConfirmingExit,
    /// A follow-up question is being fetched.
    LoadingQuestion,
    /// Transient: deciding whether a report can be requested.
    Terminating,
    ReportPending,
    Done,
    Aborted,
}

impl SessionPhase {
    /// Phases in which an operation is outstanding. Only an exit request is
    /// accepted here, and it is queued until the operation resolves.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::LoadingQuestion | Self::ReportPending
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Identifies one outstanding asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    OpeningFetch,
    FollowupFetch,
    Report,
}

/// Which report path produced the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportChannel {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "error", rename_all = "snake_case")]
pub enum AbortReason {
    /// The session could not be opened.
    OpeningFailed(MockmateError),
    /// The candidate exited while the opening question was loading.
    ExitedBeforeStart,
    /// The candidate exited and chose not to request a report.
    Discarded,
    /// Termination with no recorded turns.
    NoTurnsRecorded,
    ReportFailed(MockmateError),
    /// The candidate exited while the report was being generated.
    ExitedDuringReport,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpeningFailed(e) => write!(f, "could not start the session: {e}"),
            Self::ExitedBeforeStart => f.write_str("exited before the first question"),
            Self::Discarded => f.write_str("session discarded"),
            Self::NoTurnsRecorded => f.write_str("no answers were recorded"),
            Self::ReportFailed(e) => write!(f, "report generation failed: {e}"),
            Self::ExitedDuringReport => f.write_str("exited while the report was generating"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed {
        report: Box<FinalReport>,
        channel: ReportChannel,
    },
    Aborted {
        reason: AbortReason,
    },
}

impl SessionOutcome {
    pub fn report(&self) -> Option<&FinalReport> {
        match self {
            Self::Completed { report, .. } => Some(report.as_ref()),
            Self::Aborted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_phases_are_exactly_the_pending_ones() {
        let loading: Vec<_> = [
            SessionPhase::Initializing,
            SessionPhase::Presenting,
            SessionPhase::Reviewing,
            SessionPhase::ConfirmingSkip,
            SessionPhase::ConfirmingExit,
            SessionPhase::LoadingQuestion,
            SessionPhase::Terminating,
            SessionPhase::ReportPending,
            SessionPhase::Done,
            SessionPhase::Aborted,
        ]
        .into_iter()
        .filter(SessionPhase::is_loading)
        .collect();
        assert_eq!(
            loading,
            vec![
                SessionPhase::Initializing,
                SessionPhase::LoadingQuestion,
                SessionPhase::ReportPending
            ]
        );
    }

    #[test]
    fn phase_display_is_snake_case() {
        assert_eq!(SessionPhase::ConfirmingExit.to_string(), "confirming_exit");
        assert_eq!(OperationId(4).to_string(), "op-4");
    }
}
