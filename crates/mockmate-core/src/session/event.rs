use super::phase::{OperationId, OperationKind, SessionOutcome, SessionPhase};
use serde::{Deserialize, Serialize};

/// Notifications published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    /// A question was bound and is ready to show.
    QuestionPresented {
        question: String,
        interviewer_id: String,
        interviewer: String,
    },
    TurnRecorded {
        index: usize,
        skipped: bool,
    },
    /// An exit request arrived while an operation was outstanding.
    ExitQueued {
        operation: OperationKind,
    },
    /// A resolution arrived for an operation that is no longer pending.
    StaleResultDropped {
        operation: OperationId,
    },
    Finished {
        outcome: SessionOutcome,
    },
}
