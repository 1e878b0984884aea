//! Interview turns and the append-only transcript.

use super::blueprint::QuestionBlueprint;
use crate::error::{MockmateError, Result};
use serde::{Deserialize, Serialize};

/// Recorded in place of a response when the candidate skips a question.
pub const SKIPPED_SENTINEL: &str = "[SKIPPED]";

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewTurn {
    /// Stable id of the persona who asked
    pub interviewer_id: String,
    /// Display label of the persona who asked
    pub interviewer: String,
    pub question: String,
    /// Confirmed answer text, or [`SKIPPED_SENTINEL`]
    pub candidate_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_blueprint: Option<QuestionBlueprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_feedback: Option<String>,
}

impl InterviewTurn {
    pub fn answered(
        interviewer_id: impl Into<String>,
        interviewer: impl Into<String>,
        question: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            interviewer_id: interviewer_id.into(),
            interviewer: interviewer.into(),
            question: question.into(),
            candidate_response: response.into(),
            question_blueprint: None,
            code_feedback: None,
        }
    }

    pub fn skipped(
        interviewer_id: impl Into<String>,
        interviewer: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self::answered(interviewer_id, interviewer, question, SKIPPED_SENTINEL)
    }

    pub fn with_blueprint(mut self, blueprint: Option<QuestionBlueprint>) -> Self {
        self.question_blueprint = blueprint;
        self
    }

    pub fn with_code_feedback(mut self, feedback: Option<String>) -> Self {
        self.code_feedback = feedback;
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.candidate_response == SKIPPED_SENTINEL
    }
}

/// Ordered, append-only record of a session's confirmed turns.
///
/// Entries can be read but never edited, reordered or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    turns: Vec<InterviewTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn and returns the new length.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the question or interviewer is blank, or
    /// the response is blank and not the skip sentinel.
    pub fn record(&mut self, turn: InterviewTurn) -> Result<usize> {
        if turn.question.trim().is_empty() {
            return Err(MockmateError::InvalidInput(
                "cannot record a turn without question text".into(),
            ));
        }
        if turn.interviewer.trim().is_empty() || turn.interviewer_id.trim().is_empty() {
            return Err(MockmateError::InvalidInput(
                "cannot record a turn without an interviewer".into(),
            ));
        }
        if turn.candidate_response.trim().is_empty() {
            return Err(MockmateError::InvalidInput(
                "response must be text or the skip sentinel".into(),
            ));
        }

        self.turns.push(turn);
        Ok(self.turns.len())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[InterviewTurn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InterviewTurn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&InterviewTurn> {
        self.turns.last()
    }

    /// The most recent `n` turns, oldest first.
    pub fn tail(&self, n: usize) -> &[InterviewTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn skipped_count(&self) -> usize {
        self.turns.iter().filter(|t| t.is_skipped()).count()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a InterviewTurn;
    type IntoIter = std::slice::Iter<'a, InterviewTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
