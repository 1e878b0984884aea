//! The rehearsal session state machine.
//!
//! The machine performs no I/O. User actions and operation resolutions are
//! plain method calls; when asynchronous work is needed the machine enters a
//! loading phase and returns a [`SessionEffect`] tagged with an
//! [`OperationId`]. Whoever executes the effect reports back through the
//! matching `resolve_*` method. A resolution for any other id is stale and
//! is dropped.

use super::attribution::attribute;
use super::event::SessionEvent;
use super::phase::{
    AbortReason, OperationId, OperationKind, ReportChannel, SessionOutcome, SessionPhase,
};
use super::question_source::{PlanLookup, StructuredPlan};
use super::report::ReportOutcome;
use crate::error::{MockmateError, Result};
use crate::interview::{
    DEFAULT_TOTAL_QUESTIONS, FinalReport, InterviewTurn, QuestionBlueprint, SessionContext,
    SessionType, Transcript,
};
use crate::persona::PersonaRoster;
use crate::service::{FollowupQuestion, OpeningQuestion};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Asynchronous work requested by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    FetchOpening {
        operation: OperationId,
        context: SessionContext,
    },
    FetchFollowup {
        operation: OperationId,
        transcript: Transcript,
        context: SessionContext,
        interviewer_id: String,
        total_questions: usize,
    },
    RequestReport {
        operation: OperationId,
        session_id: String,
        transcript: Transcript,
        context: SessionContext,
    },
}

impl SessionEffect {
    pub fn operation(&self) -> OperationId {
        match self {
            Self::FetchOpening { operation, .. }
            | Self::FetchFollowup { operation, .. }
            | Self::RequestReport { operation, .. } => *operation,
        }
    }
}

/// The question currently bound to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedQuestion {
    pub text: String,
    pub interviewer_id: String,
    pub interviewer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<QuestionBlueprint>,
}

/// An answer captured but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_feedback: Option<String>,
}

/// Read-only view for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub phase: SessionPhase,
    pub question: Option<String>,
    pub interviewer_id: Option<String>,
    pub interviewer: Option<String>,
    pub draft: Option<Draft>,
    pub turns_recorded: usize,
    pub total_questions: usize,
    pub exit_queued: bool,
    pub outcome: Option<SessionOutcome>,
}

#[derive(Debug, Clone)]
struct PendingOperation {
    id: OperationId,
    kind: OperationKind,
    /// Panelist a follow-up fetch was issued for.
    interviewer_id: Option<String>,
}

pub struct SessionStateMachine {
    session_id: String,
    context: SessionContext,
    roster: PersonaRoster,
    default_total_questions: usize,
    phase: SessionPhase,
    started: bool,
    transcript: Transcript,
    current: Option<PresentedQuestion>,
    draft: Option<Draft>,
    pending: Option<PendingOperation>,
    next_operation: u64,
    exit_queued: bool,
    outcome: Option<SessionOutcome>,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl SessionStateMachine {
    pub fn new(context: SessionContext, roster: PersonaRoster) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            context,
            roster,
            default_total_questions: DEFAULT_TOTAL_QUESTIONS,
            phase: SessionPhase::Initializing,
            started: false,
            transcript: Transcript::new(),
            current: None,
            draft: None,
            pending: None,
            next_operation: 1,
            exit_queued: false,
            outcome: None,
            events: None,
        }
    }

    /// Turn budget used when the context carries no plan.
    pub fn with_default_total_questions(mut self, total: usize) -> Self {
        self.default_total_questions = total.max(1);
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn total_questions(&self) -> usize {
        self.context.total_questions(self.default_total_questions)
    }

    /// The question on screen, only while it can be acted on.
    pub fn presented_question(&self) -> Option<&PresentedQuestion> {
        match self.phase {
            SessionPhase::Presenting => self.current.as_ref(),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            question: self.current.as_ref().map(|q| q.text.clone()),
            interviewer_id: self.current.as_ref().map(|q| q.interviewer_id.clone()),
            interviewer: self.current.as_ref().map(|q| q.interviewer.clone()),
            draft: self.draft.clone(),
            turns_recorded: self.transcript.len(),
            total_questions: self.total_questions(),
            exit_queued: self.exit_queued,
            outcome: self.outcome.clone(),
        }
    }

    // ============================================================================
    // Opening
    // ============================================================================

    /// Binds the first question.
    ///
    /// Structured sessions read plan index 0 directly. Conversational
    /// sessions return a [`SessionEffect::FetchOpening`].
    pub fn start(&mut self) -> Result<Option<SessionEffect>> {
        if self.phase != SessionPhase::Initializing || self.started {
            return Err(MockmateError::invalid_transition(self.phase, "start"));
        }
        self.started = true;
        tracing::info!(
            session_id = %self.session_id,
            session_type = %self.context.session_type,
            panel = ?self.context.selected_panel_ids,
            "Starting session"
        );

        if let Err(e) = self.context.validate() {
            self.abort(AbortReason::OpeningFailed(e.clone()));
            return Err(e);
        }

        match self.context.session_type {
            SessionType::Structured => {
                let first = self.plan_question(0);
                match first {
                    Ok(blueprint) => {
                        self.bind_blueprint(blueprint);
                        Ok(None)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Structured session cannot open");
                        self.abort(AbortReason::OpeningFailed(e));
                        Ok(None)
                    }
                }
            }
            SessionType::Conversational => {
                let operation = self.begin(OperationKind::OpeningFetch, None);
                Ok(Some(SessionEffect::FetchOpening {
                    operation,
                    context: self.context.clone(),
                }))
            }
        }
    }

    pub fn resolve_opening(
        &mut self,
        operation: OperationId,
        result: Result<OpeningQuestion>,
    ) -> Option<SessionEffect> {
        self.settle(operation, OperationKind::OpeningFetch)?;

        if self.exit_queued {
            self.exit_queued = false;
            tracing::info!("Exit was queued during the opening fetch");
            self.abort(AbortReason::ExitedBeforeStart);
            return None;
        }

        match result {
            Ok(opening) if opening.question.trim().is_empty() => {
                tracing::error!("Opening question came back blank");
                self.abort(AbortReason::OpeningFailed(MockmateError::generation(
                    "opening question is blank",
                )));
            }
            Ok(opening) => {
                self.context = opening.updated_context;
                let label = self.roster.label_for(&opening.interviewer_id);
                self.present(PresentedQuestion {
                    text: opening.question,
                    interviewer_id: opening.interviewer_id,
                    interviewer: label,
                    blueprint: None,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Opening question failed");
                self.abort(AbortReason::OpeningFailed(e));
            }
        }
        None
    }

    // ============================================================================
    // Answer capture and confirmation
    // ============================================================================

    pub fn capture_answer(&mut self, response: &str) -> Result<()> {
        self.capture(response, None)
    }

    /// Captures submitted code with an optional critique.
    pub fn capture_code(&mut self, code: &str, feedback: Option<String>) -> Result<()> {
        self.capture(code, feedback)
    }

    fn capture(&mut self, response: &str, code_feedback: Option<String>) -> Result<()> {
        self.expect_phase(SessionPhase::Presenting, "capture an answer")?;
        let response = response.trim();
        if response.is_empty() {
            return Err(MockmateError::NoResponseCaptured);
        }
        self.draft = Some(Draft {
            response: response.to_string(),
            code_feedback,
        });
        self.transition(SessionPhase::Reviewing);
        Ok(())
    }

    /// Drops the draft and shows the same question again.
    pub fn discard(&mut self) -> Result<()> {
        self.expect_phase(SessionPhase::Reviewing, "discard an answer")?;
        self.draft = None;
        self.transition(SessionPhase::Presenting);
        Ok(())
    }

    /// Records the draft as a turn and advances.
    pub fn confirm(&mut self) -> Result<Option<SessionEffect>> {
        self.expect_phase(SessionPhase::Reviewing, "confirm an answer")?;
        let (Some(draft), Some(question)) = (self.draft.clone(), self.current.clone()) else {
            return Err(MockmateError::internal("reviewing without a draft or question"));
        };

        let turn = InterviewTurn::answered(
            question.interviewer_id,
            question.interviewer,
            question.text,
            draft.response,
        )
        .with_blueprint(question.blueprint)
        .with_code_feedback(draft.code_feedback);
        self.record(turn)?;
        Ok(self.advance())
    }

    // ============================================================================
    // Skip
    // ============================================================================

    pub fn request_skip(&mut self) -> Result<()> {
        self.expect_phase(SessionPhase::Presenting, "skip")?;
        self.transition(SessionPhase::ConfirmingSkip);
        Ok(())
    }

    pub fn cancel_skip(&mut self) -> Result<()> {
        self.expect_phase(SessionPhase::ConfirmingSkip, "cancel a skip")?;
        self.transition(SessionPhase::Presenting);
        Ok(())
    }

    /// Records the skip sentinel for the current question and advances.
    pub fn confirm_skip(&mut self) -> Result<Option<SessionEffect>> {
        self.expect_phase(SessionPhase::ConfirmingSkip, "confirm a skip")?;
        let Some(question) = self.current.clone() else {
            return Err(MockmateError::internal("skip confirmed without a question"));
        };

        let turn = InterviewTurn::skipped(
            question.interviewer_id,
            question.interviewer,
            question.text,
        )
        .with_blueprint(question.blueprint);
        self.record(turn)?;
        Ok(self.advance())
    }

    // ============================================================================
    // Exit
    // ============================================================================

    /// Asks to leave the session.
    ///
    /// While an operation is outstanding the request is queued and applied
    /// when the operation resolves.
    pub fn request_exit(&mut self) -> Result<()> {
        match self.phase {
            SessionPhase::Presenting | SessionPhase::Reviewing | SessionPhase::ConfirmingSkip => {
                self.transition(SessionPhase::ConfirmingExit);
                Ok(())
            }
            SessionPhase::ConfirmingExit => Ok(()),
            SessionPhase::Initializing if !self.started => {
                self.abort(AbortReason::ExitedBeforeStart);
                Ok(())
            }
            phase if phase.is_loading() => {
                if !self.exit_queued {
                    self.exit_queued = true;
                    if let Some(pending) = &self.pending {
                        let operation = pending.kind;
                        tracing::info!(%operation, "Exit queued until the pending operation resolves");
                        self.publish(SessionEvent::ExitQueued { operation });
                    }
                }
                Ok(())
            }
            phase => Err(MockmateError::invalid_transition(phase, "exit")),
        }
    }

    /// Ends the session with a report over the turns recorded so far.
    pub fn exit_with_report(&mut self) -> Result<Option<SessionEffect>> {
        self.expect_phase(SessionPhase::ConfirmingExit, "request a partial report")?;
        Ok(self.terminate())
    }

    /// Ends the session without a report, whatever was recorded.
    pub fn exit_and_discard(&mut self) -> Result<()> {
        self.expect_phase(SessionPhase::ConfirmingExit, "discard the session")?;
        self.abort(AbortReason::Discarded);
        Ok(())
    }

    /// Returns to the interview. An unconfirmed draft is back under review;
    /// a question dropped by a queued exit is fetched again.
    pub fn resume(&mut self) -> Result<Option<SessionEffect>> {
        self.expect_phase(SessionPhase::ConfirmingExit, "resume")?;
        if self.current.is_some() {
            let phase = if self.draft.is_some() {
                SessionPhase::Reviewing
            } else {
                SessionPhase::Presenting
            };
            self.transition(phase);
            return Ok(None);
        }
        tracing::info!("Resuming with a dropped question; fetching it again");
        Ok(self.advance())
    }

    // ============================================================================
    // Follow-up and report resolutions
    // ============================================================================

    pub fn resolve_followup(
        &mut self,
        operation: OperationId,
        result: Result<FollowupQuestion>,
    ) -> Option<SessionEffect> {
        let pending = self.settle(operation, OperationKind::FollowupFetch)?;

        if self.exit_queued {
            self.exit_queued = false;
            tracing::info!("Exit was queued during a follow-up fetch; discarding its result");
            self.transition(SessionPhase::ConfirmingExit);
            return None;
        }

        match result {
            Ok(FollowupQuestion::Question { text }) if text.trim().is_empty() => {
                tracing::warn!("Follow-up question came back blank; ending with a partial report");
                self.terminate()
            }
            Ok(FollowupQuestion::Question { text }) => {
                let interviewer_id = pending
                    .interviewer_id
                    .or_else(|| self.context.lead_panelist().map(str::to_string))
                    .unwrap_or_default();
                let interviewer = self.roster.label_for(&interviewer_id);
                self.present(PresentedQuestion {
                    text,
                    interviewer_id,
                    interviewer,
                    blueprint: None,
                });
                None
            }
            Ok(FollowupQuestion::Exhausted) => {
                tracing::info!("Question source exhausted");
                self.terminate()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Follow-up question failed; ending with a partial report");
                self.terminate()
            }
        }
    }

    pub fn resolve_report(
        &mut self,
        operation: OperationId,
        outcome: ReportOutcome,
    ) -> Option<SessionEffect> {
        self.settle(operation, OperationKind::Report)?;

        if self.exit_queued {
            self.exit_queued = false;
            tracing::info!("Exit was queued during report generation; discarding the report");
            self.abort(AbortReason::ExitedDuringReport);
            return None;
        }

        match outcome {
            ReportOutcome::Primary(report) => self.complete(report, ReportChannel::Primary),
            ReportOutcome::Fallback(report) => self.complete(report, ReportChannel::Fallback),
            ReportOutcome::Failed { error, .. } => {
                self.abort(AbortReason::ReportFailed(error));
            }
        }
        None
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn expect_phase(&self, expected: SessionPhase, action: &str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(MockmateError::invalid_transition(self.phase, action))
        }
    }

    fn record(&mut self, turn: InterviewTurn) -> Result<()> {
        let skipped = turn.is_skipped();
        let len = self.transcript.record(turn)?;
        tracing::info!(turn = len, skipped, "Turn recorded");
        self.publish(SessionEvent::TurnRecorded {
            index: len - 1,
            skipped,
        });
        Ok(())
    }

    /// Moves past the recorded turn: next question, or termination.
    fn advance(&mut self) -> Option<SessionEffect> {
        self.current = None;
        self.draft = None;
        let total = self.total_questions();
        if self.transcript.len() >= total {
            tracing::info!(total, "Turn budget reached");
            return self.terminate();
        }

        match self.context.session_type {
            SessionType::Structured => {
                // One turn per plan entry, so the next index is the turn count.
                let next = self.transcript.len();
                match self.plan_question(next) {
                    Ok(blueprint) => {
                        self.bind_blueprint(blueprint);
                        None
                    }
                    Err(e) => {
                        tracing::info!(cursor = next, error = %e, "No usable plan question; ending");
                        self.terminate()
                    }
                }
            }
            SessionType::Conversational => {
                let panel = &self.context.selected_panel_ids;
                let interviewer_id = panel
                    .get(self.transcript.len() % panel.len().max(1))
                    .cloned()
                    .unwrap_or_default();
                let operation =
                    self.begin(OperationKind::FollowupFetch, Some(interviewer_id.clone()));
                Some(SessionEffect::FetchFollowup {
                    operation,
                    transcript: self.transcript.clone(),
                    context: self.context.clone(),
                    interviewer_id,
                    total_questions: total,
                })
            }
        }
    }

    fn plan_question(&self, cursor: usize) -> Result<QuestionBlueprint> {
        let plan = self
            .context
            .interview_plan
            .as_ref()
            .ok_or_else(|| MockmateError::generation("structured session has no interview plan"))?;
        match StructuredPlan::new(plan, self.total_questions()).question_at(cursor) {
            PlanLookup::Question(blueprint) if blueprint.question.trim().is_empty() => {
                Err(MockmateError::generation(format!(
                    "interview plan question {} is blank",
                    blueprint.id
                )))
            }
            PlanLookup::Question(blueprint) => Ok(blueprint.clone()),
            PlanLookup::Exhausted => Err(MockmateError::generation(format!(
                "interview plan has no question at index {cursor}"
            ))),
        }
    }

    fn bind_blueprint(&mut self, blueprint: QuestionBlueprint) {
        let interviewer_id = attribute(Some(&blueprint), &self.context)
            .unwrap_or_default()
            .to_string();
        let interviewer = self.roster.label_for(&interviewer_id);
        self.present(PresentedQuestion {
            text: blueprint.question.clone(),
            interviewer_id,
            interviewer,
            blueprint: Some(blueprint),
        });
    }

    fn present(&mut self, question: PresentedQuestion) {
        tracing::debug!(interviewer = %question.interviewer_id, "Question bound");
        self.publish(SessionEvent::QuestionPresented {
            question: question.text.clone(),
            interviewer_id: question.interviewer_id.clone(),
            interviewer: question.interviewer.clone(),
        });
        self.current = Some(question);
        self.transition(SessionPhase::Presenting);
    }

    /// Enters termination. An empty transcript aborts without a report call.
    fn terminate(&mut self) -> Option<SessionEffect> {
        self.current = None;
        self.draft = None;
        self.transition(SessionPhase::Terminating);

        if self.transcript.is_empty() {
            tracing::info!("No turns recorded; skipping report");
            self.abort(AbortReason::NoTurnsRecorded);
            return None;
        }

        let operation = self.begin(OperationKind::Report, None);
        Some(SessionEffect::RequestReport {
            operation,
            session_id: self.session_id.clone(),
            transcript: self.transcript.clone(),
            context: self.context.clone(),
        })
    }

    /// Registers a new pending operation and enters its loading phase.
    fn begin(&mut self, kind: OperationKind, interviewer_id: Option<String>) -> OperationId {
        let id = OperationId(self.next_operation);
        self.next_operation += 1;
        self.pending = Some(PendingOperation {
            id,
            kind,
            interviewer_id,
        });
        tracing::debug!(operation = %id, %kind, "Operation started");

        let phase = match kind {
            OperationKind::OpeningFetch => SessionPhase::Initializing,
            OperationKind::FollowupFetch => SessionPhase::LoadingQuestion,
            OperationKind::Report => SessionPhase::ReportPending,
        };
        self.transition(phase);
        id
    }

    /// Clears the pending operation if `operation` is it; otherwise the
    /// resolution is stale and `None` is returned.
    fn settle(&mut self, operation: OperationId, kind: OperationKind) -> Option<PendingOperation> {
        match &self.pending {
            Some(pending) if pending.id == operation && pending.kind == kind => self.pending.take(),
            _ => {
                tracing::debug!(%operation, %kind, "Dropping stale resolution");
                self.publish(SessionEvent::StaleResultDropped { operation });
                None
            }
        }
    }

    fn complete(&mut self, report: FinalReport, channel: ReportChannel) {
        tracing::info!(%channel, turns = self.transcript.len(), "Session completed");
        self.finish(
            SessionPhase::Done,
            SessionOutcome::Completed {
                report: Box::new(report),
                channel,
            },
        );
    }

    fn abort(&mut self, reason: AbortReason) {
        tracing::info!(%reason, "Session aborted");
        self.pending = None;
        self.exit_queued = false;
        self.current = None;
        self.draft = None;
        self.finish(SessionPhase::Aborted, SessionOutcome::Aborted { reason });
    }

    fn finish(&mut self, phase: SessionPhase, outcome: SessionOutcome) {
        self.outcome = Some(outcome.clone());
        self.transition(phase);
        self.publish(SessionEvent::Finished { outcome });
    }

    fn transition(&mut self, to: SessionPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        tracing::info!(session_id = %self.session_id, %from, %to, "Phase changed");
        self.publish(SessionEvent::PhaseChanged { from, to });
    }

    fn publish(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::{CoachPack, Difficulty, InterviewPlan, QuestionPhase, SessionControls};
    use crate::persona::default_roster;

    fn plan(questions: &[&str], total: usize) -> InterviewPlan {
        let set = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                QuestionBlueprint::new(format!("q{i}"), QuestionPhase::Knowledge, Difficulty::L2, *q)
            })
            .collect();
        InterviewPlan::new(
            "Engineer",
            SessionControls {
                total_questions: total,
                ..SessionControls::default()
            },
        )
        .with_questions(set)
    }

    fn structured(questions: &[&str], total: usize) -> SessionStateMachine {
        let ctx = SessionContext::new("Engineer", SessionType::Structured, vec!["p1".into()])
            .with_plan(plan(questions, total));
        SessionStateMachine::new(ctx, default_roster())
    }

    fn conversational() -> SessionStateMachine {
        let ctx = SessionContext::new(
            "Engineer",
            SessionType::Conversational,
            vec!["p1".into(), "p2".into()],
        );
        SessionStateMachine::new(ctx, default_roster()).with_default_total_questions(3)
    }

    fn report() -> FinalReport {
        FinalReport {
            overall_summary: "Fine".into(),
            readiness: None,
            advisory_panel: Vec::new(),
            question_performance: Vec::new(),
            biggest_risk_area: None,
            coach_pack: CoachPack::default(),
        }
    }

    fn opening(machine: &SessionStateMachine) -> OpeningQuestion {
        OpeningQuestion {
            question: "Walk me through your last project.".into(),
            interviewer_id: "p1".into(),
            updated_context: machine.context().clone(),
        }
    }

    #[test]
    fn illegal_actions_leave_state_unchanged() {
        let mut m = structured(&["Q1", "Q2"], 2);
        m.start().unwrap();
        assert_eq!(m.phase(), SessionPhase::Presenting);

        assert!(matches!(m.confirm(), Err(MockmateError::InvalidTransition { .. })));
        assert!(m.discard().is_err());
        assert!(m.exit_with_report().is_err());
        assert_eq!(m.phase(), SessionPhase::Presenting);
        assert!(m.transcript().is_empty());
    }

    #[test]
    fn blank_answer_is_not_captured() {
        let mut m = structured(&["Q1"], 1);
        m.start().unwrap();
        assert_eq!(m.capture_answer("   "), Err(MockmateError::NoResponseCaptured));
        assert_eq!(m.phase(), SessionPhase::Presenting);
    }

    #[test]
    fn discard_returns_to_same_question_without_recording() {
        let mut m = structured(&["Q1", "Q2"], 2);
        m.start().unwrap();
        m.capture_answer("first try").unwrap();
        m.discard().unwrap();

        assert_eq!(m.phase(), SessionPhase::Presenting);
        assert_eq!(m.snapshot().question.as_deref(), Some("Q1"));
        assert!(m.transcript().is_empty());

        m.capture_answer("second try").unwrap();
        m.confirm().unwrap();
        assert_eq!(m.transcript().len(), 1);
        assert_eq!(m.transcript().turns()[0].candidate_response, "second try");
        assert_eq!(m.snapshot().question.as_deref(), Some("Q2"));
    }

    #[test]
    fn structured_plan_without_questions_aborts() {
        let mut m = structured(&[], 3);
        m.start().unwrap();
        assert_eq!(m.phase(), SessionPhase::Aborted);
        assert!(matches!(
            m.outcome(),
            Some(SessionOutcome::Aborted {
                reason: AbortReason::OpeningFailed(MockmateError::GenerationFailure { .. })
            })
        ));
    }

    #[test]
    fn conversational_opening_failure_aborts() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        assert_eq!(m.phase(), SessionPhase::Initializing);

        let next = m.resolve_opening(effect.operation(), Err(MockmateError::generation("boom")));
        assert!(next.is_none());
        assert_eq!(m.phase(), SessionPhase::Aborted);
    }

    #[test]
    fn followup_goes_to_round_robin_panelist() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let opening = opening(&m);
        m.resolve_opening(effect.operation(), Ok(opening));
        assert_eq!(m.snapshot().interviewer_id.as_deref(), Some("p1"));

        m.capture_answer("answer").unwrap();
        let Some(SessionEffect::FetchFollowup { interviewer_id, .. }) = m.confirm().unwrap() else {
            panic!("expected follow-up fetch");
        };
        assert_eq!(interviewer_id, "p2");
        assert_eq!(m.phase(), SessionPhase::LoadingQuestion);
    }

    #[test]
    fn followup_failure_fails_soft_into_report() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let opening = opening(&m);
        m.resolve_opening(effect.operation(), Ok(opening));
        m.capture_answer("answer").unwrap();
        let fetch = m.confirm().unwrap().unwrap();

        let next = m.resolve_followup(fetch.operation(), Err(MockmateError::generation("boom")));
        assert!(matches!(next, Some(SessionEffect::RequestReport { .. })));
        assert_eq!(m.phase(), SessionPhase::ReportPending);
    }

    #[test]
    fn blank_plan_question_aborts_the_opening() {
        let mut m = structured(&["   ", "Q2"], 2);
        m.start().unwrap();
        assert_eq!(m.phase(), SessionPhase::Aborted);
        assert_eq!(m.snapshot().question, None);
        assert!(matches!(
            m.outcome(),
            Some(SessionOutcome::Aborted {
                reason: AbortReason::OpeningFailed(MockmateError::GenerationFailure { .. })
            })
        ));
    }

    #[test]
    fn blank_plan_question_mid_session_ends_with_report() {
        let mut m = structured(&["Q1", "", "Q3"], 3);
        m.start().unwrap();
        m.capture_answer("answer").unwrap();

        let next = m.confirm().unwrap();
        assert!(matches!(next, Some(SessionEffect::RequestReport { .. })));
        assert_eq!(m.phase(), SessionPhase::ReportPending);
        assert_eq!(m.transcript().len(), 1);
    }

    #[test]
    fn blank_generated_questions_are_not_presented() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let mut blank = opening(&m);
        blank.question = "  ".into();
        m.resolve_opening(effect.operation(), Ok(blank));
        assert_eq!(m.phase(), SessionPhase::Aborted);

        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let opening = opening(&m);
        m.resolve_opening(effect.operation(), Ok(opening));
        m.capture_answer("answer").unwrap();
        let fetch = m.confirm().unwrap().unwrap();
        let next = m.resolve_followup(
            fetch.operation(),
            Ok(FollowupQuestion::Question { text: "\n".into() }),
        );
        assert!(matches!(next, Some(SessionEffect::RequestReport { .. })));
        assert_eq!(m.snapshot().question, None);
    }

    #[test]
    fn rejected_turn_keeps_the_draft_under_review() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let mut unattributed = opening(&m);
        unattributed.interviewer_id = String::new();
        m.resolve_opening(effect.operation(), Ok(unattributed));
        m.capture_answer("my answer").unwrap();

        assert!(matches!(m.confirm(), Err(MockmateError::InvalidInput(_))));
        assert_eq!(m.phase(), SessionPhase::Reviewing);
        assert_eq!(m.snapshot().draft.map(|d| d.response).as_deref(), Some("my answer"));
        assert!(m.transcript().is_empty());

        // Still recoverable: the draft can be discarded or the session left.
        m.discard().unwrap();
        assert_eq!(m.phase(), SessionPhase::Presenting);
    }

    #[test]
    fn stale_resolution_is_dropped() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let stale = OperationId(effect.operation().0 + 100);
        let opening = opening(&m);

        assert!(m.resolve_opening(stale, Ok(opening.clone())).is_none());
        assert_eq!(m.phase(), SessionPhase::Initializing);

        m.resolve_opening(effect.operation(), Ok(opening.clone()));
        assert_eq!(m.phase(), SessionPhase::Presenting);

        // A second resolution for the settled operation is stale too.
        m.resolve_opening(effect.operation(), Ok(opening));
        assert_eq!(m.phase(), SessionPhase::Presenting);
    }

    #[test]
    fn exit_queued_during_opening_aborts() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        m.request_exit().unwrap();
        assert!(m.snapshot().exit_queued);

        let opening = opening(&m);
        m.resolve_opening(effect.operation(), Ok(opening));
        assert_eq!(m.phase(), SessionPhase::Aborted);
        assert!(m.transcript().is_empty());
        assert_eq!(
            m.outcome(),
            Some(&SessionOutcome::Aborted {
                reason: AbortReason::ExitedBeforeStart
            })
        );
    }

    #[test]
    fn exit_queued_during_followup_discards_question_and_resume_refetches() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let opening = opening(&m);
        m.resolve_opening(effect.operation(), Ok(opening));
        m.capture_answer("answer").unwrap();
        let fetch = m.confirm().unwrap().unwrap();

        m.request_exit().unwrap();
        let next = m.resolve_followup(
            fetch.operation(),
            Ok(FollowupQuestion::Question {
                text: "Late question".into(),
            }),
        );
        assert!(next.is_none());
        assert_eq!(m.phase(), SessionPhase::ConfirmingExit);
        assert_eq!(m.snapshot().question, None);
        assert_eq!(m.transcript().len(), 1);

        let refetch = m.resume().unwrap().unwrap();
        assert_ne!(refetch.operation(), fetch.operation());
        assert_eq!(m.phase(), SessionPhase::LoadingQuestion);
    }

    #[test]
    fn exit_queued_during_failed_followup_waits_for_the_choice() {
        let mut m = conversational();
        let effect = m.start().unwrap().unwrap();
        let opening = opening(&m);
        m.resolve_opening(effect.operation(), Ok(opening));
        m.capture_answer("answer").unwrap();
        let fetch = m.confirm().unwrap().unwrap();

        m.request_exit().unwrap();
        let next = m.resolve_followup(fetch.operation(), Err(MockmateError::generation("boom")));
        assert!(next.is_none());
        assert_eq!(m.phase(), SessionPhase::ConfirmingExit);
        assert_eq!(m.transcript().len(), 1);
        assert!(!m.snapshot().exit_queued);
        assert!(m.outcome().is_none());
    }

    #[test]
    fn resume_after_exit_returns_to_the_unconfirmed_draft() {
        let mut m = structured(&["Q1", "Q2"], 2);
        m.start().unwrap();
        m.capture_answer("half-typed answer").unwrap();
        m.request_exit().unwrap();
        assert_eq!(m.phase(), SessionPhase::ConfirmingExit);

        assert!(m.resume().unwrap().is_none());
        assert_eq!(m.phase(), SessionPhase::Reviewing);
        assert_eq!(
            m.snapshot().draft.map(|d| d.response).as_deref(),
            Some("half-typed answer")
        );

        m.confirm().unwrap();
        assert_eq!(m.transcript().turns()[0].candidate_response, "half-typed answer");
    }

    #[test]
    fn partial_report_leaves_the_draft_unrecorded() {
        let mut m = structured(&["Q1", "Q2"], 2);
        m.start().unwrap();
        m.capture_answer("answer").unwrap();
        m.confirm().unwrap();
        m.capture_answer("never confirmed").unwrap();
        m.request_exit().unwrap();

        let Some(SessionEffect::RequestReport { transcript, .. }) = m.exit_with_report().unwrap()
        else {
            panic!("expected a report request");
        };
        assert_eq!(transcript.len(), 1);
        assert_eq!(m.snapshot().draft, None);
    }

    #[test]
    fn exit_queued_during_report_discards_report() {
        let mut m = structured(&["Q1"], 1);
        m.start().unwrap();
        m.capture_answer("answer").unwrap();
        let request = m.confirm().unwrap().unwrap();
        assert_eq!(m.phase(), SessionPhase::ReportPending);

        m.request_exit().unwrap();
        m.resolve_report(request.operation(), ReportOutcome::Primary(report()));
        assert_eq!(m.phase(), SessionPhase::Aborted);
        assert_eq!(
            m.outcome(),
            Some(&SessionOutcome::Aborted {
                reason: AbortReason::ExitedDuringReport
            })
        );
    }

    #[test]
    fn discard_from_exit_never_requests_report() {
        let mut m = structured(&["Q1", "Q2"], 2);
        m.start().unwrap();
        m.capture_answer("answer").unwrap();
        m.confirm().unwrap();
        m.request_exit().unwrap();

        m.exit_and_discard().unwrap();
        assert_eq!(m.phase(), SessionPhase::Aborted);
        assert_eq!(m.transcript().len(), 1);
    }

    #[test]
    fn partial_report_with_zero_turns_aborts() {
        let mut m = structured(&["Q1", "Q2"], 2);
        m.start().unwrap();
        m.request_exit().unwrap();
        assert!(m.exit_with_report().unwrap().is_none());
        assert_eq!(
            m.outcome(),
            Some(&SessionOutcome::Aborted {
                reason: AbortReason::NoTurnsRecorded
            })
        );
    }

    #[test]
    fn report_failure_aborts_without_report() {
        let mut m = structured(&["Q1"], 1);
        m.start().unwrap();
        m.capture_answer("answer").unwrap();
        let request = m.confirm().unwrap().unwrap();

        m.resolve_report(
            request.operation(),
            ReportOutcome::Failed {
                error: MockmateError::AuthFailure("expired".into()),
                fallback_attempted: false,
            },
        );
        assert_eq!(m.phase(), SessionPhase::Aborted);
        assert!(m.outcome().and_then(SessionOutcome::report).is_none());
    }

    #[test]
    fn events_follow_phase_changes() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ctx = SessionContext::new("Engineer", SessionType::Structured, vec!["p1".into()])
            .with_plan(plan(&["Q1"], 1));
        let mut m = SessionStateMachine::new(ctx, default_roster()).with_events(tx);

        m.start().unwrap();
        m.capture_answer("answer").unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events[0], SessionEvent::QuestionPresented { .. }));
        assert_eq!(
            events[1],
            SessionEvent::PhaseChanged {
                from: SessionPhase::Initializing,
                to: SessionPhase::Presenting
            }
        );
        assert_eq!(
            events[2],
            SessionEvent::PhaseChanged {
                from: SessionPhase::Presenting,
                to: SessionPhase::Reviewing
            }
        );
    }

    #[test]
    fn interviewer_label_comes_from_roster() {
        let mut m = structured(&["Q1"], 1);
        m.start().unwrap();
        let snapshot = m.snapshot();
        assert_eq!(snapshot.interviewer_id.as_deref(), Some("p1"));
        assert!(snapshot.interviewer.unwrap().starts_with("Asha"));
    }
}
