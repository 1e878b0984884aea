//! Async driver around [`SessionStateMachine`].
//!
//! The runner owns the machine behind a single-writer mutex and executes the
//! effects it returns. The lock is held only while the machine is touched,
//! never across a remote call, so an exit request from another task can be
//! queued while a question or report is in flight.

use super::machine::{SessionEffect, SessionSnapshot, SessionStateMachine};
use super::question_source::ConversationalSource;
use super::report::ReportRequester;
use crate::error::{MockmateError, Result};
use crate::service::{AnswerTranscriber, CoachingAssistant, RawCapture};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_ASSIST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct SessionRunner {
    machine: Arc<Mutex<SessionStateMachine>>,
    questions: Option<ConversationalSource>,
    reports: ReportRequester,
    coach: Option<Arc<dyn CoachingAssistant>>,
    transcriber: Option<Arc<dyn AnswerTranscriber>>,
    assist_timeout: Duration,
}

impl SessionRunner {
    pub fn new(machine: SessionStateMachine, reports: ReportRequester) -> Self {
        Self {
            machine: Arc::new(Mutex::new(machine)),
            questions: None,
            reports,
            coach: None,
            transcriber: None,
            assist_timeout: DEFAULT_ASSIST_TIMEOUT,
        }
    }

    /// Question source for conversational sessions.
    pub fn with_question_source(mut self, source: ConversationalSource) -> Self {
        self.questions = Some(source);
        self
    }

    pub fn with_coach(mut self, coach: Arc<dyn CoachingAssistant>) -> Self {
        self.coach = Some(coach);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn AnswerTranscriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Time budget for hints, code reviews and transcription.
    pub fn with_assist_timeout(mut self, timeout: Duration) -> Self {
        self.assist_timeout = timeout;
        self
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.machine.lock().await.snapshot()
    }

    pub async fn start(&self) -> Result<SessionSnapshot> {
        let effect = self.machine.lock().await.start()?;
        self.drive(effect).await
    }

    pub async fn capture_answer(&self, response: &str) -> Result<SessionSnapshot> {
        self.machine.lock().await.capture_answer(response)?;
        Ok(self.snapshot().await)
    }

    /// Captures code for the current question, with a critique when the
    /// coaching service provides one.
    pub async fn submit_code(&self, code: &str) -> Result<SessionSnapshot> {
        if code.trim().is_empty() {
            return Err(MockmateError::NoResponseCaptured);
        }
        let (question, context) = {
            let machine = self.machine.lock().await;
            let question = machine
                .presented_question()
                .ok_or_else(|| MockmateError::invalid_transition(machine.phase(), "submit code"))?
                .text
                .clone();
            (question, machine.context().clone())
        };

        let feedback = match &self.coach {
            Some(coach) => {
                match self
                    .assist("code review", coach.review_code(&question, code, &context))
                    .await
                {
                    Ok(feedback) if !feedback.trim().is_empty() => Some(feedback),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "Code review failed; capturing code without feedback");
                        None
                    }
                }
            }
            None => None,
        };

        self.machine.lock().await.capture_code(code, feedback)?;
        Ok(self.snapshot().await)
    }

    /// Transcribes a recording and captures it as the answer.
    pub async fn submit_recording(&self, capture: &RawCapture) -> Result<SessionSnapshot> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| MockmateError::config("no answer transcriber configured"))?;
        {
            let machine = self.machine.lock().await;
            if machine.presented_question().is_none() {
                return Err(MockmateError::invalid_transition(
                    machine.phase(),
                    "submit a recording",
                ));
            }
        }

        let text = match self
            .assist("transcription", transcriber.transcribe(capture))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("Transcription was empty");
                return Err(MockmateError::NoResponseCaptured);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transcription failed");
                return Err(MockmateError::NoResponseCaptured);
            }
        };

        self.capture_answer(&text).await
    }

    pub async fn confirm(&self) -> Result<SessionSnapshot> {
        let effect = self.machine.lock().await.confirm()?;
        self.drive(effect).await
    }

    pub async fn discard(&self) -> Result<SessionSnapshot> {
        self.machine.lock().await.discard()?;
        Ok(self.snapshot().await)
    }

    pub async fn request_skip(&self) -> Result<SessionSnapshot> {
        self.machine.lock().await.request_skip()?;
        Ok(self.snapshot().await)
    }

    pub async fn confirm_skip(&self) -> Result<SessionSnapshot> {
        let effect = self.machine.lock().await.confirm_skip()?;
        self.drive(effect).await
    }

    pub async fn cancel_skip(&self) -> Result<SessionSnapshot> {
        self.machine.lock().await.cancel_skip()?;
        Ok(self.snapshot().await)
    }

    pub async fn request_exit(&self) -> Result<SessionSnapshot> {
        self.machine.lock().await.request_exit()?;
        Ok(self.snapshot().await)
    }

    pub async fn exit_with_report(&self) -> Result<SessionSnapshot> {
        let effect = self.machine.lock().await.exit_with_report()?;
        self.drive(effect).await
    }

    pub async fn exit_and_discard(&self) -> Result<SessionSnapshot> {
        self.machine.lock().await.exit_and_discard()?;
        Ok(self.snapshot().await)
    }

    pub async fn resume(&self) -> Result<SessionSnapshot> {
        let effect = self.machine.lock().await.resume()?;
        self.drive(effect).await
    }

    /// A hint for the presented question. Coach mode only.
    pub async fn request_hint(&self) -> Result<String> {
        let coach = self
            .coach
            .as_ref()
            .ok_or_else(|| MockmateError::config("no coaching assistant configured"))?;
        let (question, context) = {
            let machine = self.machine.lock().await;
            if !machine.context().is_coach_mode() {
                return Err(MockmateError::InvalidInput(
                    "hints are only available in coach mode".into(),
                ));
            }
            let question = machine
                .presented_question()
                .ok_or_else(|| MockmateError::invalid_transition(machine.phase(), "request a hint"))?
                .clone();
            (question, machine.context().clone())
        };
        let signals = question
            .blueprint
            .as_ref()
            .map(|bp| bp.expected_signals.clone())
            .unwrap_or_default();

        self.assist("hint", coach.hint(&question.text, &signals, &context))
            .await
    }

    /// Executes effects until the machine stops asking for work.
    async fn drive(&self, mut effect: Option<SessionEffect>) -> Result<SessionSnapshot> {
        while let Some(current) = effect.take() {
            tracing::debug!(operation = %current.operation(), "Executing effect");
            effect = match current {
                SessionEffect::FetchOpening { operation, context } => {
                    let result = match &self.questions {
                        Some(source) => source.start(&context).await,
                        None => Err(MockmateError::config("no question generator configured")),
                    };
                    self.machine.lock().await.resolve_opening(operation, result)
                }
                SessionEffect::FetchFollowup {
                    operation,
                    transcript,
                    context,
                    interviewer_id,
                    total_questions,
                } => {
                    let result = match &self.questions {
                        Some(source) => {
                            source
                                .next(&transcript, &context, &interviewer_id, total_questions)
                                .await
                        }
                        None => Err(MockmateError::config("no question generator configured")),
                    };
                    self.machine.lock().await.resolve_followup(operation, result)
                }
                SessionEffect::RequestReport {
                    operation,
                    session_id,
                    transcript,
                    context,
                } => {
                    let outcome = self.reports.request(&session_id, &transcript, &context).await;
                    self.machine.lock().await.resolve_report(operation, outcome)
                }
            };
        }
        Ok(self.snapshot().await)
    }

    async fn assist<T>(&self, operation: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.assist_timeout, call)
            .await
            .map_err(|_| MockmateError::timeout(operation, self.assist_timeout.as_secs()))?
    }
}
