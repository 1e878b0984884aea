//! Where questions come from.
//!
//! Structured sessions read a precomputed plan by index. Conversational
//! sessions ask a [`QuestionGenerator`] for each question, bounded by a
//! timeout and a small retry budget.

use crate::config::SessionSettings;
use crate::error::{MockmateError, Result};
use crate::interview::{InterviewPlan, QuestionBlueprint, SessionContext, Transcript};
use crate::service::{
    FollowupQuestion, FollowupRequest, OpeningQuestion, OpeningRequest, QuestionGenerator,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum PlanLookup<'a> {
    Question(&'a QuestionBlueprint),
    Exhausted,
}

/// Indexed view over a plan, capped at the session's turn budget.
#[derive(Debug, Clone, Copy)]
pub struct StructuredPlan<'a> {
    plan: &'a InterviewPlan,
    total_questions: usize,
}

impl<'a> StructuredPlan<'a> {
    pub fn new(plan: &'a InterviewPlan, total_questions: usize) -> Self {
        Self {
            plan,
            total_questions,
        }
    }

    /// Number of questions the session can actually ask.
    pub fn len(&self) -> usize {
        self.plan.question_set.len().min(self.total_questions)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn question_at(&self, cursor: usize) -> PlanLookup<'a> {
        if cursor >= self.total_questions {
            return PlanLookup::Exhausted;
        }
        match self.plan.question_set.get(cursor) {
            Some(blueprint) => PlanLookup::Question(blueprint),
            None => PlanLookup::Exhausted,
        }
    }
}

/// Generator-backed question source for conversational sessions.
#[derive(Clone)]
pub struct ConversationalSource {
    generator: Arc<dyn QuestionGenerator>,
    timeout: Duration,
    attempts: u32,
}

impl ConversationalSource {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self::with_settings(generator, &SessionSettings::default())
    }

    pub fn with_settings(generator: Arc<dyn QuestionGenerator>, settings: &SessionSettings) -> Self {
        Self {
            generator,
            timeout: settings.question_timeout(),
            attempts: settings.question_attempts.max(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches the opening question. Fails closed: any error ends the session.
    pub async fn start(&self, context: &SessionContext) -> Result<OpeningQuestion> {
        let request = OpeningRequest {
            request_id: Uuid::new_v4().to_string(),
            context: context.clone(),
        };
        tracing::debug!(request_id = %request.request_id, "Requesting opening question");

        let mut opening = self
            .call("opening question", || self.generator.generate_opening(&request))
            .await?;

        if opening.question.trim().is_empty() {
            return Err(MockmateError::generation("opening question was empty"));
        }
        if opening.updated_context.validate().is_err() {
            tracing::warn!("Generator returned an invalid context; keeping the original");
            opening.updated_context = context.clone();
        }
        let panel = &opening.updated_context.selected_panel_ids;
        if !panel.contains(&opening.interviewer_id) {
            let lead = opening
                .updated_context
                .lead_panelist()
                .unwrap_or_default()
                .to_string();
            tracing::warn!(
                returned = %opening.interviewer_id,
                lead = %lead,
                "Opening interviewer is not on the panel; using the lead panelist"
            );
            opening.interviewer_id = lead;
        }
        Ok(opening)
    }

    /// Fetches the next question, or reports exhaustion without calling the
    /// generator once `total_questions` turns are recorded.
    pub async fn next(
        &self,
        transcript: &Transcript,
        context: &SessionContext,
        interviewer_id: &str,
        total_questions: usize,
    ) -> Result<FollowupQuestion> {
        if transcript.len() >= total_questions {
            return Ok(FollowupQuestion::Exhausted);
        }

        let request = FollowupRequest {
            request_id: Uuid::new_v4().to_string(),
            transcript: transcript.turns().to_vec(),
            context: context.clone(),
            interviewer_id: interviewer_id.to_string(),
        };
        tracing::debug!(
            request_id = %request.request_id,
            turns = transcript.len(),
            interviewer = %interviewer_id,
            "Requesting follow-up question"
        );

        match self
            .call("follow-up question", || self.generator.generate_followup(&request))
            .await?
        {
            FollowupQuestion::Question { text } if text.trim().is_empty() => {
                Err(MockmateError::generation("follow-up question was empty"))
            }
            other => Ok(other),
        }
    }

    /// Runs `op` under the timeout, retrying retryable failures. The same
    /// request (and its `request_id`) is reused for every attempt.
    async fn call<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(MockmateError::timeout(operation, self.timeout.as_secs())),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    tracing::warn!(attempt, error = %e, "{} failed; retrying", operation);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::{Difficulty, InterviewTurn, QuestionPhase, SessionControls, SessionType};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn plan(n: usize) -> InterviewPlan {
        let questions = (0..n)
            .map(|i| {
                QuestionBlueprint::new(
                    format!("q{i}"),
                    QuestionPhase::Knowledge,
                    Difficulty::L1,
                    format!("Question {i}"),
                )
            })
            .collect();
        InterviewPlan::new("Analyst", SessionControls::default()).with_questions(questions)
    }

    #[test]
    fn structured_lookup_is_capped_by_budget() {
        let plan = plan(5);
        let source = StructuredPlan::new(&plan, 3);
        assert_eq!(source.len(), 3);
        assert!(matches!(source.question_at(2), PlanLookup::Question(bp) if bp.id == "q2"));
        assert_eq!(source.question_at(3), PlanLookup::Exhausted);

        let short = StructuredPlan::new(&plan, 10);
        assert_eq!(short.question_at(5), PlanLookup::Exhausted);
    }

    /// Generator that replays scripted follow-up results and records the
    /// request ids it was called with.
    struct ScriptedGenerator {
        followups: Mutex<VecDeque<Result<FollowupQuestion>>>,
        request_ids: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(followups: Vec<Result<FollowupQuestion>>) -> Arc<Self> {
            Arc::new(Self {
                followups: Mutex::new(followups.into()),
                request_ids: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl QuestionGenerator for ScriptedGenerator {
        async fn generate_opening(&self, request: &OpeningRequest) -> Result<OpeningQuestion> {
            self.request_ids.lock().unwrap().push(request.request_id.clone());
            Ok(OpeningQuestion {
                question: "Tell me about yourself.".into(),
                interviewer_id: "zz".into(),
                updated_context: request.context.clone(),
            })
        }

        async fn generate_followup(&self, request: &FollowupRequest) -> Result<FollowupQuestion> {
            self.request_ids.lock().unwrap().push(request.request_id.clone());
            self.followups
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(FollowupQuestion::Exhausted))
        }
    }

    fn context() -> SessionContext {
        SessionContext::new("SRE", SessionType::Conversational, vec!["p1".into(), "p2".into()])
    }

    #[tokio::test]
    async fn retry_reuses_request_id() {
        let generator = ScriptedGenerator::new(vec![
            Err(MockmateError::generation_retryable("503")),
            Ok(FollowupQuestion::Question {
                text: "How do you page?".into(),
            }),
        ]);
        let source = ConversationalSource::new(generator.clone());

        let next = source.next(&Transcript::new(), &context(), "p2", 7).await.unwrap();
        assert_eq!(
            next,
            FollowupQuestion::Question {
                text: "How do you page?".into()
            }
        );
        let ids = generator.request_ids.lock().unwrap().clone();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn quota_is_not_retried() {
        let generator = ScriptedGenerator::new(vec![
            Err(MockmateError::QuotaExceeded("daily".into())),
            Ok(FollowupQuestion::Exhausted),
        ]);
        let source = ConversationalSource::new(generator.clone());

        let err = source.next(&Transcript::new(), &context(), "p1", 7).await.unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(generator.request_ids.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_followup_is_a_generation_failure() {
        let generator = ScriptedGenerator::new(vec![Ok(FollowupQuestion::Question {
            text: "   ".into(),
        })]);
        let source = ConversationalSource::new(generator);

        let err = source.next(&Transcript::new(), &context(), "p1", 7).await.unwrap_err();
        assert!(matches!(err, MockmateError::GenerationFailure { .. }));
    }

    #[tokio::test]
    async fn ceiling_short_circuits_the_generator() {
        let generator = ScriptedGenerator::new(Vec::new());
        let source = ConversationalSource::new(generator.clone());
        let mut transcript = Transcript::new();
        transcript
            .record(InterviewTurn::answered("p1", "Asha", "Q1", "A1"))
            .unwrap();

        let next = source.next(&transcript, &context(), "p2", 1).await.unwrap();
        assert_eq!(next, FollowupQuestion::Exhausted);
        assert!(generator.request_ids.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn opening_interviewer_off_panel_falls_back_to_lead() {
        let source = ConversationalSource::new(ScriptedGenerator::new(Vec::new()));
        let opening = source.start(&context()).await.unwrap();
        assert_eq!(opening.interviewer_id, "p1");
    }

    struct SlowGenerator;

    #[async_trait]
    impl QuestionGenerator for SlowGenerator {
        async fn generate_opening(&self, _request: &OpeningRequest) -> Result<OpeningQuestion> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(MockmateError::internal("unreachable"))
        }

        async fn generate_followup(&self, _request: &FollowupRequest) -> Result<FollowupQuestion> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(FollowupQuestion::Exhausted)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generator_times_out() {
        let source = ConversationalSource::new(Arc::new(SlowGenerator));
        let err = source.start(&context()).await.unwrap_err();
        assert!(matches!(err, MockmateError::Timeout { seconds: 30, .. }));
    }
}
