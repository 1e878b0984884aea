//! Report requests and the fallback policy.
//!
//! A quota refusal on the primary channel gets exactly one attempt on the
//! fallback channel. Every other failure is final.

use crate::error::{MockmateError, Result};
use crate::interview::{FinalReport, SessionContext, Transcript};
use crate::service::{ReportRequest, ReportSynthesizer};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Primary(FinalReport),
    Fallback(FinalReport),
    Failed {
        error: MockmateError,
        fallback_attempted: bool,
    },
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

#[derive(Clone)]
pub struct ReportRequester {
    primary: Arc<dyn ReportSynthesizer>,
    fallback: Option<Arc<dyn ReportSynthesizer>>,
    timeout: Duration,
}

impl ReportRequester {
    pub fn new(primary: Arc<dyn ReportSynthesizer>) -> Self {
        Self {
            primary,
            fallback: None,
            timeout: DEFAULT_REPORT_TIMEOUT,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ReportSynthesizer>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Requests a report for `transcript`.
    ///
    /// An empty transcript fails without any remote call. A successful
    /// report is reconciled against the transcript before it is returned.
    pub async fn request(
        &self,
        session_id: &str,
        transcript: &Transcript,
        context: &SessionContext,
    ) -> ReportOutcome {
        if transcript.is_empty() {
            return ReportOutcome::Failed {
                error: MockmateError::EmptyTranscript,
                fallback_attempted: false,
            };
        }

        let request = ReportRequest {
            request_id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            transcript: transcript.turns().to_vec(),
            context: context.clone(),
        };

        match self.synthesize(self.primary.as_ref(), &request).await {
            Ok(report) => {
                tracing::info!(channel = self.primary.channel(), "Report generated");
                ReportOutcome::Primary(finish(report, transcript))
            }
            Err(error) if error.is_quota_exceeded() => {
                let Some(fallback) = &self.fallback else {
                    tracing::error!(error = %error, "Primary report channel over quota; no fallback configured");
                    return ReportOutcome::Failed {
                        error,
                        fallback_attempted: false,
                    };
                };

                tracing::warn!(
                    primary = self.primary.channel(),
                    fallback = fallback.channel(),
                    "Primary report channel over quota; trying fallback"
                );
                match self.synthesize(fallback.as_ref(), &request).await {
                    Ok(report) => ReportOutcome::Fallback(finish(report, transcript)),
                    Err(error) => {
                        tracing::error!(error = %error, "Fallback report channel failed");
                        ReportOutcome::Failed {
                            error,
                            fallback_attempted: true,
                        }
                    }
                }
            }
            Err(error) => {
                tracing::error!(channel = self.primary.channel(), error = %error, "Report generation failed");
                ReportOutcome::Failed {
                    error,
                    fallback_attempted: false,
                }
            }
        }
    }

    async fn synthesize(
        &self,
        synthesizer: &dyn ReportSynthesizer,
        request: &ReportRequest,
    ) -> Result<FinalReport> {
        let report = tokio::time::timeout(self.timeout, synthesizer.synthesize(request))
            .await
            .map_err(|_| MockmateError::timeout("report generation", self.timeout.as_secs()))??;

        report
            .check_shape()
            .map_err(|message| MockmateError::malformed(synthesizer.channel(), message))?;
        Ok(report)
    }
}

fn finish(mut report: FinalReport, transcript: &Transcript) -> FinalReport {
    let corrections = report.reconcile(transcript);
    if corrections > 0 {
        tracing::debug!(corrections, "Reconciled report against transcript");
    }
    report
}
