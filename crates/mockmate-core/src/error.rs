//! Error types for MockMate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire MockMate workspace.
///
/// The first group of variants is the failure taxonomy of a rehearsal
/// session (question generation, report synthesis). The second group covers
/// local misuse of the state machine and the usual I/O plumbing.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MockmateError {
    /// Opening or follow-up question could not be produced, or came back empty.
    #[error("Question generation failed: {message}")]
    GenerationFailure { message: String, retryable: bool },

    /// The remote service refused the request because of usage limits.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Identity could not be verified for a gated operation.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// Transport succeeded but the payload did not have the expected shape.
    #[error("Malformed response from {source_name}: {message}")]
    MalformedResponse {
        source_name: String,
        message: String,
    },

    /// A report was requested for a transcript with no turns.
    #[error("Cannot synthesize a report from an empty transcript")]
    EmptyTranscript,

    /// Report synthesis failed for a reason other than quota or auth.
    #[error("Report synthesis failed: {message}")]
    SynthesisFailure { message: String, retryable: bool },

    /// A remote call did not resolve within its time budget.
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// The requested action is not accepted in the current phase.
    #[error("Cannot {action} while session is {phase}")]
    InvalidTransition { phase: String, action: String },

    /// Answer capture produced no usable text.
    #[error("No response captured")]
    NoResponseCaptured,

    /// Input rejected by a precondition check.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MockmateError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a non-retryable GenerationFailure
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailure {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a GenerationFailure that a caller may retry (transport hiccups, 5xx)
    pub fn generation_retryable(message: impl Into<String>) -> Self {
        Self::GenerationFailure {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable SynthesisFailure
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::SynthesisFailure {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a MalformedResponse error
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a Timeout error
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Creates an InvalidTransition error
    pub fn invalid_transition(phase: impl ToString, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            phase: phase.to_string(),
            action: action.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a quota/rate-limit refusal
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }

    /// Check if this is an authentication failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailure(_))
    }

    /// Check if this is a malformed-response error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether repeating the same request could plausibly succeed.
    ///
    /// Quota, auth and malformed payloads are never retryable: repeating
    /// them burns usage without changing the answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::GenerationFailure { retryable, .. } => *retryable,
            Self::SynthesisFailure { retryable, .. } => *retryable,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MockmateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MockmateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MockmateError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MockmateError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error for service edges that still use anyhow
impl From<anyhow::Error> for MockmateError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for MockmateError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, MockmateError>`.
pub type Result<T> = std::result::Result<T, MockmateError>;
