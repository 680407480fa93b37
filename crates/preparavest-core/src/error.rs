//! Error types for the quiz core.
//!
//! `ServiceError` describes failures of the external collaborators (question
//! provider, scoring authority, ranking store). It is defined here rather than
//! in the backends crate so the orchestrator can classify collaborator failures
//! into the user-facing `QuizError` taxonomy without string matching.

use thiserror::Error;

use crate::model::QuestionId;

/// Failures raised by a collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The collaborator answered with an error status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The collaborator answered with a payload we could not make sense of.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Returns `true` if the failure happened before a usable payload was received.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ServiceError::Malformed(_))
    }
}

/// Errors surfaced to the presentation layer.
///
/// None of these is fatal for a session: callers render them as messages and
/// keep the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The question provider returned no usable questions.
    #[error("no questions available")]
    EmptyBank,

    /// The user tried to advance without answering the current question.
    #[error("select an answer before continuing")]
    NoSelection,

    /// `previous` was requested on the first question.
    #[error("already at the first question")]
    NoPreviousQuestion,

    /// An answering intent arrived after the session was finalized.
    #[error("the session is already finished")]
    SessionFinished,

    /// An intent arrived while no session is running.
    #[error("no quiz session is active")]
    NoActiveSession,

    /// A label outside A-E was supplied.
    #[error("invalid option label: '{0}'")]
    InvalidLabel(String),

    /// A question violated the data model invariants.
    #[error("invalid question {id}: {reason}")]
    InvalidQuestion { id: QuestionId, reason: String },

    /// A collaborator could not be reached or answered with an error status.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// A collaborator answered with an unexpected shape.
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

impl From<ServiceError> for QuizError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Malformed(msg) => QuizError::MalformedResponse(msg),
            other => QuizError::NetworkFailure(other.to_string()),
        }
    }
}
