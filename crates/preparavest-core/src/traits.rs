//! Collaborator traits.
//!
//! The quiz core never talks to a transport directly. It consumes these async
//! traits, implemented over HTTP and by in-memory fakes in
//! `preparavest-backends`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::{Answer, Question, RankingEntry};

// ---------------------------------------------------------------------------
// Question Provider
// ---------------------------------------------------------------------------

/// Source of the full question bank.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Human-readable source name (e.g. "http", "file").
    fn name(&self) -> &str;

    /// Fetch every available question. Invalid rows are dropped by the
    /// implementation; an empty vector means no questions are available.
    async fn fetch_questions(&self) -> Result<Vec<Question>, ServiceError>;
}

// ---------------------------------------------------------------------------
// Scoring Authority
// ---------------------------------------------------------------------------

/// A finished answer set sent for delegated scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    /// Id of the user taking the quiz.
    pub user_id: u64,
    /// Answers in the order the questions were presented.
    pub answers: Vec<Answer>,
}

/// What the scoring authority returned for a submission.
///
/// `correct_count` is `None` when the response did not carry a count; the
/// scoring engine decides how to treat that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmissionReceipt {
    pub correct_count: Option<u32>,
}

/// Computes or records correctness for submitted answers.
#[async_trait]
pub trait ScoringAuthority: Send + Sync {
    /// Submit a complete answer set and obtain its correctness count.
    async fn submit_answers(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionReceipt, ServiceError>;

    /// Record a score computed on the client (legacy local scoring).
    async fn submit_score(&self, user_id: u64, correct_count: u32) -> Result<(), ServiceError>;
}

// ---------------------------------------------------------------------------
// Ranking Store
// ---------------------------------------------------------------------------

/// Persists and returns leaderboard entries.
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Fetch the leaderboard in source order.
    async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError>;
}
