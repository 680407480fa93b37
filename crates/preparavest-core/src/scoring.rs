//! Scoring of finished sessions.
//!
//! Two trust models exist and a deployment picks exactly one:
//!
//! - [`ScoringMode::Delegated`]: the full answer set goes to the scoring
//!   authority, which returns the correctness count.
//! - [`ScoringMode::Local`]: answers are compared against the correct tags of
//!   the sampled questions on the client, and the count is then published to
//!   the scoring authority.
//!
//! Scoring never fails from the caller's point of view. Failures degrade to a
//! zero score (delegated mode) and are carried in [`ScoreOutcome::error`] for
//! display.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{Answer, Question, ScoreResult};
use crate::session::FinishedAttempt;
use crate::traits::{AnswerSubmission, ScoringAuthority};

/// Where correctness is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    #[default]
    Delegated,
    Local,
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::Delegated => write!(f, "delegated"),
            ScoringMode::Local => write!(f, "local"),
        }
    }
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delegated" | "server" | "remote" => Ok(ScoringMode::Delegated),
            "local" | "client" => Ok(ScoringMode::Local),
            other => Err(format!("unknown scoring mode: {other}")),
        }
    }
}

/// Score of a finished attempt plus the failure to surface, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub result: ScoreResult,
    pub error: Option<QuizError>,
}

impl ScoreOutcome {
    pub fn ok(result: ScoreResult) -> Self {
        Self {
            result,
            error: None,
        }
    }

    pub fn degraded(result: ScoreResult, error: QuizError) -> Self {
        Self {
            result,
            error: Some(error),
        }
    }
}

/// Count answers matching the correct tag of their question.
///
/// Questions without an answer count as incorrect; answers referencing a
/// question outside `questions` are ignored.
pub fn count_correct(questions: &[Question], answers: &[Answer]) -> u32 {
    let by_id: HashMap<_, _> = answers.iter().map(|a| (a.question_id, a.selected)).collect();
    questions
        .iter()
        .filter(|q| by_id.get(&q.id()) == Some(&q.correct()))
        .count() as u32
}

/// Turns a finished attempt into a [`ScoreOutcome`].
pub struct ScoringEngine {
    mode: ScoringMode,
    authority: Arc<dyn ScoringAuthority>,
}

impl ScoringEngine {
    pub fn new(mode: ScoringMode, authority: Arc<dyn ScoringAuthority>) -> Self {
        Self { mode, authority }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Score `attempt` on behalf of `user_id`.
    pub async fn score(&self, user_id: u64, attempt: &FinishedAttempt) -> ScoreOutcome {
        let total = attempt.total();
        match self.mode {
            ScoringMode::Delegated => self.score_delegated(user_id, attempt, total).await,
            ScoringMode::Local => self.score_local(user_id, attempt, total).await,
        }
    }

    async fn score_delegated(
        &self,
        user_id: u64,
        attempt: &FinishedAttempt,
        total: u32,
    ) -> ScoreOutcome {
        let submission = AnswerSubmission {
            user_id,
            answers: attempt.answers().to_vec(),
        };

        match self.authority.submit_answers(&submission).await {
            Ok(receipt) => match receipt.correct_count {
                Some(correct) if correct <= total => {
                    tracing::info!(user_id, correct, total, "answers scored by authority");
                    ScoreOutcome::ok(ScoreResult::new(correct, total))
                }
                Some(correct) => {
                    tracing::warn!(correct, total, "authority reported more hits than questions");
                    ScoreOutcome::degraded(
                        ScoreResult::zero(total),
                        QuizError::MalformedResponse(format!(
                            "correct count {correct} exceeds {total} questions"
                        )),
                    )
                }
                None => {
                    tracing::warn!("authority response carried no correct count");
                    ScoreOutcome::degraded(
                        ScoreResult::zero(total),
                        QuizError::MalformedResponse("missing correct count".into()),
                    )
                }
            },
            Err(e) => {
                tracing::error!("submitting answers failed: {e}");
                ScoreOutcome::degraded(ScoreResult::zero(total), e.into())
            }
        }
    }

    async fn score_local(&self, user_id: u64, attempt: &FinishedAttempt, total: u32) -> ScoreOutcome {
        let correct = count_correct(attempt.questions(), attempt.answers());
        let result = ScoreResult::new(correct, total);
        tracing::info!(user_id, correct, total, "answers scored locally");

        match self.authority.submit_score(user_id, correct).await {
            Ok(()) => ScoreOutcome::ok(result),
            Err(e) => {
                tracing::error!("publishing local score failed: {e}");
                ScoreOutcome::degraded(result, e.into())
            }
        }
    }
}
