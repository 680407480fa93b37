//! Quiz session state machine.
//!
//! A [`SessionController`] owns exactly one session at a time. The
//! presentation layer reads it through [`SessionController::view`] and drives
//! it only through the intent methods (`select_answer`, `next`, `previous`,
//! `restart`).
//!
//! ```text
//!   start ──► InProgress ──next() on last question──► Finished
//!                ▲                                        │
//!                └──────────────── restart() ◄────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{Answer, OptionLabel, Question, QuestionId, ScoreResult};
use crate::sampler::sample;
use crate::scoring::ScoreOutcome;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Finished,
}

/// Result of a successful `next()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Moved to the question at `index`; `recalled` is the stored selection
    /// for that question, if the user answered it before.
    Moved {
        index: usize,
        recalled: Option<OptionLabel>,
    },
    /// The last question was answered. The attempt must be scored and the
    /// outcome handed back through [`SessionController::apply_score`].
    Finished(FinishedAttempt),
}

/// Snapshot of a finalized session, handed out once per session for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedAttempt {
    session_id: Uuid,
    questions: Vec<Question>,
    answers: Vec<Answer>,
}

impl FinishedAttempt {
    /// Id of the session this attempt belongs to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Questions in the order they were presented.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Recorded answers in presentation order.
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Number of questions in the session.
    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub session_id: Uuid,
    pub status: SessionStatus,
    /// Zero-based position of the current question.
    pub index: usize,
    pub total: usize,
    pub question: Question,
    /// Selection to pre-populate for the current question.
    pub selected: Option<OptionLabel>,
    pub answered: usize,
    pub is_last: bool,
    /// Set once the scoring outcome has been applied.
    pub score: Option<ScoreResult>,
    /// Scoring failure to display next to the score.
    pub score_error: Option<QuizError>,
}

#[derive(Debug)]
struct Session {
    id: Uuid,
    questions: Vec<Question>,
    index: usize,
    answers: HashMap<QuestionId, Answer>,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    outcome: Option<ScoreOutcome>,
}

impl Session {
    fn new(questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4(),
            questions,
            index: 0,
            answers: HashMap::new(),
            status: SessionStatus::InProgress,
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
        }
    }

    fn current(&self) -> &Question {
        &self.questions[self.index]
    }

    fn recalled(&self) -> Option<OptionLabel> {
        self.answers.get(&self.current().id()).map(|a| a.selected)
    }

    fn ordered_answers(&self) -> Vec<Answer> {
        self.questions
            .iter()
            .filter_map(|q| self.answers.get(&q.id()).copied())
            .collect()
    }
}

/// Owns the active session and applies user intents to it.
#[derive(Debug)]
pub struct SessionController {
    session: Session,
}

impl SessionController {
    /// Sample up to `limit` questions from `bank` and start a session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyBank` if `bank` is empty.
    pub fn start<R>(bank: &[Question], limit: usize, rng: &mut R) -> Result<Self, QuizError>
    where
        R: Rng + ?Sized,
    {
        let questions = sample(bank, limit, rng)?;
        let session = Session::new(questions);
        tracing::debug!(session = %session.id, total = session.questions.len(), "session started");
        Ok(Self { session })
    }

    /// Discard the current session and start a fresh one from `bank`.
    ///
    /// Valid in any state. On error the current session is left untouched.
    pub fn restart<R>(&mut self, bank: &[Question], limit: usize, rng: &mut R) -> Result<(), QuizError>
    where
        R: Rng + ?Sized,
    {
        let questions = sample(bank, limit, rng)?;
        let previous = self.session.id;
        self.session = Session::new(questions);
        tracing::debug!(%previous, session = %self.session.id, "session restarted");
        Ok(())
    }

    /// Record `label` as the answer to the current question, replacing any
    /// earlier selection for it.
    pub fn select_answer(&mut self, label: OptionLabel) -> Result<(), QuizError> {
        self.ensure_in_progress()?;
        let question_id = self.session.current().id();
        self.session.answers.insert(
            question_id,
            Answer {
                question_id,
                selected: label,
            },
        );
        Ok(())
    }

    /// Parse `label` and record it; rejects empty or unknown labels.
    pub fn select_answer_str(&mut self, label: &str) -> Result<(), QuizError> {
        let label = label.parse::<OptionLabel>()?;
        self.select_answer(label)
    }

    /// Advance to the next question, or finalize on the last one.
    ///
    /// # Errors
    ///
    /// `SessionFinished` after finalization; `NoSelection` if the current
    /// question has no recorded answer. Neither mutates the session.
    pub fn next(&mut self) -> Result<Step, QuizError> {
        self.ensure_in_progress()?;
        if self.session.recalled().is_none() {
            return Err(QuizError::NoSelection);
        }

        if self.session.index + 1 == self.session.questions.len() {
            self.session.status = SessionStatus::Finished;
            self.session.finished_at = Some(Utc::now());
            tracing::debug!(session = %self.session.id, "session finished");
            return Ok(Step::Finished(FinishedAttempt {
                session_id: self.session.id,
                questions: self.session.questions.clone(),
                answers: self.session.ordered_answers(),
            }));
        }

        self.session.index += 1;
        Ok(Step::Moved {
            index: self.session.index,
            recalled: self.session.recalled(),
        })
    }

    /// Go back one question and return the stored selection for it.
    pub fn previous(&mut self) -> Result<Option<OptionLabel>, QuizError> {
        self.ensure_in_progress()?;
        if self.session.index == 0 {
            return Err(QuizError::NoPreviousQuestion);
        }
        self.session.index -= 1;
        Ok(self.session.recalled())
    }

    /// Apply a scoring outcome produced for the attempt of `session_id`.
    ///
    /// The outcome is dropped (and `false` returned) if the session was
    /// restarted since, is not finished, or already holds a score.
    pub fn apply_score(&mut self, session_id: Uuid, outcome: ScoreOutcome) -> bool {
        let session = &mut self.session;
        if session.id != session_id {
            tracing::debug!(stale = %session_id, current = %session.id, "ignoring stale score");
            return false;
        }
        if session.status != SessionStatus::Finished || session.outcome.is_some() {
            tracing::warn!(session = %session_id, "score arrived for a session that cannot take it");
            return false;
        }
        session.outcome = Some(outcome);
        true
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn index(&self) -> usize {
        self.session.index
    }

    /// Number of questions in the session.
    pub fn len(&self) -> usize {
        self.session.questions.len()
    }

    /// Always `false`: sessions are never started from an empty sample.
    pub fn is_empty(&self) -> bool {
        self.session.questions.is_empty()
    }

    pub fn current_question(&self) -> &Question {
        self.session.current()
    }

    pub fn questions(&self) -> &[Question] {
        &self.session.questions
    }

    /// Stored selection for the current question (answer recall).
    pub fn recalled_answer(&self) -> Option<OptionLabel> {
        self.session.recalled()
    }

    /// Stored selection for any question of the session.
    pub fn answer_for(&self, id: QuestionId) -> Option<OptionLabel> {
        self.session.answers.get(&id).map(|a| a.selected)
    }

    /// Recorded answers in presentation order.
    pub fn answers(&self) -> Vec<Answer> {
        self.session.ordered_answers()
    }

    pub fn outcome(&self) -> Option<&ScoreOutcome> {
        self.session.outcome.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.session.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.session.finished_at
    }

    pub fn view(&self) -> SessionView {
        let session = &self.session;
        SessionView {
            session_id: session.id,
            status: session.status,
            index: session.index,
            total: session.questions.len(),
            question: session.current().clone(),
            selected: session.recalled(),
            answered: session.answers.len(),
            is_last: session.index + 1 == session.questions.len(),
            score: session.outcome.as_ref().map(|o| o.result),
            score_error: session.outcome.as_ref().and_then(|o| o.error.clone()),
        }
    }

    fn ensure_in_progress(&self) -> Result<(), QuizError> {
        match self.session.status {
            SessionStatus::InProgress => Ok(()),
            SessionStatus::Finished => Err(QuizError::SessionFinished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::bank;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn controller(n: u64) -> SessionController {
        let mut rng = StdRng::seed_from_u64(42);
        SessionController::start(&bank(n), 10, &mut rng).unwrap()
    }

    fn finish(ctrl: &mut SessionController) -> FinishedAttempt {
        loop {
            ctrl.select_answer(OptionLabel::A).unwrap();
            if let Step::Finished(attempt) = ctrl.next().unwrap() {
                return attempt;
            }
        }
    }

    #[test]
    fn starts_in_progress_at_zero() {
        let ctrl = controller(12);
        assert_eq!(ctrl.status(), SessionStatus::InProgress);
        assert_eq!(ctrl.index(), 0);
        assert_eq!(ctrl.len(), 10);
        assert!(ctrl.answers().is_empty());
        assert!(ctrl.outcome().is_none());
    }

    #[test]
    fn start_with_empty_bank_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = SessionController::start(&[], 10, &mut rng).unwrap_err();
        assert_eq!(err, QuizError::EmptyBank);
    }

    #[test]
    fn select_overwrites_by_question_id() {
        let mut ctrl = controller(3);
        ctrl.select_answer(OptionLabel::B).unwrap();
        ctrl.select_answer(OptionLabel::D).unwrap();
        assert_eq!(ctrl.answers().len(), 1);
        assert_eq!(ctrl.recalled_answer(), Some(OptionLabel::D));
        assert_eq!(ctrl.index(), 0);
    }

    #[test]
    fn select_rejects_bad_label() {
        let mut ctrl = controller(3);
        assert!(matches!(
            ctrl.select_answer_str(""),
            Err(QuizError::InvalidLabel(_))
        ));
        assert!(ctrl.answers().is_empty());
        ctrl.select_answer_str("c").unwrap();
        assert_eq!(ctrl.recalled_answer(), Some(OptionLabel::C));
    }

    #[test]
    fn next_without_selection_is_blocked() {
        let mut ctrl = controller(5);
        assert_eq!(ctrl.next(), Err(QuizError::NoSelection));
        assert_eq!(ctrl.index(), 0);
        assert_eq!(ctrl.status(), SessionStatus::InProgress);
    }

    #[test]
    fn answer_recall_on_revisit() {
        let mut ctrl = controller(5);
        let first = ctrl.current_question().id();
        ctrl.select_answer(OptionLabel::C).unwrap();

        let step = ctrl.next().unwrap();
        assert_eq!(
            step,
            Step::Moved {
                index: 1,
                recalled: None
            }
        );

        let recalled = ctrl.previous().unwrap();
        assert_eq!(recalled, Some(OptionLabel::C));
        assert_eq!(ctrl.current_question().id(), first);
        assert_eq!(ctrl.view().selected, Some(OptionLabel::C));
    }

    #[test]
    fn next_recalls_answer_after_going_back() {
        let mut ctrl = controller(5);
        ctrl.select_answer(OptionLabel::A).unwrap();
        ctrl.next().unwrap();
        ctrl.select_answer(OptionLabel::E).unwrap();
        ctrl.previous().unwrap();

        let step = ctrl.next().unwrap();
        assert_eq!(
            step,
            Step::Moved {
                index: 1,
                recalled: Some(OptionLabel::E)
            }
        );
    }

    #[test]
    fn previous_on_first_question_fails() {
        let mut ctrl = controller(5);
        assert_eq!(ctrl.previous(), Err(QuizError::NoPreviousQuestion));
        assert_eq!(ctrl.index(), 0);
    }

    #[test]
    fn last_next_finalizes_once() {
        let mut ctrl = controller(10);
        let attempt = finish(&mut ctrl);

        assert_eq!(ctrl.status(), SessionStatus::Finished);
        assert!(ctrl.finished_at().is_some());
        assert_eq!(attempt.total(), 10);
        assert_eq!(attempt.answers().len(), 10);
        assert_eq!(attempt.session_id(), ctrl.session_id());

        // Answers follow presentation order.
        let order: Vec<_> = ctrl.questions().iter().map(Question::id).collect();
        let answered: Vec<_> = attempt.answers().iter().map(|a| a.question_id).collect();
        assert_eq!(order, answered);

        // No second ticket.
        assert_eq!(ctrl.next(), Err(QuizError::SessionFinished));
        assert_eq!(ctrl.previous(), Err(QuizError::SessionFinished));
        assert_eq!(
            ctrl.select_answer(OptionLabel::B),
            Err(QuizError::SessionFinished)
        );
    }

    #[test]
    fn single_question_session_finishes_on_first_next() {
        let mut ctrl = controller(1);
        ctrl.select_answer(OptionLabel::B).unwrap();
        assert!(matches!(ctrl.next().unwrap(), Step::Finished(_)));
    }

    #[test]
    fn apply_score_only_once_and_only_when_finished() {
        let mut ctrl = controller(2);
        let id = ctrl.session_id();
        assert!(!ctrl.apply_score(id, ScoreOutcome::ok(ScoreResult::new(1, 2))));

        let attempt = finish(&mut ctrl);
        assert!(ctrl.apply_score(attempt.session_id(), ScoreOutcome::ok(ScoreResult::new(2, 2))));
        assert!(!ctrl.apply_score(attempt.session_id(), ScoreOutcome::ok(ScoreResult::new(0, 2))));
        assert_eq!(ctrl.view().score, Some(ScoreResult::new(2, 2)));
    }

    #[test]
    fn restart_after_finish_resets_everything() {
        let mut ctrl = controller(10);
        let attempt = finish(&mut ctrl);
        assert_eq!(ctrl.answers().len(), 10);
        ctrl.apply_score(attempt.session_id(), ScoreOutcome::ok(ScoreResult::new(10, 10)));

        let mut rng = StdRng::seed_from_u64(7);
        ctrl.restart(&bank(10), 10, &mut rng).unwrap();

        assert_eq!(ctrl.status(), SessionStatus::InProgress);
        assert_eq!(ctrl.index(), 0);
        assert!(ctrl.answers().is_empty());
        assert!(ctrl.outcome().is_none());
        assert_ne!(ctrl.session_id(), attempt.session_id());
    }

    #[test]
    fn stale_score_after_restart_is_ignored() {
        let mut ctrl = controller(1);
        ctrl.select_answer(OptionLabel::A).unwrap();
        let Step::Finished(attempt) = ctrl.next().unwrap() else {
            panic!("expected finish");
        };

        let mut rng = StdRng::seed_from_u64(8);
        ctrl.restart(&bank(1), 10, &mut rng).unwrap();
        ctrl.select_answer(OptionLabel::A).unwrap();
        ctrl.next().unwrap();

        assert!(!ctrl.apply_score(attempt.session_id(), ScoreOutcome::ok(ScoreResult::new(1, 1))));
        assert!(ctrl.outcome().is_none());
    }

    #[test]
    fn failed_restart_keeps_session() {
        let mut ctrl = controller(4);
        ctrl.select_answer(OptionLabel::B).unwrap();
        let id = ctrl.session_id();

        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(ctrl.restart(&[], 10, &mut rng), Err(QuizError::EmptyBank));
        assert_eq!(ctrl.session_id(), id);
        assert_eq!(ctrl.recalled_answer(), Some(OptionLabel::B));
    }

    #[test]
    fn view_reports_progress() {
        let mut ctrl = controller(3);
        let view = ctrl.view();
        assert_eq!(view.total, 3);
        assert!(!view.is_last);
        assert!(view.selected.is_none());

        ctrl.select_answer(OptionLabel::A).unwrap();
        ctrl.next().unwrap();
        ctrl.select_answer(OptionLabel::A).unwrap();
        ctrl.next().unwrap();
        let view = ctrl.view();
        assert_eq!(view.index, 2);
        assert_eq!(view.answered, 2);
        assert!(view.is_last);
    }
}
