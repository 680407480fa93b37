//! In-memory backend for tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use preparavest_core::error::ServiceError;
use preparavest_core::model::{Question, RankingEntry};
use preparavest_core::scoring::count_correct;
use preparavest_core::traits::{
    AnswerSubmission, QuestionProvider, RankingStore, ScoringAuthority, SubmissionReceipt,
};

/// Collaborator operations of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchQuestions,
    SubmitAnswers,
    SubmitScore,
    FetchRanking,
}

/// A mock backend implementing all three collaborator traits.
///
/// Scores submitted answers against its own bank and accumulates results on
/// an in-memory leaderboard. Any operation can be made to fail.
pub struct MockBackend {
    questions: Mutex<Vec<Question>>,
    ranking: Mutex<Vec<RankingEntry>>,
    users: Mutex<HashMap<u64, String>>,
    count_override: Mutex<CountOverride>,
    failures: Mutex<HashMap<Operation, ServiceError>>,
    calls: Mutex<HashMap<Operation, u32>>,
    submissions: AtomicU32,
    last_submission: Mutex<Option<AnswerSubmission>>,
}

/// What a scoring response reports as the correct count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountOverride {
    /// Grade the submission against the bank.
    Graded,
    /// Report this count, or omit it when `None`.
    Fixed(Option<u32>),
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBackend {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: Mutex::new(questions),
            ranking: Mutex::new(Vec::new()),
            users: Mutex::new(HashMap::new()),
            count_override: Mutex::new(CountOverride::Graded),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            submissions: AtomicU32::new(0),
            last_submission: Mutex::new(None),
        }
    }

    /// Seed the leaderboard.
    pub fn with_ranking(self, entries: Vec<RankingEntry>) -> Self {
        *lock(&self.ranking) = entries;
        self
    }

    /// Name under which a user's results appear on the leaderboard.
    pub fn with_user(self, id: u64, name: &str) -> Self {
        lock(&self.users).insert(id, name.to_string());
        self
    }

    /// Answer every scoring request with `count` instead of grading it.
    pub fn set_fixed_count(&self, count: Option<u32>) {
        *lock(&self.count_override) = CountOverride::Fixed(count);
    }

    pub fn set_questions(&self, questions: Vec<Question>) {
        *lock(&self.questions) = questions;
    }

    /// Make `op` fail with `error` until [`recover`](Self::recover) is called.
    pub fn fail(&self, op: Operation, error: ServiceError) {
        lock(&self.failures).insert(op, error);
    }

    pub fn recover(&self, op: Operation) {
        lock(&self.failures).remove(&op);
    }

    /// Number of calls made for `op`, failed ones included.
    pub fn call_count(&self, op: Operation) -> u32 {
        lock(&self.calls).get(&op).copied().unwrap_or(0)
    }

    /// Number of answer sets graded so far.
    pub fn graded(&self) -> u32 {
        self.submissions.load(Ordering::Relaxed)
    }

    pub fn last_submission(&self) -> Option<AnswerSubmission> {
        lock(&self.last_submission).clone()
    }

    fn enter(&self, op: Operation) -> Result<(), ServiceError> {
        *lock(&self.calls).entry(op).or_default() += 1;
        match lock(&self.failures).get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn record(&self, user_id: u64, correct: u32) {
        let name = lock(&self.users)
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| format!("user{user_id}"));
        let mut ranking = lock(&self.ranking);
        match ranking.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.correct_total += correct,
            None => ranking.push(RankingEntry::new(name, correct)),
        }
    }
}

#[async_trait]
impl QuestionProvider for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_questions(&self) -> Result<Vec<Question>, ServiceError> {
        self.enter(Operation::FetchQuestions)?;
        Ok(lock(&self.questions).clone())
    }
}

#[async_trait]
impl ScoringAuthority for MockBackend {
    async fn submit_answers(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionReceipt, ServiceError> {
        self.enter(Operation::SubmitAnswers)?;
        *lock(&self.last_submission) = Some(submission.clone());
        self.submissions.fetch_add(1, Ordering::Relaxed);

        let graded = count_correct(&lock(&self.questions), &submission.answers);
        self.record(submission.user_id, graded);

        let correct_count = match *lock(&self.count_override) {
            CountOverride::Graded => Some(graded),
            CountOverride::Fixed(count) => count,
        };
        Ok(SubmissionReceipt { correct_count })
    }

    async fn submit_score(&self, user_id: u64, correct_count: u32) -> Result<(), ServiceError> {
        self.enter(Operation::SubmitScore)?;
        self.record(user_id, correct_count);
        Ok(())
    }
}

#[async_trait]
impl RankingStore for MockBackend {
    async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError> {
        self.enter(Operation::FetchRanking)?;
        Ok(lock(&self.ranking).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preparavest_core::model::{Answer, OptionLabel, QuestionId};

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId(id),
            format!("q{id}"),
            ["1".into(), "2".into(), "3".into(), "4".into(), "5".into()],
            OptionLabel::C,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn grades_and_accumulates() {
        let backend = MockBackend::new(vec![question(1), question(2)])
            .with_user(7, "Ana")
            .with_ranking(vec![RankingEntry::new("Ana", 3)]);

        let submission = AnswerSubmission {
            user_id: 7,
            answers: vec![
                Answer {
                    question_id: QuestionId(1),
                    selected: OptionLabel::C,
                },
                Answer {
                    question_id: QuestionId(2),
                    selected: OptionLabel::A,
                },
            ],
        };
        let receipt = backend.submit_answers(&submission).await.unwrap();
        assert_eq!(receipt.correct_count, Some(1));
        assert_eq!(
            backend.fetch_ranking().await.unwrap(),
            vec![RankingEntry::new("Ana", 4)]
        );
        assert_eq!(backend.graded(), 1);
        assert_eq!(backend.last_submission(), Some(submission));
    }

    #[tokio::test]
    async fn failures_are_injected_and_counted() {
        let backend = MockBackend::new(vec![question(1)]);
        backend.fail(Operation::FetchQuestions, ServiceError::Timeout(5000));

        assert_eq!(
            backend.fetch_questions().await.unwrap_err(),
            ServiceError::Timeout(5000)
        );
        backend.recover(Operation::FetchQuestions);
        assert_eq!(backend.fetch_questions().await.unwrap().len(), 1);
        assert_eq!(backend.call_count(Operation::FetchQuestions), 2);
        assert_eq!(backend.call_count(Operation::FetchRanking), 0);
    }

    #[tokio::test]
    async fn fixed_count_overrides_grading() {
        let backend = MockBackend::new(vec![question(1)]);
        backend.set_fixed_count(None);
        let submission = AnswerSubmission {
            user_id: 1,
            answers: vec![],
        };
        assert_eq!(
            backend.submit_answers(&submission).await.unwrap().correct_count,
            None
        );

        backend.set_fixed_count(Some(4));
        assert_eq!(
            backend.submit_answers(&submission).await.unwrap().correct_count,
            Some(4)
        );
    }

    #[tokio::test]
    async fn local_scores_land_on_ranking() {
        let backend = MockBackend::new(vec![]);
        backend.submit_score(9, 6).await.unwrap();
        backend.submit_score(9, 2).await.unwrap();
        assert_eq!(
            backend.fetch_ranking().await.unwrap(),
            vec![RankingEntry::new("user9", 8)]
        );
    }
}
