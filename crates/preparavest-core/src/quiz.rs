//! Quiz orchestrator.
//!
//! Wires the collaborators, the current user, the scoring engine and the
//! ranking aggregator around one [`SessionController`]. Every collaborator
//! failure ends up as a user-visible state here; none of them tears down a
//! running session.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{OptionLabel, Question, RankingEntry, RANKING_SIZE, SESSION_LIMIT};
use crate::profile::UserProfile;
use crate::ranking::RankingAggregator;
use crate::scoring::{ScoreOutcome, ScoringEngine, ScoringMode};
use crate::session::{SessionController, SessionView, Step};
use crate::traits::{QuestionProvider, RankingStore, ScoringAuthority};

/// Configuration for a [`Quiz`].
#[derive(Debug, Clone)]
pub struct QuizOptions {
    pub scoring_mode: ScoringMode,
    /// Maximum questions per session.
    pub session_limit: usize,
    /// Entries shown on the leaderboard.
    pub ranking_size: usize,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            scoring_mode: ScoringMode::default(),
            session_limit: SESSION_LIMIT,
            ranking_size: RANKING_SIZE,
            seed: None,
        }
    }
}

pub struct Quiz {
    provider: Arc<dyn QuestionProvider>,
    scoring: ScoringEngine,
    ranking: RankingAggregator,
    user: UserProfile,
    rng: StdRng,
    limit: usize,
    session: Option<SessionController>,
    ranking_error: Option<QuizError>,
}

impl Quiz {
    pub fn new(
        provider: Arc<dyn QuestionProvider>,
        authority: Arc<dyn ScoringAuthority>,
        store: Arc<dyn RankingStore>,
        user: UserProfile,
        options: QuizOptions,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            provider,
            scoring: ScoringEngine::new(options.scoring_mode, authority),
            ranking: RankingAggregator::with_size(store, options.ranking_size),
            user,
            rng,
            limit: options.session_limit,
            session: None,
            ranking_error: None,
        }
    }

    /// Open a new session.
    ///
    /// The bank and the leaderboard are fetched concurrently. A leaderboard
    /// failure is recorded and the session still starts; a bank failure or an
    /// empty bank leaves the quiz without a session.
    pub async fn start(&mut self) -> Result<SessionView, QuizError> {
        let provider = Arc::clone(&self.provider);
        let (bank, ranking) = tokio::join!(provider.fetch_questions(), self.ranking.refresh());
        self.ranking_error = ranking.err();

        let bank = bank.map_err(|e| {
            tracing::error!(provider = provider.name(), "fetching questions failed: {e}");
            QuizError::from(e)
        })?;

        let ctrl = SessionController::start(&bank, self.limit, &mut self.rng)?;
        tracing::info!(
            session = %ctrl.session_id(),
            user = self.user.id,
            questions = ctrl.len(),
            "session started"
        );
        let view = ctrl.view();
        self.session = Some(ctrl);
        Ok(view)
    }

    /// Discard the current session and start over with a fresh sample.
    ///
    /// On failure the current session is left as it was.
    pub async fn restart(&mut self) -> Result<SessionView, QuizError> {
        if self.session.is_none() {
            return self.start().await;
        }

        let bank = self.fetch_bank().await?;
        let ctrl = self.session.as_mut().ok_or(QuizError::NoActiveSession)?;
        ctrl.restart(&bank, self.limit, &mut self.rng)?;
        tracing::info!(session = %ctrl.session_id(), "session restarted");
        Ok(ctrl.view())
    }

    /// Tear down the current session. Scores arriving afterwards are dropped.
    pub fn close(&mut self) {
        if let Some(ctrl) = self.session.take() {
            tracing::debug!(session = %ctrl.session_id(), "session closed");
        }
    }

    pub fn select(&mut self, label: OptionLabel) -> Result<(), QuizError> {
        self.session_mut()?.select_answer(label)
    }

    pub fn previous(&mut self) -> Result<Option<OptionLabel>, QuizError> {
        self.session_mut()?.previous()
    }

    /// Advance the session.
    ///
    /// On the last question the attempt is scored, the outcome is applied to
    /// the session it came from and the leaderboard is refreshed.
    pub async fn next(&mut self) -> Result<Step, QuizError> {
        let step = self.session_mut()?.next()?;

        if let Step::Finished(attempt) = &step {
            let outcome = self.scoring.score(self.user.id, attempt).await;
            if let Some(err) = &outcome.error {
                tracing::warn!(session = %attempt.session_id(), "scoring degraded: {err}");
            }
            self.apply_score(attempt.session_id(), outcome);
            self.refresh_ranking().await;
        }

        Ok(step)
    }

    /// Hand a scoring outcome to the session it belongs to.
    ///
    /// Returns `false` if that session was restarted or closed in the meantime.
    pub fn apply_score(&mut self, session_id: Uuid, outcome: ScoreOutcome) -> bool {
        match self.session.as_mut() {
            Some(ctrl) => ctrl.apply_score(session_id, outcome),
            None => {
                tracing::debug!(%session_id, "no session, dropping score");
                false
            }
        }
    }

    /// Re-fetch the leaderboard, keeping the last known one on failure.
    pub async fn refresh_ranking(&mut self) -> Vec<RankingEntry> {
        self.ranking_error = self.ranking.refresh().await.err();
        self.ranking.top()
    }

    pub fn view(&self) -> Option<SessionView> {
        self.session.as_ref().map(SessionController::view)
    }

    /// Top entries of the last successful leaderboard fetch.
    pub fn ranking(&self) -> Vec<RankingEntry> {
        self.ranking.top()
    }

    /// Failure of the most recent leaderboard fetch, if it failed.
    pub fn ranking_error(&self) -> Option<&QuizError> {
        self.ranking_error.as_ref()
    }

    pub fn session(&self) -> Option<&SessionController> {
        self.session.as_ref()
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn scoring_mode(&self) -> ScoringMode {
        self.scoring.mode()
    }

    async fn fetch_bank(&self) -> Result<Vec<Question>, QuizError> {
        self.provider.fetch_questions().await.map_err(|e| {
            tracing::error!(provider = self.provider.name(), "fetching questions failed: {e}");
            QuizError::from(e)
        })
    }

    fn session_mut(&mut self) -> Result<&mut SessionController, QuizError> {
        self.session.as_mut().ok_or(QuizError::NoActiveSession)
    }
}
