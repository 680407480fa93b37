//! Attempt reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{OptionLabel, QuestionId, ScoreResult};
use crate::scoring::ScoringMode;
use crate::session::SessionController;

/// A finished quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Session identifier.
    pub id: Uuid,
    /// Who took the quiz.
    pub user_id: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// How the score was obtained.
    pub scoring_mode: ScoringMode,
    /// Questions in presentation order with the user's selection.
    pub questions: Vec<AnsweredQuestion>,
    pub score: ScoreResult,
    /// Grade on a 0-10 scale.
    pub grade: f64,
    /// Scoring failure shown to the user, if any.
    #[serde(default)]
    pub error: Option<String>,
}

/// One question of an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub id: QuestionId,
    pub prompt: String,
    pub selected: Option<OptionLabel>,
}

impl AttemptReport {
    /// Build a report from a finished, scored session.
    ///
    /// Returns `None` while the session is still running or unscored.
    pub fn from_session(
        session: &SessionController,
        user_id: u64,
        scoring_mode: ScoringMode,
    ) -> Option<Self> {
        let finished_at = session.finished_at()?;
        let outcome = session.outcome()?;

        let questions = session
            .questions()
            .iter()
            .map(|q| AnsweredQuestion {
                id: q.id(),
                prompt: q.prompt().to_string(),
                selected: session.answer_for(q.id()),
            })
            .collect();

        Some(Self {
            id: session.session_id(),
            user_id,
            started_at: session.started_at(),
            finished_at,
            scoring_mode,
            questions,
            score: outcome.result,
            grade: outcome.result.grade(),
            error: outcome.error.as_ref().map(ToString::to_string),
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AttemptReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
