//! Question provider backed by TOML bank files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use preparavest_core::error::ServiceError;
use preparavest_core::model::Question;
use preparavest_core::parser::{load_banks, RowPolicy};
use preparavest_core::traits::QuestionProvider;

/// Serves questions from a bank file or a directory of bank files.
///
/// The path is read on every fetch, so a restart picks up edits. Questions
/// that fail validation are dropped with a warning.
pub struct FileQuestionProvider {
    path: PathBuf,
}

impl FileQuestionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestionProvider for FileQuestionProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_questions(&self) -> Result<Vec<Question>, ServiceError> {
        let banks = load_banks(&self.path, RowPolicy::Skip)
            .map_err(|e| ServiceError::Malformed(format!("{e:#}")))?;

        let questions: Vec<Question> = banks.into_iter().flat_map(|b| b.questions).collect();
        tracing::debug!(path = %self.path.display(), count = questions.len(), "questions loaded");
        Ok(questions)
    }
}
