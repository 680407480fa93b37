//! Core data model types for preparavest.
//!
//! Questions, option labels, answers, scores, and leaderboard entries. Every
//! value that crosses a collaborator boundary ends up as one of these types,
//! already validated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuizError;

/// Maximum number of questions drawn into one session.
pub const SESSION_LIMIT: usize = 10;

/// Default size of the leaderboard view.
pub const RANKING_SIZE: usize = 5;

/// Stable identifier of a question in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the five option labels of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
    E,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [OptionLabel; 5] = [
        OptionLabel::A,
        OptionLabel::B,
        OptionLabel::C,
        OptionLabel::D,
        OptionLabel::E,
    ];

    /// Position of the label in `ALL`.
    pub fn index(self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
            OptionLabel::E => 4,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
            OptionLabel::E => "E",
        };
        f.write_str(letter)
    }
}

impl FromStr for OptionLabel {
    type Err = QuizError;

    /// Accepts `a`/`A` and the legacy `alt_a` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();
        let letter = lower.strip_prefix("alt_").unwrap_or(&lower);
        match letter {
            "a" => Ok(OptionLabel::A),
            "b" => Ok(OptionLabel::B),
            "c" => Ok(OptionLabel::C),
            "d" => Ok(OptionLabel::D),
            "e" => Ok(OptionLabel::E),
            _ => Err(QuizError::InvalidLabel(trimmed.to_string())),
        }
    }
}

/// A multiple-choice question with five options.
///
/// Construct through [`Question::new`], which enforces that the prompt and all
/// options are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: [String; 5],
    correct: OptionLabel,
    image: Option<String>,
}

impl Question {
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: [String; 5],
        correct: OptionLabel,
    ) -> Result<Self, QuizError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuizError::InvalidQuestion {
                id,
                reason: "prompt is empty".into(),
            });
        }
        if let Some(label) = OptionLabel::ALL
            .iter()
            .find(|label| options[label.index()].trim().is_empty())
        {
            return Err(QuizError::InvalidQuestion {
                id,
                reason: format!("option {label} is empty"),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct,
            image: None,
        })
    }

    /// Attach an image reference shown alongside the prompt.
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    /// Options paired with their labels, in display order.
    pub fn options(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        OptionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.option(label)))
    }

    pub fn correct(&self) -> OptionLabel {
        self.correct
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

/// The user's selection for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub selected: OptionLabel,
}

/// Outcome of scoring a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Number of correct answers.
    pub correct: u32,
    /// Number of questions in the session.
    pub total: u32,
}

impl ScoreResult {
    pub fn new(correct: u32, total: u32) -> Self {
        Self { correct, total }
    }

    /// A zero score for a session of `total` questions.
    pub fn zero(total: u32) -> Self {
        Self { correct: 0, total }
    }

    /// Share of correct answers in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }

    /// Grade on a 0-10 scale, rounded to one decimal.
    pub fn grade(&self) -> f64 {
        self.percentage().round() / 10.0
    }
}

/// A row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Display name of the player.
    pub name: String,
    /// Cumulative number of correct answers.
    pub correct_total: u32,
}

impl RankingEntry {
    pub fn new(name: impl Into<String>, correct_total: u32) -> Self {
        Self {
            name: name.into(),
            correct_total,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A valid question whose correct answer is `correct`.
    pub fn question(id: u64, correct: OptionLabel) -> Question {
        Question::new(
            QuestionId(id),
            format!("Question {id}?"),
            [
                format!("{id}-a"),
                format!("{id}-b"),
                format!("{id}-c"),
                format!("{id}-d"),
                format!("{id}-e"),
            ],
            correct,
        )
        .unwrap()
    }

    /// A bank of `n` questions with ids `1..=n`, all answered by `A`.
    pub fn bank(n: u64) -> Vec<Question> {
        (1..=n).map(|id| question(id, OptionLabel::A)).collect()
    }
}
