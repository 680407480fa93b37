//! JSON shapes exchanged with the quiz API, and their normalization into core
//! types.
//!
//! Nothing outside this module sees the API's field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use preparavest_core::error::ServiceError;
use preparavest_core::model::{Answer, OptionLabel, Question, QuestionId, RankingEntry};
use preparavest_core::traits::{AnswerSubmission, SubmissionReceipt};

#[derive(Debug, Deserialize)]
pub(crate) struct WireQuestion {
    id_quest: Value,
    #[serde(default)]
    enunciado: String,
    #[serde(default)]
    alt_a: String,
    #[serde(default)]
    alt_b: String,
    #[serde(default)]
    alt_c: String,
    #[serde(default)]
    alt_d: String,
    #[serde(default)]
    alt_e: String,
    #[serde(default)]
    correta: String,
    #[serde(default)]
    imagem: Option<String>,
}

impl WireQuestion {
    fn into_question(self) -> Result<Question, String> {
        let id = as_u64(&self.id_quest).ok_or_else(|| format!("bad id {}", self.id_quest))?;
        let correct: OptionLabel = self.correta.parse().map_err(|e| format!("question {id}: {e}"))?;
        let question = Question::new(
            QuestionId(id),
            self.enunciado,
            [self.alt_a, self.alt_b, self.alt_c, self.alt_d, self.alt_e],
            correct,
        )
        .map_err(|e| e.to_string())?;
        Ok(question.with_image(self.imagem))
    }
}

/// Decode a question list, dropping rows that do not form a valid question.
pub(crate) fn questions_from_json(body: Value) -> Result<Vec<Question>, ServiceError> {
    let rows: Vec<Value> = serde_json::from_value(body)
        .map_err(|e| ServiceError::Malformed(format!("expected a question list: {e}")))?;

    let total = rows.len();
    let questions: Vec<Question> = rows
        .into_iter()
        .filter_map(|row| {
            let parsed = serde_json::from_value::<WireQuestion>(row)
                .map_err(|e| e.to_string())
                .and_then(WireQuestion::into_question);
            match parsed {
                Ok(q) => Some(q),
                Err(reason) => {
                    tracing::warn!("dropping question: {reason}");
                    None
                }
            }
        })
        .collect();

    if questions.len() < total {
        tracing::warn!(kept = questions.len(), total, "some questions were invalid");
    }
    Ok(questions)
}

#[derive(Debug, Serialize)]
pub(crate) struct WireAnswer {
    id_quest: u64,
    resposta: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireSubmission {
    id_user: u64,
    respostas: Vec<WireAnswer>,
}

impl From<&AnswerSubmission> for WireSubmission {
    fn from(submission: &AnswerSubmission) -> Self {
        Self {
            id_user: submission.user_id,
            respostas: submission.answers.iter().map(wire_answer).collect(),
        }
    }
}

fn wire_answer(answer: &Answer) -> WireAnswer {
    WireAnswer {
        id_quest: answer.question_id.0,
        resposta: answer.selected.to_string().to_lowercase(),
    }
}

#[derive(Debug, Deserialize)]
struct WireReceipt {
    #[serde(default, alias = "correctCount", rename = "acertosTentativa")]
    acertos_tentativa: Option<Value>,
}

/// Decode a scoring response. A missing or non-numeric count yields a receipt
/// without a count.
pub(crate) fn receipt_from_json(body: Value) -> SubmissionReceipt {
    let count = serde_json::from_value::<WireReceipt>(body)
        .ok()
        .and_then(|r| r.acertos_tentativa)
        .as_ref()
        .and_then(as_u64)
        .and_then(|n| u32::try_from(n).ok());
    SubmissionReceipt {
        correct_count: count,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WireScore {
    pub id_user: u64,
    pub acertos: u32,
}

#[derive(Debug, Deserialize)]
struct WireRankingRow {
    #[serde(default)]
    nome: String,
    #[serde(default, alias = "acertos")]
    total_acertos: Value,
}

/// Decode a leaderboard, dropping rows with an empty name or a total that is
/// not a non-negative integer.
pub(crate) fn ranking_from_json(body: Value) -> Result<Vec<RankingEntry>, ServiceError> {
    let rows: Vec<Value> = serde_json::from_value(body)
        .map_err(|e| ServiceError::Malformed(format!("expected a ranking list: {e}")))?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let row: WireRankingRow = serde_json::from_value(row).ok()?;
            let total = as_u64(&row.total_acertos).and_then(|n| u32::try_from(n).ok());
            match total {
                Some(total) if !row.nome.trim().is_empty() => {
                    Some(RankingEntry::new(row.nome.trim(), total))
                }
                _ => {
                    tracing::debug!(name = %row.nome, "dropping ranking row");
                    None
                }
            }
        })
        .collect())
}

/// Accept integers sent either as JSON numbers or numeric strings.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
