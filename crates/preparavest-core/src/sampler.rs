//! Question sampling.
//!
//! Draws a bounded, uniformly shuffled subset of the question bank. The bank is
//! borrowed and never reordered in place.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::QuizError;
use crate::model::Question;

/// Draw up to `limit` questions from `bank` in random order.
///
/// Questions repeating an id already seen are skipped (the first occurrence
/// wins), so the result never contains duplicate ids. The order is a uniform
/// permutation (Fisher-Yates via [`SliceRandom::shuffle`]).
///
/// # Errors
///
/// Returns `QuizError::EmptyBank` if `bank` is empty or `limit` is zero.
pub fn sample<R>(bank: &[Question], limit: usize, rng: &mut R) -> Result<Vec<Question>, QuizError>
where
    R: Rng + ?Sized,
{
    if bank.is_empty() || limit == 0 {
        return Err(QuizError::EmptyBank);
    }

    let mut seen = HashSet::with_capacity(bank.len());
    let mut picked: Vec<Question> = bank
        .iter()
        .filter(|q| seen.insert(q.id()))
        .cloned()
        .collect();

    let skipped = bank.len() - picked.len();
    if skipped > 0 {
        tracing::warn!("skipped {skipped} question(s) with duplicate ids");
    }

    picked.shuffle(rng);
    picked.truncate(limit);

    tracing::debug!(
        available = bank.len(),
        sampled = picked.len(),
        "sampled questions"
    );
    Ok(picked)
}
