//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.
//! Banks on disk let the quiz run without a remote question provider.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{OptionLabel, Question, QuestionId, SESSION_LIMIT};

/// A named collection of questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
}

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u64,
    prompt: String,
    a: String,
    b: String,
    c: String,
    d: String,
    e: String,
    correct: String,
    #[serde(default)]
    image: Option<String>,
}

/// What to do with a question row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    /// Reject the whole file.
    Reject,
    /// Drop the row and log a warning.
    Skip,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    parse_bank_with(path, RowPolicy::Reject)
}

/// Parse a single TOML file, handling invalid rows according to `policy`.
pub fn parse_bank_with(path: &Path, policy: RowPolicy) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str_with(&content, path, policy)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    parse_bank_str_with(content, source_path, RowPolicy::Reject)
}

pub fn parse_bank_str_with(
    content: &str,
    source_path: &Path,
    policy: RowPolicy,
) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut questions = Vec::with_capacity(parsed.questions.len());
    for raw in parsed.questions {
        match build_question(raw) {
            Ok(question) => questions.push(question),
            Err(e) if policy == RowPolicy::Skip => {
                tracing::warn!("skipping question in {}: {e:#}", source_path.display());
            }
            Err(e) => return Err(e.context(format!("in {}", source_path.display()))),
        }
    }

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

fn build_question(q: TomlQuestion) -> Result<Question> {
    let id = QuestionId(q.id);
    let correct: OptionLabel = q
        .correct
        .parse()
        .with_context(|| format!("question {id}"))?;
    let question = Question::new(id, q.prompt, [q.a, q.b, q.c, q.d, q.e], correct)?;
    Ok(question.with_image(q.image))
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path, policy: RowPolicy) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path, policy)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank_with(&path, policy) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank file, or every bank below a directory.
pub fn load_banks(path: &Path, policy: RowPolicy) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_bank_directory(path, policy)
    } else {
        Ok(vec![parse_bank_with(path, policy)?])
    }
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<QuestionId>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    } else if bank.questions.len() < SESSION_LIMIT {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "bank has {} questions; sessions will be shorter than {SESSION_LIMIT}",
                bank.questions.len()
            ),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id()),
                message: format!("duplicate question ID: {}", q.id()),
            });
        }
    }

    // Identical options make the question ambiguous
    for q in &bank.questions {
        let distinct: HashSet<_> = q.options().map(|(_, text)| text.trim()).collect();
        if distinct.len() < OptionLabel::ALL.len() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id()),
                message: "options are not all distinct".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[bank]
id = "enem-basics"
name = "ENEM Basics"
description = "Warm-up questions"

[[questions]]
id = 1
prompt = "What is the chemical symbol for sodium?"
a = "S"
b = "Na"
c = "So"
d = "N"
e = "Sd"
correct = "B"

[[questions]]
id = 2
prompt = "Which planet is closest to the sun?"
a = "Mercury"
b = "Venus"
c = "Earth"
d = "Mars"
e = "Jupiter"
correct = "alt_a"
image = "img/solar-system.png"
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(bank.id, "enem-basics");
        assert_eq!(bank.name, "ENEM Basics");
        assert_eq!(bank.questions.len(), 2);
        assert_eq!(bank.questions[0].correct(), OptionLabel::B);
        assert_eq!(bank.questions[1].correct(), OptionLabel::A);
        assert_eq!(bank.questions[1].image(), Some("img/solar-system.png"));
    }

    #[test]
    fn parse_rejects_bad_label() {
        let toml = r#"
[bank]
id = "bad"
name = "Bad"

[[questions]]
id = 1
prompt = "?"
a = "1"
b = "2"
c = "3"
d = "4"
e = "5"
correct = "F"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("invalid option label"));
    }

    #[test]
    fn parse_rejects_empty_option() {
        let toml = r#"
[bank]
id = "bad"
name = "Bad"

[[questions]]
id = 4
prompt = "?"
a = "1"
b = ""
c = "3"
d = "4"
e = "5"
correct = "A"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("option B is empty"));
    }

    #[test]
    fn skip_policy_drops_only_invalid_rows() {
        let toml = VALID_TOML.replace("correct = \"B\"", "correct = \"F\"");
        let path = PathBuf::from("mixed.toml");

        assert!(parse_bank_str(&toml, &path).is_err());

        let bank = parse_bank_str_with(&toml, &path, RowPolicy::Skip).unwrap();
        assert_eq!(bank.questions.len(), 1);
        assert_eq!(bank.questions[0].id(), QuestionId(2));
    }

    #[test]
    fn skip_policy_still_rejects_broken_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str_with(bad, &PathBuf::from("bad.toml"), RowPolicy::Skip).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_small_bank_and_duplicates() {
        let toml = VALID_TOML.replace("id = 2", "id = 1");
        let bank = parse_bank_str(&toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("shorter than 10")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("duplicate") && w.question_id == Some(QuestionId(1))));
    }

    #[test]
    fn validate_repeated_options() {
        let toml = VALID_TOML.replace("e = \"Sd\"", "e = \"Na\"");
        let bank = parse_bank_str(&toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("distinct")));
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[bank").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path(), RowPolicy::Reject).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id, "enem-basics");

        let via_load = load_banks(dir.path(), RowPolicy::Reject).unwrap();
        assert_eq!(via_load.len(), 1);
    }
}
