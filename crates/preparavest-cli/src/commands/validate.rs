//! The `preparavest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use preparavest_core::parser::{load_banks, validate_bank, RowPolicy};

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = load_banks(&bank_path, RowPolicy::Reject)?;
    anyhow::ensure!(!banks.is_empty(), "no question banks found in {}", bank_path.display());

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Bank: {} ({} questions)", bank.name, bank.questions.len());

        let warnings = validate_bank(bank);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
