//! The `preparavest ranking` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use preparavest_backends::{create_backend, load_config_from};
use preparavest_core::model::RankingEntry;
use preparavest_core::ranking::RankingAggregator;

pub async fn execute(config_path: Option<PathBuf>, top: Option<usize>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config)?;

    let size = top.unwrap_or(config.ranking_size);
    let mut ranking = RankingAggregator::with_size(backend.ranking, size);
    let entries = ranking.refresh().await?;

    if entries.is_empty() {
        println!("No scores yet.");
    } else {
        println!("{}", ranking_table(&entries));
    }
    Ok(())
}

/// Leaderboard as a table, best first.
pub(crate) fn ranking_table(entries: &[RankingEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Correct"]);

    for (pos, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(pos + 1),
            Cell::new(&entry.name),
            Cell::new(entry.correct_total),
        ]);
    }
    table
}
