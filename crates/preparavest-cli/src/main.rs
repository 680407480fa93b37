//! preparavest CLI: take quizzes and check the leaderboard from a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use preparavest_core::profile::UserRole;
use preparavest_core::scoring::ScoringMode;

mod commands;

#[derive(Parser)]
#[command(name = "preparavest", version, about = "Multiple-choice exam practice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz session
    Play {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Local question bank (.toml file or directory) instead of the API
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Scoring mode: delegated or local
        #[arg(long)]
        scoring: Option<ScoringMode>,

        /// Write the finished attempt as JSON to this path
        #[arg(long)]
        save_report: Option<PathBuf>,

        /// Seed for reproducible question order
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the leaderboard
    Ranking {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of entries to show
        #[arg(long)]
        top: Option<usize>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Show or set the current user
    Profile {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// Create starter config and example question bank
    Init,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile
    Show,
    /// Store the profile used for quizzes
    Set {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// "admin" or "standard"
        #[arg(long, default_value = "standard")]
        role: UserRole,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("preparavest=warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            config,
            bank,
            scoring,
            save_report,
            seed,
        } => commands::play::execute(config, bank, scoring, save_report, seed).await,
        Commands::Ranking { config, top } => commands::ranking::execute(config, top).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Profile { config, action } => match action.unwrap_or(ProfileAction::Show) {
            ProfileAction::Show => commands::profile::show(config),
            ProfileAction::Set {
                id,
                name,
                email,
                role,
            } => commands::profile::set(config, id, name, email, role),
        },
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
