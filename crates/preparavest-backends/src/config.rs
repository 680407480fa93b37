//! Configuration loading and backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use preparavest_core::model::{RANKING_SIZE, SESSION_LIMIT};
use preparavest_core::quiz::QuizOptions;
use preparavest_core::scoring::ScoringMode;
use preparavest_core::traits::{QuestionProvider, RankingStore, ScoringAuthority};

use crate::file::FileQuestionProvider;
use crate::http::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};

/// Name of the config file looked up in the current directory.
pub const CONFIG_FILE: &str = "preparavest.toml";

/// Connection settings for the quiz API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Top-level preparavest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Where correctness is decided.
    #[serde(default)]
    pub scoring_mode: ScoringMode,
    /// Questions per session.
    #[serde(default = "default_session_limit")]
    pub session_limit: usize,
    /// Entries shown on the leaderboard.
    #[serde(default = "default_ranking_size")]
    pub ranking_size: usize,
    /// Local question bank used instead of the API.
    #[serde(default)]
    pub question_bank: Option<PathBuf>,
    /// Where the current user's profile is stored.
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_session_limit() -> usize {
    SESSION_LIMIT
}
fn default_ranking_size() -> usize {
    RANKING_SIZE
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            scoring_mode: ScoringMode::default(),
            session_limit: default_session_limit(),
            ranking_size: default_ranking_size(),
            question_bank: None,
            profile_path: None,
            api: ApiConfig::default(),
        }
    }
}

impl QuizConfig {
    pub fn quiz_options(&self) -> QuizOptions {
        QuizOptions {
            scoring_mode: self.scoring_mode,
            session_limit: self.session_limit,
            ranking_size: self.ranking_size,
            seed: None,
        }
    }

    /// Profile location, falling back to the per-user config directory.
    pub fn profile_path(&self) -> PathBuf {
        self.profile_path
            .clone()
            .or_else(|| dirs_path().map(|d| d.join("profile.json")))
            .unwrap_or_else(|| PathBuf::from("profile.json"))
    }

    fn validate(&self) -> Result<()> {
        if self.session_limit == 0 {
            anyhow::bail!("session_limit must be at least 1");
        }
        if self.api.timeout_ms == 0 {
            anyhow::bail!("api.timeout_ms must be at least 1");
        }
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

/// Expand `${VAR}` and a leading `~/` in a configured path.
fn resolve_path(path: &Path) -> PathBuf {
    let resolved = resolve_env_vars(&path.to_string_lossy());
    match (resolved.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(resolved),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `preparavest.toml` in the current directory
/// 2. `~/.config/preparavest/config.toml`
///
/// `PREPARAVEST_API_URL` overrides `api.base_url`.
pub fn load_config() -> Result<QuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|d| d.join("config.toml"))
                    .filter(|p| p.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizConfig::default(),
    };

    if let Ok(url) = std::env::var("PREPARAVEST_API_URL") {
        config.api.base_url = url;
    }

    config.api.base_url = resolve_env_vars(&config.api.base_url);
    config.question_bank = config.question_bank.as_deref().map(resolve_path);
    config.profile_path = config.profile_path.as_deref().map(resolve_path);

    config.validate()?;
    tracing::debug!(
        source = ?config_path,
        scoring = %config.scoring_mode,
        base_url = %config.api.base_url,
        "configuration loaded"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("preparavest"))
}

/// The collaborators a quiz runs against.
pub struct Backend {
    pub questions: Arc<dyn QuestionProvider>,
    pub scoring: Arc<dyn ScoringAuthority>,
    pub ranking: Arc<dyn RankingStore>,
}

/// Build the collaborators described by `config`.
///
/// Scoring and ranking always go to the API; questions come from the local
/// bank when one is configured.
pub fn create_backend(config: &QuizConfig) -> Result<Backend> {
    let api = Arc::new(ApiClient::new(&config.api.base_url, config.api.timeout_ms)?);

    let questions: Arc<dyn QuestionProvider> = match &config.question_bank {
        Some(path) => Arc::new(FileQuestionProvider::new(path)),
        None => api.clone(),
    };

    Ok(Backend {
        questions,
        scoring: api.clone(),
        ranking: api,
    })
}
