//! preparavest-backends: Collaborator implementations.
//!
//! Implements the question provider, scoring authority and ranking store
//! traits over the quiz REST API, local TOML banks, and an in-memory mock.

pub mod config;
pub mod file;
pub mod http;
pub mod mock;
mod wire;

pub use config::{create_backend, load_config, load_config_from, Backend, QuizConfig};
pub use file::FileQuestionProvider;
pub use http::ApiClient;
pub use mock::{MockBackend, Operation};
