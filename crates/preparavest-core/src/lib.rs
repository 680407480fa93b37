//! preparavest-core: Quiz sessions, scoring, and ranking.
//!
//! This crate holds the data model, the session state machine, the scoring
//! engine and the leaderboard. Everything that talks to the outside world does
//! so through the traits in [`traits`].

pub mod error;
pub mod model;
pub mod parser;
pub mod profile;
pub mod quiz;
pub mod ranking;
pub mod report;
pub mod sampler;
pub mod scoring;
pub mod session;
pub mod traits;
