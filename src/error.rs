//! Error type shared by the library and the command line front-end.
//!
//! Only construction-time and input faults live here. Infeasible move
//! operands are reported as `false` by the move primitives, and rule
//! violations are collected by the validators.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("team count must be positive, got {0}")]
    InvalidTeamCount(usize),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("exact solver unavailable: {0}")]
    ExactUnavailable(String),
    #[error("instance too large for exact solver: {teams} teams (limit {limit})")]
    InstanceTooLarge { teams: usize, limit: usize },
    #[error("too many matches to enumerate: {matches} (limit {limit})")]
    TooManyMatches { matches: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
