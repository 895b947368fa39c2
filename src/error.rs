use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum ModelError {
    #[error("invalid statistics for team {team}: {field} {reason}")]
    InvalidStatistics {
        team: String,
        field: &'static str,
        reason: String,
    },

    #[error("invalid league baseline for {league}: {field} {reason}")]
    InvalidLeague {
        league: String,
        field: &'static str,
        reason: String,
    },

    #[error("poisson rate must be finite and non-negative, got {0}")]
    InvalidRate(f64),

    #[error("decimal odds for {selection} must be greater than 1.0, got {odds}")]
    InvalidOdds { selection: &'static str, odds: f64 },

    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    #[error("score matrix shape mismatch: {0}")]
    InvalidMatrix(String),

    #[error("unknown pick {value:?} for market {market:?}")]
    InvalidPick { market: String, value: String },
}

pub type ModelResult<T> = Result<T, ModelError>;
