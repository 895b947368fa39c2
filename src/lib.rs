pub mod backtest;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod league_params;
pub mod poisson;
pub mod settle;
pub mod stats;
pub mod synthetic;
pub mod value;

pub use backtest::{BacktestReport, BacktestResult, evaluate, evaluate_with};
pub use config::ModelConfig;
pub use engine::{PredictionResult, predict, predict_with};
pub use error::{ModelError, ModelResult};
pub use league_params::LeagueStats;
pub use settle::{Pick, PickStatus, settle};
pub use stats::{HistoricalMatch, TeamStats};
