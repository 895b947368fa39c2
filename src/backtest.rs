use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::calibration::{self, Metrics, Outcome, OutcomeCalibration, Prob3};
use crate::config::ModelConfig;
use crate::engine::{self, PredictionResult};
use crate::error::{ModelError, ModelResult};
use crate::league_params::LeagueStats;
use crate::stats::{HistoricalMatch, TeamStats};

/// Reliability bins per outcome in a report.
pub const RELIABILITY_BINS: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    #[serde(rename = "match")]
    pub match_: HistoricalMatch,
    pub prediction: PredictionResult,
    pub predicted_outcome: Outcome,
    pub is_outcome_correct: bool,
    pub is_btts_correct: bool,
    pub is_over_correct: bool,
    /// The home side was missing from the lookup and a league-average team stood in.
    pub home_fallback: bool,
    pub away_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedMatch {
    pub match_id: u64,
    pub error: ModelError,
}

/// Hit rates in percent, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accuracy {
    pub outcome: f64,
    pub btts: f64,
    pub over_under: f64,
}

impl Accuracy {
    /// `None` when there is nothing to measure.
    pub fn from_results(results: &[BacktestResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        Some(Self {
            outcome: hit_rate(results, |r| r.is_outcome_correct),
            btts: hit_rate(results, |r| r.is_btts_correct),
            over_under: hit_rate(results, |r| r.is_over_correct),
        })
    }
}

fn hit_rate(results: &[BacktestResult], hit: impl Fn(&BacktestResult) -> bool) -> f64 {
    let hits = results.iter().filter(|&r| hit(r)).count();
    hits as f64 / results.len() as f64 * 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    /// Evaluated matches, in input order.
    pub results: Vec<BacktestResult>,
    pub skipped: Vec<SkippedMatch>,
    pub accuracy: Option<Accuracy>,
    /// 1X2 Brier score / log-loss over `results`.
    pub metrics: Option<Metrics>,
    /// Home, Draw and Away reliability curves; empty when nothing was evaluated.
    pub reliability: Vec<OutcomeCalibration>,
}

impl BacktestReport {
    pub fn evaluated(&self) -> usize {
        self.results.len()
    }

    pub fn fallbacks(&self) -> usize {
        self.results
            .iter()
            .map(|r| r.home_fallback as usize + r.away_fallback as usize)
            .sum()
    }
}

/// [`evaluate_with`] under the default [`ModelConfig`].
pub fn evaluate(
    matches: &[HistoricalMatch],
    teams: &HashMap<u32, TeamStats>,
    league: &LeagueStats,
) -> ModelResult<BacktestReport> {
    evaluate_with(matches, teams, league, &ModelConfig::default())
}

/// Replays the model over finished matches.
///
/// Teams missing from `teams` are replaced by [`TeamStats::neutral`] and flagged on the
/// result. A match whose prediction fails is reported in `skipped` and the batch carries on.
/// Bad config or league baselines fail the whole call since no match could succeed.
pub fn evaluate_with(
    matches: &[HistoricalMatch],
    teams: &HashMap<u32, TeamStats>,
    league: &LeagueStats,
    cfg: &ModelConfig,
) -> ModelResult<BacktestReport> {
    cfg.validate()?;
    league.validate()?;

    let outcomes: Vec<Result<BacktestResult, SkippedMatch>> = matches
        .par_iter()
        .map(|m| {
            evaluate_one(m, teams, league, cfg).map_err(|error| {
                warn!(match_id = m.fixture.id, %error, "skipping match");
                SkippedMatch {
                    match_id: m.fixture.id,
                    error,
                }
            })
        })
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(r) => results.push(r),
            Err(s) => skipped.push(s),
        }
    }

    let accuracy = Accuracy::from_results(&results);
    let preds: Vec<Prob3> = results
        .iter()
        .map(|r| r.prediction.probabilities.one_x_two())
        .collect();
    let actual: Vec<Outcome> = results.iter().map(|r| r.match_.outcome()).collect();
    let metrics = calibration::evaluate_probs(&preds, &actual);
    let reliability = calibration::reliability(&preds, &actual, RELIABILITY_BINS);

    let report = BacktestReport {
        results,
        skipped,
        accuracy,
        metrics,
        reliability,
    };
    match report.accuracy {
        Some(acc) => info!(
            league = %league.id,
            evaluated = report.evaluated(),
            skipped = report.skipped.len(),
            fallbacks = report.fallbacks(),
            outcome = acc.outcome,
            btts = acc.btts,
            over_under = acc.over_under,
            "backtest finished"
        ),
        None => info!(
            league = %league.id,
            skipped = report.skipped.len(),
            "backtest finished with no evaluated matches"
        ),
    }
    Ok(report)
}

fn evaluate_one(
    m: &HistoricalMatch,
    teams: &HashMap<u32, TeamStats>,
    league: &LeagueStats,
    cfg: &ModelConfig,
) -> ModelResult<BacktestResult> {
    let (home, home_fallback) = lookup_or_neutral(teams, m.fixture.home_team.id, league);
    let (away, away_fallback) = lookup_or_neutral(teams, m.fixture.away_team.id, league);
    if home_fallback || away_fallback {
        warn!(
            match_id = m.fixture.id,
            home_fallback, away_fallback, "team stats missing, using league-average team"
        );
    }

    let prediction = engine::predict_with(&home, &away, league, cfg)?;
    let probs = prediction.probabilities;

    let predicted_outcome = probs.favourite();
    let is_outcome_correct = predicted_outcome == m.outcome();
    let is_btts_correct = m.both_scored() == (probs.btts > cfg.market_decision_threshold);
    let is_over_correct = (m.total_goals() as f64 > cfg.over_under_line)
        == (probs.over > cfg.market_decision_threshold);

    Ok(BacktestResult {
        match_: m.clone(),
        prediction,
        predicted_outcome,
        is_outcome_correct,
        is_btts_correct,
        is_over_correct,
        home_fallback,
        away_fallback,
    })
}

fn lookup_or_neutral(
    teams: &HashMap<u32, TeamStats>,
    id: u32,
    league: &LeagueStats,
) -> (TeamStats, bool) {
    match teams.get(&id) {
        Some(t) => (t.clone(), false),
        None => (TeamStats::neutral(id, league), true),
    }
}
