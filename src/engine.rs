use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibration::{self, Outcome, Prob3};
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::league_params::LeagueStats;
use crate::poisson::goal_probabilities;
use crate::stats::TeamStats;

/// Attack/defence ratios relative to the league baseline. Above 1.0 means a stronger attack
/// or a leakier defence than average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStrengths {
    pub home_attack: f64,
    pub home_defense: f64,
    pub away_attack: f64,
    pub away_defense: f64,
}

impl TeamStrengths {
    /// Callers must have validated both teams (non-zero venue match counts).
    fn compute(home: &TeamStats, away: &TeamStats, league: &LeagueStats) -> Self {
        Self {
            home_attack: home.home_scored_rate() / league.avg_home_goals,
            away_defense: away.away_conceded_rate() / league.avg_away_goals,
            away_attack: away.away_scored_rate() / league.avg_away_goals,
            home_defense: home.home_conceded_rate() / league.avg_home_goals,
        }
    }
}

/// Joint scoreline probabilities, square with side `max_goals + 1`, indexed `[(home, away)]`.
/// The last row/column is the "max_goals or more" bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreMatrix")]
pub struct ScoreMatrix {
    dim: usize,
    cells: Vec<f64>,
}

#[derive(Deserialize)]
struct RawScoreMatrix {
    dim: usize,
    cells: Vec<f64>,
}

impl TryFrom<RawScoreMatrix> for ScoreMatrix {
    type Error = ModelError;

    fn try_from(raw: RawScoreMatrix) -> ModelResult<Self> {
        if raw.dim.checked_mul(raw.dim) != Some(raw.cells.len()) {
            return Err(ModelError::InvalidMatrix(format!(
                "{} cells cannot fill a {}x{} grid",
                raw.cells.len(),
                raw.dim,
                raw.dim
            )));
        }
        Ok(Self {
            dim: raw.dim,
            cells: raw.cells,
        })
    }
}

impl ScoreMatrix {
    /// Outer product of two marginals (independent goal counts). Both must cover the same
    /// goal range.
    pub fn from_marginals(home: &[f64], away: &[f64]) -> ModelResult<Self> {
        if home.len() != away.len() {
            return Err(ModelError::InvalidMatrix(format!(
                "home marginal has {} buckets, away has {}",
                home.len(),
                away.len()
            )));
        }
        let dim = home.len();
        let mut cells = Vec::with_capacity(dim * dim);
        for p_h in home {
            for p_a in away {
                cells.push(p_h * p_a);
            }
        }
        Ok(Self { dim, cells })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, home_goals: usize, away_goals: usize) -> Option<f64> {
        if home_goals >= self.dim || away_goals >= self.dim {
            return None;
        }
        Some(self.cells[home_goals * self.dim + away_goals])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.cells.chunks(self.dim.max(1))
    }

    /// `(home, away, p)` in ascending home goals, then ascending away goals.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let dim = self.dim;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, p)| (i / dim, i % dim, *p))
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Most probable exact scores, descending. Equal probabilities keep matrix order.
    pub fn top_scores(&self, n: usize) -> Vec<ScoreLine> {
        let mut scores: Vec<ScoreLine> = self
            .iter()
            .map(|(h, a, p)| ScoreLine {
                home: h as u32,
                away: a as u32,
                probability: p,
            })
            .collect();
        // `sort_by` is stable.
        scores.sort_by(|x, y| {
            y.probability
                .partial_cmp(&x.probability)
                .unwrap_or(Ordering::Equal)
        });
        scores.truncate(n);
        scores
    }
}

impl Index<(usize, usize)> for ScoreMatrix {
    type Output = f64;

    fn index(&self, (home_goals, away_goals): (usize, usize)) -> &f64 {
        assert!(
            home_goals < self.dim && away_goals < self.dim,
            "score ({home_goals}, {away_goals}) outside {0}x{0} matrix",
            self.dim
        );
        &self.cells[home_goals * self.dim + away_goals]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub home: u32,
    pub away: u32,
    pub probability: f64,
}

impl fmt::Display for ScoreLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Market probabilities summed from the truncated matrix. 1X2 and BTTS are not renormalised;
/// `under` is the exact complement of `over`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketProbabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub btts: f64,
    pub over: f64,
    pub under: f64,
}

impl MarketProbabilities {
    pub fn from_matrix(matrix: &ScoreMatrix, over_under_line: f64) -> Self {
        let mut home_win = 0.0;
        let mut draw = 0.0;
        let mut away_win = 0.0;
        let mut btts = 0.0;
        let mut over = 0.0;

        for (h, a, p) in matrix.iter() {
            match h.cmp(&a) {
                Ordering::Greater => home_win += p,
                Ordering::Equal => draw += p,
                Ordering::Less => away_win += p,
            }
            if h > 0 && a > 0 {
                btts += p;
            }
            if (h + a) as f64 > over_under_line {
                over += p;
            }
        }

        Self {
            home_win,
            draw,
            away_win,
            btts,
            over,
            under: 1.0 - over,
        }
    }

    pub fn one_x_two(&self) -> Prob3 {
        Prob3 {
            home: self.home_win,
            draw: self.draw,
            away: self.away_win,
        }
    }

    /// Ties resolve Home, then Draw, then Away.
    pub fn favourite(&self) -> Outcome {
        calibration::favourite(self.one_x_two())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    #[serde(rename = "homeXG")]
    pub home_xg: f64,
    #[serde(rename = "awayXG")]
    pub away_xg: f64,
    pub strengths: TeamStrengths,
    pub probabilities: MarketProbabilities,
    pub over_under_line: f64,
    pub score_matrix: ScoreMatrix,
    pub most_likely_scores: Vec<ScoreLine>,
}

/// [`predict_with`] under the default [`ModelConfig`].
pub fn predict(
    home: &TeamStats,
    away: &TeamStats,
    league: &LeagueStats,
) -> ModelResult<PredictionResult> {
    predict_with(home, away, league, &ModelConfig::default())
}

/// Relative-strength Poisson scoreline model.
///
/// Home xG is the home side's home attack ratio times the away side's away defence ratio,
/// scaled by the league home average (and symmetrically for the away side). The two goal
/// counts are treated as independent.
pub fn predict_with(
    home: &TeamStats,
    away: &TeamStats,
    league: &LeagueStats,
    cfg: &ModelConfig,
) -> ModelResult<PredictionResult> {
    cfg.validate()?;
    league.validate()?;
    home.validate()?;
    away.validate()?;

    let strengths = TeamStrengths::compute(home, away, league);
    let home_xg = strengths.home_attack * strengths.away_defense * league.avg_home_goals;
    let away_xg = strengths.away_attack * strengths.home_defense * league.avg_away_goals;

    let home_probs = goal_probabilities(home_xg, cfg.max_goals)?;
    let away_probs = goal_probabilities(away_xg, cfg.max_goals)?;

    let score_matrix = ScoreMatrix::from_marginals(&home_probs, &away_probs)?;
    let probabilities = MarketProbabilities::from_matrix(&score_matrix, cfg.over_under_line);
    let most_likely_scores = score_matrix.top_scores(cfg.top_scores);

    debug!(
        home = %home.label(),
        away = %away.label(),
        league = %league.id,
        home_xg,
        away_xg,
        p_home = probabilities.home_win,
        p_draw = probabilities.draw,
        p_away = probabilities.away_win,
        "prediction"
    );

    Ok(PredictionResult {
        home_xg,
        away_xg,
        strengths,
        probabilities,
        over_under_line: cfg.over_under_line,
        score_matrix,
        most_likely_scores,
    })
}
