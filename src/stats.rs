use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::{self, Outcome};
use crate::error::{ModelError, ModelResult};
use crate::league_params::LeagueStats;

/// Per-venue sample size used when synthesising a league-average team.
const NEUTRAL_MATCHES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    W,
    D,
    L,
}

impl FormResult {
    pub fn points(self) -> u32 {
        match self {
            FormResult::W => 3,
            FormResult::D => 1,
            FormResult::L => 0,
        }
    }
}

/// Season aggregates for one team.
///
/// `last_five` is oldest-first: the final element is the most recent match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    pub matches_played: u32,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub home_goals_scored: u32,
    pub home_goals_conceded: u32,
    pub home_matches: u32,
    pub away_goals_scored: u32,
    pub away_goals_conceded: u32,
    pub away_matches: u32,
    #[serde(default)]
    pub last_five: Vec<FormResult>,
}

impl TeamStats {
    /// A team scoring and conceding exactly at the league's home/away averages.
    ///
    /// Every strength ratio of this record is 1.0 (up to rounding to whole goals over a
    /// 100-match sample), so it contributes no information of its own. The backtest uses it
    /// when a team is missing from the stats lookup.
    pub fn neutral(id: u32, league: &LeagueStats) -> Self {
        let per_venue = |avg: f64| (avg * NEUTRAL_MATCHES as f64).round().max(0.0) as u32;
        let home_for = per_venue(league.avg_home_goals);
        let away_for = per_venue(league.avg_away_goals);
        Self {
            id,
            name: format!("League average ({})", league.id),
            short_name: "AVG".to_string(),
            matches_played: NEUTRAL_MATCHES * 2,
            goals_scored: home_for + away_for,
            goals_conceded: home_for + away_for,
            home_goals_scored: home_for,
            home_goals_conceded: home_for,
            home_matches: NEUTRAL_MATCHES,
            away_goals_scored: away_for,
            away_goals_conceded: away_for,
            away_matches: NEUTRAL_MATCHES,
            last_five: Vec::new(),
        }
    }

    /// Rejects records whose venue splits would divide by zero.
    pub fn validate(&self) -> ModelResult<()> {
        if self.home_matches == 0 {
            return Err(self.invalid("homeMatches", "is zero"));
        }
        if self.away_matches == 0 {
            return Err(self.invalid("awayMatches", "is zero"));
        }
        Ok(())
    }

    pub fn home_scored_rate(&self) -> f64 {
        self.home_goals_scored as f64 / self.home_matches as f64
    }

    pub fn home_conceded_rate(&self) -> f64 {
        self.home_goals_conceded as f64 / self.home_matches as f64
    }

    pub fn away_scored_rate(&self) -> f64 {
        self.away_goals_scored as f64 / self.away_matches as f64
    }

    pub fn away_conceded_rate(&self) -> f64 {
        self.away_goals_conceded as f64 / self.away_matches as f64
    }

    pub fn form_points(&self) -> u32 {
        self.last_five.iter().map(|r| r.points()).sum()
    }

    pub fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("team {}", self.id)
        } else {
            format!("{} ({})", self.name, self.id)
        }
    }

    fn invalid(&self, field: &'static str, reason: &str) -> ModelError {
        ModelError::InvalidStatistics {
            team: self.label(),
            field,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u64,
    pub utc_date: DateTime<Utc>,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub league_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalMatch {
    #[serde(flatten)]
    pub fixture: Match,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl HistoricalMatch {
    pub fn outcome(&self) -> Outcome {
        calibration::classify_outcome(self.home_goals, self.away_goals)
    }

    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }

    pub fn both_scored(&self) -> bool {
        self.home_goals > 0 && self.away_goals > 0
    }
}

/// Reads a JSON array of team records into an id-keyed lookup. Later duplicates win.
pub fn load_teams(path: &Path) -> Result<HashMap<u32, TeamStats>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read team stats {}", path.display()))?;
    let rows: Vec<TeamStats> = serde_json::from_str(&raw).context("parse team stats")?;
    Ok(rows.into_iter().map(|t| (t.id, t)).collect())
}

/// Reads a JSON array of finished matches, keeping file order.
pub fn load_history(path: &Path) -> Result<Vec<HistoricalMatch>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read historical matches {}", path.display()))?;
    serde_json::from_str(&raw).context("parse historical matches")
}
