use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Season-level scoring baseline used to normalise team rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueStats {
    pub id: String,
    pub name: String,
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub best_markets: Vec<String>,
}

impl LeagueStats {
    pub fn new(id: &str, name: &str, avg_home_goals: f64, avg_away_goals: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            avg_home_goals,
            avg_away_goals,
            description: String::new(),
            best_markets: Vec::new(),
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        check_avg(&self.id, "avgHomeGoals", self.avg_home_goals)?;
        check_avg(&self.id, "avgAwayGoals", self.avg_away_goals)?;
        Ok(())
    }
}

fn check_avg(league: &str, field: &'static str, v: f64) -> ModelResult<()> {
    if v.is_finite() && v > 0.0 {
        return Ok(());
    }
    Err(ModelError::InvalidLeague {
        league: league.to_string(),
        field,
        reason: format!("must be finite and positive, got {v}"),
    })
}

// id, name, avg home, avg away, notes, best markets
const PRESETS: &[(&str, &str, f64, f64, &str, &[&str])] = &[
    (
        "PL",
        "Premier League",
        1.58,
        1.26,
        "Massive data availability, High goal average, Strong home advantage. Note: More efficient odds, so value is smaller.",
        &["Over goals", "BTTS", "Top-team wins"],
    ),
    (
        "PD",
        "La Liga",
        1.45,
        1.12,
        "Top teams are very consistent, Lower teams struggle against elite clubs, Tactically stable league.",
        &["Favorites", "Draw no bet", "Under 3.5 goals"],
    ),
    (
        "BL1",
        "Bundesliga",
        1.74,
        1.43,
        "Very high goals per game, Strong gap between top and bottom teams, Attacking style is consistent every season.",
        &["Over 2.5 goals", "Favorites", "BTTS"],
    ),
    (
        "DED",
        "Eredivisie",
        1.85,
        1.45,
        "One of the highest scoring leagues in Europe, Big teams dominate weak defenses, Upsets are rare at home for top clubs.",
        &["Over goals", "Handicap", "Favorites"],
    ),
    (
        "PPL",
        "Primeira Liga",
        1.40,
        1.05,
        "Clear “big three” dominate the league, Small clubs rarely beat top teams, Low variance season to season.",
        &["Home wins", "Double chance", "Under goals"],
    ),
    (
        "J1",
        "J1 League",
        1.35,
        1.25,
        "Very structured and disciplined play, Few surprise results, Stable scheduling and team behavior.",
        &["Draw no bet", "Under/over 2.5", "Form-based bets"],
    ),
    (
        "ASV",
        "Allsvenskan",
        1.55,
        1.25,
        "Very low draw rate, Clear form streaks, Minimal mid-season disruption.",
        &["Match winner", "Double chance"],
    ),
    (
        "CSL",
        "Chinese Super League",
        1.50,
        1.10,
        "Very top-heavy league, Favorites win often, Models perform well historically.",
        &["Favorites", "Underdog fades", "Under goals"],
    ),
];

pub fn preset(id: &str) -> Option<LeagueStats> {
    let key = id.trim().to_ascii_uppercase();
    PRESETS
        .iter()
        .find(|(pid, ..)| *pid == key)
        .map(|(pid, name, home, away, desc, markets)| LeagueStats {
            id: (*pid).to_string(),
            name: (*name).to_string(),
            avg_home_goals: *home,
            avg_away_goals: *away,
            description: (*desc).to_string(),
            best_markets: markets.iter().map(|m| (*m).to_string()).collect(),
        })
}

pub fn presets() -> Vec<LeagueStats> {
    PRESETS.iter().filter_map(|(id, ..)| preset(id)).collect()
}

/// Loads a league table keyed by league id.
pub fn load_leagues(path: &Path) -> Result<BTreeMap<String, LeagueStats>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read league table {}", path.display()))?;
    let leagues: BTreeMap<String, LeagueStats> =
        serde_json::from_str(&raw).context("parse league table")?;
    for league in leagues.values() {
        league.validate()?;
    }
    Ok(leagues)
}

pub fn save_leagues(path: &Path, leagues: &BTreeMap<String, LeagueStats>) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(leagues).context("serialize league table")?;
    fs::write(&tmp, json).context("write league table")?;
    fs::rename(&tmp, path).context("swap league table")?;
    Ok(())
}

/// Looks `id` up in `table` first, then in the built-in presets.
pub fn resolve(id: &str, table: Option<&BTreeMap<String, LeagueStats>>) -> Option<LeagueStats> {
    table
        .and_then(|t| t.get(id).cloned())
        .or_else(|| preset(id))
}
