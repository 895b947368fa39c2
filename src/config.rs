use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

pub const DEFAULT_MAX_GOALS: usize = 5;
pub const DEFAULT_OVER_UNDER_LINE: f64 = 2.5;
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;
pub const DEFAULT_TOP_SCORES: usize = 5;
pub const DEFAULT_VALUE_EDGE: f64 = 0.05;
/// Largest accepted grid; real scorelines never get near it.
pub const MAX_GOALS_LIMIT: usize = 50;

/// Tunable knobs of the scoreline model.
///
/// Defaults: `max_goals = 5` (buckets 0..4 plus "5+"), `over_under_line = 2.5`,
/// `market_decision_threshold = 0.5` (BTTS / over calls in backtests), `top_scores = 5`,
/// `value_edge_threshold = 0.05` (minimum EV for a flagged value bet).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConfig {
    pub max_goals: usize,
    pub over_under_line: f64,
    pub market_decision_threshold: f64,
    pub top_scores: usize,
    pub value_edge_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_goals: DEFAULT_MAX_GOALS,
            over_under_line: DEFAULT_OVER_UNDER_LINE,
            market_decision_threshold: DEFAULT_DECISION_THRESHOLD,
            top_scores: DEFAULT_TOP_SCORES,
            value_edge_threshold: DEFAULT_VALUE_EDGE,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if self.max_goals == 0 || self.max_goals > MAX_GOALS_LIMIT {
            return Err(ModelError::InvalidConfig(format!(
                "maxGoals must lie in 1..={MAX_GOALS_LIMIT}, got {}",
                self.max_goals
            )));
        }
        if !self.over_under_line.is_finite() || self.over_under_line < 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "overUnderLine must be finite and non-negative, got {}",
                self.over_under_line
            )));
        }
        let t = self.market_decision_threshold;
        if !(t > 0.0 && t < 1.0) {
            return Err(ModelError::InvalidConfig(format!(
                "marketDecisionThreshold must lie in (0, 1), got {t}"
            )));
        }
        if self.top_scores == 0 {
            return Err(ModelError::InvalidConfig(
                "topScores must be at least 1".to_string(),
            ));
        }
        if !self.value_edge_threshold.is_finite() {
            return Err(ModelError::InvalidConfig(
                "valueEdgeThreshold must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read model config {}", path.display()))?;
        let cfg: ModelConfig = serde_json::from_str(&raw).context("parse model config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `SCORELINE_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::with_env_overrides`] with variables read through `lookup`.
    /// Blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = parse_var::<usize>(&lookup, "SCORELINE_MAX_GOALS")? {
            self.max_goals = v;
        }
        if let Some(v) = parse_var::<f64>(&lookup, "SCORELINE_OVER_UNDER_LINE")? {
            self.over_under_line = v;
        }
        if let Some(v) = parse_var::<f64>(&lookup, "SCORELINE_DECISION_THRESHOLD")? {
            self.market_decision_threshold = v;
        }
        if let Some(v) = parse_var::<usize>(&lookup, "SCORELINE_TOP_SCORES")? {
            self.top_scores = v;
        }
        if let Some(v) = parse_var::<f64>(&lookup, "SCORELINE_VALUE_EDGE")? {
            self.value_edge_threshold = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// Optional file, then environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let v = raw
        .parse::<T>()
        .with_context(|| format!("parse {key}={raw}"))?;
    Ok(Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = ModelConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_goals, 5);
        assert_eq!(cfg.over_under_line, 2.5);
        assert_eq!(cfg.market_decision_threshold, 0.5);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ModelConfig = serde_json::from_str(r#"{"maxGoals": 8}"#).unwrap();
        assert_eq!(cfg.max_goals, 8);
        assert_eq!(cfg.top_scores, 5);
        assert_eq!(cfg.over_under_line, 2.5);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg = ModelConfig {
            market_decision_threshold: 1.0,
            ..ModelConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_max_goals() {
        let cfg = ModelConfig {
            max_goals: 0,
            ..ModelConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_oversized_grid() {
        let cfg = ModelConfig {
            max_goals: MAX_GOALS_LIMIT + 1,
            ..ModelConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ModelError::InvalidConfig(_))));
        let cfg = ModelConfig {
            max_goals: MAX_GOALS_LIMIT,
            ..ModelConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn overrides_replace_every_knob() {
        let cfg = ModelConfig::default()
            .with_overrides(vars(&[
                ("SCORELINE_MAX_GOALS", "7"),
                ("SCORELINE_OVER_UNDER_LINE", " 3.5 "),
                ("SCORELINE_DECISION_THRESHOLD", "0.6"),
                ("SCORELINE_TOP_SCORES", "3"),
                ("SCORELINE_VALUE_EDGE", "0.1"),
            ]))
            .unwrap();
        assert_eq!(
            cfg,
            ModelConfig {
                max_goals: 7,
                over_under_line: 3.5,
                market_decision_threshold: 0.6,
                top_scores: 3,
                value_edge_threshold: 0.1,
            }
        );
    }

    #[test]
    fn blank_override_is_ignored() {
        let cfg = ModelConfig::default()
            .with_overrides(vars(&[
                ("SCORELINE_MAX_GOALS", ""),
                ("SCORELINE_TOP_SCORES", "   "),
            ]))
            .unwrap();
        assert_eq!(cfg, ModelConfig::default());
    }

    #[test]
    fn unparsable_override_names_the_variable() {
        let err = ModelConfig::default()
            .with_overrides(vars(&[("SCORELINE_MAX_GOALS", "abc")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("SCORELINE_MAX_GOALS=abc"));
    }

    #[test]
    fn out_of_range_override_fails_validation() {
        let err = ModelConfig::default()
            .with_overrides(vars(&[("SCORELINE_DECISION_THRESHOLD", "1.5")]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn loads_partial_file_from_disk() {
        let dir = std::env::temp_dir().join(format!("scoreline-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");
        fs::write(&path, r#"{"overUnderLine": 1.5, "topScores": 8}"#).unwrap();

        let cfg = ModelConfig::load(&path).unwrap();
        assert_eq!(cfg.over_under_line, 1.5);
        assert_eq!(cfg.top_scores, 8);
        assert_eq!(cfg.max_goals, DEFAULT_MAX_GOALS);

        fs::write(&path, r#"{"maxGoals": 0}"#).unwrap();
        assert!(ModelConfig::load(&path).is_err());
        assert!(ModelConfig::load(&dir.join("missing.json")).is_err());
        let _ = fs::remove_dir_all(dir);
    }
}
