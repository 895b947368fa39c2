use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calibration::{self, Outcome};
use crate::error::{ModelError, ModelResult};

/// A saved market call, as stored next to a fixture before kickoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "market", content = "value", rename_all = "camelCase")]
pub enum Pick {
    Result(Outcome),
    /// `true` backs both teams to score.
    BothTeamsScore(bool),
    Over(f64),
    Under(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PickStatus {
    Pending,
    Won,
    Lost,
}

impl Pick {
    /// Reads the stored `(type, value)` labels: `1X2` with `Home`/`Draw`/`Away`,
    /// `BTTS` with `YES`/`NO`, `O/U` with `OVER <line>`/`UNDER <line>`. Case-insensitive.
    pub fn parse(market: &str, value: &str) -> ModelResult<Self> {
        let invalid = || ModelError::InvalidPick {
            market: market.to_string(),
            value: value.to_string(),
        };
        let v = value.trim().to_ascii_uppercase();

        match market.trim().to_ascii_uppercase().as_str() {
            "1X2" => match v.as_str() {
                "HOME" => Ok(Pick::Result(Outcome::Home)),
                "DRAW" => Ok(Pick::Result(Outcome::Draw)),
                "AWAY" => Ok(Pick::Result(Outcome::Away)),
                _ => Err(invalid()),
            },
            "BTTS" => match v.as_str() {
                "YES" => Ok(Pick::BothTeamsScore(true)),
                "NO" => Ok(Pick::BothTeamsScore(false)),
                _ => Err(invalid()),
            },
            "O/U" => {
                let (side, line) = v.split_once(' ').ok_or_else(invalid)?;
                let line: f64 = line.trim().parse().map_err(|_| invalid())?;
                if !line.is_finite() || line < 0.0 {
                    return Err(invalid());
                }
                match side {
                    "OVER" => Ok(Pick::Over(line)),
                    "UNDER" => Ok(Pick::Under(line)),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }

    /// `(type, value)` labels accepted by [`Pick::parse`].
    pub fn labels(&self) -> (&'static str, String) {
        match self {
            Pick::Result(o) => ("1X2", format!("{o:?}")),
            Pick::BothTeamsScore(yes) => ("BTTS", if *yes { "YES" } else { "NO" }.to_string()),
            Pick::Over(line) => ("O/U", format!("OVER {line}")),
            Pick::Under(line) => ("O/U", format!("UNDER {line}")),
        }
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (market, value) = self.labels();
        write!(f, "{market}: {value}")
    }
}

/// Grades a pick against the final score. Both totals lines are strict, so a total
/// landing exactly on the line loses either way.
pub fn settle(pick: Pick, home_goals: u32, away_goals: u32) -> PickStatus {
    let total = (home_goals + away_goals) as f64;
    let won = match pick {
        Pick::Result(o) => calibration::classify_outcome(home_goals, away_goals) == o,
        Pick::BothTeamsScore(yes) => (home_goals > 0 && away_goals > 0) == yes,
        Pick::Over(line) => total > line,
        Pick::Under(line) => total < line,
    };
    if won { PickStatus::Won } else { PickStatus::Lost }
}

/// [`settle`] once a final score exists; `Pending` until then.
pub fn status(pick: Pick, final_score: Option<(u32, u32)>) -> PickStatus {
    match final_score {
        Some((home_goals, away_goals)) => settle(pick, home_goals, away_goals),
        None => PickStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_picks() {
        let home = Pick::parse("1X2", "Home").unwrap();
        let away = Pick::parse("1X2", "Away").unwrap();
        let draw = Pick::parse("1x2", "draw").unwrap();
        assert_eq!(settle(home, 2, 1), PickStatus::Won);
        assert_eq!(settle(home, 1, 1), PickStatus::Lost);
        assert_eq!(settle(away, 0, 3), PickStatus::Won);
        assert_eq!(settle(away, 3, 0), PickStatus::Lost);
        assert_eq!(settle(draw, 2, 2), PickStatus::Won);
        assert_eq!(settle(draw, 2, 0), PickStatus::Lost);
    }

    #[test]
    fn btts_picks() {
        let yes = Pick::parse("BTTS", "YES").unwrap();
        let no = Pick::parse("BTTS", "NO").unwrap();
        assert_eq!(settle(yes, 1, 1), PickStatus::Won);
        assert_eq!(settle(yes, 3, 0), PickStatus::Lost);
        assert_eq!(settle(no, 0, 2), PickStatus::Won);
        assert_eq!(settle(no, 0, 0), PickStatus::Won);
        assert_eq!(settle(no, 2, 1), PickStatus::Lost);
    }

    #[test]
    fn totals_picks_are_strict() {
        let over = Pick::parse("O/U", "OVER 2.5").unwrap();
        let under = Pick::parse("O/U", "UNDER 2.5").unwrap();
        assert_eq!(over, Pick::Over(2.5));
        assert_eq!(settle(over, 2, 1), PickStatus::Won);
        assert_eq!(settle(over, 1, 1), PickStatus::Lost);
        assert_eq!(settle(under, 1, 1), PickStatus::Won);
        assert_eq!(settle(under, 2, 1), PickStatus::Lost);

        // Whole-number line: landing on it loses both sides.
        assert_eq!(settle(Pick::Over(3.0), 2, 1), PickStatus::Lost);
        assert_eq!(settle(Pick::Under(3.0), 2, 1), PickStatus::Lost);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        for (market, value) in [
            ("1X2", "X"),
            ("BTTS", "MAYBE"),
            ("O/U", "OVER"),
            ("O/U", "OVER two"),
            ("O/U", "SIDEWAYS 2.5"),
            ("HANDICAP", "-1"),
        ] {
            match Pick::parse(market, value) {
                Err(ModelError::InvalidPick { market: m, value: v }) => {
                    assert_eq!(m, market);
                    assert_eq!(v, value);
                }
                other => panic!("{market} {value}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn labels_parse_back() {
        for pick in [
            Pick::Result(Outcome::Away),
            Pick::BothTeamsScore(false),
            Pick::Over(2.5),
            Pick::Under(3.5),
        ] {
            let (market, value) = pick.labels();
            assert_eq!(Pick::parse(market, &value).unwrap(), pick);
        }
        assert_eq!(Pick::Over(2.5).to_string(), "O/U: OVER 2.5");
    }

    #[test]
    fn unplayed_fixture_stays_pending() {
        let pick = Pick::BothTeamsScore(true);
        assert_eq!(status(pick, None), PickStatus::Pending);
        assert_eq!(status(pick, Some((1, 2))), PickStatus::Won);
    }

    #[test]
    fn status_serializes_like_stored_rows() {
        assert_eq!(serde_json::to_string(&PickStatus::Won).unwrap(), "\"WON\"");
        assert_eq!(serde_json::to_string(&PickStatus::Pending).unwrap(), "\"PENDING\"");
    }
}
