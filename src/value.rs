use serde::{Deserialize, Serialize};

use crate::calibration::Outcome;
use crate::config::ModelConfig;
use crate::engine::MarketProbabilities;
use crate::error::{ModelError, ModelResult};

/// Bookmaker decimal odds for the 1X2 market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueBet {
    pub selection: Outcome,
    pub probability: f64,
    pub odds: f64,
    pub fair_odds: Option<f64>,
    pub expected_value: f64,
    pub is_value: bool,
}

/// Expected profit per unit staked.
pub fn expected_value(probability: f64, decimal_odds: f64) -> f64 {
    probability * decimal_odds - 1.0
}

pub fn fair_odds(probability: f64) -> Option<f64> {
    (probability > 0.0).then(|| 1.0 / probability)
}

/// One entry per 1X2 selection, in Home, Draw, Away order.
pub fn find_value(
    markets: &MarketProbabilities,
    odds: &BookOdds,
    cfg: &ModelConfig,
) -> ModelResult<Vec<ValueBet>> {
    let legs = [
        (Outcome::Home, "home", markets.home_win, odds.home),
        (Outcome::Draw, "draw", markets.draw, odds.draw),
        (Outcome::Away, "away", markets.away_win, odds.away),
    ];

    let mut out = Vec::with_capacity(legs.len());
    for (selection, label, probability, price) in legs {
        if !price.is_finite() || price <= 1.0 {
            return Err(ModelError::InvalidOdds {
                selection: label,
                odds: price,
            });
        }
        let ev = expected_value(probability, price);
        out.push(ValueBet {
            selection,
            probability,
            odds: price,
            fair_odds: fair_odds(probability),
            expected_value: ev,
            is_value: ev > cfg.value_edge_threshold,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markets(home: f64, draw: f64, away: f64) -> MarketProbabilities {
        MarketProbabilities {
            home_win: home,
            draw,
            away_win: away,
            btts: 0.5,
            over: 0.5,
            under: 0.5,
        }
    }

    #[test]
    fn flags_edges_above_threshold() {
        let odds = BookOdds {
            home: 2.0,
            draw: 3.4,
            away: 3.8,
        };
        let bets = find_value(&markets(0.55, 0.25, 0.20), &odds, &ModelConfig::default()).unwrap();
        assert_eq!(bets.len(), 3);
        assert!((bets[0].expected_value - 0.10).abs() < 1e-12);
        assert!(bets[0].is_value);
        assert!(!bets[1].is_value);
        assert!(!bets[2].is_value);
        assert_eq!(bets[2].selection, Outcome::Away);
        assert!((bets[0].fair_odds.unwrap() - 1.0 / 0.55).abs() < 1e-12);
    }

    #[test]
    fn rejects_odds_at_or_below_evens_stake() {
        let odds = BookOdds {
            home: 2.0,
            draw: 1.0,
            away: 3.8,
        };
        let err = find_value(&markets(0.4, 0.3, 0.3), &odds, &ModelConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidOdds { selection: "draw", .. }));
    }

    #[test]
    fn zero_probability_has_no_fair_price() {
        assert!(fair_odds(0.0).is_none());
        assert_eq!(expected_value(0.0, 5.0), -1.0);
    }
}
