use std::path::PathBuf;

use scoreline::calibration::Outcome;
use scoreline::config::ModelConfig;
use scoreline::league_params;
use scoreline::stats;
use scoreline::value::{self, BookOdds};
use scoreline::{ModelError, predict, predict_with};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn arsenal_at_home_to_liverpool() {
    let teams = stats::load_teams(&fixture("teams.json")).expect("fixture should parse");
    let pl = league_params::preset("PL").unwrap();
    let r = predict(&teams[&1], &teams[&3], &pl).unwrap();

    assert!((r.strengths.home_attack - 1.477).abs() < 1e-3);
    assert!((r.strengths.away_defense - 0.794).abs() < 1e-3);
    assert!((r.home_xg - 1.853).abs() < 2e-3);

    let p = r.probabilities;
    assert!(p.home_win > p.away_win);
    assert!(p.home_win + p.draw + p.away_win <= 1.0 + 1e-12);
    assert!((p.over + p.under - 1.0).abs() <= f64::EPSILON);
    assert_eq!(r.score_matrix.dim(), 6);
    assert_eq!(r.most_likely_scores.len(), 5);
    assert!(
        r.most_likely_scores
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability)
    );
}

#[test]
fn promoted_side_without_matches_is_rejected() {
    let teams = stats::load_teams(&fixture("teams.json")).unwrap();
    let pl = league_params::preset("PL").unwrap();
    let err = predict(&teams[&5], &teams[&2], &pl).unwrap_err();
    match err {
        ModelError::InvalidStatistics { team, field, .. } => {
            assert_eq!(team, "Promoted FC (5)");
            assert_eq!(field, "homeMatches");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn different_line_moves_over_probability() {
    let teams = stats::load_teams(&fixture("teams.json")).unwrap();
    let pl = league_params::preset("PL").unwrap();
    let base = predict(&teams[&2], &teams[&4], &pl).unwrap();
    let cfg = ModelConfig {
        over_under_line: 3.5,
        ..ModelConfig::default()
    };
    let higher = predict_with(&teams[&2], &teams[&4], &pl, &cfg).unwrap();
    assert_eq!(higher.over_under_line, 3.5);
    assert!(higher.probabilities.over < base.probabilities.over);
    assert_eq!(higher.probabilities.home_win, base.probabilities.home_win);
}

#[test]
fn value_bets_use_prediction_markets() {
    let teams = stats::load_teams(&fixture("teams.json")).unwrap();
    let pl = league_params::preset("PL").unwrap();
    let r = predict(&teams[&1], &teams[&4], &pl).unwrap();
    let odds = BookOdds {
        home: 4.0,
        draw: 3.4,
        away: 3.8,
    };
    let bets = value::find_value(&r.probabilities, &odds, &ModelConfig::default()).unwrap();
    let home = bets
        .iter()
        .find(|b| b.selection == Outcome::Home)
        .unwrap();
    assert!((home.expected_value - (r.probabilities.home_win * 4.0 - 1.0)).abs() < 1e-12);
    assert!(home.is_value);
}

#[test]
fn prediction_serializes_for_presentation() {
    let teams = stats::load_teams(&fixture("teams.json")).unwrap();
    let pl = league_params::preset("PL").unwrap();
    let r = predict(&teams[&1], &teams[&2], &pl).unwrap();
    let v = serde_json::to_value(&r).unwrap();
    assert!(v.get("probabilities").and_then(|p| p.get("btts")).is_some());
    assert!(v.get("homeXG").and_then(|x| x.as_f64()).is_some());
    assert_eq!(
        v.get("mostLikelyScores").and_then(|s| s.as_array()).map(|a| a.len()),
        Some(5)
    );
}
