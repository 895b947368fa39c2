use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scoreline::config::ModelConfig;
use scoreline::engine::PredictionResult;
use scoreline::league_params;
use scoreline::settle::{self, Pick};
use scoreline::stats::{self, TeamStats};
use scoreline::value::{self, BookOdds};

#[derive(Parser)]
#[command(name = "scoreline")]
#[command(about = "Poisson scoreline predictions from season team statistics")]
struct Cli {
    /// JSON model config; `SCORELINE_*` env vars override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict one fixture
    Predict {
        /// JSON array of team stats
        #[arg(long)]
        teams: PathBuf,
        #[arg(long)]
        home: u32,
        #[arg(long)]
        away: u32,
        /// League id, e.g. PL
        #[arg(long)]
        league: String,
        /// JSON league table keyed by id; built-in presets are used otherwise
        #[arg(long)]
        leagues: Option<PathBuf>,
        /// Decimal 1X2 odds as home,draw,away
        #[arg(long)]
        odds: Option<String>,
        /// Print the full prediction as JSON
        #[arg(long)]
        json: bool,
    },
    /// List built-in league baselines
    Leagues,
    /// Grade a saved pick against a final score
    Settle {
        /// Market label: 1X2, BTTS or O/U
        #[arg(long)]
        market: String,
        /// Pick label, e.g. Home, YES, "OVER 2.5"
        #[arg(long)]
        pick: String,
        /// Final score as home-away; omit for an unplayed fixture
        #[arg(long)]
        score: Option<String>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = ModelConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Predict {
            teams,
            home,
            away,
            league,
            leagues,
            odds,
            json,
        } => {
            let table = leagues
                .as_deref()
                .map(league_params::load_leagues)
                .transpose()?;
            let league = league_params::resolve(&league, table.as_ref())
                .with_context(|| format!("unknown league {league}"))?;
            let lookup = stats::load_teams(&teams)?;
            let home = find_team(&lookup, home)?;
            let away = find_team(&lookup, away)?;

            let prediction = scoreline::predict_with(home, away, &league, &cfg)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                print_prediction(home, away, &prediction);
            }

            if let Some(raw) = odds {
                let odds = parse_odds(&raw)?;
                println!();
                println!("Value (edge > {:.1}%)", cfg.value_edge_threshold * 100.0);
                for bet in value::find_value(&prediction.probabilities, &odds, &cfg)? {
                    println!(
                        "  {:<5} odds={:.2} fair={} ev={:+.1}%{}",
                        format!("{:?}", bet.selection),
                        bet.odds,
                        bet.fair_odds
                            .map(|o| format!("{o:.2}"))
                            .unwrap_or_else(|| "-".to_string()),
                        bet.expected_value * 100.0,
                        if bet.is_value { "  VALUE" } else { "" }
                    );
                }
            }
        }
        Commands::Leagues => {
            for l in league_params::presets() {
                println!(
                    "{:<4} {:<22} home={:.2} away={:.2}  {}",
                    l.id,
                    l.name,
                    l.avg_home_goals,
                    l.avg_away_goals,
                    l.best_markets.join(", ")
                );
            }
        }
        Commands::Settle {
            market,
            pick,
            score,
        } => {
            let pick = Pick::parse(&market, &pick)?;
            let score = score.as_deref().map(parse_score).transpose()?;
            println!("{pick} -> {:?}", settle::status(pick, score));
        }
    }

    Ok(())
}

fn find_team(
    lookup: &std::collections::HashMap<u32, TeamStats>,
    id: u32,
) -> Result<&TeamStats> {
    lookup
        .get(&id)
        .ok_or_else(|| anyhow!("team {id} not found in stats file"))
}

fn parse_odds(raw: &str) -> Result<BookOdds> {
    let parts = raw
        .split([',', ';', ' '])
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .context("odds must be numbers")?;
    match parts.as_slice() {
        [home, draw, away] => Ok(BookOdds {
            home: *home,
            draw: *draw,
            away: *away,
        }),
        _ => Err(anyhow!(
            "expected three odds (home,draw,away), got {}",
            parts.len()
        )),
    }
}

fn parse_score(raw: &str) -> Result<(u32, u32)> {
    let (home, away) = raw
        .split_once(['-', ':'])
        .ok_or_else(|| anyhow!("score must look like 2-1, got {raw}"))?;
    let home = home.trim().parse().context("home goals")?;
    let away = away.trim().parse().context("away goals")?;
    Ok((home, away))
}

fn print_prediction(home: &TeamStats, away: &TeamStats, p: &PredictionResult) {
    let m = &p.probabilities;
    println!("{} vs {}", home.name, away.name);
    println!("xG: {:.2} - {:.2}", p.home_xg, p.away_xg);
    println!(
        "1X2: {:.1}% / {:.1}% / {:.1}%",
        m.home_win * 100.0,
        m.draw * 100.0,
        m.away_win * 100.0
    );
    println!("BTTS: {:.1}%", m.btts * 100.0);
    println!(
        "Over {0}: {1:.1}%  Under {0}: {2:.1}%",
        p.over_under_line,
        m.over * 100.0,
        m.under * 100.0
    );
    println!("Most likely:");
    for s in &p.most_likely_scores {
        println!("  {:<5} {:.1}%", s.to_string(), s.probability * 100.0);
    }
}
