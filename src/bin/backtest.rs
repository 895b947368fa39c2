use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scoreline::backtest::{self, BacktestReport};
use scoreline::config::ModelConfig;
use scoreline::league_params;
use scoreline::stats;
use scoreline::synthetic;

/// Replays the scoreline model over finished matches and reports hit rates for the
/// 1X2, BTTS and over/under markets. No network access; inputs are local JSON files.
#[derive(Parser)]
#[command(name = "backtest")]
struct Args {
    /// JSON array of team stats
    #[arg(long)]
    teams: PathBuf,
    /// JSON array of finished matches; required unless --synthetic-legs is set
    #[arg(long)]
    matches: Option<PathBuf>,
    /// Generate a seeded synthetic season instead of reading --matches
    #[arg(long)]
    synthetic_legs: Option<usize>,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    #[arg(long)]
    league: String,
    #[arg(long)]
    leagues: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print every evaluated match
    #[arg(long)]
    verbose: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = ModelConfig::resolve(args.config.as_deref())?;

    let table = args
        .leagues
        .as_deref()
        .map(league_params::load_leagues)
        .transpose()?;
    let league = league_params::resolve(&args.league, table.as_ref())
        .with_context(|| format!("unknown league {}", args.league))?;
    let teams = stats::load_teams(&args.teams)?;

    let matches = match (args.synthetic_legs, args.matches.as_deref()) {
        (Some(legs), _) => {
            let mut roster = teams.values().cloned().collect::<Vec<_>>();
            roster.sort_by_key(|t| t.id);
            synthetic::season(&roster, &league, legs, args.seed)?
        }
        (None, Some(path)) => stats::load_history(path)?,
        (None, None) => return Err(anyhow!("pass --matches or --synthetic-legs")),
    };

    let report = backtest::evaluate_with(&matches, &teams, &league, &cfg)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&league.name, &cfg, &report, args.verbose);
    Ok(())
}

fn print_report(league: &str, cfg: &ModelConfig, report: &BacktestReport, verbose: bool) {
    println!("Backtest: {league}");
    println!(
        "Matches: {} evaluated, {} skipped, {} neutral fallbacks",
        report.evaluated(),
        report.skipped.len(),
        report.fallbacks()
    );

    match report.accuracy {
        Some(acc) => {
            println!("1X2 accuracy:      {:.1}%", acc.outcome);
            println!("BTTS accuracy:     {:.1}%", acc.btts);
            println!(
                "O/U {} accuracy:  {:.1}%",
                cfg.over_under_line, acc.over_under
            );
        }
        None => println!("No matches evaluated."),
    }
    if let Some(m) = report.metrics {
        println!("Brier: {:.4}  log-loss: {:.4}", m.brier, m.log_loss);
    }
    for curve in &report.reliability {
        let buckets: Vec<String> = curve
            .bins
            .iter()
            .filter(|b| b.count > 0)
            .map(|b| {
                format!(
                    "{:.0}-{:.0}%: {:.0}% of {}",
                    b.bucket_start * 100.0,
                    b.bucket_end * 100.0,
                    b.actual_rate * 100.0,
                    b.count
                )
            })
            .collect();
        println!("{:?} reliability  {}", curve.outcome, buckets.join("  "));
    }

    for s in &report.skipped {
        println!("skipped match {}: {}", s.match_id, s.error);
    }

    if verbose {
        println!();
        for r in &report.results {
            let m = &r.match_;
            let flag = |ok: bool| if ok { "ok" } else { "--" };
            println!(
                "{} {} vs {}  {}-{}  pick={:?} 1X2={} BTTS={} O/U={}",
                m.fixture.utc_date.format("%Y-%m-%d"),
                m.fixture.home_team.name,
                m.fixture.away_team.name,
                m.home_goals,
                m.away_goals,
                r.predicted_outcome,
                flag(r.is_outcome_correct),
                flag(r.is_btts_correct),
                flag(r.is_over_correct),
            );
        }
    }
}
