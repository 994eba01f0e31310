use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use expected_standings::analysis::performance;
use expected_standings::data_loader::load_stats_csv;
use expected_standings::league::LeagueSnapshot;
use expected_standings::leaders::stat_leaders;
use expected_standings::ranking::expected_points;
use expected_standings::report::*;
use expected_standings::scoreboard::load_scoreboards;
use expected_standings::standings::merge_standings;
use expected_standings::RankingContext;

/*
    Three steps, each reading the previous one's output:
    extract   saved weekly scoreboards  -> stats_<season>.csv
    standings stats + league snapshot   -> standings_<season>.csv
    leaders   stats                     -> leaders_<season>.csv
*/

#[derive(Parser)]
#[command(
    name = "expected-standings",
    version,
    about = "Fantasy league standings with expected points"
)]
struct Args {
    /// Configuration file (TOML). Defaults plus environment when absent.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Season year, used in the default file names
    #[arg(long)]
    season: Option<i32>,

    /// Directory for the CSV files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn saved week_<n>.json scoreboards into the stats CSV
    Extract {
        /// Directory holding week_<n>.json files
        #[arg(long, value_name = "DIR")]
        scoreboards: PathBuf,

        /// Skip weeks from this one on (first incomplete week)
        #[arg(long)]
        current_week: Option<u32>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Expected points merged with the live standings
    Standings {
        /// League snapshot JSON (current_week + standings)
        #[arg(long, value_name = "FILE")]
        league: PathBuf,

        #[arg(long, value_name = "FILE")]
        stats: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the table and the luck analysis
        #[arg(short, long)]
        verbose: bool,
    },

    /// Weekly stat leaders for every week in the stats CSV
    Leaders {
        #[arg(long, value_name = "FILE")]
        stats: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn load_context(args: &Args) -> Result<RankingContext> {
    let mut context = match &args.config {
        Some(path) => RankingContext::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => RankingContext::from_env()?,
    };

    if let Some(season) = args.season {
        context.season = season;
    }
    if let Some(dir) = &args.data_dir {
        context.data_dir = dir.clone();
    }
    if let Some(level) = &args.log_level {
        context.log_level = level.clone();
    }
    if args.debug {
        context.log_level = "debug".to_string();
    }

    Ok(context)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let context = load_context(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });
    init_logging(&context.log_level)?;

    let categories = context.category_table()?;
    info!("Season {}, {} categories", context.season, categories.len());

    match args.command {
        Command::Extract { scoreboards, current_week, output } => {
            info!("Loaded {} team name mappings", context.team_name_mapping.len());
            let records = load_scoreboards(
                &scoreboards,
                current_week,
                &categories,
                &context.team_name_mapping,
            )
            .with_context(|| format!("reading scoreboards from {}", scoreboards.display()))?;

            if records.is_empty() {
                tracing::warn!("No stats to export");
                return Ok(());
            }
            export_stats(&output.unwrap_or_else(|| context.stats_file()), &records, &categories)?;
        }

        Command::Standings { league, stats, output, verbose } => {
            let stats = stats.unwrap_or_else(|| context.stats_file());
            let records = load_stats_csv(&stats, &categories, &context.team_name_mapping)
                .with_context(|| format!("loading stats from {}", stats.display()))?;
            let snapshot = LeagueSnapshot::load(&league)
                .with_context(|| format!("loading league snapshot from {}", league.display()))?;

            let rows = expected_points(&records, &categories, snapshot.current_week)?;
            let merged = merge_standings(rows, &snapshot);

            let output = output.unwrap_or_else(|| context.standings_file());
            export_standings(&output, &merged, &categories)?;

            if verbose {
                print_standings(&merged);
                print_performance(&performance(&merged));
            }
        }

        Command::Leaders { stats, output, verbose } => {
            let stats = stats.unwrap_or_else(|| context.stats_file());
            let records = load_stats_csv(&stats, &categories, &context.team_name_mapping)
                .with_context(|| format!("loading stats from {}", stats.display()))?;

            let leaders = stat_leaders(&records, &categories)?;
            export_leaders(&output.unwrap_or_else(|| context.leaders_file()), &leaders)?;

            if verbose {
                print_leaders(&leaders);
            }
        }
    }

    Ok(())
}
