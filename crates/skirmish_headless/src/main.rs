//! Headless battle runner.
//!
//! Fights battles without a renderer and prints JSON reports, for
//! balance sweeps and CI determinism checks.
//!
//! ```bash
//! # One battle of the built-in mirror match
//! cargo run -p skirmish_headless -- run --seed 42
//!
//! # A custom matchup from a RON file
//! cargo run -p skirmish_headless -- run --scenario matchups/cavalry_screen.ron
//!
//! # Sweep 500 seeds and aggregate win rates
//! cargo run -p skirmish_headless -- batch --count 500 --output results/
//! ```
//!
//! Reports go to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skirmish_headless::batch::{run_batch, BatchConfig};
use skirmish_headless::runner::{run_battle, DEFAULT_MAX_TICKS};
use skirmish_headless::scenario::Scenario;

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless battle runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fight one battle and print its report as JSON
    Run {
        /// Scenario RON file (defaults to the built-in mirror match)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Tick cap (60 ticks = 1 second of battle time)
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Fight many seeds of one scenario and aggregate win rates
    Batch {
        /// Scenario RON file (defaults to the built-in mirror match)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of battles
        #[arg(short, long, default_value = "100")]
        count: u64,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick cap per battle
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Output directory for batch_results.json
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            max_ticks,
            pretty,
        } => cmd_run(scenario, seed, max_ticks, pretty),
        Commands::Batch {
            scenario,
            count,
            seed,
            max_ticks,
            output,
        } => cmd_batch(scenario, count, seed, max_ticks, output),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading scenario");
            Ok(Scenario::load(p)?)
        }
        None => Ok(Scenario::default()),
    }
}

fn cmd_run(
    scenario: Option<PathBuf>,
    seed: u64,
    max_ticks: u64,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = load_scenario(scenario)?;
    let report = run_battle(&scenario, seed, max_ticks)?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn cmd_batch(
    scenario: Option<PathBuf>,
    count: u64,
    seed: u64,
    max_ticks: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = load_scenario(scenario)?;
    let config = BatchConfig {
        game_count: count,
        seed_start: seed,
        max_ticks,
        output_dir: output.clone(),
    };

    let results = run_batch(&scenario, &config)?;

    let results_path = output.join("batch_results.json");
    results.save(&results_path)?;

    let s = &results.summary;
    eprintln!("\nBATCH COMPLETE");
    eprintln!("Battles: {} ({} unresolved)", results.games.len(), s.unresolved);
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Red win rate:  {:.1}%", s.red_win_rate * 100.0);
    eprintln!("Blue win rate: {:.1}%", s.blue_win_rate * 100.0);
    if s.draws > 0 {
        eprintln!("Draws: {}", s.draws);
    }
    eprintln!("Average battle length: {:.0} ticks", s.average_ticks);
    eprintln!("Results saved to: {}", results_path.display());

    Ok(())
}
