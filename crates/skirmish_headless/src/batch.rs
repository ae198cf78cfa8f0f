//! Batch battle runner for balance sweeps.
//!
//! Fights the same scenario across a range of seeds in parallel with
//! rayon and aggregates win rates. Seeds are `seed_start..seed_start
//! + game_count`, so a sweep is reproducible from its config alone.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use skirmish_core::units::Team;

use crate::runner::{run_battle, BattleReport, DEFAULT_MAX_TICKS};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of battles to fight.
    pub game_count: u64,
    /// First seed; battle `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick cap per battle.
    pub max_ticks: u64,
    /// Where to write `batch_results.json`.
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            output_dir: PathBuf::from("results"),
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Scenario name.
    pub scenario: String,
    /// Individual battle reports.
    pub games: Vec<BattleReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime of the sweep.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Battles that resolved before the tick cap.
    pub completed: u64,
    /// Battles that hit the cap.
    pub unresolved: u64,
    /// Red victories.
    pub red_wins: u64,
    /// Blue victories.
    pub blue_wins: u64,
    /// Mutual annihilation (no winner despite completion).
    pub draws: u64,
    /// Red win rate over completed battles.
    pub red_win_rate: f64,
    /// Blue win rate over completed battles.
    pub blue_win_rate: f64,
    /// Mean ticks of completed battles.
    pub average_ticks: f64,
    /// Mean kills per battle.
    pub average_kills: f64,
    /// Largest single hit across the whole sweep.
    pub highest_hit: i32,
}

impl BatchSummary {
    fn from_games(games: &[BattleReport]) -> Self {
        let completed: Vec<&BattleReport> = games.iter().filter(|g| g.completed).collect();
        let red_wins = completed
            .iter()
            .filter(|g| g.winner == Some(Team::Red))
            .count() as u64;
        let blue_wins = completed
            .iter()
            .filter(|g| g.winner == Some(Team::Blue))
            .count() as u64;
        let draws = completed.len() as u64 - red_wins - blue_wins;
        let denom = completed.len().max(1) as f64;

        Self {
            completed: completed.len() as u64,
            unresolved: games.len() as u64 - completed.len() as u64,
            red_wins,
            blue_wins,
            draws,
            red_win_rate: red_wins as f64 / denom,
            blue_win_rate: blue_wins as f64 / denom,
            average_ticks: completed.iter().map(|g| g.ticks as f64).sum::<f64>() / denom,
            average_kills: games.iter().map(|g| f64::from(g.total_kills)).sum::<f64>()
                / games.len().max(1) as f64,
            highest_hit: games.iter().map(|g| g.highest_hit).max().unwrap_or(0),
        }
    }
}

/// Run a batch of battles in parallel.
///
/// The scenario is validated once up front, so the per-seed runs
/// cannot fail individually.
pub fn run_batch(scenario: &Scenario, config: &BatchConfig) -> Result<BatchResults, ScenarioError> {
    // Surface placement errors before spinning up the pool.
    scenario.build_session(config.seed_start)?;

    tracing::info!(
        scenario = %scenario.name,
        games = config.game_count,
        seed_start = config.seed_start,
        "starting batch sweep"
    );
    let start = Instant::now();

    let games: Vec<BattleReport> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            run_battle(scenario, config.seed_start + i, config.max_ticks)
                .expect("scenario validated before sweep")
        })
        .collect();

    let summary = BatchSummary::from_games(&games);
    tracing::info!(
        red_win_rate = summary.red_win_rate,
        blue_win_rate = summary.blue_win_rate,
        unresolved = summary.unresolved,
        "batch sweep finished"
    );

    Ok(BatchResults {
        config: config.clone(),
        scenario: scenario.name.clone(),
        games,
        summary,
        duration_seconds: start.elapsed().as_secs_f64(),
    })
}
