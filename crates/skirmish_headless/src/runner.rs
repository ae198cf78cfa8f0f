//! Single-battle runner.
//!
//! Drives a session with a synthetic 60 FPS clock until one army is
//! eliminated or the tick cap is hit, then summarizes the outcome.

use serde::{Deserialize, Serialize};

use skirmish_core::session::BattlePhase;
use skirmish_core::units::Team;

use crate::scenario::{Scenario, ScenarioError};

/// Milliseconds per synthetic frame (60 FPS).
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Default tick cap: ten minutes of simulated time.
pub const DEFAULT_MAX_TICKS: u64 = 10 * 60 * 60;

/// Outcome of one headless battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleReport {
    /// Scenario name.
    pub scenario: String,
    /// Seed used for this run.
    pub seed: u64,
    /// Winner, if the battle resolved.
    pub winner: Option<Team>,
    /// Whether the battle resolved before the tick cap.
    pub completed: bool,
    /// Ticks executed.
    pub ticks: u64,
    /// Simulated battle time in milliseconds.
    pub elapsed_ms: f64,
    /// Total units removed from the field.
    pub total_kills: u32,
    /// Largest single hit landed.
    pub highest_hit: i32,
    /// Red units still standing.
    pub red_survivors: usize,
    /// Blue units still standing.
    pub blue_survivors: usize,
}

/// Fight one scenario to completion (or the tick cap).
pub fn run_battle(
    scenario: &Scenario,
    seed: u64,
    max_ticks: u64,
) -> Result<BattleReport, ScenarioError> {
    let mut session = scenario.build_session(seed)?;

    let mut now = 0.0;
    let mut ticks = 0;
    while session.phase() == BattlePhase::Running && ticks < max_ticks {
        now += FRAME_MS;
        session.tick(now);
        ticks += 1;
        // Nothing renders these, so drop them every frame.
        session.events_mut().clear();
    }

    let stats = session.stats();
    let completed = session.phase() == BattlePhase::Complete;
    if completed {
        tracing::info!(seed, winner = ?stats.winner, ticks, "battle resolved");
    } else {
        tracing::warn!(seed, ticks, "battle hit tick cap unresolved");
    }

    Ok(BattleReport {
        scenario: scenario.name.clone(),
        seed,
        winner: stats.winner,
        completed,
        ticks,
        elapsed_ms: stats.elapsed_ms,
        total_kills: stats.total_kills,
        highest_hit: stats.highest_hit,
        red_survivors: stats.red_alive,
        blue_survivors: stats.blue_alive,
    })
}
