//! Canned battle sessions and the synthetic clock.
//!
//! Cooldowns are wall-clock-gated, so tests drive sessions with a
//! [`Clock`] that advances a fixed 60 FPS frame per tick. Identical
//! clock sequences plus identical seeds give identical battles.

use skirmish_core::config::BattleConfig;
use skirmish_core::math::Vec2;
use skirmish_core::session::{BattlePhase, BattleSession};
use skirmish_core::units::{Team, UnitKind};

/// Milliseconds per synthetic frame (60 FPS).
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// Synthetic wall clock advancing one frame per tick.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    now: f64,
}

impl Clock {
    /// Clock starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Current time in milliseconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance one frame and return the new time.
    pub fn tick(&mut self) -> f64 {
        self.now += FRAME_MS;
        self.now
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Soldier-vs-soldier duel, already started at t=0.
#[must_use]
pub fn duel_session() -> BattleSession {
    let mut session = BattleSession::new(BattleConfig::default());
    session
        .place_unit(Vec2::new(300.0, 400.0), Team::Red, UnitKind::Soldier)
        .expect("placement");
    session
        .place_unit(Vec2::new(900.0, 400.0), Team::Blue, UnitKind::Soldier)
        .expect("placement");
    session.start(0.0).expect("start");
    session
}

/// Mirrored mixed armies (all five kinds cycled), started at t=0.
///
/// The layout is a column per 16 units so any army size places
/// without overlap.
#[must_use]
pub fn mixed_session(per_team: usize, seed: u64) -> BattleSession {
    let config = BattleConfig::new(1200.0, 800.0).with_seed(seed);
    let mut session = BattleSession::new(config);

    for i in 0..per_team {
        let kind = UnitKind::ALL[i % UnitKind::ALL.len()];
        let row = (i % 16) as f32;
        let col = (i / 16) as f32;
        let y = 70.0 + row * 42.0;
        let x_off = col * 45.0;
        session
            .place_unit(Vec2::new(120.0 + x_off, y), Team::Red, kind)
            .expect("red placement");
        session
            .place_unit(Vec2::new(1080.0 - x_off, y), Team::Blue, kind)
            .expect("blue placement");
    }

    session.start(0.0).expect("start");
    session
}

/// Tick a session until it completes or `max_ticks` elapse.
///
/// Returns the number of ticks executed.
pub fn run_to_completion(session: &mut BattleSession, max_ticks: u64) -> u64 {
    let mut clock = Clock::new();
    for i in 0..max_ticks {
        if session.phase() != BattlePhase::Running {
            return i;
        }
        session.tick(clock.tick());
    }
    max_ticks
}
