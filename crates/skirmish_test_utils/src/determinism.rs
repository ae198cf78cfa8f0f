//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Battles must replay exactly when driven the same way. The inputs
//! that matter are:
//!
//! - **The clock sequence**: cooldowns gate on caller-provided
//!   wall-clock milliseconds, so tests drive sessions with the
//!   synthetic [`crate::fixtures::Clock`] rather than real time.
//!
//! - **The PRNG seed**: musket accuracy rolls come from a seeded
//!   ChaCha stream owned by the session; same seed, same misses.
//!
//! - **Iteration order**: units act in placement order and the
//!   collection stays sorted by id, so no hash-map iteration can leak
//!   into the schedule.
//!
//! Frame-rate *variation* is explicitly not reproducible (cooldowns
//! are wall-clock-gated); determinism claims always assume an
//! identical clock sequence.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use skirmish_core::session::BattleSession;

use crate::fixtures::Clock;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the battle produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance one tick
/// * `hash` - Function to compute a state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for [`BattleSession`].
///
/// Runs the session twice under the synthetic clock and verifies the
/// final state hashes match exactly.
pub fn verify_session_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> BattleSession,
{
    let result = verify_determinism(
        2,
        num_ticks,
        || (setup_fn(), Clock::new()),
        |(session, clock)| {
            session.tick(clock.tick());
        },
        |(session, _)| session.state_hash(),
    );
    result.is_deterministic
}

/// Compare two session runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match, `Some(tick)` at the first differing tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> BattleSession,
{
    let mut a = setup_fn();
    let mut b = setup_fn();
    let mut clock_a = Clock::new();
    let mut clock_b = Clock::new();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick(clock_a.tick());
        b.tick(clock_b.tick());

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that serialization round-trip preserves session state exactly.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> BattleSession,
{
    let mut session = setup_fn();
    let mut clock = Clock::new();

    for _ in 0..num_ticks {
        session.tick(clock.tick());
    }

    let hash_before = session.state_hash();

    let bytes = match session.serialize() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let restored = match BattleSession::deserialize(&bytes) {
        Ok(s) => s,
        Err(_) => return false,
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle testing.
///
/// Placements come from a coarse grid so random armies never trip the
/// overlap rejection.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::math::Vec2;
    use skirmish_core::units::{Team, UnitKind};

    /// Columns in the placement grid (per team).
    pub const GRID_COLS: u8 = 4;
    /// Rows in the placement grid.
    pub const GRID_ROWS: u8 = 14;

    /// Generate a unit kind.
    pub fn arb_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::Soldier),
            Just(UnitKind::Tank),
            Just(UnitKind::Healer),
            Just(UnitKind::Musketeer),
            Just(UnitKind::Cavalry),
        ]
    }

    /// Generate a team.
    pub fn arb_team() -> impl Strategy<Value = Team> {
        prop_oneof![Just(Team::Red), Just(Team::Blue)]
    }

    /// Grid slot index for one team's side.
    pub fn arb_slot() -> impl Strategy<Value = u8> {
        0..GRID_COLS * GRID_ROWS
    }

    /// Map a grid slot to battlefield coordinates for a team
    /// (defaults assume the 1200x800 battlefield).
    #[must_use]
    pub fn slot_position(slot: u8, team: Team) -> Vec2 {
        let col = f32::from(slot / GRID_ROWS);
        let row = f32::from(slot % GRID_ROWS);
        let y = 70.0 + row * 46.0;
        match team {
            Team::Red => Vec2::new(110.0 + col * 48.0, y),
            Team::Blue => Vec2::new(1090.0 - col * 48.0, y),
        }
    }

    /// One army: distinct grid slots with a kind each.
    pub fn arb_army(max_units: usize) -> impl Strategy<Value = Vec<(u8, UnitKind)>> {
        proptest::collection::hash_map(arb_slot(), arb_kind(), 1..max_units)
            .prop_map(|m| {
                let mut v: Vec<(u8, UnitKind)> = m.into_iter().collect();
                v.sort_by_key(|(slot, _)| *slot);
                v
            })
    }

    /// PRNG seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{duel_session, mixed_session, run_to_completion};
    use proptest::prelude::*;
    use skirmish_core::config::BattleConfig;
    use skirmish_core::session::{BattlePhase, BattleSession};
    use skirmish_core::units::Team;
    use strategies::slot_position;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_duel_determinism() {
        assert!(verify_session_determinism(duel_session, 600));
    }

    #[test]
    fn test_mixed_battle_determinism() {
        // Cavalry and musketeers exercise the PRNG and the charge machine.
        assert!(verify_session_determinism(|| mixed_session(10, 7), 900));
    }

    #[test]
    fn test_find_divergence_on_identical_runs() {
        let divergence = find_first_divergence(|| mixed_session(6, 3), 300);
        assert!(divergence.is_none(), "diverged at tick {divergence:?}");
    }

    #[test]
    fn test_different_seeds_eventually_diverge() {
        // Musket misses differ between seeds, which shifts damage
        // timing and everything downstream of it.
        let mut a = mixed_session(10, 1);
        let mut b = mixed_session(10, 2);
        let mut clock_a = Clock::new();
        let mut clock_b = Clock::new();
        for _ in 0..1_200 {
            a.tick(clock_a.tick());
            b.tick(clock_b.tick());
        }
        assert_ne!(
            a.state_hash(),
            b.state_hash(),
            "different seeds should not replay identically"
        );
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_fresh_session() {
        assert!(verify_serialization_determinism(duel_session, 0));
    }

    #[test]
    fn test_serialization_preserves_mid_battle_state() {
        assert!(verify_serialization_determinism(|| mixed_session(8, 11), 250));
    }

    #[test]
    fn test_serialized_session_continues_identically() {
        let mut original = mixed_session(8, 5);
        let mut clock = Clock::new();
        for _ in 0..200 {
            original.tick(clock.tick());
        }

        let bytes = original.serialize().unwrap();
        let mut resumed = BattleSession::deserialize(&bytes).unwrap();

        let mut resumed_clock = clock;
        for _ in 0..200 {
            original.tick(clock.tick());
            resumed.tick(resumed_clock.tick());
        }
        assert_eq!(original.state_hash(), resumed.state_hash());
    }

    // =========================================================================
    // Replay via snapshot restore
    // =========================================================================

    #[test]
    fn test_restore_replays_identical_battle() {
        let mut session = mixed_session(8, 13);

        let mut first_hashes = Vec::new();
        let mut clock = Clock::new();
        for _ in 0..400 {
            session.tick(clock.tick());
            first_hashes.push(session.state_hash());
        }

        session.restore().unwrap();
        session.start(0.0).unwrap();

        let mut clock = Clock::new();
        for expected in first_hashes {
            session.tick(clock.tick());
            assert_eq!(session.state_hash(), expected);
        }
    }

    // =========================================================================
    // Property-based tests
    // =========================================================================

    proptest! {
        /// Any random army layout must replay identically under the
        /// same seed and clock.
        #[test]
        fn prop_random_armies_are_deterministic(
            red in strategies::arb_army(12),
            blue in strategies::arb_army(12),
            seed in strategies::arb_seed(),
        ) {
            let red = red.clone();
            let blue = blue.clone();
            let setup = move || {
                let config = BattleConfig::new(1200.0, 800.0).with_seed(seed);
                let mut session = BattleSession::new(config);
                for (slot, kind) in &red {
                    session
                        .place_unit(slot_position(*slot, Team::Red), Team::Red, *kind)
                        .expect("red placement");
                }
                for (slot, kind) in &blue {
                    session
                        .place_unit(slot_position(*slot, Team::Blue), Team::Blue, *kind)
                        .expect("blue placement");
                }
                session.start(0.0).expect("start");
                session
            };

            prop_assert!(verify_session_determinism(setup, 200));
        }

        /// Serialization round-trips exactly at any point in a battle.
        #[test]
        fn prop_serialization_roundtrip_is_exact(
            per_team in 2usize..8,
            ticks in 0u64..300,
            seed in strategies::arb_seed(),
        ) {
            prop_assert!(verify_serialization_determinism(
                move || mixed_session(per_team, seed),
                ticks,
            ));
        }
    }

    // =========================================================================
    // Stress tests (only run explicitly with --ignored)
    // =========================================================================

    #[test]
    #[ignore = "Long-running stress test"]
    fn stress_large_battle_determinism() {
        let result = verify_determinism(
            5,
            5_000,
            || (mixed_session(60, 99), Clock::new()),
            |(session, clock)| session.tick(clock.tick()),
            |(session, _)| session.state_hash(),
        );
        result.assert_deterministic();
    }

    #[test]
    #[ignore = "Long-running stress test"]
    fn stress_battles_always_complete() {
        for seed in 0..20 {
            let mut session = mixed_session(20, seed);
            run_to_completion(&mut session, 200_000);
            assert_eq!(session.phase(), BattlePhase::Complete, "seed {seed} stalled");
        }
    }
}
