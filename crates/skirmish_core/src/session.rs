//! Battle lifecycle and the per-tick scheduler.
//!
//! A [`BattleSession`] owns every piece of battle state: the unit
//! collection in placement order, the placement snapshot, the visual
//! event queues, aggregate statistics, and the seeded PRNG. Hosts
//! drive it with their own clock:
//!
//! ```
//! use skirmish_core::prelude::*;
//!
//! let mut session = BattleSession::new(BattleConfig::default());
//! session.place_unit(Vec2::new(200.0, 400.0), Team::Red, UnitKind::Soldier).unwrap();
//! session.place_unit(Vec2::new(900.0, 400.0), Team::Blue, UnitKind::Soldier).unwrap();
//! session.start(0.0).unwrap();
//!
//! let mut now = 0.0;
//! while session.phase() == BattlePhase::Running {
//!     session.tick(now);
//!     now += 1000.0 / 60.0;
//! }
//! assert!(session.winner().is_some());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{BattleConfig, BASE_UNIT_RADIUS};
use crate::error::{BattleError, Result};
use crate::events::{DamageText, EventQueues, MeleeFlash, EVENT_LIFE};
use crate::math::Vec2;
use crate::separation::resolve_separation;
use crate::snapshot::ArmySnapshot;
use crate::units::{
    self, Behavior, SpecTable, StepAction, StepCtx, Team, Unit, UnitId, UnitKind, UnitView,
};

/// Battle lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Units are being placed; the clock is not running.
    Setup,
    /// The battle is ticking.
    Running,
    /// Frozen mid-battle; timestamps are retained.
    Paused,
    /// One side has been eliminated.
    Complete,
}

/// Aggregate battle statistics, cheap to copy out every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    /// Living red units.
    pub red_alive: usize,
    /// Living blue units.
    pub blue_alive: usize,
    /// Milliseconds of running battle time.
    pub elapsed_ms: f64,
    /// Units killed since the battle started.
    pub total_kills: u32,
    /// Largest single hit landed.
    pub highest_hit: i32,
    /// Winning team once the battle completes.
    pub winner: Option<Team>,
}

/// An owned battle: placement, scheduling, events, and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSession {
    config: BattleConfig,
    specs: SpecTable,
    units: Vec<Unit>,
    next_id: u32,
    snapshot: Option<ArmySnapshot>,
    events: EventQueues,
    phase: BattlePhase,
    winner: Option<Team>,
    total_kills: u32,
    highest_hit: i32,
    elapsed_ms: f64,
    last_tick: Option<f64>,
    rng: ChaCha8Rng,
}

impl BattleSession {
    /// Create an empty session in the setup phase.
    #[must_use]
    pub fn new(config: BattleConfig) -> Self {
        Self::with_specs(config, SpecTable::default())
    }

    /// Create a session with a custom stat table.
    #[must_use]
    pub fn with_specs(config: BattleConfig, specs: SpecTable) -> Self {
        Self {
            config,
            specs,
            units: Vec::new(),
            next_id: 0,
            snapshot: None,
            events: EventQueues::new(),
            phase: BattlePhase::Setup,
            winner: None,
            total_kills: 0,
            highest_hit: 0,
            elapsed_ms: 0.0,
            last_tick: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Place a unit during setup.
    ///
    /// Rejects positions whose circle leaves the padded battlefield and
    /// positions overlapping an already-placed unit; on rejection
    /// nothing is mutated.
    ///
    /// # Errors
    ///
    /// [`BattleError::InvalidState`] outside the setup phase,
    /// [`BattleError::OutOfBounds`] or [`BattleError::PlacementOverlap`]
    /// for bad positions.
    pub fn place_unit(&mut self, pos: Vec2, team: Team, kind: UnitKind) -> Result<UnitId> {
        if self.phase != BattlePhase::Setup {
            return Err(BattleError::InvalidState(
                "units can only be placed before the battle starts".to_string(),
            ));
        }

        let spec = self.specs.get(kind);
        let scale = self.config.size_multiplier();
        let radius = BASE_UNIT_RADIUS * spec.radius_scale * scale;

        let min_x = self.config.padding + radius;
        let max_x = self.config.width - self.config.padding - radius;
        let min_y = self.config.padding + radius;
        let max_y = self.config.height - self.config.padding - radius;
        if pos.x < min_x || pos.x > max_x || pos.y < min_y || pos.y > max_y {
            return Err(BattleError::OutOfBounds { x: pos.x, y: pos.y });
        }

        for u in &self.units {
            if u.pos.distance(pos) < u.radius + radius {
                return Err(BattleError::PlacementOverlap(u.id.0));
            }
        }

        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units.push(Unit::new(id, pos, team, kind, spec, scale));
        Ok(id)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the battle.
    ///
    /// The first start captures the army snapshot used by
    /// [`BattleSession::restore`].
    ///
    /// # Errors
    ///
    /// [`BattleError::InvalidState`] outside setup or when either team
    /// has no units.
    pub fn start(&mut self, now: f64) -> Result<()> {
        if self.phase != BattlePhase::Setup {
            return Err(BattleError::InvalidState(format!(
                "cannot start from {:?}",
                self.phase
            )));
        }
        if self.alive_count(Team::Red) == 0 || self.alive_count(Team::Blue) == 0 {
            return Err(BattleError::InvalidState(
                "both teams need at least one unit".to_string(),
            ));
        }

        if self.snapshot.is_none() {
            self.snapshot = Some(ArmySnapshot::capture(&self.units));
        }
        self.phase = BattlePhase::Running;
        self.last_tick = Some(now);
        tracing::info!(
            red = self.alive_count(Team::Red),
            blue = self.alive_count(Team::Blue),
            "battle started"
        );
        Ok(())
    }

    /// Freeze the battle. Cooldown timestamps are retained, so a long
    /// pause shortens the wait once resumed; the elapsed timer stops.
    ///
    /// # Errors
    ///
    /// [`BattleError::InvalidState`] unless running.
    pub fn pause(&mut self) -> Result<()> {
        if self.phase != BattlePhase::Running {
            return Err(BattleError::InvalidState(format!(
                "cannot pause from {:?}",
                self.phase
            )));
        }
        self.phase = BattlePhase::Paused;
        self.last_tick = None;
        Ok(())
    }

    /// Resume a paused battle.
    ///
    /// # Errors
    ///
    /// [`BattleError::InvalidState`] unless paused.
    pub fn resume(&mut self, now: f64) -> Result<()> {
        if self.phase != BattlePhase::Paused {
            return Err(BattleError::InvalidState(format!(
                "cannot resume from {:?}",
                self.phase
            )));
        }
        self.phase = BattlePhase::Running;
        self.last_tick = Some(now);
        Ok(())
    }

    /// Rebuild both armies from the snapshot captured at first start.
    ///
    /// Every unit returns to its original placement at full health;
    /// kill and damage counters, events, and the elapsed timer reset;
    /// the PRNG reseeds so a replay rolls the same sequence.
    ///
    /// # Errors
    ///
    /// [`BattleError::NoSnapshot`] if no battle was ever started.
    pub fn restore(&mut self) -> Result<()> {
        let snapshot = self.snapshot.clone().ok_or(BattleError::NoSnapshot)?;
        let scale = self.config.size_multiplier();

        self.units.clear();
        // Ids restart from zero so a replayed battle is
        // indistinguishable from the original run.
        self.next_id = 0;
        for rec in &snapshot.records {
            let id = UnitId(self.next_id);
            self.next_id += 1;
            let mut unit = Unit::new(id, rec.pos, rec.team, rec.kind, self.specs.get(rec.kind), scale);
            unit.max_health = rec.max_health;
            unit.health = rec.max_health;
            unit.radius = rec.radius;
            if let Behavior::Cavalry(ref mut b) = unit.behavior {
                b.has_used_first_charge = !rec.first_charge_available;
            }
            self.units.push(unit);
        }

        self.events.clear();
        self.total_kills = 0;
        self.highest_hit = 0;
        self.elapsed_ms = 0.0;
        self.winner = None;
        self.phase = BattlePhase::Setup;
        self.last_tick = None;
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        Ok(())
    }

    // =========================================================================
    // Tick scheduler
    // =========================================================================

    /// Advance the battle to `now` (wall-clock milliseconds).
    ///
    /// No-op unless running. The team partition is computed once; each
    /// living unit then steps `game_speed` times in placement order
    /// with actions applied immediately, followed by separation,
    /// end-of-tick removal, and the victory check.
    pub fn tick(&mut self, now: f64) {
        if self.phase != BattlePhase::Running {
            return;
        }

        if let Some(last) = self.last_tick {
            self.elapsed_ms += (now - last).max(0.0);
        }
        self.last_tick = Some(now);

        // Partition membership is fixed for the whole tick; views are
        // refreshed from authoritative state before every step.
        let red_ids: Vec<UnitId> = self.team_ids(Team::Red);
        let blue_ids: Vec<UnitId> = self.team_ids(Team::Blue);
        let order: Vec<UnitId> = self.units.iter().map(|u| u.id).collect();

        for id in order {
            for _ in 0..self.config.game_speed {
                let Some(idx) = self.index_of(id) else { break };
                if !self.units[idx].is_alive() {
                    break;
                }

                let (enemy_ids, ally_ids) = match self.units[idx].team {
                    Team::Red => (&blue_ids, &red_ids),
                    Team::Blue => (&red_ids, &blue_ids),
                };
                let enemies = self.views(enemy_ids, None);
                let allies = self.views(ally_ids, Some(id));

                let action = units::step_unit(
                    &mut self.units[idx],
                    &enemies,
                    &allies,
                    &mut StepCtx {
                        now,
                        rng: &mut self.rng,
                        events: &mut self.events,
                    },
                );

                match action {
                    StepAction::None => {}
                    StepAction::Attack {
                        target,
                        amount,
                        critical,
                        melee,
                    } => self.apply_attack(idx, target, amount, critical, melee),
                    StepAction::Heal { target, amount } => self.apply_heal(idx, target, amount),
                }
            }
        }

        resolve_separation(&mut self.units, &self.config);
        self.units.retain(Unit::is_alive);
        self.check_victory();

        #[cfg(feature = "debug-validation")]
        tracing::debug!(hash = self.state_hash(), "post-tick state hash");
    }

    /// Apply damage from one step, crediting the kill at the moment
    /// health crosses zero. The corpse stays until end-of-tick cleanup.
    fn apply_attack(&mut self, attacker_idx: usize, target: UnitId, amount: i32, critical: bool, melee: bool) {
        let Some(t_idx) = self.index_of(target) else {
            return;
        };
        if !self.units[t_idx].is_alive() {
            return;
        }

        let t_pos = self.units[t_idx].pos;
        self.units[t_idx].health -= amount;
        let killed = !self.units[t_idx].is_alive();

        let team = self.units[attacker_idx].team;
        self.events.push_damage_text(DamageText {
            pos: t_pos,
            amount,
            team,
            is_heal: false,
            is_critical: critical,
            is_miss: false,
            life: EVENT_LIFE,
        });
        if melee {
            self.events.push_melee_flash(MeleeFlash {
                pos: t_pos,
                team,
                is_critical: critical,
                life: EVENT_LIFE,
            });
        }

        let attacker = &mut self.units[attacker_idx];
        attacker.total_damage_dealt += i64::from(amount);
        if killed {
            attacker.kills += 1;
            self.total_kills += 1;
        }
        if amount > self.highest_hit {
            self.highest_hit = amount;
        }
    }

    /// Apply a heal, re-clamped against the patient's current health
    /// in case it changed since the healer's view was taken.
    fn apply_heal(&mut self, healer_idx: usize, target: UnitId, amount: i32) {
        let Some(t_idx) = self.index_of(target) else {
            return;
        };
        if !self.units[t_idx].is_alive() {
            return;
        }

        let missing = self.units[t_idx].max_health - self.units[t_idx].health;
        let amount = amount.min(missing);
        if amount <= 0 {
            return;
        }

        self.units[t_idx].health += amount;
        let pos = self.units[t_idx].pos;
        let team = self.units[healer_idx].team;
        self.events.push_damage_text(DamageText {
            pos,
            amount,
            team,
            is_heal: true,
            is_critical: false,
            is_miss: false,
            life: EVENT_LIFE,
        });
    }

    fn check_victory(&mut self) {
        let red = self.alive_count(Team::Red);
        let blue = self.alive_count(Team::Blue);
        if red > 0 && blue > 0 {
            return;
        }

        self.winner = match (red, blue) {
            (0, b) if b > 0 => Some(Team::Blue),
            (r, 0) if r > 0 => Some(Team::Red),
            _ => None,
        };
        self.phase = BattlePhase::Complete;
        self.last_tick = None;
        match self.winner {
            Some(team) => tracing::info!(
                winner = %team,
                elapsed_ms = self.elapsed_ms,
                kills = self.total_kills,
                "VICTORY - army eliminated"
            ),
            None => tracing::info!(elapsed_ms = self.elapsed_ms, "battle ended with no survivors"),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All units, in placement order. Includes mid-tick corpses only
    /// while a tick is in progress.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.index_of(id).map(|idx| &self.units[idx])
    }

    /// Living units on a team.
    #[must_use]
    pub fn alive_count(&self, team: Team) -> usize {
        self.units
            .iter()
            .filter(|u| u.team == team && u.is_alive())
            .count()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Winning team, once decided.
    #[must_use]
    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Battlefield configuration.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// The placement snapshot captured at first start.
    #[must_use]
    pub fn snapshot(&self) -> Option<&ArmySnapshot> {
        self.snapshot.as_ref()
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> BattleStats {
        BattleStats {
            red_alive: self.alive_count(Team::Red),
            blue_alive: self.alive_count(Team::Blue),
            elapsed_ms: self.elapsed_ms,
            total_kills: self.total_kills,
            highest_hit: self.highest_hit,
            winner: self.winner,
        }
    }

    /// Visual event queues, for the renderer to drain.
    pub fn events_mut(&mut self) -> &mut EventQueues {
        &mut self.events
    }

    fn team_ids(&self, team: Team) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.team == team && u.is_alive())
            .map(|u| u.id)
            .collect()
    }

    /// Ids are assigned in increasing order and removal preserves
    /// order, so the collection stays sorted by id.
    fn index_of(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |u| u.id).ok()
    }

    fn views(&self, ids: &[UnitId], exclude: Option<UnitId>) -> Vec<UnitView> {
        ids.iter()
            .filter(|&&id| Some(id) != exclude)
            .filter_map(|&id| self.index_of(id))
            .filter(|&idx| self.units[idx].is_alive())
            .map(|idx| self.units[idx].view())
            .collect()
    }

    // =========================================================================
    // Hashing and persistence
    // =========================================================================

    /// Order-independent-clock state hash, for divergence checks
    /// between two sessions driven with the same clock and seed.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.units.len().hash(&mut hasher);
        for u in &self.units {
            u.id.hash(&mut hasher);
            u.team.hash(&mut hasher);
            u.kind.hash(&mut hasher);
            u.pos.x.to_bits().hash(&mut hasher);
            u.pos.y.to_bits().hash(&mut hasher);
            u.vel.x.to_bits().hash(&mut hasher);
            u.vel.y.to_bits().hash(&mut hasher);
            u.facing.to_bits().hash(&mut hasher);
            u.health.hash(&mut hasher);
            u.kills.hash(&mut hasher);
        }
        self.total_kills.hash(&mut hasher);
        self.highest_hit.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the full session to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::Serialization`] on encode failure.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BattleError::Serialization(e.to_string()))
    }

    /// Restore a session from [`BattleSession::serialize`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::Serialization`] on decode failure.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| BattleError::Serialization(e.to_string()))
    }
}
