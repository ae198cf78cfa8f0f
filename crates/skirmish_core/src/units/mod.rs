//! Unit model and per-kind behavior dispatch.
//!
//! A [`Unit`] owns the fields every kind shares; kind-specific fields
//! and the tagged state enum live in a [`Behavior`] variant. Each tick
//! the scheduler hands a unit read-only [`UnitView`]s of the two team
//! partitions and the unit returns at most one [`StepAction`], which
//! the session applies before the next unit moves.

pub mod cavalry;
pub mod healer;
pub mod musketeer;
pub mod soldier;
pub mod spec;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::BASE_UNIT_RADIUS;
use crate::events::EventQueues;
use crate::math::Vec2;

pub use spec::{SpecTable, UnitSpec};

/// Which side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Red army.
    Red,
    /// Blue army.
    Blue,
}

impl Team {
    /// The opposing team.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }

    /// Facing at placement: armies start looking at each other,
    /// red toward +x and blue toward -x.
    #[must_use]
    pub fn initial_facing(self) -> f32 {
        match self {
            Self::Red => 0.0,
            Self::Blue => std::f32::consts::PI,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "Red"),
            Self::Blue => write!(f, "Blue"),
        }
    }
}

/// Unit archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Baseline melee infantry.
    Soldier,
    /// Slow, heavy melee unit; same state machine as the soldier.
    Tank,
    /// Support unit that restores ally health.
    Healer,
    /// Ranged unit with a bayonet fallback.
    Musketeer,
    /// Fast unit with a periodic charge attack.
    Cavalry,
}

impl UnitKind {
    /// All unit kinds, in display order.
    pub const ALL: [Self; 5] = [
        Self::Soldier,
        Self::Tank,
        Self::Healer,
        Self::Musketeer,
        Self::Cavalry,
    ];
}

/// Stable unit identifier, unique within a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind-specific fields and state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Soldier / tank melee machine.
    Melee(soldier::MeleeBehavior),
    /// Healer support machine.
    Healer(healer::HealerBehavior),
    /// Musketeer ranged/bayonet machine.
    Musketeer(musketeer::MusketeerBehavior),
    /// Cavalry charge machine.
    Cavalry(cavalry::CavalryBehavior),
}

/// One battlefield unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier.
    pub id: UnitId,
    /// Owning team. Immutable after creation.
    pub team: Team,
    /// Archetype. Immutable after creation.
    pub kind: UnitKind,
    /// Center position.
    pub pos: Vec2,
    /// Current velocity.
    pub vel: Vec2,
    /// Facing angle in radians, kept from the last nonzero velocity.
    pub facing: f32,
    /// Collision radius, already scaled to the battlefield.
    pub radius: f32,
    /// Current health; a unit is dead at or below zero but stays in
    /// the collection until end-of-tick cleanup.
    pub health: i32,
    /// Health at creation.
    pub max_health: i32,
    /// Base attack damage.
    pub attack_power: i32,
    /// Milliseconds between attacks.
    pub attack_cooldown_ms: f64,
    /// Top movement speed.
    pub max_speed: f32,
    /// Steering responsiveness.
    pub turn_speed: f32,
    /// Wall-clock timestamp of the last attack.
    pub last_attack: f64,
    /// Cumulative damage dealt.
    pub total_damage_dealt: i64,
    /// Enemies this unit has killed.
    pub kills: u32,
    /// Kind-specific fields and state.
    pub behavior: Behavior,
}

impl Unit {
    /// Create a unit from its spec, with radius and ranges scaled by
    /// the battlefield size multiplier.
    #[must_use]
    pub fn new(id: UnitId, pos: Vec2, team: Team, kind: UnitKind, spec: &UnitSpec, scale: f32) -> Self {
        let behavior = match kind {
            UnitKind::Soldier | UnitKind::Tank => Behavior::Melee(soldier::MeleeBehavior::new()),
            UnitKind::Healer => Behavior::Healer(healer::HealerBehavior::new(spec, scale)),
            UnitKind::Musketeer => {
                Behavior::Musketeer(musketeer::MusketeerBehavior::new(spec, scale))
            }
            UnitKind::Cavalry => Behavior::Cavalry(cavalry::CavalryBehavior::new(spec, scale)),
        };

        Self {
            id,
            team,
            kind,
            pos,
            vel: Vec2::ZERO,
            facing: team.initial_facing(),
            radius: BASE_UNIT_RADIUS * spec.radius_scale * scale,
            health: spec.max_health,
            max_health: spec.max_health,
            attack_power: spec.attack_power,
            attack_cooldown_ms: spec.attack_cooldown_ms,
            max_speed: spec.max_speed,
            turn_speed: spec.turn_speed,
            last_attack: f64::NEG_INFINITY,
            total_damage_dealt: 0,
            kills: 0,
            behavior,
        }
    }

    /// Still fighting.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Read-only snapshot of the fields other units may inspect.
    #[must_use]
    pub fn view(&self) -> UnitView {
        UnitView {
            id: self.id,
            team: self.team,
            kind: self.kind,
            pos: self.pos,
            radius: self.radius,
            facing: self.facing,
            health: self.health,
            max_health: self.max_health,
        }
    }

    /// Steer toward `dir` (unit length) at `speed` and move.
    ///
    /// Exponential smoothing: heavier units (lower `turn_speed`) take
    /// longer to come about.
    pub(crate) fn steer(&mut self, dir: Vec2, speed: f32) {
        let desired = dir * speed;
        self.vel += (desired - self.vel) * self.turn_speed;
        self.pos += self.vel;
    }

    /// Bleed off speed without moving.
    pub(crate) fn decelerate(&mut self, factor: f32) {
        self.vel *= factor;
    }

    /// Update facing from velocity, keeping the old facing when nearly
    /// stationary.
    pub(crate) fn update_facing(&mut self) {
        if self.vel.x.abs() > 0.1 || self.vel.y.abs() > 0.1 {
            self.facing = self.vel.angle();
        }
    }
}

/// Read-only view of a unit, copied out of the authoritative
/// collection before each step so mid-tick mutation stays ordered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Owning team.
    pub team: Team,
    /// Archetype.
    pub kind: UnitKind,
    /// Center position.
    pub pos: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Facing angle.
    pub facing: f32,
    /// Current health.
    pub health: i32,
    /// Health at creation.
    pub max_health: i32,
}

/// Mutation a step wants applied to another unit.
///
/// Steps never touch other units directly; the session applies the
/// action immediately after the step returns, in placement order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAction {
    /// Nothing to apply this step.
    None,
    /// Deal damage to an enemy.
    Attack {
        /// Victim.
        target: UnitId,
        /// Damage after all multipliers, already floored.
        amount: i32,
        /// Presented as a critical hit.
        critical: bool,
        /// Melee hit (emits an impact flash).
        melee: bool,
    },
    /// Restore health to an ally.
    Heal {
        /// Patient.
        target: UnitId,
        /// Health restored, already clamped to the missing amount.
        amount: i32,
    },
}

/// Per-step context handed to the state machines.
pub struct StepCtx<'a> {
    /// Wall-clock timestamp in milliseconds.
    pub now: f64,
    /// Session PRNG (accuracy rolls).
    pub rng: &'a mut ChaCha8Rng,
    /// Visual event queues.
    pub events: &'a mut EventQueues,
}

/// Run one step of a unit's state machine.
///
/// `enemies` and `allies` are the alive members of each partition,
/// refreshed from authoritative state; `allies` excludes the acting
/// unit itself.
pub fn step_unit(
    unit: &mut Unit,
    enemies: &[UnitView],
    allies: &[UnitView],
    ctx: &mut StepCtx<'_>,
) -> StepAction {
    match unit.behavior {
        Behavior::Melee(_) => soldier::step(unit, enemies, ctx),
        Behavior::Healer(_) => healer::step(unit, enemies, allies, ctx),
        Behavior::Musketeer(_) => musketeer::step(unit, enemies, ctx),
        Behavior::Cavalry(_) => cavalry::step(unit, enemies, ctx),
    }
}

/// Nearest view to `pos`, if any.
pub(crate) fn nearest(pos: Vec2, views: &[UnitView]) -> Option<UnitView> {
    views
        .iter()
        .copied()
        .min_by(|a, b| a.pos.distance_squared(pos).total_cmp(&b.pos.distance_squared(pos)))
}
