//! Healer support state machine.
//!
//! Healers never attack. Each step they score every wounded ally and
//! chase the best patient; with nobody hurt they drift back toward the
//! fighting line so they are in position when damage starts landing.

use serde::{Deserialize, Serialize};

use crate::events::{HealBeam, EVENT_LIFE};
use crate::math::Vec2;
use crate::units::{Behavior, StepAction, StepCtx, Unit, UnitKind, UnitSpec, UnitView};

/// Allies below this health fraction are heal candidates.
pub const WOUNDED_THRESHOLD: f32 = 0.9;

/// Enemy distance (pre-scale) at which an ally counts as in combat.
pub const THREAT_RADIUS: f32 = 100.0;

/// Extra slack beyond heal range before the healer starts moving.
const RANGE_SLACK: f32 = 5.0;

/// Healer machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealerState {
    /// Moving toward the chosen patient.
    SeekingPatient,
    /// In range and pulsing heals on cooldown.
    Healing,
    /// Nobody wounded; drifting toward the fighters.
    Repositioning,
}

/// Healer fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealerBehavior {
    /// Health restored per pulse.
    pub heal_power: i32,
    /// Healing reach, scaled to the battlefield.
    pub heal_range: f32,
    /// Milliseconds between pulses.
    pub heal_cooldown_ms: f64,
    /// In-combat check distance, scaled to the battlefield.
    pub threat_radius: f32,
    /// Timestamp of the last pulse.
    pub last_heal: f64,
    /// Current machine state.
    pub state: HealerState,
}

impl HealerBehavior {
    /// Build from a spec, scaling ranges to the battlefield.
    #[must_use]
    pub fn new(spec: &UnitSpec, scale: f32) -> Self {
        Self {
            heal_power: spec.heal_power,
            heal_range: spec.heal_range * scale,
            heal_cooldown_ms: spec.heal_cooldown_ms,
            threat_radius: THREAT_RADIUS * scale,
            last_heal: f64::NEG_INFINITY,
            state: HealerState::Repositioning,
        }
    }
}

/// One step of the healer machine.
pub fn step(
    unit: &mut Unit,
    enemies: &[UnitView],
    allies: &[UnitView],
    ctx: &mut StepCtx<'_>,
) -> StepAction {
    let Behavior::Healer(mut b) = unit.behavior else {
        return StepAction::None;
    };
    let action = step_inner(unit, &mut b, enemies, allies, ctx);
    unit.behavior = Behavior::Healer(b);
    action
}

fn step_inner(
    unit: &mut Unit,
    b: &mut HealerBehavior,
    enemies: &[UnitView],
    allies: &[UnitView],
    ctx: &mut StepCtx<'_>,
) -> StepAction {
    let patient = allies
        .iter()
        .filter(|a| (a.health as f32) < (a.max_health as f32) * WOUNDED_THRESHOLD)
        .max_by(|x, y| {
            score(b, unit.pos, x, enemies).total_cmp(&score(b, unit.pos, y, enemies))
        })
        .copied();

    let Some(patient) = patient else {
        b.state = HealerState::Repositioning;
        reposition(unit, allies);
        return StepAction::None;
    };

    let to = patient.pos - unit.pos;
    let dist = to.length();

    if dist > b.heal_range + RANGE_SLACK {
        b.state = HealerState::SeekingPatient;
        if dist > f32::EPSILON {
            let speed = unit.max_speed.min(dist - b.heal_range) * 0.7;
            unit.steer(to * (1.0 / dist), speed);
        }
        unit.update_facing();
        return StepAction::None;
    }

    b.state = HealerState::Healing;
    unit.decelerate(0.7);
    unit.update_facing();

    if ctx.now - b.last_heal >= b.heal_cooldown_ms {
        let amount = b.heal_power.min(patient.max_health - patient.health);
        if amount > 0 {
            b.last_heal = ctx.now;
            ctx.events.push_heal_beam(HealBeam {
                start: unit.pos,
                end: patient.pos,
                amount,
                target: patient.id,
                life: EVENT_LIFE,
            });
            return StepAction::Heal {
                target: patient.id,
                amount,
            };
        }
    }

    StepAction::None
}

/// Patient priority.
///
/// Missing health dominates, non-healers get a flat and per-kind
/// bonus (front-liners first), allies under fire jump the queue, and
/// distance works against far patients. Other healers are actively
/// deprioritized so healer pairs don't lock onto each other.
fn score(b: &HealerBehavior, healer_pos: Vec2, ally: &UnitView, enemies: &[UnitView]) -> f32 {
    let health_pct = ally.health as f32 / ally.max_health as f32;
    let mut score = (1.0 - health_pct) * 100.0;

    if ally.kind == UnitKind::Healer {
        score -= 80.0;
    } else {
        score += 50.0 + kind_bonus(ally.kind);
        let in_combat = enemies
            .iter()
            .any(|e| e.pos.distance_squared(ally.pos) < b.threat_radius * b.threat_radius);
        if in_combat {
            score += 25.0;
        }
    }

    score - healer_pos.distance(ally.pos) * 0.5
}

fn kind_bonus(kind: UnitKind) -> f32 {
    match kind {
        UnitKind::Tank => 20.0,
        UnitKind::Cavalry => 15.0,
        UnitKind::Musketeer => 10.0,
        UnitKind::Soldier => 5.0,
        UnitKind::Healer => 0.0,
    }
}

/// Drift toward the centroid of the non-healer allies.
fn reposition(unit: &mut Unit, allies: &[UnitView]) {
    let fighters: Vec<&UnitView> = allies.iter().filter(|a| a.kind != UnitKind::Healer).collect();
    if fighters.is_empty() {
        unit.decelerate(0.7);
        return;
    }

    let mut centroid = Vec2::ZERO;
    for f in &fighters {
        centroid += f.pos;
    }
    centroid *= 1.0 / fighters.len() as f32;

    let to = centroid - unit.pos;
    let dist = to.length();
    if dist > 30.0 {
        unit.steer(to * (1.0 / dist), unit.max_speed * 0.5);
    } else {
        unit.decelerate(0.7);
    }
    unit.update_facing();
}
