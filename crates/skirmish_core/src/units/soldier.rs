//! Soldier and tank melee state machine.
//!
//! The simplest machine: close on the nearest enemy, then trade blows
//! on the attack cooldown. The tank runs the same machine with heavier
//! stats. Cavalry reuses [`engage`] when it is not charging.

use serde::{Deserialize, Serialize};

use crate::combat::{directional_multiplier, scaled_damage, CRITICAL_THRESHOLD};
use crate::units::{nearest, Behavior, StepAction, StepCtx, Unit, UnitView};

/// Velocity retained per engaged frame while winding up a swing.
pub(crate) const ENGAGE_DECEL: f32 = 0.7;

/// Extra reach beyond the two radii for a melee touch.
pub(crate) const MELEE_REACH_PAD: f32 = 1.0;

/// Melee machine state, re-derived each step from the distance to the
/// nearest enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeleeState {
    /// Closing on the nearest enemy.
    Seeking,
    /// In reach and attacking on cooldown.
    Engaged,
}

/// Soldier/tank fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeleeBehavior {
    /// Current machine state.
    pub state: MeleeState,
}

impl MeleeBehavior {
    /// New machine, seeking.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: MeleeState::Seeking,
        }
    }
}

impl Default for MeleeBehavior {
    fn default() -> Self {
        Self::new()
    }
}

/// One step of the soldier/tank machine.
pub fn step(unit: &mut Unit, enemies: &[UnitView], ctx: &mut StepCtx<'_>) -> StepAction {
    let Behavior::Melee(mut b) = unit.behavior else {
        return StepAction::None;
    };
    let speed = unit.max_speed;
    let (state, action) = engage(unit, enemies, speed, ctx.now);
    b.state = state;
    unit.behavior = Behavior::Melee(b);
    action
}

/// Shared melee engagement: steer into reach, then attack on cooldown.
///
/// With no living enemy the unit coasts to a stop; the scheduler will
/// already have detected victory.
pub(crate) fn engage(
    unit: &mut Unit,
    enemies: &[UnitView],
    speed: f32,
    now: f64,
) -> (MeleeState, StepAction) {
    let Some(target) = nearest(unit.pos, enemies) else {
        unit.decelerate(ENGAGE_DECEL);
        return (MeleeState::Seeking, StepAction::None);
    };

    let to = target.pos - unit.pos;
    let dist = to.length();
    let reach = unit.radius + target.radius + MELEE_REACH_PAD;

    if dist > reach {
        if dist > f32::EPSILON {
            unit.steer(to * (1.0 / dist), speed);
        }
        unit.update_facing();
        return (MeleeState::Seeking, StepAction::None);
    }

    unit.decelerate(ENGAGE_DECEL);
    unit.update_facing();

    if now - unit.last_attack >= unit.attack_cooldown_ms {
        unit.last_attack = now;
        let mult = directional_multiplier(unit.pos, target.pos, target.facing);
        let amount = scaled_damage(unit.attack_power, mult);
        return (
            MeleeState::Engaged,
            StepAction::Attack {
                target: target.id,
                amount,
                critical: mult > CRITICAL_THRESHOLD,
                melee: true,
            },
        );
    }

    (MeleeState::Engaged, StepAction::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueues;
    use crate::math::Vec2;
    use crate::units::{SpecTable, Team, UnitId, UnitKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn soldier(id: u32, pos: Vec2, team: Team) -> Unit {
        let table = SpecTable::default();
        Unit::new(UnitId(id), pos, team, UnitKind::Soldier, table.get(UnitKind::Soldier), 1.0)
    }

    fn ctx<'a>(now: f64, rng: &'a mut ChaCha8Rng, events: &'a mut EventQueues) -> StepCtx<'a> {
        StepCtx { now, rng, events }
    }

    #[test]
    fn test_closes_distance_to_nearest_enemy() {
        let mut attacker = soldier(1, Vec2::new(100.0, 100.0), Team::Red);
        let enemy = soldier(2, Vec2::new(300.0, 100.0), Team::Blue);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventQueues::new();

        let start = attacker.pos.distance(enemy.pos);
        for i in 0..20 {
            let action = step(&mut attacker, &[enemy.view()], &mut ctx(f64::from(i) * 16.0, &mut rng, &mut events));
            assert_eq!(action, StepAction::None);
        }
        assert!(attacker.pos.distance(enemy.pos) < start);
        assert!(matches!(attacker.behavior, Behavior::Melee(b) if b.state == MeleeState::Seeking));
    }

    #[test]
    fn test_attacks_once_in_reach_and_respects_cooldown() {
        let mut attacker = soldier(1, Vec2::new(100.0, 100.0), Team::Red);
        let enemy = soldier(2, Vec2::new(120.0, 100.0), Team::Blue);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventQueues::new();

        // In reach (radii 12 + 12 + 1 pad > 20 apart).
        let first = step(&mut attacker, &[enemy.view()], &mut ctx(0.0, &mut rng, &mut events));
        assert!(matches!(first, StepAction::Attack { amount: 10, melee: true, .. }));

        // Within the 600ms cooldown: no second swing.
        let second = step(&mut attacker, &[enemy.view()], &mut ctx(300.0, &mut rng, &mut events));
        assert_eq!(second, StepAction::None);

        // Cooldown elapsed.
        let third = step(&mut attacker, &[enemy.view()], &mut ctx(650.0, &mut rng, &mut events));
        assert!(matches!(third, StepAction::Attack { .. }));
    }

    #[test]
    fn test_rear_attack_is_critical() {
        let mut attacker = soldier(1, Vec2::new(120.0, 100.0), Team::Red);
        // Enemy right in reach, facing away from the attacker.
        let mut enemy = soldier(2, Vec2::new(100.0, 100.0), Team::Blue);
        enemy.facing = std::f32::consts::PI;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventQueues::new();

        let action = step(&mut attacker, &[enemy.view()], &mut ctx(0.0, &mut rng, &mut events));
        assert!(
            matches!(action, StepAction::Attack { amount: 20, critical: true, .. }),
            "expected a doubled rear hit, got {action:?}"
        );
    }

    #[test]
    fn test_no_enemies_is_a_quiet_idle() {
        let mut unit = soldier(1, Vec2::new(100.0, 100.0), Team::Red);
        unit.vel = Vec2::new(2.0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventQueues::new();

        let action = step(&mut unit, &[], &mut ctx(0.0, &mut rng, &mut events));
        assert_eq!(action, StepAction::None);
        assert!(unit.vel.length() < 2.0);
    }
}
