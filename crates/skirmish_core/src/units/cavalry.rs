//! Cavalry charge state machine.
//!
//! Outside a charge the rider fights like a soldier at riding speed.
//! When the charge timer is up and there is room for a run-up, it
//! locks the nearest enemy and accelerates along a boost ramp; impact
//! damage scales with a speed tier and a one-time first-charge bonus.
//! A charge ends on the hit, when the target dies, or when the
//! duration runs out.

use serde::{Deserialize, Serialize};

use crate::combat::{charge_speed_tier, directional_multiplier, CRITICAL_THRESHOLD};
use crate::units::{nearest, soldier, Behavior, StepAction, StepCtx, Unit, UnitId, UnitView};

/// Boost ramp: speed multiplier grows from 1.0 to 2.8 over the charge.
const CHARGE_BOOST_RAMP: f32 = 1.8;

/// Contact distance pad during a charge (looser than a melee touch).
const CHARGE_CONTACT_PAD: f32 = 5.0;

/// Fraction of the attack cooldown gating the charge impact.
const CHARGE_ATTACK_GATE: f64 = 0.3;

/// One-time damage bonus on the first charge of a unit's life.
const FIRST_CHARGE_BONUS: f32 = 1.5;

/// Speed tiers above this are presented as criticals.
const TIER_CRITICAL_THRESHOLD: f32 = 1.3;

/// Cavalry machine state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CavalryState {
    /// Fighting like a soldier at riding speed.
    Riding,
    /// Committed to a charge against a locked target.
    Charging {
        /// When the charge began.
        started: f64,
        /// Locked target; the charge ends if it dies.
        target: UnitId,
    },
}

/// Cavalry fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CavalryBehavior {
    /// Riding speed outside a charge.
    pub base_speed: f32,
    /// Milliseconds between charges.
    pub charge_cooldown_ms: f64,
    /// Maximum charge length in milliseconds.
    pub charge_duration_ms: f64,
    /// Minimum run-up distance, scaled to the battlefield.
    pub min_charge_distance: f32,
    /// When the current or previous charge began its cooldown.
    pub last_charge: f64,
    /// Scalar speed recorded just before the last charge move.
    pub recorded_speed: f32,
    /// The first-charge bonus has been spent.
    pub has_used_first_charge: bool,
    /// Current machine state.
    pub state: CavalryState,
}

impl CavalryBehavior {
    /// Build from a spec, scaling the run-up distance to the
    /// battlefield. New riders start with the charge already off
    /// cooldown.
    #[must_use]
    pub fn new(spec: &crate::units::UnitSpec, scale: f32) -> Self {
        Self {
            base_speed: spec.charge_base_speed,
            charge_cooldown_ms: spec.charge_cooldown_ms,
            charge_duration_ms: spec.charge_duration_ms,
            min_charge_distance: spec.min_charge_distance * scale,
            last_charge: f64::NEG_INFINITY,
            recorded_speed: 0.0,
            has_used_first_charge: false,
            state: CavalryState::Riding,
        }
    }
}

/// One step of the cavalry machine.
pub fn step(unit: &mut Unit, enemies: &[UnitView], ctx: &mut StepCtx<'_>) -> StepAction {
    let Behavior::Cavalry(mut b) = unit.behavior else {
        return StepAction::None;
    };
    let action = step_inner(unit, &mut b, enemies, ctx.now);
    unit.behavior = Behavior::Cavalry(b);
    action
}

fn step_inner(
    unit: &mut Unit,
    b: &mut CavalryBehavior,
    enemies: &[UnitView],
    now: f64,
) -> StepAction {
    // Begin a charge when off cooldown and there is room for a run-up.
    if matches!(b.state, CavalryState::Riding) && now - b.last_charge >= b.charge_cooldown_ms {
        if let Some(t) = nearest(unit.pos, enemies) {
            if unit.pos.distance(t.pos) >= b.min_charge_distance {
                b.state = CavalryState::Charging {
                    started: now,
                    target: t.id,
                };
                b.last_charge = now;
            }
        }
    }

    if let CavalryState::Charging { started, target } = b.state {
        let locked = enemies.iter().find(|v| v.id == target).copied();
        match locked {
            // A charge that ends without landing still spends the
            // first-charge bonus.
            None => {
                // target fell mid-charge
                b.has_used_first_charge = true;
                b.state = CavalryState::Riding;
            }
            Some(_) if now - started >= b.charge_duration_ms => {
                b.has_used_first_charge = true;
                b.state = CavalryState::Riding;
            }
            Some(t) => {
                if let Some(action) = charge_move(unit, b, &t, started, now) {
                    return action;
                }
                return StepAction::None;
            }
        }
    }

    // Riding: soldier engagement at riding speed.
    let (_, action) = soldier::engage(unit, enemies, b.base_speed, now);
    action
}

/// Advance along the boost ramp; on contact, resolve the impact.
fn charge_move(
    unit: &mut Unit,
    b: &mut CavalryBehavior,
    target: &UnitView,
    started: f64,
    now: f64,
) -> Option<StepAction> {
    let progress = ((now - started) / b.charge_duration_ms).clamp(0.0, 1.0) as f32;
    let boost = 1.0 + progress * CHARGE_BOOST_RAMP;

    let to = target.pos - unit.pos;
    let dist = to.length();
    let dir = if dist > f32::EPSILON {
        to * (1.0 / dist)
    } else {
        crate::math::Vec2::ZERO
    };

    let vel = dir * (b.base_speed * boost);
    b.recorded_speed = vel.length();
    unit.vel = vel;
    unit.pos += vel;
    unit.update_facing();

    let contact = unit.radius + target.radius + CHARGE_CONTACT_PAD;
    if dist <= contact && now - unit.last_attack >= CHARGE_ATTACK_GATE * unit.attack_cooldown_ms {
        unit.last_attack = now;

        let impact_speed = b.recorded_speed * boost;
        let tier = charge_speed_tier(impact_speed);
        let dir_mult = directional_multiplier(unit.pos, target.pos, target.facing);
        let mut amount = (unit.attack_power as f32 * dir_mult * tier).floor() as i32;

        let first = !b.has_used_first_charge;
        if first {
            b.has_used_first_charge = true;
            amount = (amount as f32 * FIRST_CHARGE_BONUS).floor() as i32;
        }

        let critical =
            dir_mult * tier > CRITICAL_THRESHOLD || tier > TIER_CRITICAL_THRESHOLD || first;

        b.state = CavalryState::Riding;
        return Some(StepAction::Attack {
            target: target.id,
            amount,
            critical,
            melee: true,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueues;
    use crate::math::Vec2;
    use crate::units::{SpecTable, Team, UnitId, UnitKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cavalry(id: u32, pos: Vec2, team: Team) -> Unit {
        let table = SpecTable::default();
        Unit::new(UnitId(id), pos, team, UnitKind::Cavalry, table.get(UnitKind::Cavalry), 1.0)
    }

    fn soldier(id: u32, pos: Vec2, team: Team) -> Unit {
        let table = SpecTable::default();
        Unit::new(UnitId(id), pos, team, UnitKind::Soldier, table.get(UnitKind::Soldier), 1.0)
    }

    fn run_step(unit: &mut Unit, enemies: &[UnitView], now: f64) -> StepAction {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventQueues::new();
        step(unit, enemies, &mut StepCtx { now, rng: &mut rng, events: &mut events })
    }

    #[test]
    fn test_charges_on_first_step_at_exact_run_up_distance() {
        let mut rider = cavalry(1, Vec2::new(100.0, 100.0), Team::Red);
        // Enemy at exactly the minimum run-up distance (50).
        let enemy = soldier(2, Vec2::new(150.0, 100.0), Team::Blue);

        run_step(&mut rider, &[enemy.view()], 0.0);
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Charging { .. })
        ));
    }

    #[test]
    fn test_no_charge_without_run_up_room() {
        let mut rider = cavalry(1, Vec2::new(100.0, 100.0), Team::Red);
        let enemy = soldier(2, Vec2::new(140.0, 100.0), Team::Blue); // 40 < 50

        run_step(&mut rider, &[enemy.view()], 0.0);
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Riding)
        ));
    }

    #[test]
    fn test_first_charge_lands_bonus_damage() {
        let mut rider = cavalry(1, Vec2::new(100.0, 100.0), Team::Red);
        let mut enemy = soldier(2, Vec2::new(160.0, 100.0), Team::Blue);
        enemy.facing = 0.0; // looking away: rear hit

        let mut hit = None;
        for i in 0..600 {
            let now = f64::from(i) * 16.0;
            if let StepAction::Attack { amount, critical, .. } =
                run_step(&mut rider, &[enemy.view()], now)
            {
                hit = Some((amount, critical));
                break;
            }
        }
        let (amount, critical) = hit.expect("charge never connected");
        // Rear (x2) at baseline tier: floor(16 * 2) = 32, then the
        // first-charge bonus: floor(32 * 1.5) = 48.
        assert_eq!(amount, 48);
        assert!(critical, "first charge is always presented as critical");
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if b.has_used_first_charge
        ));
    }

    #[test]
    fn test_second_charge_has_no_bonus() {
        let mut rider = cavalry(1, Vec2::new(100.0, 100.0), Team::Red);
        let mut b = match rider.behavior {
            Behavior::Cavalry(b) => b,
            _ => unreachable!(),
        };
        b.has_used_first_charge = true;
        rider.behavior = Behavior::Cavalry(b);

        let mut enemy = soldier(2, Vec2::new(160.0, 100.0), Team::Blue);
        enemy.facing = 0.0;

        let mut hit = None;
        for i in 0..600 {
            let now = f64::from(i) * 16.0;
            if let StepAction::Attack { amount, .. } = run_step(&mut rider, &[enemy.view()], now) {
                hit = Some(amount);
                break;
            }
        }
        assert_eq!(hit.expect("charge never connected"), 32);
    }

    #[test]
    fn test_charge_ends_when_target_dies() {
        let mut rider = cavalry(1, Vec2::new(100.0, 100.0), Team::Red);
        let enemy = soldier(2, Vec2::new(300.0, 100.0), Team::Blue);
        let other = soldier(3, Vec2::new(400.0, 100.0), Team::Blue);

        run_step(&mut rider, &[enemy.view(), other.view()], 0.0);
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Charging { target: UnitId(2), .. })
        ));

        // Locked target gone from the living enemy views.
        run_step(&mut rider, &[other.view()], 16.0);
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Riding) && b.has_used_first_charge
        ));
    }

    #[test]
    fn test_charge_expires_after_duration() {
        let mut rider = cavalry(1, Vec2::new(100.0, 100.0), Team::Red);
        // Far enough that the rider cannot reach it within the duration.
        let enemy = soldier(2, Vec2::new(10_000.0, 100.0), Team::Blue);

        run_step(&mut rider, &[enemy.view()], 0.0);
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Charging { .. })
        ));

        run_step(&mut rider, &[enemy.view()], 2_500.0);
        // An expired charge still spends the one-time bonus.
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Riding) && b.has_used_first_charge
        ));
    }

    #[test]
    fn test_cooldown_blocks_back_to_back_charges() {
        let mut rider = cavalry(1, Vec2::new(100.0, 100.0), Team::Red);
        let enemy = soldier(2, Vec2::new(10_000.0, 100.0), Team::Blue);

        run_step(&mut rider, &[enemy.view()], 0.0);
        // Duration expires…
        run_step(&mut rider, &[enemy.view()], 2_500.0);
        // …and an immediate retry stays in the saddle: 25s cooldown.
        run_step(&mut rider, &[enemy.view()], 3_000.0);
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Riding)
        ));
        // Off cooldown again.
        run_step(&mut rider, &[enemy.view()], 26_000.0);
        assert!(matches!(
            rider.behavior,
            Behavior::Cavalry(b) if matches!(b.state, CavalryState::Charging { .. })
        ));
    }
}
