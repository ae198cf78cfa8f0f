//! Overlap resolution and battlefield bounds.
//!
//! Runs once per tick after every unit has stepped. Pushes are
//! accumulated against a snapshot of positions and applied in one
//! shot, so resolution order cannot bias the outcome, then every unit
//! is clamped back inside the padded battlefield.

use crate::config::BattleConfig;
use crate::math::Vec2;
use crate::units::Unit;

/// Gap kept between unit edges beyond their radii.
pub const SEPARATION_GAP: f32 = 2.0;

/// Push strength factor.
pub const SEPARATION_STRENGTH: f32 = 1.5;

/// Push `unit` away from all overlapping `others`.
///
/// Exactly coincident centers give no direction to push along and
/// contribute nothing; the pair stays overlapped until some other
/// force separates them.
#[must_use]
pub fn separation_push(pos: Vec2, radius: f32, others: &[(Vec2, f32)]) -> Vec2 {
    let mut push = Vec2::ZERO;
    for &(other_pos, other_radius) in others {
        let min_dist = radius + other_radius + SEPARATION_GAP;
        let delta = pos - other_pos;
        let dist = delta.length();
        if dist > 0.0 && dist < min_dist {
            let strength = (min_dist - dist) / min_dist * SEPARATION_STRENGTH;
            push += delta * (1.0 / dist) * strength;
        }
    }
    push
}

/// Resolve overlap between all living units and clamp to bounds.
///
/// Units already at or below zero health neither push nor get pushed;
/// they are removed at the end of the tick.
pub fn resolve_separation(units: &mut [Unit], config: &BattleConfig) {
    let snapshot: Vec<(Vec2, f32)> = units
        .iter()
        .filter(|u| u.is_alive())
        .map(|u| (u.pos, u.radius))
        .collect();

    // A unit is coincident with itself, so its own snapshot entry
    // contributes no push and needs no exclusion.
    let pushes: Vec<Vec2> = units
        .iter()
        .map(|u| {
            if u.is_alive() {
                separation_push(u.pos, u.radius, &snapshot)
            } else {
                Vec2::ZERO
            }
        })
        .collect();

    for (unit, push) in units.iter_mut().zip(pushes) {
        if unit.is_alive() {
            unit.pos += push;
            clamp_to_bounds(unit, config);
        }
    }
}

/// Keep a unit's full circle inside the padded battlefield.
pub fn clamp_to_bounds(unit: &mut Unit, config: &BattleConfig) {
    let min_x = config.padding + unit.radius;
    let max_x = config.width - config.padding - unit.radius;
    let min_y = config.padding + unit.radius;
    let max_y = config.height - config.padding - unit.radius;
    unit.pos.x = unit.pos.x.clamp(min_x, max_x);
    unit.pos.y = unit.pos.y.clamp(min_y, max_y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{SpecTable, Team, UnitId, UnitKind};

    fn soldier(id: u32, pos: Vec2) -> Unit {
        let table = SpecTable::default();
        Unit::new(UnitId(id), pos, Team::Red, UnitKind::Soldier, table.get(UnitKind::Soldier), 1.0)
    }

    #[test]
    fn test_overlapping_pair_separates() {
        let cfg = BattleConfig::default();
        let mut units = vec![
            soldier(1, Vec2::new(400.0, 400.0)),
            soldier(2, Vec2::new(405.0, 400.0)),
        ];

        // A few iterations, as in consecutive ticks.
        for _ in 0..40 {
            resolve_separation(&mut units, &cfg);
        }

        let dist = units[0].pos.distance(units[1].pos);
        let min = units[0].radius + units[1].radius;
        assert!(dist >= min - 0.5, "still overlapping: {dist} < {min}");
    }

    #[test]
    fn test_coincident_units_do_not_produce_nan() {
        let cfg = BattleConfig::default();
        let mut units = vec![
            soldier(1, Vec2::new(400.0, 400.0)),
            soldier(2, Vec2::new(400.0, 400.0)),
        ];
        resolve_separation(&mut units, &cfg);
        for u in &units {
            assert!(u.pos.x.is_finite() && u.pos.y.is_finite());
            assert_eq!(u.pos, Vec2::new(400.0, 400.0), "coincident pair gets no push");
        }
    }

    #[test]
    fn test_distant_units_unaffected() {
        let push = separation_push(
            Vec2::new(100.0, 100.0),
            12.0,
            &[(Vec2::new(400.0, 400.0), 12.0)],
        );
        assert_eq!(push, Vec2::ZERO);
    }

    #[test]
    fn test_push_is_symmetric_for_equal_radii() {
        let a = Vec2::new(400.0, 400.0);
        let b = Vec2::new(410.0, 400.0);
        let push_a = separation_push(a, 12.0, &[(b, 12.0)]);
        let push_b = separation_push(b, 12.0, &[(a, 12.0)]);
        assert_eq!(push_a.x, -push_b.x);
        assert_eq!(push_a.y, push_b.y);
    }

    #[test]
    fn test_clamped_inside_padded_bounds() {
        let cfg = BattleConfig::default();
        let mut unit = soldier(1, Vec2::new(-50.0, 5000.0));
        clamp_to_bounds(&mut unit, &cfg);
        assert_eq!(unit.pos.x, cfg.padding + unit.radius);
        assert_eq!(unit.pos.y, cfg.height - cfg.padding - unit.radius);
    }
}
