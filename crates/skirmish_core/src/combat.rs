//! Damage resolution: directional multipliers and charge speed tiers.
//!
//! Every hit is scaled by where it lands relative to the target's
//! facing. The angle compared is the direction *from the target to the
//! attacker* against the target's facing: a target looking straight at
//! its attacker takes frontal (x1.0) damage, a target looking away
//! takes rear (x2.0) damage.

use crate::math::{angle_difference, Vec2};

/// Frontal arc half-angle: hits inside it deal x1.0.
pub const FRONT_ARC_RAD: f32 = std::f32::consts::PI / 6.0; // 30 degrees

/// Rear arc threshold: hits at or beyond it deal x2.0.
pub const REAR_ARC_RAD: f32 = 5.0 * std::f32::consts::PI / 6.0; // 150 degrees

/// Frontal damage multiplier.
pub const FRONT_MULTIPLIER: f32 = 1.0;

/// Flanking damage multiplier.
pub const FLANK_MULTIPLIER: f32 = 1.25;

/// Rear damage multiplier.
pub const REAR_MULTIPLIER: f32 = 2.0;

/// A hit is presented as critical above this combined multiplier.
pub const CRITICAL_THRESHOLD: f32 = 1.5;

/// Directional damage multiplier for an attack.
///
/// Compares the direction from the target to the attacker with the
/// target's facing angle:
/// - difference `< 30°` → frontal, x1.0
/// - difference in `[30°, 150°)` → flank, x1.25
/// - difference `>= 150°` → rear, x2.0
///
/// Symmetric under angle negation: flanking from the left and the
/// right score identically.
#[must_use]
pub fn directional_multiplier(attacker_pos: Vec2, target_pos: Vec2, target_facing: f32) -> f32 {
    let to_attacker = (attacker_pos - target_pos).angle();
    multiplier_for_angle(angle_difference(to_attacker, target_facing))
}

/// Band lookup for an already-computed angular difference in `[0, PI]`.
#[must_use]
pub fn multiplier_for_angle(diff: f32) -> f32 {
    if diff < FRONT_ARC_RAD {
        FRONT_MULTIPLIER
    } else if diff >= REAR_ARC_RAD {
        REAR_MULTIPLIER
    } else {
        FLANK_MULTIPLIER
    }
}

/// Final damage for an attack: multiplier applied, fraction dropped.
#[must_use]
pub fn scaled_damage(attack_power: i32, multiplier: f32) -> i32 {
    (attack_power as f32 * multiplier).floor() as i32
}

/// Cavalry charge impact speed tier.
///
/// Impact speed is the recorded scalar speed times the charge boost.
/// Two narrow bands reward a clean full-speed connect; anything else
/// is the baseline.
#[must_use]
pub fn charge_speed_tier(impact_speed: f32) -> f32 {
    if (17.0..=18.0).contains(&impact_speed) {
        1.45
    } else if (13.0..=16.0).contains(&impact_speed) {
        1.15
    } else {
        1.0
    }
}
