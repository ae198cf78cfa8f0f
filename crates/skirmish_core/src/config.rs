//! Battlefield configuration.

use serde::{Deserialize, Serialize};

/// Reference battlefield dimension for the size multiplier.
pub const REFERENCE_DIMENSION: f32 = 800.0;

/// Base unit radius before per-kind and battlefield scaling.
pub const BASE_UNIT_RADIUS: f32 = 12.0;

/// Battlefield dimensions and pacing settings.
///
/// All unit radii and ranges are scaled at creation by
/// [`BattleConfig::size_multiplier`], so the same army layout behaves
/// the same on battlefields of different sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Battlefield width.
    pub width: f32,
    /// Battlefield height.
    pub height: f32,
    /// Margin kept clear along each edge.
    pub padding: f32,
    /// Integer pacing factor: each unit re-runs its full step this many
    /// times per tick. Not a delta-time scale; cooldowns stay on the
    /// wall clock.
    pub game_speed: u32,
    /// PRNG seed for accuracy rolls.
    pub seed: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 20.0,
            game_speed: 1,
            seed: 42,
        }
    }
}

impl BattleConfig {
    /// Create a config for a battlefield of the given dimensions.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Builder: set the pacing factor (clamped to at least 1).
    #[must_use]
    pub fn with_game_speed(mut self, game_speed: u32) -> Self {
        self.game_speed = game_speed.max(1);
        self
    }

    /// Builder: set the PRNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the edge padding.
    #[must_use]
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Global size multiplier: `min(width, height) / 800`.
    #[must_use]
    pub fn size_multiplier(&self) -> f32 {
        self.width.min(self.height) / REFERENCE_DIMENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_multiplier_uses_smaller_dimension() {
        let cfg = BattleConfig::new(1200.0, 800.0);
        assert_eq!(cfg.size_multiplier(), 1.0);

        let cfg = BattleConfig::new(1600.0, 1000.0);
        assert_eq!(cfg.size_multiplier(), 1.25);

        let cfg = BattleConfig::new(400.0, 1000.0);
        assert_eq!(cfg.size_multiplier(), 0.5);
    }

    #[test]
    fn test_game_speed_never_zero() {
        let cfg = BattleConfig::default().with_game_speed(0);
        assert_eq!(cfg.game_speed, 1);
    }
}
