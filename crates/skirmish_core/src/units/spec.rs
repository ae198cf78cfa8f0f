//! Data-driven per-kind unit stats.
//!
//! Stats are plain serde structs so balance passes can be done in RON
//! without touching code. The built-in table reproduces the shipped
//! tuning; [`SpecTable::from_ron`] loads an override file.

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};
use crate::units::UnitKind;

/// Base stats for one unit kind.
///
/// Kind-specific fields default to zero and are only read by the
/// matching state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Hit points at creation.
    pub max_health: i32,
    /// Base attack damage before multipliers.
    #[serde(default)]
    pub attack_power: i32,
    /// Milliseconds between attacks.
    #[serde(default)]
    pub attack_cooldown_ms: f64,
    /// Top movement speed.
    pub max_speed: f32,
    /// Steering responsiveness per frame.
    pub turn_speed: f32,
    /// Radius relative to the base unit radius.
    pub radius_scale: f32,

    // Healer
    /// Health restored per pulse.
    #[serde(default)]
    pub heal_power: i32,
    /// Healing reach (pre-scale).
    #[serde(default)]
    pub heal_range: f32,
    /// Milliseconds between heal pulses.
    #[serde(default)]
    pub heal_cooldown_ms: f64,

    // Musketeer
    /// Musket reach (pre-scale).
    #[serde(default)]
    pub shooting_range: f32,
    /// Distance at which the bayonet comes out (pre-scale).
    #[serde(default)]
    pub bayonet_range: f32,
    /// Probability a shot misses.
    #[serde(default)]
    pub miss_chance: f32,

    // Cavalry
    /// Riding speed outside a charge.
    #[serde(default)]
    pub charge_base_speed: f32,
    /// Milliseconds between charges.
    #[serde(default)]
    pub charge_cooldown_ms: f64,
    /// Maximum charge length in milliseconds.
    #[serde(default)]
    pub charge_duration_ms: f64,
    /// Minimum run-up distance to start a charge (pre-scale).
    #[serde(default)]
    pub min_charge_distance: f32,
}

impl UnitSpec {
    fn soldier() -> Self {
        Self {
            max_health: 100,
            attack_power: 10,
            attack_cooldown_ms: 600.0,
            max_speed: 2.0,
            turn_speed: 0.1,
            radius_scale: 1.0,
            ..Self::empty()
        }
    }

    fn tank() -> Self {
        Self {
            max_health: 220,
            attack_power: 20,
            attack_cooldown_ms: 1000.0,
            max_speed: 1.0,
            turn_speed: 0.05,
            radius_scale: 1.4,
            ..Self::empty()
        }
    }

    fn healer() -> Self {
        Self {
            max_health: 70,
            max_speed: 1.5,
            turn_speed: 0.1,
            radius_scale: 0.9,
            heal_power: 10,
            heal_range: 80.0,
            heal_cooldown_ms: 1000.0,
            ..Self::empty()
        }
    }

    fn musketeer() -> Self {
        Self {
            max_health: 60,
            attack_power: 25,
            attack_cooldown_ms: 1200.0,
            max_speed: 1.6,
            turn_speed: 0.13,
            radius_scale: 0.9,
            shooting_range: 150.0,
            bayonet_range: 50.0,
            miss_chance: 0.35,
            ..Self::empty()
        }
    }

    fn cavalry() -> Self {
        Self {
            max_health: 120,
            attack_power: 16,
            attack_cooldown_ms: 500.0,
            max_speed: 2.8,
            turn_speed: 0.08,
            radius_scale: 1.1,
            charge_base_speed: 1.2,
            charge_cooldown_ms: 25_000.0,
            charge_duration_ms: 2_000.0,
            min_charge_distance: 50.0,
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            max_health: 0,
            attack_power: 0,
            attack_cooldown_ms: 0.0,
            max_speed: 0.0,
            turn_speed: 0.0,
            radius_scale: 1.0,
            heal_power: 0,
            heal_range: 0.0,
            heal_cooldown_ms: 0.0,
            shooting_range: 0.0,
            bayonet_range: 0.0,
            miss_chance: 0.0,
            charge_base_speed: 0.0,
            charge_cooldown_ms: 0.0,
            charge_duration_ms: 0.0,
            min_charge_distance: 0.0,
        }
    }
}

/// Full stat table, one spec per kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecTable {
    /// Soldier stats.
    pub soldier: UnitSpec,
    /// Tank stats.
    pub tank: UnitSpec,
    /// Healer stats.
    pub healer: UnitSpec,
    /// Musketeer stats.
    pub musketeer: UnitSpec,
    /// Cavalry stats.
    pub cavalry: UnitSpec,
}

impl Default for SpecTable {
    fn default() -> Self {
        Self {
            soldier: UnitSpec::soldier(),
            tank: UnitSpec::tank(),
            healer: UnitSpec::healer(),
            musketeer: UnitSpec::musketeer(),
            cavalry: UnitSpec::cavalry(),
        }
    }
}

impl SpecTable {
    /// Stats for a unit kind.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> &UnitSpec {
        match kind {
            UnitKind::Soldier => &self.soldier,
            UnitKind::Tank => &self.tank,
            UnitKind::Healer => &self.healer,
            UnitKind::Musketeer => &self.musketeer,
            UnitKind::Cavalry => &self.cavalry,
        }
    }

    /// Parse a stat table from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::DataParseError`] if the text is not a
    /// valid table.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| BattleError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a stat table from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or
    /// [`BattleError::DataParseError`] if it does not parse.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        ron::from_str(&text).map_err(|e| BattleError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
