//! Plain-data visual event queues.
//!
//! The simulation never draws. Each tick it appends records to these
//! queues; the host drains them and owns all animation (the `life` and
//! `progress` fields are initialized here and counted down by the
//! renderer). Events carry no references into the unit collection, so
//! they stay valid after the source or target dies.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::units::{Team, UnitId};

/// Initial lifetime for damage texts and flashes, in renderer units.
pub const EVENT_LIFE: f32 = 1.0;

/// Tracer progress advanced per renderer frame.
pub const TRACER_SPEED: f32 = 0.12;

/// Floating combat text: damage, healing, or a miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageText {
    /// Spawn position (above the target).
    pub pos: Vec2,
    /// Amount shown; zero for a miss.
    pub amount: i32,
    /// Team of the acting unit (drives text color).
    pub team: Team,
    /// Healing rather than damage.
    pub is_heal: bool,
    /// Critical hit styling.
    pub is_critical: bool,
    /// A shot that missed.
    pub is_miss: bool,
    /// Remaining lifetime, counted down by the renderer.
    pub life: f32,
}

/// Impact flash on a melee hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeleeFlash {
    /// Impact position.
    pub pos: Vec2,
    /// Attacker's team.
    pub team: Team,
    /// Critical hit styling.
    pub is_critical: bool,
    /// Remaining lifetime.
    pub life: f32,
}

/// Musket shot tracer, fired whether or not the shot connects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MusketTracer {
    /// Muzzle position.
    pub start: Vec2,
    /// Target position at the moment of firing.
    pub end: Vec2,
    /// Whether the shot connected.
    pub hit: bool,
    /// Travel progress along the line, 0 at the muzzle.
    pub progress: f32,
    /// Progress advanced per renderer frame.
    pub speed: f32,
    /// Remaining lifetime.
    pub life: f32,
}

/// Beam drawn from a healer to its patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealBeam {
    /// Healer position.
    pub start: Vec2,
    /// Patient position.
    pub end: Vec2,
    /// Health restored.
    pub amount: i32,
    /// Patient id, for renderers that track the beam to a moving unit.
    pub target: UnitId,
    /// Remaining lifetime.
    pub life: f32,
}

/// Per-category event queues owned by the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueues {
    damage_texts: Vec<DamageText>,
    melee_flashes: Vec<MeleeFlash>,
    tracers: Vec<MusketTracer>,
    heal_beams: Vec<HealBeam>,
}

impl EventQueues {
    /// Create empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a floating combat text.
    pub fn push_damage_text(&mut self, text: DamageText) {
        self.damage_texts.push(text);
    }

    /// Queue a melee impact flash.
    pub fn push_melee_flash(&mut self, flash: MeleeFlash) {
        self.melee_flashes.push(flash);
    }

    /// Queue a musket tracer.
    pub fn push_tracer(&mut self, tracer: MusketTracer) {
        self.tracers.push(tracer);
    }

    /// Queue a heal beam.
    pub fn push_heal_beam(&mut self, beam: HealBeam) {
        self.heal_beams.push(beam);
    }

    /// Drain all pending damage texts.
    pub fn drain_damage_texts(&mut self) -> std::vec::Drain<'_, DamageText> {
        self.damage_texts.drain(..)
    }

    /// Drain all pending melee flashes.
    pub fn drain_melee_flashes(&mut self) -> std::vec::Drain<'_, MeleeFlash> {
        self.melee_flashes.drain(..)
    }

    /// Drain all pending tracers.
    pub fn drain_tracers(&mut self) -> std::vec::Drain<'_, MusketTracer> {
        self.tracers.drain(..)
    }

    /// Drain all pending heal beams.
    pub fn drain_heal_beams(&mut self) -> std::vec::Drain<'_, HealBeam> {
        self.heal_beams.drain(..)
    }

    /// Number of pending damage texts.
    #[must_use]
    pub fn damage_text_count(&self) -> usize {
        self.damage_texts.len()
    }

    /// Number of pending tracers.
    #[must_use]
    pub fn tracer_count(&self) -> usize {
        self.tracers.len()
    }

    /// Number of pending heal beams.
    #[must_use]
    pub fn heal_beam_count(&self) -> usize {
        self.heal_beams.len()
    }

    /// Number of pending melee flashes.
    #[must_use]
    pub fn melee_flash_count(&self) -> usize {
        self.melee_flashes.len()
    }

    /// Discard all pending events.
    pub fn clear(&mut self) {
        self.damage_texts.clear();
        self.melee_flashes.clear();
        self.tracers.clear();
        self.heal_beams.clear();
    }

    /// True when every queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.damage_texts.is_empty()
            && self.melee_flashes.is_empty()
            && self.tracers.is_empty()
            && self.heal_beams.is_empty()
    }
}
