//! # Skirmish Core
//!
//! Real-time 2D battle simulation core.
//!
//! Opposing armies are placed on a battlefield, the battle is started,
//! and autonomous units move, target, attack, heal, and die until one
//! side is eliminated. This crate contains **only** the simulation:
//! - No rendering
//! - No UI or audio
//! - No system randomness (miss rolls use a seeded PRNG)
//!
//! Visual effects (damage texts, melee flashes, musket tracers, heal
//! beams) are emitted as plain data queues for an external renderer to
//! drain; the host drives the simulation by calling
//! [`session::BattleSession::tick`] with its own clock.
//!
//! ## Crate Structure
//!
//! - [`units`] - Unit model, capability dispatch, per-kind state machines
//! - [`combat`] - Directional damage multipliers and charge speed tiers
//! - [`separation`] - Overlap resolution and battlefield bounds
//! - [`events`] - Plain-data visual event queues
//! - [`session`] - Battle lifecycle and the per-tick scheduler
//! - [`snapshot`] - Army placement capture and restore
//! - [`math`] - 2D vector and angle utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod separation;
pub mod session;
pub mod snapshot;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::directional_multiplier;
    pub use crate::config::BattleConfig;
    pub use crate::error::{BattleError, Result};
    pub use crate::events::EventQueues;
    pub use crate::math::Vec2;
    pub use crate::session::{BattlePhase, BattleSession, BattleStats};
    pub use crate::snapshot::ArmySnapshot;
    pub use crate::units::{Team, Unit, UnitId, UnitKind};
}
