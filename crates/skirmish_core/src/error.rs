//! Error types for the battle simulation.
//!
//! The tick loop itself never fails; errors are rejected transitions
//! on the session surface (placement, lifecycle, persistence).

use thiserror::Error;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for all battle simulation errors.
#[derive(Debug, Error)]
pub enum BattleError {
    /// Placement outside the playable battlefield area.
    #[error("Position ({x:.1}, {y:.1}) is outside the battlefield")]
    OutOfBounds {
        /// Requested X coordinate.
        x: f32,
        /// Requested Y coordinate.
        y: f32,
    },

    /// Placement overlapping an already-placed unit.
    #[error("Placement overlaps existing unit {0}")]
    PlacementOverlap(u32),

    /// Invalid unit reference.
    #[error("Unit not found: {0}")]
    UnitNotFound(u32),

    /// Replay requested before any battle was started.
    #[error("No army snapshot has been captured")]
    NoSnapshot,

    /// Lifecycle operation not valid in the current phase.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Session or snapshot serialization failure.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Snapshot file IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
