//! Scenario loading and configuration.
//!
//! A scenario is the battlefield plus both armies' placements, stored
//! as RON so matchups can be edited by hand and checked into the repo.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skirmish_core::config::BattleConfig;
use skirmish_core::error::BattleError;
use skirmish_core::math::Vec2;
use skirmish_core::session::BattleSession;
use skirmish_core::units::{Team, UnitKind};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A placement was rejected by the session.
    #[error("invalid placement: {0}")]
    InvalidPlacement(#[from] BattleError),
    /// Army composition cannot produce a battle.
    #[error("scenario invalid: {0}")]
    BadComposition(String),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Battlefield width in world units.
    pub width: f32,
    /// Battlefield height in world units.
    pub height: f32,
    /// Simulation steps per tick.
    pub game_speed: u32,
    /// Unit placements for both armies.
    pub placements: Vec<Placement>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::mirror_match(20)
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Mirrored armies of `per_team` units, all five kinds cycled, on
    /// the standard 1200x800 field. The go-to matchup for balance
    /// sweeps because composition is identical on both sides.
    #[must_use]
    pub fn mirror_match(per_team: usize) -> Self {
        let mut placements = Vec::with_capacity(per_team * 2);
        for i in 0..per_team {
            let kind = UnitKind::ALL[i % UnitKind::ALL.len()];
            let row = (i % 16) as f32;
            let col = (i / 16) as f32;
            let y = 70.0 + row * 42.0;
            let x_off = col * 45.0;
            placements.push(Placement::new(kind, Team::Red, 120.0 + x_off, y));
            placements.push(Placement::new(kind, Team::Blue, 1080.0 - x_off, y));
        }
        Self {
            name: format!("Mirror {per_team}v{per_team}"),
            description: "Identical mixed armies facing each other".to_string(),
            width: 1200.0,
            height: 800.0,
            game_speed: 1,
            placements,
        }
    }

    /// Build a ready-to-start session from this scenario.
    ///
    /// The seed lives outside the scenario file so one matchup can be
    /// swept across many seeds.
    pub fn build_session(&self, seed: u64) -> Result<BattleSession, ScenarioError> {
        let has_red = self.placements.iter().any(|p| p.team == Team::Red);
        let has_blue = self.placements.iter().any(|p| p.team == Team::Blue);
        if !has_red || !has_blue {
            return Err(ScenarioError::BadComposition(
                "both armies need at least one unit".to_string(),
            ));
        }

        let config = BattleConfig::new(self.width, self.height)
            .with_game_speed(self.game_speed)
            .with_seed(seed);
        let mut session = BattleSession::new(config);
        for p in &self.placements {
            session.place_unit(Vec2::new(p.x, p.y), p.team, p.kind)?;
        }
        session.start(0.0)?;
        Ok(session)
    }
}

/// Placement of a single unit at battle start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Placement {
    /// Unit archetype.
    pub kind: UnitKind,
    /// Owning army.
    pub team: Team,
    /// X position in world units.
    pub x: f32,
    /// Y position in world units.
    pub y: f32,
}

impl Placement {
    /// Create a new placement.
    #[must_use]
    pub fn new(kind: UnitKind, team: Team, x: f32, y: f32) -> Self {
        Self { kind, team, x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::session::BattlePhase;

    #[test]
    fn test_mirror_match_is_balanced() {
        let scenario = Scenario::mirror_match(15);
        let red = scenario
            .placements
            .iter()
            .filter(|p| p.team == Team::Red)
            .count();
        let blue = scenario.placements.len() - red;
        assert_eq!(red, 15);
        assert_eq!(blue, 15);
    }

    #[test]
    fn test_build_session_starts_running() {
        let scenario = Scenario::mirror_match(10);
        let session = scenario.build_session(7).unwrap();
        assert_eq!(session.phase(), BattlePhase::Running);
        assert_eq!(session.alive_count(Team::Red), 10);
        assert_eq!(session.alive_count(Team::Blue), 10);
    }

    #[test]
    fn test_one_sided_scenario_rejected() {
        let scenario = Scenario {
            name: "lopsided".to_string(),
            description: String::new(),
            width: 1200.0,
            height: 800.0,
            game_speed: 1,
            placements: vec![Placement::new(UnitKind::Soldier, Team::Red, 100.0, 100.0)],
        };
        assert!(matches!(
            scenario.build_session(0),
            Err(ScenarioError::BadComposition(_))
        ));
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Cavalry screen",
                description: "Two lancers against a gun line",
                width: 1200.0,
                height: 800.0,
                game_speed: 1,
                placements: [
                    Placement(kind: Cavalry, team: Red, x: 100.0, y: 300.0),
                    Placement(kind: Cavalry, team: Red, x: 100.0, y: 500.0),
                    Placement(kind: Musketeer, team: Blue, x: 1100.0, y: 400.0),
                ],
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Cavalry screen");
        assert_eq!(scenario.placements.len(), 3);
        assert_eq!(scenario.placements[0].kind, UnitKind::Cavalry);
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }
}
