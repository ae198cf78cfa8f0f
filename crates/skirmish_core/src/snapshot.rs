//! Army placement capture and restore.
//!
//! The session captures an [`ArmySnapshot`] the first time a battle
//! starts; replaying the same battle later rebuilds every unit from
//! its placement record. Snapshots also serialize to versioned bincode
//! files so a layout can be saved and rerun.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{BattleError, Result};
use crate::math::Vec2;
use crate::units::{Behavior, Team, Unit, UnitKind};

/// Snapshot format version, bumped on layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild one unit at its original placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Original position.
    pub pos: Vec2,
    /// Owning team.
    pub team: Team,
    /// Archetype.
    pub kind: UnitKind,
    /// Health at placement.
    pub max_health: i32,
    /// Radius, already scaled to the battlefield.
    pub radius: f32,
    /// Cavalry only: whether the first-charge bonus was still unspent.
    pub first_charge_available: bool,
}

/// Ordered placement records for both armies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmySnapshot {
    /// Format version.
    pub version: u32,
    /// Records in placement order.
    pub records: Vec<PlacementRecord>,
}

impl ArmySnapshot {
    /// Capture the current unit collection, in placement order.
    #[must_use]
    pub fn capture(units: &[Unit]) -> Self {
        let records = units
            .iter()
            .map(|u| PlacementRecord {
                pos: u.pos,
                team: u.team,
                kind: u.kind,
                max_health: u.max_health,
                radius: u.radius,
                first_charge_available: match u.behavior {
                    Behavior::Cavalry(b) => !b.has_used_first_charge,
                    _ => true,
                },
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            records,
        }
    }

    /// Number of recorded placements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recorded placements for one team.
    #[must_use]
    pub fn team_count(&self, team: Team) -> usize {
        self.records.iter().filter(|r| r.team == team).count()
    }

    /// Save to a bincode file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the snapshot
    /// cannot be encoded.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let bytes =
            bincode::serialize(self).map_err(|e| BattleError::Serialization(e.to_string()))?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Load from a bincode file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, decoded, or is a
    /// different format version.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let snapshot: Self = bincode::deserialize_from(reader)
            .map_err(|e| BattleError::Serialization(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(BattleError::InvalidState(format!(
                "snapshot version {} is not supported (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{SpecTable, UnitId};

    fn sample_units() -> Vec<Unit> {
        let table = SpecTable::default();
        vec![
            Unit::new(
                UnitId(1),
                Vec2::new(100.0, 200.0),
                Team::Red,
                UnitKind::Soldier,
                table.get(UnitKind::Soldier),
                1.0,
            ),
            Unit::new(
                UnitId(2),
                Vec2::new(700.0, 200.0),
                Team::Blue,
                UnitKind::Cavalry,
                table.get(UnitKind::Cavalry),
                1.0,
            ),
        ]
    }

    #[test]
    fn test_capture_preserves_order_and_placement() {
        let units = sample_units();
        let snap = ArmySnapshot::capture(&units);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.records[0].team, Team::Red);
        assert_eq!(snap.records[0].pos, Vec2::new(100.0, 200.0));
        assert_eq!(snap.records[1].kind, UnitKind::Cavalry);
        assert!(snap.records[1].first_charge_available);
        assert_eq!(snap.team_count(Team::Red), 1);
        assert_eq!(snap.team_count(Team::Blue), 1);
    }

    #[test]
    fn test_spent_first_charge_is_recorded() {
        let mut units = sample_units();
        if let Behavior::Cavalry(ref mut b) = units[1].behavior {
            b.has_used_first_charge = true;
        }
        let snap = ArmySnapshot::capture(&units);
        assert!(!snap.records[1].first_charge_available);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join("skirmish_snapshot_test.bin");

        let snap = ArmySnapshot::capture(&sample_units());
        snap.save(&path).unwrap();
        let loaded = ArmySnapshot::load(&path).unwrap();
        assert_eq!(loaded, snap);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("skirmish_snapshot_badversion.bin");

        let mut snap = ArmySnapshot::capture(&sample_units());
        snap.version = 99;
        snap.save(&path).unwrap();
        let err = ArmySnapshot::load(&path).unwrap_err();
        assert!(matches!(err, BattleError::InvalidState(_)));

        let _ = std::fs::remove_file(&path);
    }
}
