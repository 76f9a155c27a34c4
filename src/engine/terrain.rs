//! Battlefield terrain types and their effects
//!
//! The terrain table is compile-time data; cells reference it by value.

use serde::{Deserialize, Serialize};

/// Terrain type for a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Terrain {
    #[default]
    Plains, // No movement penalty, no cover
    Road,    // Movement bonus
    Forest,  // Slight penalty, light cover
    Rubble,  // Slight penalty
    Swamp,   // Heavy penalty
    Spikes,  // Damages units entering
    Bulwark, // Heavy cover
    Chasm,   // Impassable
}

impl Terrain {
    /// Movement cost for entering a cell of this terrain (1.0 = normal)
    pub fn movement_cost(&self) -> f32 {
        match self {
            Terrain::Plains => 1.0,
            Terrain::Road => 0.7,
            Terrain::Forest => 1.5,
            Terrain::Rubble => 1.5,
            Terrain::Swamp => 2.0,
            Terrain::Spikes => 1.0,
            Terrain::Bulwark => 1.0,
            Terrain::Chasm => f32::INFINITY,
        }
    }

    /// Can units stand on this terrain at all?
    pub fn passable(&self) -> bool {
        !matches!(self, Terrain::Chasm)
    }

    /// Damage applied to a unit the moment it enters, if any
    pub fn entry_damage(&self) -> Option<u32> {
        match self {
            Terrain::Spikes => Some(5),
            _ => None,
        }
    }

    /// Multiplicative damage reduction for a defender standing here
    /// (0.0 = none, 1.0 = full)
    pub fn defense_bonus(&self) -> f64 {
        match self {
            Terrain::Forest => 0.15,
            Terrain::Bulwark => 0.30,
            _ => 0.0,
        }
    }

    /// Stable name used by snapshots and the setup API
    pub fn name(&self) -> &'static str {
        match self {
            Terrain::Plains => "plains",
            Terrain::Road => "road",
            Terrain::Forest => "forest",
            Terrain::Rubble => "rubble",
            Terrain::Swamp => "swamp",
            Terrain::Spikes => "spikes",
            Terrain::Bulwark => "bulwark",
            Terrain::Chasm => "chasm",
        }
    }

    /// Look up a terrain by its stable name
    pub fn from_name(name: &str) -> Option<Terrain> {
        match name {
            "plains" => Some(Terrain::Plains),
            "road" => Some(Terrain::Road),
            "forest" => Some(Terrain::Forest),
            "rubble" => Some(Terrain::Rubble),
            "swamp" => Some(Terrain::Swamp),
            "spikes" => Some(Terrain::Spikes),
            "bulwark" => Some(Terrain::Bulwark),
            "chasm" => Some(Terrain::Chasm),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plains_no_penalty() {
        assert_eq!(Terrain::Plains.movement_cost(), 1.0);
        assert_eq!(Terrain::Plains.defense_bonus(), 0.0);
    }

    #[test]
    fn test_road_faster_than_plains() {
        assert!(Terrain::Road.movement_cost() < Terrain::Plains.movement_cost());
    }

    #[test]
    fn test_chasm_impassable() {
        assert!(!Terrain::Chasm.passable());
        assert!(Terrain::Chasm.movement_cost().is_infinite());
    }

    #[test]
    fn test_spikes_damage_on_entry() {
        assert!(Terrain::Spikes.entry_damage().is_some());
        assert!(Terrain::Plains.entry_damage().is_none());
    }

    #[test]
    fn test_bulwark_best_cover() {
        assert!(Terrain::Bulwark.defense_bonus() > Terrain::Forest.defense_bonus());
    }

    #[test]
    fn test_name_round_trip() {
        for terrain in [
            Terrain::Plains,
            Terrain::Road,
            Terrain::Forest,
            Terrain::Rubble,
            Terrain::Swamp,
            Terrain::Spikes,
            Terrain::Bulwark,
            Terrain::Chasm,
        ] {
            assert_eq!(Terrain::from_name(terrain.name()), Some(terrain));
        }
        assert_eq!(Terrain::from_name("lava"), None);
    }
}
