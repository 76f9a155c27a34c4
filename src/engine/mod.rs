//! Tactical grid-combat engine
//!
//! A 9x9 battlefield, two rosters, speed-ordered turns. The orchestrator
//! exposes move/attack primitives and turn advancement; deciding what to do
//! with them is the caller's job.

pub mod cell;
pub mod combat;
pub mod constants;
pub mod coord;
pub mod grid;
pub mod log;
pub mod pathfinding;
pub mod snapshot;
pub mod terrain;
pub mod unit;

// Re-exports for convenient access
pub use cell::{Cell, CellGrid, HighlightKind, Zone};
pub use combat::{calculate_damage, distance_modifier, DamageBreakdown};
pub use constants::*;
pub use coord::GridCoord;
pub use grid::{AttackReport, BattleGrid, BattleOutcome, BattlePhase, MoveReport};
pub use log::{BattleEvent, BattleEventKind, BattleLog};
pub use pathfinding::{find_path, path_cost};
pub use snapshot::{
    BattleSnapshot, CellSnapshot, CellView, GridView, OccupantView, UnitSnapshot,
};
pub use terrain::Terrain;
pub use unit::{
    AttackStyle, Role, Stat, StatModifier, StatusEffect, Team, Unit, UnitConfig, UnitId,
};
