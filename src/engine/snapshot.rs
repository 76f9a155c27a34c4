//! Read-only state export and the persistence snapshot contract
//!
//! The presentation view is a flat, render-ready projection. The
//! persistence snapshot carries enough to reconstruct grid, units, turn
//! order, and log; storing it somewhere is the caller's business.

use serde::{Deserialize, Serialize};

use crate::core::error::{ActionError, Result};
use crate::engine::cell::{HighlightKind, Zone};
use crate::engine::constants::SNAPSHOT_LOG_TAIL;
use crate::engine::coord::GridCoord;
use crate::engine::grid::{BattleGrid, BattleOutcome, BattlePhase};
use crate::engine::log::BattleEvent;
use crate::engine::terrain::Terrain;
use crate::engine::unit::{AttackStyle, Role, StatusEffect, Team, Unit, UnitId};

/// Summary of a cell's occupant for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupantView {
    pub id: UnitId,
    pub name: String,
    pub team: Team,
    pub role: Role,
    pub hp: u32,
    pub max_hp: u32,
    pub alive: bool,
}

/// One cell as the presentation layer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub row: i32,
    pub col: i32,
    pub zone: Zone,
    pub terrain: String,
    pub occupant: Option<OccupantView>,
    pub highlight: Option<HighlightKind>,
    pub effects: Vec<String>,
}

/// Full read-only battle view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridView {
    pub cells: Vec<CellView>,
    pub active_unit: Option<UnitId>,
    pub round: u32,
    pub phase: BattlePhase,
    pub outcome: BattleOutcome,
    pub player_alive: usize,
    pub enemy_alive: usize,
}

/// Cell state persisted by a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub row: i32,
    pub col: i32,
    pub terrain: String,
    pub effects: Vec<String>,
    pub occupant: Option<UnitId>,
}

/// Unit state persisted by a snapshot. Carries the full stat block so a
/// restore needs no side channel back to the roster supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub name: String,
    pub role: Role,
    pub team: Team,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub luck: i32,
    pub attack_range: u32,
    pub attack_style: AttackStyle,
    pub movement_range: u32,
    pub position: GridCoord,
    pub has_moved: bool,
    pub has_acted: bool,
    pub alive: bool,
    pub status_effects: Vec<StatusEffect>,
}

impl UnitSnapshot {
    fn from_unit(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            name: unit.name.clone(),
            role: unit.role,
            team: unit.team,
            hp: unit.hp,
            max_hp: unit.max_hp,
            attack: unit.attack,
            defense: unit.defense,
            speed: unit.speed,
            luck: unit.luck,
            attack_range: unit.attack_range,
            attack_style: unit.attack_style,
            movement_range: unit.movement_range,
            position: unit.position,
            has_moved: unit.has_moved,
            has_acted: unit.has_acted,
            alive: unit.alive,
            status_effects: unit.status_effects.clone(),
        }
    }

    fn to_unit(&self) -> Unit {
        Unit {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
            team: self.team,
            hp: self.hp,
            max_hp: self.max_hp,
            attack: self.attack,
            defense: self.defense,
            speed: self.speed,
            luck: self.luck,
            attack_range: self.attack_range,
            attack_style: self.attack_style,
            movement_range: self.movement_range,
            position: self.position,
            has_moved: self.has_moved,
            has_acted: self.has_acted,
            alive: self.alive,
            status_effects: self.status_effects.clone(),
        }
    }
}

/// Everything needed to rebuild a battle mid-flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub cells: Vec<CellSnapshot>,
    pub units: Vec<UnitSnapshot>,
    pub turn_order: Vec<UnitId>,
    pub current_turn: usize,
    pub round: u32,
    pub phase: BattlePhase,
    pub outcome: BattleOutcome,
    pub log_tail: Vec<BattleEvent>,
}

impl BattleGrid {
    /// Read-only projection for the presentation layer
    pub fn view(&self) -> GridView {
        let cells = self
            .cells
            .iter()
            .map(|cell| {
                let occupant = cell
                    .occupant
                    .and_then(|id| self.units.get(&id))
                    .map(|unit| OccupantView {
                        id: unit.id,
                        name: unit.name.clone(),
                        team: unit.team,
                        role: unit.role,
                        hp: unit.hp,
                        max_hp: unit.max_hp,
                        alive: unit.alive,
                    });
                CellView {
                    row: cell.coord.row,
                    col: cell.coord.col,
                    zone: cell.zone(),
                    terrain: cell.terrain.name().to_string(),
                    occupant,
                    highlight: cell.highlight,
                    effects: cell.effects.clone(),
                }
            })
            .collect();

        GridView {
            cells,
            active_unit: self.active_unit(),
            round: self.round,
            phase: self.phase,
            outcome: self.outcome,
            player_alive: self.living_count(Team::Player),
            enemy_alive: self.living_count(Team::Enemy),
        }
    }

    /// Persistence-oriented export
    pub fn snapshot(&self) -> BattleSnapshot {
        let cells = self
            .cells
            .iter()
            .map(|cell| CellSnapshot {
                row: cell.coord.row,
                col: cell.coord.col,
                terrain: cell.terrain.name().to_string(),
                effects: cell.effects.clone(),
                occupant: cell.occupant,
            })
            .collect();

        let units = self
            .roster
            .iter()
            .filter_map(|id| self.units.get(id))
            .map(UnitSnapshot::from_unit)
            .collect();

        BattleSnapshot {
            cells,
            units,
            turn_order: self.turn_order.clone(),
            current_turn: self.current_turn,
            round: self.round,
            phase: self.phase,
            outcome: self.outcome,
            log_tail: self.log.tail(SNAPSHOT_LOG_TAIL),
        }
    }

    /// Rebuild a battle from a snapshot. The restored grid gets a fresh
    /// RNG; randomness is not part of the persisted state.
    pub fn restore(snapshot: &BattleSnapshot) -> Result<BattleGrid> {
        let mut grid = BattleGrid::new();

        for unit_snap in &snapshot.units {
            let unit = unit_snap.to_unit();
            grid.roster.push(unit.id);
            grid.units.insert(unit.id, unit);
        }

        for cell_snap in &snapshot.cells {
            let coord = GridCoord::new(cell_snap.row, cell_snap.col);
            let terrain = Terrain::from_name(&cell_snap.terrain).ok_or_else(|| {
                ActionError::InvalidSnapshot(format!("unknown terrain '{}'", cell_snap.terrain))
            })?;
            let cell = grid.cells.get_mut(coord).ok_or_else(|| {
                ActionError::InvalidSnapshot(format!(
                    "cell ({}, {}) out of bounds",
                    cell_snap.row, cell_snap.col
                ))
            })?;
            cell.terrain = terrain;
            cell.effects = cell_snap.effects.clone();

            if let Some(id) = cell_snap.occupant {
                let unit = grid.units.get(&id).ok_or_else(|| {
                    ActionError::InvalidSnapshot("occupant not in the unit set".into())
                })?;
                if unit.position != coord {
                    return Err(ActionError::InvalidSnapshot(format!(
                        "occupant position mismatch at ({}, {})",
                        coord.row, coord.col
                    )));
                }
                cell.occupant = Some(id);
            }
        }

        for id in &snapshot.turn_order {
            if !grid.units.contains_key(id) {
                return Err(ActionError::InvalidSnapshot(
                    "turn order references an unknown unit".into(),
                ));
            }
        }
        grid.turn_order = snapshot.turn_order.clone();
        grid.current_turn = snapshot.current_turn.min(snapshot.turn_order.len());
        grid.round = snapshot.round;
        grid.phase = snapshot.phase;
        grid.outcome = snapshot.outcome;

        for event in &snapshot.log_tail {
            grid.log.push(event.round, event.kind.clone(), event.message.clone());
        }

        Ok(grid)
    }
}
