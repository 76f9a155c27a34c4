//! Battle grid cells and the 9x9 cell matrix
//!
//! A cell's occupant is an identity, never a handle: the unit registry owns
//! the units, and occupancy is re-linked together with the unit's position.

use serde::{Deserialize, Serialize};

use crate::engine::constants::GRID_SIZE;
use crate::engine::coord::GridCoord;
use crate::engine::terrain::Terrain;
use crate::engine::unit::UnitId;

/// Row band a cell belongs to. Drives initial placement and cosmetic
/// grouping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Enemy,   // rows 0-2
    Neutral, // rows 3-5
    Player,  // rows 6-8
}

/// UI highlight applied to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightKind {
    Movement,
    Attack,
    Selected,
}

/// A single cell on the battle grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub coord: GridCoord,
    pub terrain: Terrain,
    pub occupant: Option<UnitId>,
    pub effects: Vec<String>,
    pub highlight: Option<HighlightKind>,
}

impl Cell {
    pub fn new(coord: GridCoord, terrain: Terrain) -> Self {
        Self {
            coord,
            terrain,
            occupant: None,
            effects: Vec::new(),
            highlight: None,
        }
    }

    /// Which row band this cell belongs to
    pub fn zone(&self) -> Zone {
        match self.coord.row {
            0..=2 => Zone::Enemy,
            3..=5 => Zone::Neutral,
            _ => Zone::Player,
        }
    }

    pub fn occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Movement cost for entering this cell
    pub fn movement_cost(&self) -> f32 {
        self.terrain.movement_cost()
    }

    /// Passable terrain AND no occupant
    pub fn passable(&self) -> bool {
        self.terrain.passable() && !self.occupied()
    }

    /// Attach a transient effect. Effects are declarative metadata; nothing
    /// executes at the cell level.
    pub fn add_effect(&mut self, effect: impl Into<String>) {
        let effect = effect.into();
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }

    pub fn remove_effect(&mut self, effect: &str) {
        self.effects.retain(|e| e != effect);
    }
}

/// The fixed 9x9 cell matrix, built once per battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellGrid {
    cells: Vec<Vec<Cell>>,
}

impl CellGrid {
    /// Create a fresh grid of open plains
    pub fn new() -> Self {
        let mut cells = Vec::with_capacity(GRID_SIZE);
        for row in 0..GRID_SIZE {
            let mut line = Vec::with_capacity(GRID_SIZE);
            for col in 0..GRID_SIZE {
                line.push(Cell::new(
                    GridCoord::new(row as i32, col as i32),
                    Terrain::Plains,
                ));
            }
            cells.push(line);
        }
        Self { cells }
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.row >= 0
            && coord.col >= 0
            && (coord.row as usize) < GRID_SIZE
            && (coord.col as usize) < GRID_SIZE
    }

    /// Get the cell at a coordinate; out-of-bounds is an absence, not an
    /// error, so range and path code can probe past the edge freely.
    pub fn get(&self, coord: GridCoord) -> Option<&Cell> {
        if !self.in_bounds(coord) {
            return None;
        }
        Some(&self.cells[coord.row as usize][coord.col as usize])
    }

    pub fn get_mut(&mut self, coord: GridCoord) -> Option<&mut Cell> {
        if !self.in_bounds(coord) {
            return None;
        }
        Some(&mut self.cells[coord.row as usize][coord.col as usize])
    }

    pub fn set_terrain(&mut self, coord: GridCoord, terrain: Terrain) {
        if let Some(cell) = self.get_mut(coord) {
            cell.terrain = terrain;
        }
    }

    /// Iterate all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flat_map(|row| row.iter())
    }

    /// Clear every cell highlight
    pub fn clear_highlights(&mut self) {
        for row in &mut self.cells {
            for cell in row {
                cell.highlight = None;
            }
        }
    }
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dimensions() {
        let grid = CellGrid::new();
        assert_eq!(grid.iter().count(), GRID_SIZE * GRID_SIZE);
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let grid = CellGrid::new();
        assert!(grid.get(GridCoord::new(-1, 0)).is_none());
        assert!(grid.get(GridCoord::new(0, 9)).is_none());
        assert!(grid.get(GridCoord::new(8, 8)).is_some());
    }

    #[test]
    fn test_zone_bands() {
        let grid = CellGrid::new();
        assert_eq!(grid.get(GridCoord::new(0, 4)).unwrap().zone(), Zone::Enemy);
        assert_eq!(grid.get(GridCoord::new(2, 0)).unwrap().zone(), Zone::Enemy);
        assert_eq!(
            grid.get(GridCoord::new(4, 4)).unwrap().zone(),
            Zone::Neutral
        );
        assert_eq!(grid.get(GridCoord::new(6, 8)).unwrap().zone(), Zone::Player);
        assert_eq!(grid.get(GridCoord::new(8, 4)).unwrap().zone(), Zone::Player);
    }

    #[test]
    fn test_occupied_cell_not_passable() {
        let mut cell = Cell::new(GridCoord::new(3, 3), Terrain::Plains);
        assert!(cell.passable());

        cell.occupant = Some(UnitId::new());
        assert!(cell.occupied());
        assert!(!cell.passable());
    }

    #[test]
    fn test_impassable_terrain_not_passable() {
        let cell = Cell::new(GridCoord::new(3, 3), Terrain::Chasm);
        assert!(!cell.passable());
    }

    #[test]
    fn test_effects_add_remove_dedup() {
        let mut cell = Cell::new(GridCoord::new(0, 0), Terrain::Plains);
        cell.add_effect("burning");
        cell.add_effect("burning");
        assert_eq!(cell.effects.len(), 1);

        cell.remove_effect("burning");
        assert!(cell.effects.is_empty());
    }

    #[test]
    fn test_clear_highlights() {
        let mut grid = CellGrid::new();
        grid.get_mut(GridCoord::new(2, 2)).unwrap().highlight = Some(HighlightKind::Movement);
        grid.get_mut(GridCoord::new(5, 5)).unwrap().highlight = Some(HighlightKind::Attack);

        grid.clear_highlights();
        assert!(grid.iter().all(|c| c.highlight.is_none()));
    }
}
