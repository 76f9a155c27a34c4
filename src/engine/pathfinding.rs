//! Cost-bounded A* pathfinding over the battle grid
//!
//! Respects terrain costs and occupancy; the goal cell itself is exempt
//! from the passability check so callers can path at an occupied target
//! and decide for themselves whether standing there is legal.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::engine::cell::CellGrid;
use crate::engine::coord::GridCoord;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    coord: GridCoord,
    f_cost: f32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path from `start` to `goal` whose cumulative terrain cost stays
/// within `max_cost`.
///
/// Step cost is the destination cell's terrain cost; the Chebyshev
/// heuristic is admissible because every step is one unit before terrain.
/// Returns the full path including both endpoints, or None.
pub fn find_path(
    cells: &CellGrid,
    start: GridCoord,
    goal: GridCoord,
    max_cost: f32,
) -> Option<Vec<GridCoord>> {
    cells.get(start)?;
    cells.get(goal)?;

    if start == goal {
        return Some(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
    let mut g_scores: HashMap<GridCoord, f32> = HashMap::new();

    g_scores.insert(start, 0.0);
    open_set.push(PathNode {
        coord: start,
        f_cost: start.chebyshev_distance(&goal) as f32,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return Some(reconstruct_path(&came_from, current.coord));
        }

        let current_g = *g_scores.get(&current.coord).unwrap_or(&f32::INFINITY);

        for neighbor in current.coord.neighbors() {
            let Some(cell) = cells.get(neighbor) else {
                continue;
            };

            // Occupancy at the goal is the caller's problem, not the search's.
            if neighbor != goal && !cell.passable() {
                continue;
            }

            let move_cost = cell.movement_cost();
            if move_cost.is_infinite() {
                continue;
            }

            let tentative_g = current_g + move_cost;
            if tentative_g > max_cost {
                continue;
            }

            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);
            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);

                open_set.push(PathNode {
                    coord: neighbor,
                    f_cost: tentative_g + neighbor.chebyshev_distance(&goal) as f32,
                });
            }
        }
    }

    None // No path within the cost bound
}

/// Reconstruct path from came_from map
fn reconstruct_path(
    came_from: &HashMap<GridCoord, GridCoord>,
    mut current: GridCoord,
) -> Vec<GridCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Cumulative cost of walking a path: the sum of entered-cell costs,
/// excluding the start cell.
pub fn path_cost(cells: &CellGrid, path: &[GridCoord]) -> f32 {
    path.iter()
        .skip(1)
        .filter_map(|coord| cells.get(*coord))
        .map(|cell| cell.movement_cost())
        .sum()
}
