//! Battle orchestration: placement, movement, combat, turn scheduling
//!
//! The grid owns the cell matrix and the unit registry outright. All
//! mutation flows through the operations here, which is what keeps cell
//! occupancy and unit positions in agreement.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::{ActionError, Result};
use crate::engine::cell::{Cell, CellGrid, HighlightKind};
use crate::engine::combat::calculate_damage;
use crate::engine::constants::{
    BATTLE_LOG_CAP, ENEMY_LEADER_SLOT, ENEMY_SUPPORT_SLOTS, PLAYER_LEADER_SLOT,
    PLAYER_SUPPORT_SLOTS,
};
use crate::engine::coord::GridCoord;
use crate::engine::log::{BattleEvent, BattleEventKind, BattleLog};
use crate::engine::pathfinding::find_path;
use crate::engine::terrain::Terrain;
use crate::engine::unit::{Role, Stat, StatusEffect, Team, Unit, UnitConfig, UnitId};

/// Battle lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Setup,
    InProgress,
    Ended,
}

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleOutcome {
    #[default]
    Undecided,
    Victory,
    Defeat,
}

/// Result of a successful move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReport {
    pub unit_id: UnitId,
    pub path: Vec<GridCoord>,
    /// Damage taken from hazardous terrain at the destination
    pub entry_damage: u32,
}

/// Result of a successful attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReport {
    pub attacker_id: UnitId,
    pub target_id: UnitId,
    /// Damage actually dealt after the defender's defense
    pub damage: u32,
    pub critical: bool,
    pub distance_modifier: f64,
    pub target_killed: bool,
}

/// The battle grid and everything on it
#[derive(Debug)]
pub struct BattleGrid {
    pub(crate) cells: CellGrid,
    pub(crate) units: AHashMap<UnitId, Unit>,
    /// Placement order; the stable source for per-team roster views
    pub(crate) roster: Vec<UnitId>,
    pub(crate) turn_order: Vec<UnitId>,
    pub(crate) current_turn: usize,
    pub(crate) round: u32,
    pub(crate) phase: BattlePhase,
    pub(crate) outcome: BattleOutcome,
    pub(crate) log: BattleLog,
    pub(crate) rng: ChaCha8Rng,
}

impl BattleGrid {
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Deterministic battles for replays and tests
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            cells: CellGrid::new(),
            units: AHashMap::new(),
            roster: Vec::new(),
            turn_order: Vec::new(),
            current_turn: 0,
            round: 0,
            phase: BattlePhase::Setup,
            outcome: BattleOutcome::Undecided,
            log: BattleLog::new(BATTLE_LOG_CAP),
            rng,
        }
    }

    // ===== Setup =====

    /// Reset the battlefield, place both rosters at their formation slots,
    /// and compute the initial turn order (effective speed descending, ties
    /// broken randomly). A new battle discards the previous one entirely.
    pub fn setup_battle(&mut self, player_roster: Vec<UnitConfig>, enemy_roster: Vec<UnitConfig>) {
        self.cells = CellGrid::new();
        self.units.clear();
        self.roster.clear();
        self.turn_order.clear();
        self.current_turn = 0;
        self.round = 1;
        self.phase = BattlePhase::InProgress;
        self.outcome = BattleOutcome::Undecided;
        self.log = BattleLog::new(BATTLE_LOG_CAP);

        self.place_roster(player_roster, Team::Player);
        self.place_roster(enemy_roster, Team::Enemy);

        let mut keyed: Vec<(i32, u32, UnitId)> = Vec::new();
        for id in &self.roster {
            if let Some(unit) = self.units.get(id) {
                if unit.alive {
                    keyed.push((unit.effective_stat(Stat::Speed), self.rng.gen(), *id));
                }
            }
        }
        keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        self.turn_order = keyed.into_iter().map(|(_, _, id)| id).collect();

        info!(units = self.turn_order.len(), "battle setup complete");
        self.log
            .push(self.round, BattleEventKind::BattleStarted, "Battle begins".into());
        self.evaluate_battle_end();
    }

    fn place_roster(&mut self, roster: Vec<UnitConfig>, team: Team) {
        let (leader, supports) = match team {
            Team::Player => (PLAYER_LEADER_SLOT, PLAYER_SUPPORT_SLOTS),
            Team::Enemy => (ENEMY_LEADER_SLOT, ENEMY_SUPPORT_SLOTS),
        };
        let slots: Vec<GridCoord> = std::iter::once(leader)
            .chain(supports)
            .map(|(row, col)| GridCoord::new(row, col))
            .collect();

        if roster.len() > slots.len() {
            warn!(
                ?team,
                ignored = roster.len() - slots.len(),
                "roster larger than formation; extra units ignored"
            );
        }

        for (config, coord) in roster.into_iter().zip(slots) {
            let mut unit = Unit::from_config(config);
            unit.team = team; // the roster argument decides the side
            unit.position = coord;
            let id = unit.id;
            if let Some(cell) = self.cells.get_mut(coord) {
                cell.occupant = Some(id);
            }
            self.roster.push(id);
            self.units.insert(id, unit);
        }
    }

    // ===== Movement =====

    /// Move a unit to a destination cell.
    ///
    /// Validated in order: the unit can still move this round, the
    /// destination is passable and free, the destination is within movement
    /// range by Chebyshev distance, and a path exists whose terrain cost
    /// stays within that range.
    pub fn move_unit(&mut self, id: UnitId, dest: GridCoord) -> Result<MoveReport> {
        if self.phase == BattlePhase::Ended {
            return Err(ActionError::BattleEnded);
        }

        let unit = self.units.get(&id).ok_or(ActionError::UnknownUnit)?;
        if !unit.can_move() {
            return Err(ActionError::CannotMove);
        }
        let from = unit.position;
        let movement_range = unit.movement_range;
        let name = unit.name.clone();

        let dest_cell = self.cells.get(dest).ok_or(ActionError::InvalidTarget)?;
        if !dest_cell.passable() {
            return Err(ActionError::InvalidTarget);
        }
        let entry_damage = dest_cell.terrain.entry_damage();

        if from.chebyshev_distance(&dest) > movement_range {
            return Err(ActionError::OutOfRange);
        }

        let path = find_path(&self.cells, from, dest, movement_range as f32)
            .ok_or(ActionError::NoValidPath)?;

        // Occupancy and position always change together.
        self.relocate_unit(id, dest);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.has_moved = true;
        }

        debug!(unit = %name, ?from, ?dest, "unit moved");
        self.log.push(
            self.round,
            BattleEventKind::UnitMoved { unit_id: id },
            format!("{} moves to ({}, {})", name, dest.row, dest.col),
        );

        let mut damage_taken = 0;
        if let Some(amount) = entry_damage {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.take_raw_damage(amount);
                damage_taken = amount;
            }
            self.log.push(
                self.round,
                BattleEventKind::TerrainDamage {
                    unit_id: id,
                    amount,
                },
                format!("{} takes {} damage from hazardous ground", name, amount),
            );
            let died = self.units.get(&id).map_or(false, |u| !u.alive);
            if died {
                self.handle_unit_death(id);
            }
        }

        Ok(MoveReport {
            unit_id: id,
            path,
            entry_damage: damage_taken,
        })
    }

    /// Move the cell occupancy and the unit position as one step. The two
    /// fields are views into the same relationship and must never diverge.
    fn relocate_unit(&mut self, id: UnitId, dest: GridCoord) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let from = unit.position;
        unit.position = dest;

        if let Some(cell) = self.cells.get_mut(from) {
            if cell.occupant == Some(id) {
                cell.occupant = None;
            }
        }
        if let Some(cell) = self.cells.get_mut(dest) {
            cell.occupant = Some(id);
        }
    }

    // ===== Combat =====

    /// Attack the unit standing on a target cell.
    ///
    /// Validated in order: the attacker can still act this round, the cell
    /// holds a unit, that unit is hostile, and it is within attack range by
    /// Chebyshev distance.
    pub fn perform_attack(&mut self, attacker_id: UnitId, target: GridCoord) -> Result<AttackReport> {
        if self.phase == BattlePhase::Ended {
            return Err(ActionError::BattleEnded);
        }

        let attacker = self.units.get(&attacker_id).ok_or(ActionError::UnknownUnit)?;
        if !attacker.can_act() {
            return Err(ActionError::CannotAct);
        }
        let attacker_pos = attacker.position;
        let attacker_team = attacker.team;
        let attack_range = attacker.attack_range;
        let attacker_name = attacker.name.clone();

        let cell = self.cells.get(target).ok_or(ActionError::NoTarget)?;
        let target_id = cell.occupant.ok_or(ActionError::NoTarget)?;
        let cover = cell.terrain.defense_bonus();

        let defender = self.units.get(&target_id).ok_or(ActionError::NoTarget)?;
        if defender.team == attacker_team {
            return Err(ActionError::CannotAttackAlly);
        }
        let defender_name = defender.name.clone();
        let distance = attacker_pos.chebyshev_distance(&defender.position);
        if distance > attack_range {
            return Err(ActionError::OutOfRange);
        }

        let attacker = self.units.get(&attacker_id).ok_or(ActionError::UnknownUnit)?;
        let breakdown = calculate_damage(attacker, cover, distance, &mut self.rng);

        let defender = self.units.get_mut(&target_id).ok_or(ActionError::NoTarget)?;
        let dealt = defender.take_damage(breakdown.total);
        let killed = !defender.alive;

        if let Some(attacker) = self.units.get_mut(&attacker_id) {
            attacker.has_acted = true;
        }

        debug!(
            attacker = %attacker_name,
            target = %defender_name,
            dealt,
            critical = breakdown.critical,
            "attack resolved"
        );
        let message = if breakdown.critical {
            format!(
                "{} critically hits {} for {} damage",
                attacker_name, defender_name, dealt
            )
        } else {
            format!("{} hits {} for {} damage", attacker_name, defender_name, dealt)
        };
        self.log.push(
            self.round,
            BattleEventKind::AttackResolved {
                attacker_id,
                target_id,
                damage: dealt,
                critical: breakdown.critical,
            },
            message,
        );

        if killed {
            self.handle_unit_death(target_id);
        }

        Ok(AttackReport {
            attacker_id,
            target_id,
            damage: dealt,
            critical: breakdown.critical,
            distance_modifier: breakdown.distance_modifier,
            target_killed: killed,
        })
    }

    // ===== Death and battle end =====

    /// A unit's hit points reached zero: clear its cell, drop it from the
    /// turn order (it stays in the registry for inspection), and check for
    /// battle end.
    fn handle_unit_death(&mut self, id: UnitId) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let name = unit.name.clone();
        let position = unit.position;

        if let Some(cell) = self.cells.get_mut(position) {
            if cell.occupant == Some(id) {
                cell.occupant = None;
            }
        }

        let was_active = self.drop_from_turn_order(id);

        info!(unit = %name, "unit died");
        self.log.push(
            self.round,
            BattleEventKind::UnitDied { unit_id: id },
            format!("{} falls", name),
        );

        self.evaluate_battle_end();
        if was_active && self.phase == BattlePhase::InProgress {
            // The pointer already names the next unit; normalize wrapping.
            self.advance_pointer();
        }
    }

    /// Remove a unit from the turn order, keeping the current-turn pointer
    /// on the same active unit. Returns true if the removed unit was the
    /// active one.
    fn drop_from_turn_order(&mut self, id: UnitId) -> bool {
        let Some(pos) = self.turn_order.iter().position(|u| *u == id) else {
            return false;
        };
        self.turn_order.remove(pos);
        if pos < self.current_turn {
            self.current_turn -= 1;
            false
        } else {
            pos == self.current_turn
        }
    }

    fn evaluate_battle_end(&mut self) {
        if self.phase != BattlePhase::InProgress {
            return;
        }

        let enemy_alive = self
            .units
            .values()
            .any(|u| u.team == Team::Enemy && u.alive);
        let player_alive = self
            .units
            .values()
            .any(|u| u.team == Team::Player && u.alive);
        let hero_dead = self
            .units
            .values()
            .any(|u| u.role == Role::Player && !u.alive);

        let result = if !enemy_alive {
            Some(BattleOutcome::Victory)
        } else if hero_dead || !player_alive {
            Some(BattleOutcome::Defeat)
        } else {
            None
        };

        if let Some(outcome) = result {
            self.phase = BattlePhase::Ended;
            self.outcome = outcome;
            info!(?outcome, round = self.round, "battle ended");
            self.log.push(
                self.round,
                BattleEventKind::BattleEnded { outcome },
                format!("Battle ended: {:?}", outcome),
            );
        }
    }

    // ===== Turn scheduling =====

    /// End the active unit's turn by force-spending both of its per-round
    /// flags, then advance. Returns the new active unit, if any.
    pub fn end_current_turn(&mut self) -> Result<Option<UnitId>> {
        if self.phase != BattlePhase::InProgress {
            return Err(ActionError::BattleEnded);
        }
        if let Some(id) = self.turn_order.get(self.current_turn).copied() {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.has_moved = true;
                unit.has_acted = true;
            }
        }
        Ok(self.next_turn())
    }

    /// Advance to the next living unit. The outgoing unit's status effects
    /// tick first (and can kill it); wrapping past the end of the order
    /// starts a new round and clears every unit's per-round flags.
    pub fn next_turn(&mut self) -> Option<UnitId> {
        if self.phase != BattlePhase::InProgress {
            return None;
        }

        if let Some(id) = self.turn_order.get(self.current_turn).copied() {
            let expired = match self.units.get_mut(&id) {
                Some(unit) => unit.tick_status_effects(),
                None => Vec::new(),
            };
            for effect in &expired {
                debug!(unit_id = ?id, effect = %effect, "status effect expired");
            }

            let died = self.units.get(&id).map_or(false, |u| !u.alive);
            if died {
                self.handle_unit_death(id);
                if self.phase != BattlePhase::InProgress {
                    return None;
                }
                // Death handling left the pointer on the next unit.
                return self.turn_order.get(self.current_turn).copied();
            }
            self.current_turn += 1;
        }

        self.advance_pointer()
    }

    /// Normalize the turn pointer: wrap past the end (starting a new round)
    /// and skip anything not alive. Returns the unit the pointer lands on.
    fn advance_pointer(&mut self) -> Option<UnitId> {
        if self.phase != BattlePhase::InProgress || self.turn_order.is_empty() {
            return None;
        }

        let mut steps = 0;
        loop {
            if self.current_turn >= self.turn_order.len() {
                self.current_turn = 0;
                self.round += 1;
                for unit in self.units.values_mut() {
                    unit.reset_turn();
                }
                debug!(round = self.round, "new round");
                self.log.push(
                    self.round,
                    BattleEventKind::RoundStarted { round: self.round },
                    format!("Round {} begins", self.round),
                );
            }

            let id = self.turn_order[self.current_turn];
            if self.units.get(&id).map_or(false, |u| u.alive) {
                return Some(id);
            }

            self.current_turn += 1;
            steps += 1;
            if steps > self.turn_order.len() + 1 {
                return None;
            }
        }
    }

    // ===== Unit lifecycle =====

    /// Explicitly remove a unit from the battle: registry, cell, turn order.
    pub fn remove_unit(&mut self, id: UnitId) -> Result<()> {
        let unit = self.units.get(&id).ok_or(ActionError::UnknownUnit)?;
        let name = unit.name.clone();
        let position = unit.position;

        if let Some(cell) = self.cells.get_mut(position) {
            if cell.occupant == Some(id) {
                cell.occupant = None;
            }
        }
        self.drop_from_turn_order(id);
        self.roster.retain(|u| *u != id);
        self.units.remove(&id);

        self.log.push(
            self.round,
            BattleEventKind::UnitRemoved { unit_id: id },
            format!("{} leaves the battle", name),
        );

        self.evaluate_battle_end();
        if self.phase == BattlePhase::InProgress && !self.turn_order.is_empty() {
            self.advance_pointer();
        }
        Ok(())
    }

    /// Attach a status effect to a unit. The effect starts ticking at the
    /// end of that unit's turns.
    pub fn apply_status_effect(&mut self, id: UnitId, effect: StatusEffect) -> Result<()> {
        if self.phase == BattlePhase::Ended {
            return Err(ActionError::BattleEnded);
        }
        let unit = self.units.get_mut(&id).ok_or(ActionError::UnknownUnit)?;
        debug!(unit = %unit.name, effect = %effect.id, "status effect applied");
        unit.add_status_effect(effect);
        Ok(())
    }

    /// Heal a unit, capped at its maximum. Returns the amount healed.
    pub fn heal_unit(&mut self, id: UnitId, amount: u32) -> Result<u32> {
        if self.phase == BattlePhase::Ended {
            return Err(ActionError::BattleEnded);
        }
        let unit = self.units.get_mut(&id).ok_or(ActionError::UnknownUnit)?;
        Ok(unit.heal(amount))
    }

    // ===== Queries =====

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn outcome(&self) -> BattleOutcome {
        self.outcome
    }

    pub fn is_ended(&self) -> bool {
        self.phase == BattlePhase::Ended
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Whose turn is it?
    pub fn active_unit(&self) -> Option<UnitId> {
        if self.phase != BattlePhase::InProgress {
            return None;
        }
        self.turn_order.get(self.current_turn).copied()
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn cell(&self, coord: GridCoord) -> Option<&Cell> {
        self.cells.get(coord)
    }

    pub fn turn_order(&self) -> &[UnitId] {
        &self.turn_order
    }

    /// Roster view for one side, in placement order
    pub fn team_units(&self, team: Team) -> Vec<UnitId> {
        self.roster
            .iter()
            .filter(|id| self.units.get(id).map_or(false, |u| u.team == team))
            .copied()
            .collect()
    }

    pub fn living_count(&self, team: Team) -> usize {
        self.units
            .values()
            .filter(|u| u.team == team && u.alive)
            .count()
    }

    /// All cells the unit could move to right now: passable, within
    /// movement range, and reachable by a cost-bounded path. No side
    /// effects; used to drive highlights.
    pub fn movement_range(&self, id: UnitId) -> Result<Vec<GridCoord>> {
        let unit = self.units.get(&id).ok_or(ActionError::UnknownUnit)?;
        if !unit.alive {
            return Ok(Vec::new());
        }
        let origin = unit.position;
        let range = unit.movement_range;

        let mut reachable = Vec::new();
        let r = range as i32;
        for dr in -r..=r {
            for dc in -r..=r {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let coord = GridCoord::new(origin.row + dr, origin.col + dc);
                let Some(cell) = self.cells.get(coord) else {
                    continue;
                };
                if !cell.passable() {
                    continue;
                }
                if find_path(&self.cells, origin, coord, range as f32).is_some() {
                    reachable.push(coord);
                }
            }
        }
        Ok(reachable)
    }

    /// All cells the unit could target right now: a plain distance check,
    /// occupied or not.
    pub fn attack_range(&self, id: UnitId) -> Result<Vec<GridCoord>> {
        let unit = self.units.get(&id).ok_or(ActionError::UnknownUnit)?;
        if !unit.alive {
            return Ok(Vec::new());
        }
        let origin = unit.position;

        let mut targets = Vec::new();
        let r = unit.attack_range as i32;
        for dr in -r..=r {
            for dc in -r..=r {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let coord = GridCoord::new(origin.row + dr, origin.col + dc);
                if self.cells.in_bounds(coord) {
                    targets.push(coord);
                }
            }
        }
        Ok(targets)
    }

    // ===== Terrain, effects, highlights =====

    pub fn set_terrain(&mut self, coord: GridCoord, terrain: Terrain) {
        self.cells.set_terrain(coord, terrain);
    }

    /// Set terrain by its stable name; false if the name is unknown
    pub fn set_terrain_by_name(&mut self, coord: GridCoord, name: &str) -> bool {
        match Terrain::from_name(name) {
            Some(terrain) => {
                self.cells.set_terrain(coord, terrain);
                true
            }
            None => false,
        }
    }

    pub fn add_cell_effect(&mut self, coord: GridCoord, effect: impl Into<String>) {
        if let Some(cell) = self.cells.get_mut(coord) {
            cell.add_effect(effect);
        }
    }

    pub fn remove_cell_effect(&mut self, coord: GridCoord, effect: &str) {
        if let Some(cell) = self.cells.get_mut(coord) {
            cell.remove_effect(effect);
        }
    }

    pub fn set_highlight(&mut self, coord: GridCoord, kind: HighlightKind) {
        if let Some(cell) = self.cells.get_mut(coord) {
            cell.highlight = Some(kind);
        }
    }

    pub fn clear_highlight(&mut self, coord: GridCoord) {
        if let Some(cell) = self.cells.get_mut(coord) {
            cell.highlight = None;
        }
    }

    pub fn clear_highlights(&mut self) {
        self.cells.clear_highlights();
    }

    // ===== Log =====

    pub fn log_entries(&self) -> impl Iterator<Item = &BattleEvent> {
        self.log.entries()
    }

    pub fn log_tail(&self, n: usize) -> Vec<BattleEvent> {
        self.log.tail(n)
    }
}

impl Default for BattleGrid {
    fn default() -> Self {
        Self::new()
    }
}
