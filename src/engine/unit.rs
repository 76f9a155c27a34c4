//! Combatant state: stats, position, per-round flags, status effects
//!
//! Units are owned exclusively by the battle grid's registry and mutated
//! only through engine operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::coord::GridCoord;

/// Unique identifier for units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side a unit fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
}

/// Battlefield role. `Player` marks the unit whose death loses the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Player,
    Creature,
    Ally,
    Boss,
    Minion,
}

/// How a unit's attacks scale with distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackStyle {
    Melee,
    Ranged,
    Magic,
}

/// A stat that status effects can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Attack,
    Defense,
    Speed,
    Luck,
}

/// Additive stat adjustment carried by a status effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: Stat,
    pub amount: i32,
}

/// A timed effect on a unit. Turn-start behavior fires once per turn of the
/// afflicted unit; the effect expires when its counter reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub id: String,
    pub remaining_turns: u32,
    pub modifiers: Vec<StatModifier>,
    pub damage_per_turn: u32,
    pub healing_per_turn: u32,
}

impl StatusEffect {
    pub fn new(id: impl Into<String>, remaining_turns: u32) -> Self {
        Self {
            id: id.into(),
            remaining_turns,
            modifiers: Vec::new(),
            damage_per_turn: 0,
            healing_per_turn: 0,
        }
    }

    pub fn with_modifier(mut self, stat: Stat, amount: i32) -> Self {
        self.modifiers.push(StatModifier { stat, amount });
        self
    }

    pub fn with_damage_per_turn(mut self, amount: u32) -> Self {
        self.damage_per_turn = amount;
        self
    }

    pub fn with_healing_per_turn(mut self, amount: u32) -> Self {
        self.healing_per_turn = amount;
        self
    }
}

/// Caller-supplied unit configuration.
///
/// Missing stats default rather than fail; deep validation is the roster
/// supplier's job. Defaults: 1 hp, zero combat stats, melee at range 1,
/// movement 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    pub name: String,
    pub role: Role,
    pub team: Team,
    pub max_hp: u32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub luck: i32,
    pub attack_range: u32,
    pub attack_style: AttackStyle,
    pub movement_range: u32,
}

impl UnitConfig {
    pub fn new(name: impl Into<String>, role: Role, team: Team) -> Self {
        Self {
            name: name.into(),
            role,
            team,
            ..Self::default()
        }
    }
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            role: Role::Creature,
            team: Team::Player,
            max_hp: 1,
            attack: 0,
            defense: 0,
            speed: 0,
            luck: 0,
            attack_range: 1,
            attack_style: AttackStyle::Melee,
            movement_range: 3,
        }
    }
}

/// A combatant on the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
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

    // Authoritative position; must always match the cell that references
    // this unit.
    pub position: GridCoord,

    pub has_moved: bool,
    pub has_acted: bool,
    pub alive: bool,

    pub status_effects: Vec<StatusEffect>,
}

impl Unit {
    pub fn from_config(config: UnitConfig) -> Self {
        let max_hp = config.max_hp.max(1);
        Self {
            id: UnitId::new(),
            name: config.name,
            role: config.role,
            team: config.team,
            hp: max_hp,
            max_hp,
            attack: config.attack,
            defense: config.defense,
            speed: config.speed,
            luck: config.luck,
            attack_range: config.attack_range,
            attack_style: config.attack_style,
            movement_range: config.movement_range,
            position: GridCoord::default(),
            has_moved: false,
            has_acted: false,
            alive: true,
            status_effects: Vec::new(),
        }
    }

    /// Base stat plus every active modifier for it, floored at 0
    pub fn effective_stat(&self, stat: Stat) -> i32 {
        let base = match stat {
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::Speed => self.speed,
            Stat::Luck => self.luck,
        };
        let modifier: i32 = self
            .status_effects
            .iter()
            .flat_map(|e| e.modifiers.iter())
            .filter(|m| m.stat == stat)
            .map(|m| m.amount)
            .sum();
        (base + modifier).max(0)
    }

    /// Apply incoming attack damage, reduced by effective defense.
    ///
    /// Returns the actual damage dealt. Hit points floor at 0 and liveness
    /// flips exactly there.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let defense = self.effective_stat(Stat::Defense) as u32;
        let dealt = amount.saturating_sub(defense);
        self.hp = self.hp.saturating_sub(dealt);
        self.alive = self.hp > 0;
        dealt
    }

    /// Apply damage that ignores defense (terrain, poison)
    pub fn take_raw_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
        self.alive = self.hp > 0;
    }

    /// Restore hit points, capped at maximum. Returns the amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max_hp - self.hp);
        self.hp += healed;
        self.alive = self.hp > 0;
        healed
    }

    /// Clear both per-round flags
    pub fn reset_turn(&mut self) {
        self.has_moved = false;
        self.has_acted = false;
    }

    pub fn can_move(&self) -> bool {
        self.alive && !self.has_moved
    }

    pub fn can_act(&self) -> bool {
        self.alive && !self.has_acted
    }

    pub fn add_status_effect(&mut self, effect: StatusEffect) {
        self.status_effects.push(effect);
    }

    /// Fire each effect's turn-start behavior, then decrement counters and
    /// drop expired effects. Returns the ids that expired this call.
    pub fn tick_status_effects(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        let max_hp = self.max_hp;
        let mut hp = self.hp;

        for effect in &mut self.status_effects {
            hp = hp.saturating_sub(effect.damage_per_turn);
            hp = (hp + effect.healing_per_turn).min(max_hp);

            effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
            if effect.remaining_turns == 0 {
                expired.push(effect.id.clone());
            }
        }

        self.hp = hp;
        self.alive = self.hp > 0;
        self.status_effects.retain(|e| e.remaining_turns > 0);
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_unit() -> Unit {
        Unit::from_config(UnitConfig {
            name: "Test".into(),
            max_hp: 50,
            attack: 10,
            defense: 5,
            speed: 8,
            luck: 3,
            ..UnitConfig::default()
        })
    }

    #[test]
    fn test_config_defaults() {
        let unit = Unit::from_config(UnitConfig::new("Blank", Role::Minion, Team::Enemy));
        assert_eq!(unit.hp, 1);
        assert_eq!(unit.attack, 0);
        assert_eq!(unit.attack_range, 1);
        assert_eq!(unit.movement_range, 3);
        assert!(unit.alive);
    }

    #[test]
    fn test_zero_hp_config_floors_to_one() {
        let unit = Unit::from_config(UnitConfig {
            max_hp: 0,
            ..UnitConfig::default()
        });
        assert_eq!(unit.max_hp, 1);
        assert!(unit.alive);
    }

    #[test]
    fn test_take_damage_subtracts_defense() {
        let mut unit = test_unit();
        let dealt = unit.take_damage(12);
        assert_eq!(dealt, 7); // 12 - 5 defense
        assert_eq!(unit.hp, 43);
        assert!(unit.alive);
    }

    #[test]
    fn test_take_damage_never_negative() {
        let mut unit = test_unit();
        let dealt = unit.take_damage(3); // below defense
        assert_eq!(dealt, 0);
        assert_eq!(unit.hp, 50);
    }

    #[test]
    fn test_liveness_flips_exactly_at_zero() {
        let mut unit = test_unit();
        unit.take_damage(54); // 49 through defense
        assert_eq!(unit.hp, 1);
        assert!(unit.alive);

        unit.take_damage(6); // 1 through defense
        assert_eq!(unit.hp, 0);
        assert!(!unit.alive);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut unit = test_unit();
        unit.take_damage(15); // hp 40
        let healed = unit.heal(100);
        assert_eq!(healed, 10);
        assert_eq!(unit.hp, unit.max_hp);
    }

    #[test]
    fn test_reset_turn_clears_flags() {
        let mut unit = test_unit();
        unit.has_moved = true;
        unit.has_acted = true;
        unit.reset_turn();
        assert!(unit.can_move());
        assert!(unit.can_act());
    }

    #[test]
    fn test_dead_unit_cannot_move_or_act() {
        let mut unit = test_unit();
        unit.take_damage(1000);
        assert!(!unit.can_move());
        assert!(!unit.can_act());
    }

    #[test]
    fn test_effective_stat_applies_modifiers() {
        let mut unit = test_unit();
        unit.add_status_effect(StatusEffect::new("war cry", 2).with_modifier(Stat::Attack, 4));
        unit.add_status_effect(StatusEffect::new("chill", 2).with_modifier(Stat::Speed, -3));

        assert_eq!(unit.effective_stat(Stat::Attack), 14);
        assert_eq!(unit.effective_stat(Stat::Speed), 5);
    }

    #[test]
    fn test_effective_stat_floors_at_zero() {
        let mut unit = test_unit();
        unit.add_status_effect(StatusEffect::new("curse", 3).with_modifier(Stat::Defense, -20));
        assert_eq!(unit.effective_stat(Stat::Defense), 0);
    }

    #[test]
    fn test_status_tick_damage_and_expiry() {
        let mut unit = test_unit();
        unit.add_status_effect(StatusEffect::new("poison", 2).with_damage_per_turn(4));

        let expired = unit.tick_status_effects();
        assert!(expired.is_empty());
        assert_eq!(unit.hp, 46);

        let expired = unit.tick_status_effects();
        assert_eq!(expired, vec!["poison".to_string()]);
        assert_eq!(unit.hp, 42);
        assert!(unit.status_effects.is_empty());
    }

    #[test]
    fn test_status_tick_healing_capped() {
        let mut unit = test_unit();
        unit.take_damage(8); // hp 47
        unit.add_status_effect(StatusEffect::new("regen", 3).with_healing_per_turn(10));

        unit.tick_status_effects();
        assert_eq!(unit.hp, unit.max_hp);
    }

    #[test]
    fn test_status_dot_can_kill() {
        let mut poisoned = test_unit();
        poisoned.hp = 3;
        poisoned.add_status_effect(StatusEffect::new("venom", 5).with_damage_per_turn(4));
        poisoned.tick_status_effects();
        assert_eq!(poisoned.hp, 0);
        assert!(!poisoned.alive);
    }
}
