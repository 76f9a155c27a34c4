//! Engine constants - all tunable values in one place

// Battlefield
pub const GRID_SIZE: usize = 9;

// Formation slots as (row, col). The first roster entry takes the leader
// slot, centered on the zone's back row; the rest flank one row forward.
pub const PLAYER_LEADER_SLOT: (i32, i32) = (8, 4);
pub const PLAYER_SUPPORT_SLOTS: [(i32, i32); 3] = [(7, 2), (7, 4), (7, 6)];
pub const ENEMY_LEADER_SLOT: (i32, i32) = (0, 4);
pub const ENEMY_SUPPORT_SLOTS: [(i32, i32); 3] = [(1, 2), (1, 4), (1, 6)];

// Distance modifiers by attack style (fraction of base damage)
pub const MELEE_CLOSE_BONUS: f64 = 0.30;
pub const MELEE_FAR_PENALTY: f64 = -0.13;
pub const RANGED_FAR_BONUS: f64 = 0.30;
pub const RANGED_CLOSE_PENALTY: f64 = -0.13;
pub const MAGIC_BAND_BONUS: f64 = 0.21;

// Distance thresholds for the modifiers above
pub const MELEE_FAR_DISTANCE: u32 = 2; // penalty beyond this
pub const RANGED_FAR_DISTANCE: u32 = 4; // bonus at and beyond this
pub const MAGIC_BAND_MIN: u32 = 2;
pub const MAGIC_BAND_MAX: u32 = 4;

// Critical hits
pub const CRIT_CHANCE_CAP: f64 = 0.34;
pub const CRIT_MULTIPLIER: f64 = 1.618;

// Battle log
pub const BATTLE_LOG_CAP: usize = 100;
pub const SNAPSHOT_LOG_TAIL: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formation_slots_in_bounds() {
        let all = PLAYER_SUPPORT_SLOTS
            .iter()
            .chain(ENEMY_SUPPORT_SLOTS.iter())
            .chain([PLAYER_LEADER_SLOT, ENEMY_LEADER_SLOT].iter());
        for (row, col) in all {
            assert!(*row >= 0 && (*row as usize) < GRID_SIZE);
            assert!(*col >= 0 && (*col as usize) < GRID_SIZE);
        }
    }

    #[test]
    fn test_crit_chance_is_a_probability() {
        assert!(CRIT_CHANCE_CAP > 0.0 && CRIT_CHANCE_CAP < 1.0);
    }

    #[test]
    fn test_penalties_never_zero_out_damage() {
        assert!(MELEE_FAR_PENALTY > -1.0);
        assert!(RANGED_CLOSE_PENALTY > -1.0);
    }
}
