//! Capped battle event log
//!
//! Oldest entries are dropped once the cap is reached; snapshots export
//! only a short tail.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::engine::grid::BattleOutcome;
use crate::engine::unit::UnitId;

/// One logged battle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: u32,
    pub kind: BattleEventKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventKind {
    BattleStarted,
    RoundStarted { round: u32 },
    UnitMoved { unit_id: UnitId },
    AttackResolved {
        attacker_id: UnitId,
        target_id: UnitId,
        damage: u32,
        critical: bool,
    },
    TerrainDamage { unit_id: UnitId, amount: u32 },
    UnitDied { unit_id: UnitId },
    UnitRemoved { unit_id: UnitId },
    BattleEnded { outcome: BattleOutcome },
}

/// Ring of battle events with a fixed capacity
#[derive(Debug, Clone)]
pub struct BattleLog {
    entries: VecDeque<BattleEvent>,
    capacity: usize,
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, round: u32, kind: BattleEventKind, message: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(BattleEvent {
            round,
            kind,
            message,
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &BattleEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the most recent `n` entries, oldest first
    pub fn tail(&self, n: usize) -> Vec<BattleEvent> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}
