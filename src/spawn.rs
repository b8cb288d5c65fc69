use rapier3d::prelude::{Isometry, Real};
use std::collections::BTreeSet;

// ---------------------------------------------
// SPAWN SLOTS
// ---------------------------------------------
// Slot n sits on the x axis, alternating sides of the origin:
//   0 -> x = 0, 1 -> x = +4, 2 -> x = -4, 3 -> x = +8, ...
// A released slot is handed out again before any new one.

pub const SPAWN_HEIGHT: Real = 1.2;
pub const SPAWN_SPACING: Real = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnSlot(pub usize);

impl SpawnSlot {
    pub fn pose(self) -> Isometry<Real> {
        let n = self.0;
        let step = n.div_ceil(2) as Real * SPAWN_SPACING;
        let x = if n % 2 == 1 { step } else { -step };
        Isometry::translation(x, SPAWN_HEIGHT, 0.0)
    }
}

#[derive(Debug, Clone)]
pub struct PlayerSpawnInfo {
    pub player_id: String,
    pub slot: SpawnSlot,
    pub pose: Isometry<Real>,
}

// ---------------------------------------------
// SPAWN MANAGER
// ---------------------------------------------
#[derive(Debug, Default)]
pub struct SpawnManager {
    taken: BTreeSet<SpawnSlot>,
}

impl SpawnManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_use(&self) -> usize {
        self.taken.len()
    }

    // ---------------------------------------------------------
    // Lowest free slot, called when a client connects
    // ---------------------------------------------------------
    pub fn allocate_spawn(&mut self, player_id: &str) -> PlayerSpawnInfo {
        let slot = (0..)
            .map(SpawnSlot)
            .find(|slot| !self.taken.contains(slot))
            .unwrap_or(SpawnSlot(self.taken.len()));
        self.taken.insert(slot);

        PlayerSpawnInfo {
            player_id: player_id.to_string(),
            slot,
            pose: slot.pose(),
        }
    }

    pub fn release(&mut self, slot: SpawnSlot) {
        self.taken.remove(&slot);
    }
}
