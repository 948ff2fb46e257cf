//! Simulation clock and the per-tick scan guard.

use serde::{Deserialize, Serialize};

/// Simulation tick counter.
pub type Ticks = u64;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable simulation state tracked by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimState {
    /// Current tick counter. Incremented by 1 for each simulation step.
    pub tick: Ticks,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Tick phase
// ---------------------------------------------------------------------------

/// Per-tick record of whether a tower has already rescanned.
///
/// Every scan trigger (tick, neighbour change, chunk reload) receives the
/// same `TickPhase` for the current tick, so a burst of block changes costs
/// at most one scan. Start each tick with [`TickPhase::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPhase {
    tick: Ticks,
    scanned: bool,
}

impl TickPhase {
    pub fn new(tick: Ticks) -> Self {
        Self {
            tick,
            scanned: false,
        }
    }

    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn has_scanned(&self) -> bool {
        self.scanned
    }

    /// Claim this tick's scan. Returns `false` if it was already claimed.
    pub fn try_claim_scan(&mut self) -> bool {
        !std::mem::replace(&mut self.scanned, true)
    }
}
