//! The world interface a tower consumes.
//!
//! The engine never owns the world. It classifies cells through
//! [`GridProbe`] and records part ownership through [`TowerGrid`]; both are
//! implemented by whatever grid the host game uses ([`crate::grid::VoxelGrid`]
//! is the in-memory reference implementation).

use serde::{Deserialize, Serialize};

use crate::coord::BlockPos;

/// What occupies a cell, as far as a tower is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OccupantKind {
    #[default]
    Air,
    /// A tower wall block.
    Wall,
    /// A tower controller. Counts as part of the shell when it is the
    /// scanning controller, and as a conflict otherwise.
    Controller,
    /// A block that may expose a solar collector facet.
    Solar,
    /// Anything else.
    Other,
}

impl OccupantKind {
    /// Wall-kind occupants: the blocks a tower shell is built from.
    pub fn is_tower_block(self) -> bool {
        matches!(self, OccupantKind::Wall | OccupantKind::Controller)
    }
}

/// A solar collector facet found at a top-layer corner.
///
/// Holds only the collector's position; sky visibility is re-queried through
/// the grid every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolarFacet {
    pub pos: BlockPos,
}

/// Read-only queries against the world.
pub trait GridProbe {
    /// Classify the occupant at `pos`.
    fn occupant(&self, pos: BlockPos) -> OccupantKind;

    /// Whether `pos` is empty (air).
    fn is_empty(&self, pos: BlockPos) -> bool {
        self.occupant(pos) == OccupantKind::Air
    }

    /// The solar collector facet exposed at `pos`, if any.
    fn solar_facet(&self, pos: BlockPos) -> Option<SolarFacet>;

    /// Whether the block at `pos` currently sees the sun.
    fn has_sky_above(&self, pos: BlockPos) -> bool;

    /// Ambient biome temperature at `pos`.
    fn biome_temperature(&self, pos: BlockPos) -> f32;
}

/// Grids that can store part back-references.
///
/// A part records the coordinate of the controller that owns it. The
/// relation is non-owning: removing a controller simply detaches its parts.
pub trait TowerGrid: GridProbe {
    /// Record that the wall at `part` belongs to the tower at `controller`.
    fn attach_part(&mut self, part: BlockPos, controller: BlockPos);

    /// Clear `part`'s back-reference if it still points at `controller`.
    fn detach_part(&mut self, part: BlockPos, controller: BlockPos);

    /// The controller `part` currently belongs to.
    fn owner_of(&self, part: BlockPos) -> Option<BlockPos>;
}
