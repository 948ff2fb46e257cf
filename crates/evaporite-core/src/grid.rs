//! In-memory reference grid.
//!
//! A sparse map from block position to occupant, plus the part-ownership
//! back-references towers write during a successful scan. Used by tests,
//! benchmarks, and headless hosts; real games implement
//! [`GridProbe`]/[`TowerGrid`] over their own world storage.

use std::collections::BTreeMap;

use crate::coord::BlockPos;
use crate::probe::{GridProbe, OccupantKind, SolarFacet, TowerGrid};

/// Biome temperature used when none is configured.
pub const DEFAULT_BIOME_TEMPERATURE: f32 = 0.8;

/// A sparse voxel grid.
///
/// Maintains:
/// - `cells`: position -> occupant (air is never stored)
/// - `owners`: part position -> owning controller position
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    cells: BTreeMap<BlockPos, OccupantKind>,
    owners: BTreeMap<BlockPos, BlockPos>,
    biome_temperature: f32,
    daylight: bool,
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            owners: BTreeMap::new(),
            biome_temperature: DEFAULT_BIOME_TEMPERATURE,
            daylight: true,
        }
    }

    pub fn with_biome_temperature(mut self, temperature: f32) -> Self {
        self.biome_temperature = temperature;
        self
    }

    // -- Mutation --

    /// Place an occupant. Returns what was there before.
    ///
    /// Replacing a wall with anything that is not a tower block drops the
    /// cell's back-reference.
    pub fn set(&mut self, pos: BlockPos, kind: OccupantKind) -> OccupantKind {
        if !kind.is_tower_block() {
            self.owners.remove(&pos);
        }
        let previous = if kind == OccupantKind::Air {
            self.cells.remove(&pos)
        } else {
            self.cells.insert(pos, kind)
        };
        previous.unwrap_or_default()
    }

    /// Clear a cell to air. Returns what was there.
    pub fn clear(&mut self, pos: BlockPos) -> OccupantKind {
        self.set(pos, OccupantKind::Air)
    }

    /// Fill the inclusive box spanned by `a` and `b`.
    pub fn fill_box(&mut self, a: BlockPos, b: BlockPos, kind: OccupantKind) {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.set(BlockPos::new(x, y, z), kind);
                }
            }
        }
    }

    pub fn set_daylight(&mut self, daylight: bool) {
        self.daylight = daylight;
    }

    pub fn set_biome_temperature(&mut self, temperature: f32) {
        self.biome_temperature = temperature;
    }

    // -- Queries --

    pub fn get(&self, pos: BlockPos) -> OccupantKind {
        self.cells.get(&pos).copied().unwrap_or_default()
    }

    /// Number of non-air cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of parts that currently carry a back-reference.
    pub fn owned_count(&self) -> usize {
        self.owners.len()
    }

    /// All parts owned by `controller`.
    pub fn parts_owned_by(&self, controller: BlockPos) -> Vec<BlockPos> {
        self.owners
            .iter()
            .filter(|(_, owner)| **owner == controller)
            .map(|(part, _)| *part)
            .collect()
    }
}

impl GridProbe for VoxelGrid {
    fn occupant(&self, pos: BlockPos) -> OccupantKind {
        self.get(pos)
    }

    fn solar_facet(&self, pos: BlockPos) -> Option<SolarFacet> {
        (self.get(pos) == OccupantKind::Solar).then_some(SolarFacet { pos })
    }

    fn has_sky_above(&self, pos: BlockPos) -> bool {
        if !self.daylight {
            return false;
        }
        let from = BlockPos::new(pos.x, pos.y.saturating_add(1), i32::MIN);
        let to = BlockPos::new(pos.x, i32::MAX, i32::MAX);
        !self
            .cells
            .range(from..=to)
            .any(|(p, _)| p.z == pos.z && p.y > pos.y)
    }

    fn biome_temperature(&self, _pos: BlockPos) -> f32 {
        self.biome_temperature
    }
}

impl TowerGrid for VoxelGrid {
    fn attach_part(&mut self, part: BlockPos, controller: BlockPos) {
        self.owners.insert(part, controller);
    }

    fn detach_part(&mut self, part: BlockPos, controller: BlockPos) {
        if self.owners.get(&part) == Some(&controller) {
            self.owners.remove(&part);
        }
    }

    fn owner_of(&self, part: BlockPos) -> Option<BlockPos> {
        self.owners.get(&part).copied()
    }
}
