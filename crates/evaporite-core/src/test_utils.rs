//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use evaporite_fluid::FluidStack;

use crate::coord::{BlockPos, Facing};
use crate::grid::VoxelGrid;
use crate::id::FluidId;
use crate::probe::OccupantKind;
use crate::registry::{RecipeRegistry, RecipeRegistryBuilder};
use crate::scanner::{FLOOR_MARKER, TowerFrame, corner_id};

// ===========================================================================
// Recipes
// ===========================================================================

/// Water in, brine out, 10:1.
pub fn water_brine_registry() -> (RecipeRegistry, FluidId, FluidId) {
    let mut b = RecipeRegistryBuilder::new();
    let water = b.register_fluid("water");
    let brine = b.register_fluid("brine");
    b.register_recipe(
        "water_to_brine",
        FluidStack::new(water, 10),
        FluidStack::new(brine, 1),
    );
    (b.build().expect("valid registry"), water, brine)
}

// ===========================================================================
// Tower construction
// ===========================================================================

/// Describes a tower to build into a grid.
#[derive(Debug, Clone)]
pub struct TowerBlueprint {
    pub controller: BlockPos,
    pub facing: Facing,
    pub height: u32,
    /// Layers between the top layer and the controller's layer.
    pub controller_depth: u32,
    /// Controller one cell from the left edge instead of two.
    pub left_on_face: bool,
    /// Which top corners hold solar collectors, by corner id.
    pub solars: [bool; 4],
}

impl TowerBlueprint {
    /// Controller on the second layer (or the top for one-layer towers), two
    /// cells from the left edge, no solars.
    pub fn new(controller: BlockPos, facing: Facing, height: u32) -> Self {
        Self {
            controller,
            facing,
            height,
            controller_depth: height.saturating_sub(1).min(1),
            left_on_face: false,
            solars: [false; 4],
        }
    }

    pub fn controller_depth(mut self, depth: u32) -> Self {
        self.controller_depth = depth;
        self
    }

    pub fn left_on_face(mut self, left: bool) -> Self {
        self.left_on_face = left;
        self
    }

    pub fn solars(mut self, solars: [bool; 4]) -> Self {
        self.solars = solars;
        self
    }
}

/// Where a built tower ended up.
#[derive(Debug, Clone, Copy)]
pub struct TowerLayout {
    pub controller: BlockPos,
    pub facing: Facing,
    /// Frame of the top layer.
    pub frame: TowerFrame,
    pub top_y: i32,
    pub floor_y: i32,
}

/// Write the blueprint's blocks into `grid`.
///
/// Layers that would need no floor (single-layer towers) get none.
pub fn build_tower(grid: &mut VoxelGrid, blueprint: &TowerBlueprint) -> TowerLayout {
    assert!(blueprint.height > 0, "tower needs at least one layer");
    assert!(
        blueprint.controller_depth < blueprint.height,
        "controller must sit inside the tower"
    );

    let c = blueprint.controller;
    let top_y = c.y + blueprint.controller_depth as i32;
    let frame = TowerFrame::from_controller(c, blueprint.facing, blueprint.left_on_face).at_y(top_y);
    let last = blueprint.height as i32 - 1;

    for depth in 0..=last {
        let layer = frame.descend(depth);
        for (x, z, pos) in layer.cells() {
            let inner = (1..=2).contains(&x) && (1..=2).contains(&z);
            let kind = if depth == 0 {
                match corner_id(x, z) {
                    Some(id) if blueprint.solars[id] => OccupantKind::Solar,
                    _ if inner => OccupantKind::Air,
                    _ => OccupantKind::Wall,
                }
            } else if inner {
                if depth == last && (x, z) == FLOOR_MARKER {
                    OccupantKind::Wall
                } else {
                    OccupantKind::Air
                }
            } else {
                OccupantKind::Wall
            };
            grid.set(pos, kind);
        }
    }
    grid.set(c, OccupantKind::Controller);

    TowerLayout {
        controller: c,
        facing: blueprint.facing,
        frame,
        top_y,
        floor_y: top_y - last,
    }
}
