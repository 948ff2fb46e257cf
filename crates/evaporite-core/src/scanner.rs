//! Structure validation.
//!
//! A tower is a column of 4×4 layers behind its controller's front face:
//!
//! - **Top layer**: the four corners hold solar collectors or walls, the
//!   inner 2×2 is open, every other cell is a wall. Nothing tower-kind may
//!   sit on top of a top-layer wall.
//! - **Shaft layers**: twelve outer walls around an empty 2×2.
//! - **Floor layer**: like a shaft layer, with a single wall at inner cell
//!   `(1, 1)` marking the bottom.
//!
//! Cells are addressed by `(x, z)` where `x` runs to the viewer's right and
//! `z` runs into the tower. Scanning is a pure function of the grid; the
//! caller decides what to do with the resulting [`Structure`].

use std::collections::BTreeSet;

use crate::config::{LAYER_SIZE, MAX_HEIGHT, MIN_HEIGHT};
use crate::coord::{BlockPos, Direction, Facing};
use crate::probe::{GridProbe, OccupantKind, SolarFacet};

/// Inner cell holding the floor marker.
pub const FLOOR_MARKER: (i32, i32) = (1, 1);

/// Solar slot index of a top-layer corner, if `(x, z)` is one.
pub fn corner_id(x: i32, z: i32) -> Option<usize> {
    match (x, z) {
        (0, 0) => Some(0),
        (0, 3) => Some(1),
        (3, 0) => Some(2),
        (3, 3) => Some(3),
        _ => None,
    }
}

fn is_inner(x: i32, z: i32) -> bool {
    (1..=2).contains(&x) && (1..=2).contains(&z)
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Maps layer-local `(x, z)` cells to grid positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TowerFrame {
    origin: BlockPos,
    facing: Facing,
}

impl TowerFrame {
    /// A frame whose cell `(0, 0)` is `origin`.
    pub fn new(origin: BlockPos, facing: Facing) -> Self {
        Self { origin, facing }
    }

    /// The frame of a tower whose controller sits at `controller`, on the
    /// controller's own layer.
    pub fn from_controller(controller: BlockPos, facing: Facing, left_on_face: bool) -> Self {
        let shift = if left_on_face { 1 } else { 2 };
        Self::new(controller.offset(facing.left(), shift), facing)
    }

    pub fn origin(&self) -> BlockPos {
        self.origin
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// The grid position of cell `(x, z)` on this frame's layer.
    pub fn cell(&self, x: i32, z: i32) -> BlockPos {
        self.origin
            .offset(self.facing.right(), x)
            .offset(self.facing.back(), z)
    }

    /// The same frame `depth` layers further down.
    pub fn descend(&self, depth: i32) -> Self {
        Self::new(self.origin.offset(Direction::Down, depth), self.facing)
    }

    /// The same frame moved to layer `y`.
    pub fn at_y(&self, y: i32) -> Self {
        Self::new(BlockPos::new(self.origin.x, y, self.origin.z), self.facing)
    }

    /// Every cell of the layer, in scan order.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, BlockPos)> + '_ {
        (0..LAYER_SIZE).flat_map(move |x| (0..LAYER_SIZE).map(move |z| (x, z, self.cell(x, z))))
    }

    /// The interior cell with the smallest x and z on layer `y`.
    pub fn render_anchor(&self, y: i32) -> BlockPos {
        let frame = self.at_y(y);
        let a = frame.cell(1, 1);
        let b = frame.cell(2, 2);
        BlockPos::new(a.x.min(b.x), y, a.z.min(b.z))
    }

    /// The full volume of a tower `height` layers tall whose lowest interior
    /// layer is `render_y`.
    pub fn bounds(&self, render_y: i32, height: u32) -> TowerBounds {
        let anchor = self.render_anchor(render_y);
        let min = anchor.translate(-1, -1, -1);
        let max = min.translate(LAYER_SIZE - 1, height as i32 - 1, LAYER_SIZE - 1);
        TowerBounds { min, max }
    }
}

/// Two opposite corners of a tower volume, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TowerBounds {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl TowerBounds {
    pub fn contains(&self, pos: BlockPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A validated tower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    /// Layer count, floor included. Always within `MIN_HEIGHT..=MAX_HEIGHT`.
    pub height: u32,
    /// Frame of the top layer.
    pub frame: TowerFrame,
    pub left_on_face: bool,
    /// Every wall of the shell except the controller itself.
    pub parts: BTreeSet<BlockPos>,
    /// Solar collectors found at the top corners, by corner id.
    pub solars: [Option<SolarFacet>; 4],
}

impl Structure {
    pub fn top_y(&self) -> i32 {
        self.frame.origin().y
    }

    pub fn floor_y(&self) -> i32 {
        self.top_y() - (self.height as i32 - 1)
    }

    /// Lowest interior layer.
    pub fn render_y(&self) -> i32 {
        self.floor_y() + 1
    }

    pub fn render_anchor(&self) -> BlockPos {
        self.frame.render_anchor(self.render_y())
    }

    pub fn bounds(&self) -> TowerBounds {
        self.frame.bounds(self.render_y(), self.height)
    }

    /// Solar collectors that currently see the sun.
    pub fn active_solars<P: GridProbe + ?Sized>(&self, probe: &P) -> u32 {
        self.solars
            .iter()
            .flatten()
            .filter(|facet| probe.has_sky_above(facet.pos))
            .count() as u32
    }
}

/// Why a scan did not produce a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("invalid top layer cell at {0:?}")]
    TopLayer(BlockPos),
    #[error("invalid cell at {pos:?} on layer {depth} below the top")]
    LowerLayer { pos: BlockPos, depth: u32 },
    #[error("tower is {0} layers tall, below the minimum")]
    TooShort(u32),
    #[error("tower exceeds the maximum height")]
    TooTall,
    #[error("controller lies outside the validated layers")]
    ControllerOutside,
}

/// A failed scan. `conflict` is set when another controller occupied a cell
/// that had to be a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRejection {
    pub reason: RejectReason,
    pub conflict: bool,
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

enum LayerKind {
    Shaft,
    Floor,
}

struct ScanState<'a, P: ?Sized> {
    controller: BlockPos,
    probe: &'a P,
    parts: BTreeSet<BlockPos>,
    solars: [Option<SolarFacet>; 4],
    conflict: bool,
}

impl<P: GridProbe + ?Sized> ScanState<'_, P> {
    fn reject(&self, reason: RejectReason) -> ScanRejection {
        ScanRejection {
            reason,
            conflict: self.conflict,
        }
    }

    fn tower_block_above(&self, pos: BlockPos) -> bool {
        self.probe.occupant(pos.above()).is_tower_block()
    }

    /// Accept `pos` as a shell wall. The scanning controller counts as a
    /// wall but is not recorded; any other controller is a conflict.
    fn add_part(&mut self, pos: BlockPos) -> bool {
        match self.probe.occupant(pos) {
            OccupantKind::Wall => {
                self.parts.insert(pos);
                true
            }
            OccupantKind::Controller if pos == self.controller => true,
            OccupantKind::Controller => {
                self.conflict = true;
                false
            }
            _ => false,
        }
    }

    fn top_layer(&mut self, frame: &TowerFrame) -> Result<(), ScanRejection> {
        for (x, z, pos) in frame.cells() {
            let valid = if let Some(corner) = corner_id(x, z) {
                match self.probe.solar_facet(pos) {
                    Some(facet) => {
                        self.solars[corner] = Some(facet);
                        true
                    }
                    None => !self.tower_block_above(pos) && self.add_part(pos),
                }
            } else if is_inner(x, z) {
                self.probe.is_empty(pos)
            } else {
                !self.tower_block_above(pos) && self.add_part(pos)
            };
            if !valid {
                return Err(self.reject(RejectReason::TopLayer(pos)));
            }
        }
        Ok(())
    }

    fn lower_layer(&mut self, frame: &TowerFrame, depth: u32) -> Result<LayerKind, ScanRejection> {
        let mut kind = LayerKind::Shaft;
        for (x, z, pos) in frame.cells() {
            let valid = if is_inner(x, z) {
                let occupant = self.probe.occupant(pos);
                if (x, z) == FLOOR_MARKER && occupant.is_tower_block() {
                    kind = LayerKind::Floor;
                    self.add_part(pos)
                } else {
                    occupant == OccupantKind::Air
                }
            } else {
                self.add_part(pos)
            };
            if !valid {
                return Err(self.reject(RejectReason::LowerLayer { pos, depth }));
            }
        }
        Ok(kind)
    }
}

/// Validate the tower anchored at `controller`.
///
/// Pure with respect to the grid: back-references are written by the caller
/// once it accepts the result.
pub fn scan<P: GridProbe + ?Sized>(
    controller: BlockPos,
    facing: Facing,
    probe: &P,
) -> Result<Structure, ScanRejection> {
    let mut state = ScanState {
        controller,
        probe,
        parts: BTreeSet::new(),
        solars: [None; 4],
        conflict: false,
    };

    let mut top = controller;
    let mut climbed = 0;
    while probe.occupant(top.above()).is_tower_block() {
        top = top.above();
        climbed += 1;
        if climbed >= MAX_HEIGHT {
            return Err(state.reject(RejectReason::TooTall));
        }
    }

    let left_on_face = probe
        .occupant(top.below().offset(facing.right(), 2))
        .is_tower_block();
    let frame = TowerFrame::new(
        top.offset(facing.left(), if left_on_face { 1 } else { 2 }),
        facing,
    );

    state.top_layer(&frame)?;

    let mut height = 1;
    loop {
        let kind = state.lower_layer(&frame.descend(height as i32), height)?;
        height += 1;
        if height > MAX_HEIGHT {
            return Err(state.reject(RejectReason::TooTall));
        }
        if let LayerKind::Floor = kind {
            break;
        }
    }

    if height < MIN_HEIGHT {
        return Err(state.reject(RejectReason::TooShort(height)));
    }

    let structure = Structure {
        height,
        frame,
        left_on_face,
        parts: state.parts,
        solars: state.solars,
    };
    if controller.y < structure.floor_y() {
        return Err(ScanRejection {
            reason: RejectReason::ControllerOutside,
            conflict: state.conflict,
        });
    }
    Ok(structure)
}
