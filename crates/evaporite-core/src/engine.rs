//! Hosts many towers on one grid.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - The grid (any [`TowerGrid`]) and the immutable [`RecipeRegistry`]
//! - A [`TowerConfig`] shared by every tower
//! - The towers, keyed by [`TowerId`], each with its per-tick [`TickPhase`]
//! - A position index from controller coordinates to towers
//!
//! # Block changes
//!
//! When the host changes a cell it calls [`Engine::notify_block_changed`].
//! The engine rescans every tower whose controller neighbours the cell or
//! whose parts (found through the grid's back-references) touch it. Towers
//! that are not formed have no parts, so they watch every cell within reach
//! of their controller instead. A tower that already scanned this tick is
//! queued and rescanned once the next tick's phase opens.

use std::collections::BTreeMap;

use slotmap::SlotMap;
use tracing::debug;

use crate::config::{LAYER_SIZE, MAX_HEIGHT, TowerConfig};
use crate::coord::{BlockPos, Facing};
use crate::grid::VoxelGrid;
use crate::id::TowerId;
use crate::probe::{OccupantKind, TowerGrid};
use crate::registry::RecipeRegistry;
use crate::serialize::DurableState;
use crate::sim::{SimState, TickPhase};
use crate::sync::SyncChannel;
use crate::tower::{Tower, TowerContext};

/// Whether a change at `pos` could complete a tower controlled from
/// `controller`.
fn within_reach(controller: BlockPos, pos: BlockPos) -> bool {
    (pos.x - controller.x).abs() <= LAYER_SIZE
        && (pos.z - controller.z).abs() <= LAYER_SIZE
        && (pos.y - controller.y).abs() <= MAX_HEIGHT as i32
}

/// A tower plus the engine's bookkeeping for it.
#[derive(Debug)]
struct Hosted<C: SyncChannel> {
    tower: Tower<C>,
    phase: TickPhase,
    /// A rescan was requested after this tick's scan was used up.
    pending: bool,
}

/// Totals for one [`Engine::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub scans: u32,
    pub operations: u32,
    pub broadcasts: u32,
}

/// Multi-tower host.
#[derive(Debug)]
pub struct Engine<G: TowerGrid, C: SyncChannel + Clone> {
    /// The world the towers live in.
    pub grid: G,
    registry: RecipeRegistry,
    config: TowerConfig,
    towers: SlotMap<TowerId, Hosted<C>>,
    by_position: BTreeMap<BlockPos, TowerId>,
    /// Simulation state (tick counter).
    pub sim_state: SimState,
    channel: C,
}

impl<G: TowerGrid, C: SyncChannel + Clone> Engine<G, C> {
    /// `channel` is cloned into every tower.
    pub fn new(grid: G, registry: RecipeRegistry, config: TowerConfig, channel: C) -> Self {
        Self {
            grid,
            registry,
            config,
            towers: SlotMap::with_key(),
            by_position: BTreeMap::new(),
            sim_state: SimState::new(),
            channel,
        }
    }

    pub fn registry(&self) -> &RecipeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TowerConfig {
        &self.config
    }

    pub fn tower_count(&self) -> usize {
        self.towers.len()
    }

    pub fn tower(&self, id: TowerId) -> Option<&Tower<C>> {
        self.towers.get(id).map(|h| &h.tower)
    }

    pub fn tower_mut(&mut self, id: TowerId) -> Option<&mut Tower<C>> {
        self.towers.get_mut(id).map(|h| &mut h.tower)
    }

    /// The tower whose controller sits at `pos`.
    pub fn tower_at(&self, pos: BlockPos) -> Option<TowerId> {
        self.by_position.get(&pos).copied()
    }

    pub fn tower_ids(&self) -> impl Iterator<Item = TowerId> + '_ {
        self.towers.keys()
    }

    // -- Lifecycle --

    /// Host a new controller at `pos`. The grid must already hold it.
    /// Replaces any tower previously registered at `pos`.
    pub fn add_tower(&mut self, pos: BlockPos, facing: Facing) -> TowerId {
        let tower = Tower::new(pos, facing, &self.config, self.channel.clone());
        self.insert(tower)
    }

    /// Host a controller restored from saved state.
    pub fn load_tower(&mut self, pos: BlockPos, facing: Facing, durable: DurableState) -> TowerId {
        let tower = Tower::load(pos, facing, durable, &self.config, self.channel.clone());
        self.insert(tower)
    }

    fn insert(&mut self, tower: Tower<C>) -> TowerId {
        let pos = tower.pos();
        if let Some(old) = self.by_position.get(&pos).copied() {
            self.remove_tower(old);
        }
        let id = self.towers.insert(Hosted {
            tower,
            phase: TickPhase::new(self.sim_state.tick),
            pending: false,
        });
        self.by_position.insert(pos, id);
        debug!(?pos, "tower added");
        id
    }

    /// Stop hosting a tower, detaching its parts. Returns its durable state.
    pub fn remove_tower(&mut self, id: TowerId) -> Option<DurableState> {
        let mut hosted = self.towers.remove(id)?;
        hosted.tower.clear_structure(&mut self.grid);
        self.by_position.remove(&hosted.tower.pos());
        debug!(pos = ?hosted.tower.pos(), "tower removed");
        Some(hosted.tower.save())
    }

    // -- Triggers --

    /// Route a block change at `pos` to every tower it may affect.
    ///
    /// A tower whose controller cell no longer holds a controller is
    /// removed.
    pub fn notify_block_changed(&mut self, pos: BlockPos) {
        if let Some(id) = self.tower_at(pos)
            && self.grid.occupant(pos) != OccupantKind::Controller
        {
            self.remove_tower(id);
        }

        let mut affected: Vec<TowerId> = Vec::new();
        for cell in std::iter::once(pos).chain(pos.neighbors()) {
            if cell != pos
                && let Some(id) = self.tower_at(cell)
            {
                affected.push(id);
            }
            if let Some(owner) = self.grid.owner_of(cell)
                && let Some(id) = self.tower_at(owner)
            {
                affected.push(id);
            }
        }
        for (controller, id) in &self.by_position {
            if within_reach(*controller, pos)
                && self.towers.get(*id).is_some_and(|h| !h.tower.is_active())
            {
                affected.push(*id);
            }
        }
        affected.sort();
        affected.dedup();

        for id in affected {
            self.rescan(id);
        }
    }

    /// The chunk holding tower `id` was unloaded or reloaded.
    pub fn notify_chunk_reloaded(&mut self, id: TowerId) {
        self.rescan(id);
    }

    fn rescan(&mut self, id: TowerId) {
        let Some(hosted) = self.towers.get_mut(id) else {
            return;
        };
        let mut ctx = TowerContext::new(&mut self.grid, &self.registry, &self.config);
        if !hosted.tower.on_neighbor_changed(&mut ctx, &mut hosted.phase) {
            hosted.pending = true;
        }
    }

    // -- Simulation --

    /// Advance every tower by one tick, then open the next tick's phase and
    /// run any rescans deferred by the once-per-tick guard.
    pub fn step(&mut self) -> StepReport {
        let mut report = StepReport::default();

        for hosted in self.towers.values_mut() {
            let mut ctx = TowerContext::new(&mut self.grid, &self.registry, &self.config);
            let tick = hosted.tower.tick(&mut ctx, &mut hosted.phase);
            report.scans += u32::from(tick.scanned);
            report.operations += tick.operations;
            report.broadcasts += tick.broadcasts;
        }

        self.sim_state.tick += 1;
        let next = self.sim_state.tick;
        for hosted in self.towers.values_mut() {
            hosted.phase = TickPhase::new(next);
            if std::mem::take(&mut hosted.pending) {
                let mut ctx = TowerContext::new(&mut self.grid, &self.registry, &self.config);
                if let Some(flipped) = hosted.tower.rescan(&mut ctx, &mut hosted.phase) {
                    report.scans += 1;
                    report.broadcasts += u32::from(flipped);
                }
            }
        }

        report
    }

    /// Run `n` steps. Returns the summed report.
    pub fn advance(&mut self, n: u64) -> StepReport {
        let mut total = StepReport::default();
        for _ in 0..n {
            let r = self.step();
            total.scans += r.scans;
            total.operations += r.operations;
            total.broadcasts += r.broadcasts;
        }
        total
    }
}

impl<C: SyncChannel + Clone> Engine<VoxelGrid, C> {
    /// Change a cell of the reference grid and notify affected towers.
    pub fn set_block(&mut self, pos: BlockPos, kind: OccupantKind) {
        self.grid.set(pos, kind);
        self.notify_block_changed(pos);
    }

    /// Place a controller block and host a tower for it.
    pub fn place_controller(&mut self, pos: BlockPos, facing: Facing) -> TowerId {
        self.grid.set(pos, OccupantKind::Controller);
        let id = self.add_tower(pos, facing);
        self.notify_block_changed(pos);
        id
    }
}
