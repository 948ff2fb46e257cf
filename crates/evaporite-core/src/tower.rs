//! The authoritative tower controller.
//!
//! A [`Tower`] owns its tanks, thermal state, cached reaction and container
//! slots. Geometry is never stored beyond the last successful scan and is
//! rebuilt from the grid on load, on neighbour changes and on chunk
//! reloads. Every scan trigger takes the current [`TickPhase`] so at most
//! one scan runs per tick.

use evaporite_fluid::{Container, FluidStack, FluidTank, TransferMode};
use tracing::{debug, info, trace};

use crate::config::TowerConfig;
use crate::coord::{BlockPos, Facing};
use crate::exchange::{ContainerSlots, ExchangeResult, SlotSide, exchange};
use crate::probe::{GridProbe, TowerGrid};
use crate::reaction::{ReactionEnv, ReactionSlot, RedstoneControl};
use crate::registry::RecipeRegistry;
use crate::scanner::{Structure, TowerBounds, scan};
use crate::serialize::{DeserializeError, DurableState, SerializeError};
use crate::sim::TickPhase;
use crate::sync::{SyncChannel, SyncCoordinator, SyncMessage, SyncUpdate};
use crate::thermal::ThermalState;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The controller's view of its tower.
///
/// Invariant: `height == 0` exactly when `!structured`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TowerState {
    pub structured: bool,
    pub height: u32,
    pub controller_conflict: bool,
    pub left_on_face: bool,
    /// Lowest interior layer of the last valid structure.
    pub render_y: i32,
    pub thermal: ThermalState,
}

/// Shared world and data a tower works against.
pub struct TowerContext<'a, G: ?Sized> {
    pub grid: &'a mut G,
    pub registry: &'a RecipeRegistry,
    pub config: &'a TowerConfig,
}

impl<'a, G: ?Sized> TowerContext<'a, G> {
    pub fn new(grid: &'a mut G, registry: &'a RecipeRegistry, config: &'a TowerConfig) -> Self {
        Self {
            grid,
            registry,
            config,
        }
    }
}

/// What one call to [`Tower::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub scanned: bool,
    pub operations: u32,
    pub exchange: ExchangeResult,
    pub broadcasts: u32,
}

// ---------------------------------------------------------------------------
// Tower
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Tower<C: SyncChannel> {
    pos: BlockPos,
    facing: Facing,
    state: TowerState,
    structure: Option<Structure>,
    input: FluidTank,
    output: FluidTank,
    reaction: ReactionSlot,
    slots: ContainerSlots,
    sync: SyncCoordinator,
    channel: C,
    ticker: u64,
    redstone: RedstoneControl,
    powered: bool,
    powered_last_tick: bool,
}

impl<C: SyncChannel> Tower<C> {
    /// A fresh controller. It scans for the first time after the configured
    /// settle delay.
    pub fn new(pos: BlockPos, facing: Facing, config: &TowerConfig, channel: C) -> Self {
        Self {
            pos,
            facing,
            state: TowerState::default(),
            structure: None,
            input: FluidTank::new(0),
            output: FluidTank::new(config.output_capacity),
            reaction: ReactionSlot::default(),
            slots: ContainerSlots::default(),
            sync: SyncCoordinator::default(),
            channel,
            ticker: 0,
            redstone: RedstoneControl::default(),
            powered: false,
            powered_last_tick: false,
        }
    }

    /// Restore a controller from its durable fields. Values out of range are
    /// clamped; geometry stays empty until the first scan.
    pub fn load(
        pos: BlockPos,
        facing: Facing,
        mut durable: DurableState,
        config: &TowerConfig,
        channel: C,
    ) -> Self {
        durable.clamp(config);
        let mut tower = Self::new(pos, facing, config, channel);
        tower.input.set_capacity(config.max_input_capacity());
        tower.input.set_contents(durable.input);
        tower.output.set_contents(durable.output);
        tower.state.thermal = ThermalState::with_temperature(durable.temperature);
        tower
    }

    pub fn load_bytes(
        pos: BlockPos,
        facing: Facing,
        data: &[u8],
        config: &TowerConfig,
        channel: C,
    ) -> Result<Self, DeserializeError> {
        let durable = DurableState::from_bytes(data)?;
        Ok(Self::load(pos, facing, durable, config, channel))
    }

    pub fn save(&self) -> DurableState {
        DurableState::new(
            self.input.contents(),
            self.output.contents(),
            self.state.thermal.temperature,
        )
    }

    pub fn save_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        self.save().to_bytes()
    }

    // -- Accessors --

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn state(&self) -> &TowerState {
        &self.state
    }

    /// The last successfully scanned structure.
    pub fn structure(&self) -> Option<&Structure> {
        self.structure.as_ref()
    }

    pub fn input_tank(&self) -> &FluidTank {
        &self.input
    }

    pub fn output_tank(&self) -> &FluidTank {
        &self.output
    }

    pub fn reaction(&self) -> &ReactionSlot {
        &self.reaction
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn temperature(&self) -> f32 {
        self.state.thermal.temperature
    }

    /// Active exactly while structured.
    pub fn is_active(&self) -> bool {
        self.state.structured
    }

    pub fn scaled_temp_level(&self, scale: u32, config: &TowerConfig) -> u32 {
        self.state
            .thermal
            .scaled_temp_level(scale, config.max_temperature)
    }

    pub fn render_anchor(&self) -> Option<BlockPos> {
        self.structure.as_ref().map(Structure::render_anchor)
    }

    pub fn bounds(&self) -> Option<TowerBounds> {
        self.structure.as_ref().map(Structure::bounds)
    }

    // -- Redstone --

    pub fn redstone_control(&self) -> RedstoneControl {
        self.redstone
    }

    pub fn set_redstone_control(&mut self, control: RedstoneControl) {
        self.redstone = control;
    }

    pub fn set_powered(&mut self, powered: bool) {
        self.powered = powered;
    }

    pub fn can_operate(&self) -> bool {
        self.redstone.can_operate(self.powered, self.powered_last_tick)
    }

    // -- Fluid and item access --

    /// Offer fluid to the input tank. Only fluids some recipe consumes are
    /// accepted, and nothing while the tower is not structured. Returns the
    /// amount taken.
    pub fn fill_input(&mut self, offered: FluidStack, registry: &RecipeRegistry, mode: TransferMode) -> u32 {
        if !self.state.structured || !registry.accepts_input(offered.fluid) {
            return 0;
        }
        self.input.fill(offered, mode)
    }

    /// Draw from the output tank.
    pub fn drain_output(&mut self, max: u32, mode: TransferMode) -> Option<FluidStack> {
        self.output.drain(max, mode)
    }

    /// Place a container in a slot. Refused while the tower is not
    /// structured or the slot is taken.
    pub fn insert_container(&mut self, side: SlotSide, container: Container) -> Result<(), Container> {
        if !self.state.structured {
            return Err(container);
        }
        self.slots.insert(side, container)
    }

    /// Take the finished container from a slot pair. Refused while the
    /// tower is not structured.
    pub fn take_container(&mut self, side: SlotSide) -> Option<Container> {
        if !self.state.structured {
            return None;
        }
        self.slots.take_output(side)
    }

    pub fn slots(&self) -> &ContainerSlots {
        &self.slots
    }

    // -- Scan triggers --

    /// Neighbouring block changed.
    pub fn on_neighbor_changed<G: TowerGrid + ?Sized>(
        &mut self,
        ctx: &mut TowerContext<'_, G>,
        phase: &mut TickPhase,
    ) -> bool {
        self.refresh(ctx, phase)
    }

    /// The controller's chunk was unloaded or reloaded.
    pub fn on_chunk_unloaded<G: TowerGrid + ?Sized>(
        &mut self,
        ctx: &mut TowerContext<'_, G>,
        phase: &mut TickPhase,
    ) -> bool {
        self.refresh(ctx, phase)
    }

    /// Rescan the structure, at most once per tick. Returns whether a scan
    /// ran.
    pub fn refresh<G: TowerGrid + ?Sized>(
        &mut self,
        ctx: &mut TowerContext<'_, G>,
        phase: &mut TickPhase,
    ) -> bool {
        self.rescan(ctx, phase).is_some()
    }

    /// `None` when the tick's scan was already claimed, otherwise whether
    /// the scan broadcast a structural flip.
    pub(crate) fn rescan<G: TowerGrid + ?Sized>(
        &mut self,
        ctx: &mut TowerContext<'_, G>,
        phase: &mut TickPhase,
    ) -> Option<bool> {
        if !phase.try_claim_scan() {
            debug!(pos = ?self.pos, tick = phase.tick(), "rescan skipped, already scanned this tick");
            return None;
        }

        let was_structured = self.state.structured;
        self.clear_structure(ctx.grid);

        match scan(self.pos, self.facing, &*ctx.grid) {
            Ok(structure) => {
                debug!(pos = ?self.pos, height = structure.height, "scan accepted");
                for part in &structure.parts {
                    ctx.grid.attach_part(*part, self.pos);
                }
                self.state.structured = true;
                self.state.height = structure.height;
                self.state.controller_conflict = false;
                self.state.left_on_face = structure.left_on_face;
                self.state.render_y = structure.render_y();
                self.input.set_capacity(ctx.config.input_capacity(structure.height));
                if !was_structured {
                    info!(pos = ?self.pos, height = structure.height, "tower formed");
                }
                self.structure = Some(structure);
            }
            Err(rejection) => {
                debug!(pos = ?self.pos, reason = %rejection.reason, "scan rejected");
                if rejection.conflict {
                    info!(pos = ?self.pos, "controller conflict");
                }
                self.state.structured = false;
                self.state.height = 0;
                self.state.controller_conflict = rejection.conflict;
                if was_structured {
                    info!(pos = ?self.pos, "tower broke");
                    self.state.thermal.reset_biome();
                    self.reaction.invalidate();
                }
            }
        }

        let flipped = self.sync.structure_changed(self.state.structured);
        if flipped {
            self.broadcast(&*ctx.grid);
        }
        Some(flipped)
    }

    /// Drop the current geometry and every part back-reference.
    pub fn clear_structure<G: TowerGrid + ?Sized>(&mut self, grid: &mut G) {
        if let Some(structure) = self.structure.take() {
            for part in &structure.parts {
                grid.detach_part(*part, self.pos);
            }
        }
    }

    // -- Tick --

    /// Advance one tick: scan when due, heat, react, exchange containers,
    /// then sync.
    pub fn tick<G: TowerGrid + ?Sized>(
        &mut self,
        ctx: &mut TowerContext<'_, G>,
        phase: &mut TickPhase,
    ) -> TickReport {
        let mut report = TickReport::default();

        if self.ticker == ctx.config.initial_scan_delay
            && let Some(flipped) = self.rescan(ctx, phase)
        {
            report.scanned = true;
            report.broadcasts += u32::from(flipped);
        }

        if self.state.structured {
            let pos = self.pos;
            let grid = &*ctx.grid;
            let active = self.structure.as_ref().map_or(0, |s| s.active_solars(grid));
            self.state
                .thermal
                .advance(active, self.state.height, ctx.config, || grid.biome_temperature(pos));
        }

        self.reaction.refresh(ctx.registry, &self.input);
        let env = ReactionEnv {
            structured: self.state.structured,
            height: self.state.height,
            temperature: self.state.thermal.temperature,
            can_operate: self.can_operate(),
        };
        report.operations = self
            .reaction
            .process(ctx.registry, &mut self.input, &mut self.output, env, ctx.config)
            .operations;

        report.exchange = exchange(
            self.state.structured,
            &mut self.input,
            &mut self.output,
            &mut self.slots,
            ctx.registry,
        );

        if self.state.structured && self.sync.fill_ratio_moved(self.input.fill_ratio()) {
            self.broadcast(&*ctx.grid);
            report.broadcasts += 1;
        }

        self.powered_last_tick = self.powered;
        self.ticker = self.ticker.saturating_add(1);
        report
    }

    // -- Sync --

    /// The observable state, as replicas see it.
    pub fn sync_message<G: GridProbe + ?Sized>(&self, grid: &G) -> SyncMessage {
        let thermal = &self.state.thermal;
        SyncMessage {
            input: self.input.contents(),
            output: self.output.contents(),
            structured: self.state.structured,
            controller_conflict: self.state.controller_conflict,
            active_solars: self.structure.as_ref().map_or(0, |s| s.active_solars(grid)),
            height: self.state.height,
            temperature: thermal.temperature,
            biome_temp: thermal.biome_temperature(),
            left_on_face: self.state.left_on_face,
            last_gain: thermal.last_gain,
            total_loss: thermal.total_loss,
            render_y: self.state.render_y,
        }
    }

    fn broadcast<G: GridProbe + ?Sized>(&mut self, grid: &G) {
        let message = self.sync_message(grid);
        trace!(pos = ?self.pos, structured = message.structured, "broadcast");
        self.channel.broadcast(SyncUpdate {
            controller: self.pos,
            message,
        });
    }
}
