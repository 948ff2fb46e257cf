//! Portable fluid containers and the slot pairs that hold them.
//!
//! A machine exposes container slots in pairs: an input slot where the player
//! drops a container to be filled or emptied, and an output slot where the
//! container lands once it is finished. The two transfer functions here are
//! the only way fluid moves between a tank and a container.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{FluidId, FluidStack, FluidTank, TransferMode};

/// Volume of a bucket in millibuckets.
pub const BUCKET_VOLUME: u32 = 1000;

// ---------------------------------------------------------------------------
// Container variants
// ---------------------------------------------------------------------------

/// A bucket moves exactly [`BUCKET_VOLUME`] at a time, never a partial load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub contents: Option<FluidId>,
}

/// A portable cell that fills and drains partially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidCell {
    pub stored: Option<FluidStack>,
    pub capacity: u32,
}

impl FluidCell {
    pub fn empty(capacity: u32) -> Self {
        Self {
            stored: None,
            capacity,
        }
    }

    pub fn filled(stack: FluidStack, capacity: u32) -> Self {
        Self {
            stored: stack.with_amount(stack.amount.min(capacity)).non_empty(),
            capacity,
        }
    }
}

/// Any portable fluid container. Dispatches via enum match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Container {
    Bucket(Bucket),
    Cell(FluidCell),
}

impl Container {
    pub fn empty_bucket() -> Self {
        Container::Bucket(Bucket::default())
    }

    pub fn filled_bucket(fluid: FluidId) -> Self {
        Container::Bucket(Bucket {
            contents: Some(fluid),
        })
    }

    /// Fluid currently inside the container.
    pub fn contents(&self) -> Option<FluidStack> {
        match self {
            Container::Bucket(b) => b.contents.map(|f| FluidStack::new(f, BUCKET_VOLUME)),
            Container::Cell(c) => c.stored,
        }
    }

    pub fn capacity(&self) -> u32 {
        match self {
            Container::Bucket(_) => BUCKET_VOLUME,
            Container::Cell(c) => c.capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contents().is_none()
    }

    pub fn is_full(&self) -> bool {
        self.contents()
            .is_some_and(|s| s.amount >= self.capacity())
    }

    /// Offer fluid to the container. Returns the amount accepted.
    pub fn fill(&mut self, offered: FluidStack, mode: TransferMode) -> u32 {
        match self {
            Container::Bucket(b) => {
                if b.contents.is_some() || offered.amount < BUCKET_VOLUME {
                    return 0;
                }
                if mode.executes() {
                    b.contents = Some(offered.fluid);
                }
                BUCKET_VOLUME
            }
            Container::Cell(c) => {
                if let Some(stored) = c.stored
                    && stored.fluid != offered.fluid
                {
                    return 0;
                }
                let current = c.stored.map_or(0, |s| s.amount);
                let accepted = offered.amount.min(c.capacity.saturating_sub(current));
                if accepted > 0 && mode.executes() {
                    c.stored = Some(offered.with_amount(current + accepted));
                }
                accepted
            }
        }
    }

    /// Take up to `max` fluid out of the container.
    pub fn drain(&mut self, max: u32, mode: TransferMode) -> Option<FluidStack> {
        match self {
            Container::Bucket(b) => {
                let fluid = b.contents?;
                if max < BUCKET_VOLUME {
                    return None;
                }
                if mode.executes() {
                    b.contents = None;
                }
                Some(FluidStack::new(fluid, BUCKET_VOLUME))
            }
            Container::Cell(c) => {
                let stored = c.stored?;
                let taken = stored.amount.min(max);
                if taken == 0 {
                    return None;
                }
                if mode.executes() {
                    c.stored = stored.with_amount(stored.amount - taken).non_empty();
                }
                Some(stored.with_amount(taken))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Slot pair
// ---------------------------------------------------------------------------

/// An input slot and the output slot its finished containers move to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPair {
    pub input: Option<Container>,
    pub output: Option<Container>,
}

impl SlotPair {
    /// Put a container into the input slot. Hands it back if occupied.
    pub fn insert(&mut self, container: Container) -> Result<(), Container> {
        if self.input.is_some() {
            return Err(container);
        }
        self.input = Some(container);
        Ok(())
    }

    /// Take whatever sits in the output slot.
    pub fn take_output(&mut self) -> Option<Container> {
        self.output.take()
    }

    fn promote_if(&mut self, finished: impl Fn(&Container) -> bool) {
        if self.output.is_none() && self.input.as_ref().is_some_and(finished) {
            self.output = self.input.take();
        }
    }
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// Pour from `tank` into the container waiting in `slots.input`. A container
/// that ends up full moves to the output slot when that slot is free.
///
/// Returns the amount moved.
pub fn fill_container_from_tank(tank: &mut FluidTank, slots: &mut SlotPair) -> u32 {
    let Some(container) = slots.input.as_mut() else {
        return 0;
    };
    let moved = match tank.contents() {
        Some(available) => {
            let accepted = container.fill(available, TransferMode::Simulate);
            match tank.drain(accepted, TransferMode::Execute) {
                Some(drained) => container.fill(drained, TransferMode::Execute),
                None => 0,
            }
        }
        None => 0,
    };
    if moved > 0 {
        trace!(moved, "filled container from tank");
    }
    slots.promote_if(Container::is_full);
    moved
}

/// Pour the container waiting in `slots.input` into `tank`, but only when
/// `accepts` approves the contained fluid. An emptied container moves to the
/// output slot when that slot is free.
///
/// Returns the amount moved.
pub fn empty_container_into_tank(
    tank: &mut FluidTank,
    slots: &mut SlotPair,
    accepts: impl Fn(FluidId) -> bool,
) -> u32 {
    let Some(container) = slots.input.as_mut() else {
        return 0;
    };
    let moved = match container.contents() {
        Some(held) if accepts(held.fluid) => {
            let room = tank.fill(held, TransferMode::Simulate);
            match container.drain(room, TransferMode::Simulate) {
                Some(offer) if tank.fill(offer, TransferMode::Simulate) == offer.amount => {
                    match container.drain(offer.amount, TransferMode::Execute) {
                        Some(drained) => tank.fill(drained, TransferMode::Execute),
                        None => 0,
                    }
                }
                _ => 0,
            }
        }
        _ => 0,
    };
    if moved > 0 {
        trace!(moved, "emptied container into tank");
    }
    slots.promote_if(Container::is_empty);
    moved
}
