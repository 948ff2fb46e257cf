//! Portable container exchange.
//!
//! The controller has two slot pairs: containers placed on the input side
//! are poured into the input tank, containers placed on the output side are
//! filled from the output tank. Both transfers are best effort.

use evaporite_fluid::{
    Container, FluidTank, SlotPair, empty_container_into_tank, fill_container_from_tank,
};
use serde::{Deserialize, Serialize};

use crate::registry::RecipeRegistry;

/// Which slot pair a container goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotSide {
    /// Containers emptied into the input tank.
    Input,
    /// Containers filled from the output tank.
    Output,
}

/// The controller's container slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSlots {
    pub input: SlotPair,
    pub output: SlotPair,
}

impl ContainerSlots {
    pub fn pair(&self, side: SlotSide) -> &SlotPair {
        match side {
            SlotSide::Input => &self.input,
            SlotSide::Output => &self.output,
        }
    }

    pub fn pair_mut(&mut self, side: SlotSide) -> &mut SlotPair {
        match side {
            SlotSide::Input => &mut self.input,
            SlotSide::Output => &mut self.output,
        }
    }

    /// Place `container` in the input slot of `side`. Hands it back when the
    /// slot is occupied.
    pub fn insert(&mut self, side: SlotSide, container: Container) -> Result<(), Container> {
        self.pair_mut(side).insert(container)
    }

    /// Take the finished container from `side`.
    pub fn take_output(&mut self, side: SlotSide) -> Option<Container> {
        self.pair_mut(side).take_output()
    }
}

/// Amounts moved by one exchange pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeResult {
    /// Drawn from the output tank into a container.
    pub filled: u32,
    /// Poured from a container into the input tank.
    pub drained: u32,
}

impl ExchangeResult {
    pub fn moved_any(&self) -> bool {
        self.filled > 0 || self.drained > 0
    }
}

/// Run one exchange pass.
///
/// The output side works whenever the output tank holds fluid. The input
/// side only works on a structured tower and only accepts fluids some recipe
/// consumes.
pub fn exchange(
    structured: bool,
    input_tank: &mut FluidTank,
    output_tank: &mut FluidTank,
    slots: &mut ContainerSlots,
    registry: &RecipeRegistry,
) -> ExchangeResult {
    let mut result = ExchangeResult::default();
    if !output_tank.is_empty() {
        result.filled = fill_container_from_tank(output_tank, &mut slots.output);
    }
    if structured {
        result.drained =
            empty_container_into_tank(input_tank, &mut slots.input, |f| registry.accepts_input(f));
    }
    result
}
