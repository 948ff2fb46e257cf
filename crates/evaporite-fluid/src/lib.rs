//! Fluid storage primitives for the Evaporite engine.
//!
//! Models fluid identities, fixed-capacity tanks, and the portable containers
//! (buckets and cells) that players move in and out of a machine's container
//! slots. Everything here is plain data plus clamped transfer arithmetic: a
//! transfer never fails, it simply moves less than was asked for.
//!
//! # Design
//!
//! - Fluids are identified by [`FluidId`], assigned by a registry elsewhere.
//! - An empty tank holds `None`, never a zero-amount stack.
//! - Every mutating transfer takes a [`TransferMode`] so callers can probe
//!   how much would move before committing.
//! - Containers are a closed enum ([`Container`]) dispatched by match.

pub mod container;
pub mod tank;

pub use container::{
    BUCKET_VOLUME, Bucket, Container, FluidCell, SlotPair, empty_container_into_tank,
    fill_container_from_tank,
};
pub use tank::FluidTank;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fluid identity
// ---------------------------------------------------------------------------

/// Identifies a fluid type. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FluidId(pub u32);

/// A quantity of a single fluid, in millibuckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidStack {
    pub fluid: FluidId,
    pub amount: u32,
}

impl FluidStack {
    pub fn new(fluid: FluidId, amount: u32) -> Self {
        Self { fluid, amount }
    }

    /// The same fluid with a different amount.
    pub fn with_amount(self, amount: u32) -> Self {
        Self {
            fluid: self.fluid,
            amount,
        }
    }

    /// Normalize a stack so that zero amounts become `None`.
    pub fn non_empty(self) -> Option<Self> {
        (self.amount > 0).then_some(self)
    }
}

/// Whether a transfer should actually move fluid or only report how much
/// would have moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Execute,
    Simulate,
}

impl TransferMode {
    pub fn executes(self) -> bool {
        self == TransferMode::Execute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluid_stack_zero_amount_normalizes_to_none() {
        let water = FluidId(0);
        assert_eq!(FluidStack::new(water, 0).non_empty(), None);
        assert_eq!(
            FluidStack::new(water, 5).non_empty(),
            Some(FluidStack::new(water, 5))
        );
    }

    #[test]
    fn with_amount_keeps_fluid() {
        let brine = FluidId(7);
        let stack = FluidStack::new(brine, 100).with_amount(3);
        assert_eq!(stack.fluid, brine);
        assert_eq!(stack.amount, 3);
    }

    #[test]
    fn fluid_stack_bitcode_round_trip() {
        let stack = FluidStack::new(FluidId(3), 1234);
        let bytes = bitcode::serialize(&stack).unwrap();
        let back: FluidStack = bitcode::deserialize(&bytes).unwrap();
        assert_eq!(back, stack);
    }
}
