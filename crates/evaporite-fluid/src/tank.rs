use serde::{Deserialize, Serialize};

use crate::{FluidId, FluidStack, TransferMode};

/// A single-fluid tank with a capacity that may change at runtime.
///
/// Invariant: `amount() <= capacity()`. Shrinking the capacity voids the
/// excess rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidTank {
    stored: Option<FluidStack>,
    capacity: u32,
}

impl FluidTank {
    pub fn new(capacity: u32) -> Self {
        Self {
            stored: None,
            capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Change the capacity, clamping the contents. Returns the amount voided.
    pub fn set_capacity(&mut self, capacity: u32) -> u32 {
        self.capacity = capacity;
        self.clamp_to_capacity()
    }

    /// The stored fluid, if any.
    pub fn contents(&self) -> Option<FluidStack> {
        self.stored
    }

    /// Replace the contents outright, clamped to capacity. Returns the
    /// amount that did not fit.
    pub fn set_contents(&mut self, contents: Option<FluidStack>) -> u32 {
        self.stored = contents.and_then(FluidStack::non_empty);
        self.clamp_to_capacity()
    }

    pub fn fluid(&self) -> Option<FluidId> {
        self.stored.map(|s| s.fluid)
    }

    pub fn amount(&self) -> u32 {
        self.stored.map_or(0, |s| s.amount)
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_none()
    }

    /// Free space left in the tank.
    pub fn space(&self) -> u32 {
        self.capacity.saturating_sub(self.amount())
    }

    /// Fill level in `[0, 1]`. A zero-capacity tank reports 0.
    pub fn fill_ratio(&self) -> f32 {
        if self.capacity == 0 {
            0.0
        } else {
            self.amount() as f32 / self.capacity as f32
        }
    }

    /// Offer fluid to the tank. Returns the amount accepted (or that would be
    /// accepted in [`TransferMode::Simulate`]).
    pub fn fill(&mut self, offered: FluidStack, mode: TransferMode) -> u32 {
        if offered.amount == 0 {
            return 0;
        }
        if let Some(stored) = self.stored
            && stored.fluid != offered.fluid
        {
            return 0;
        }
        let accepted = offered.amount.min(self.space());
        if accepted > 0 && mode.executes() {
            let amount = self.amount() + accepted;
            self.stored = Some(offered.with_amount(amount));
        }
        accepted
    }

    /// Take up to `max` of whatever fluid is stored.
    pub fn drain(&mut self, max: u32, mode: TransferMode) -> Option<FluidStack> {
        let stored = self.stored?;
        let taken = stored.amount.min(max);
        if taken == 0 {
            return None;
        }
        if mode.executes() {
            self.stored = stored.with_amount(stored.amount - taken).non_empty();
        }
        Some(stored.with_amount(taken))
    }

    fn clamp_to_capacity(&mut self) -> u32 {
        match self.stored {
            Some(stored) if stored.amount > self.capacity => {
                let voided = stored.amount - self.capacity;
                self.stored = stored.with_amount(self.capacity).non_empty();
                voided
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> FluidId {
        FluidId(0)
    }

    fn brine() -> FluidId {
        FluidId(1)
    }

    #[test]
    fn fill_accepts_up_to_capacity() {
        let mut tank = FluidTank::new(1000);
        assert_eq!(tank.fill(FluidStack::new(water(), 600), TransferMode::Execute), 600);
        assert_eq!(tank.fill(FluidStack::new(water(), 600), TransferMode::Execute), 400);
        assert_eq!(tank.amount(), 1000);
        assert_eq!(tank.space(), 0);
    }

    #[test]
    fn fill_rejects_other_fluid() {
        let mut tank = FluidTank::new(1000);
        let _ = tank.fill(FluidStack::new(water(), 10), TransferMode::Execute);
        assert_eq!(tank.fill(FluidStack::new(brine(), 10), TransferMode::Execute), 0);
        assert_eq!(tank.fluid(), Some(water()));
    }

    #[test]
    fn simulate_does_not_mutate() {
        let mut tank = FluidTank::new(1000);
        assert_eq!(tank.fill(FluidStack::new(water(), 300), TransferMode::Simulate), 300);
        assert!(tank.is_empty());

        let _ = tank.fill(FluidStack::new(water(), 300), TransferMode::Execute);
        let drained = tank.drain(100, TransferMode::Simulate);
        assert_eq!(drained, Some(FluidStack::new(water(), 100)));
        assert_eq!(tank.amount(), 300);
    }

    #[test]
    fn drain_to_zero_clears_fluid() {
        let mut tank = FluidTank::new(1000);
        let _ = tank.fill(FluidStack::new(water(), 250), TransferMode::Execute);
        let drained = tank.drain(1000, TransferMode::Execute);
        assert_eq!(drained, Some(FluidStack::new(water(), 250)));
        assert!(tank.is_empty());
        assert_eq!(tank.fluid(), None);
        assert_eq!(tank.drain(1, TransferMode::Execute), None);
    }

    #[test]
    fn shrinking_capacity_voids_excess() {
        let mut tank = FluidTank::new(1000);
        let _ = tank.fill(FluidStack::new(water(), 900), TransferMode::Execute);
        assert_eq!(tank.set_capacity(500), 400);
        assert_eq!(tank.amount(), 500);

        assert_eq!(tank.set_capacity(0), 500);
        assert!(tank.is_empty());
    }

    #[test]
    fn set_contents_clamps() {
        let mut tank = FluidTank::new(100);
        assert_eq!(tank.set_contents(Some(FluidStack::new(brine(), 150))), 50);
        assert_eq!(tank.contents(), Some(FluidStack::new(brine(), 100)));
        assert_eq!(tank.set_contents(Some(FluidStack::new(brine(), 0))), 0);
        assert!(tank.is_empty());
    }

    #[test]
    fn fill_ratio_handles_zero_capacity() {
        let tank = FluidTank::new(0);
        assert_eq!(tank.fill_ratio(), 0.0);

        let mut tank = FluidTank::new(200);
        let _ = tank.fill(FluidStack::new(water(), 50), TransferMode::Execute);
        assert!((tank.fill_ratio() - 0.25).abs() < f32::EPSILON);
    }
}
