//! Fluid-to-fluid reaction driven by tower heat.
//!
//! The controller keeps at most one cached reaction, bound to the fluid in
//! its input tank. Each tick the cache is refreshed against the tank, then
//! processed: the base operation count (bounded by the baseline, the input
//! available and the output room) is scaled by the heat throttle.

use evaporite_fluid::{FluidTank, TransferMode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{MAX_HEIGHT, MIN_HEIGHT, TowerConfig};
use crate::id::{FluidId, RecipeId};
use crate::registry::{RecipeDef, RecipeRegistry};

// ---------------------------------------------------------------------------
// Redstone control
// ---------------------------------------------------------------------------

/// How the controller responds to a redstone signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RedstoneControl {
    /// Always operate.
    #[default]
    Ignored,
    /// Operate while powered.
    High,
    /// Operate while unpowered.
    Low,
    /// Operate on the tick the signal rises.
    Pulse,
}

impl RedstoneControl {
    pub fn can_operate(self, powered: bool, powered_last_tick: bool) -> bool {
        match self {
            RedstoneControl::Ignored => true,
            RedstoneControl::High => powered,
            RedstoneControl::Low => !powered,
            RedstoneControl::Pulse => powered && !powered_last_tick,
        }
    }
}

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

/// Scale `current_max` operations by tower heat and height.
///
/// Zero at or below zero degrees; never more than `current_max`.
pub fn throttled_operations(current_max: u32, temperature: f32, height: u32, config: &TowerConfig) -> u32 {
    if current_max == 0 {
        return 0;
    }
    let temp_mult = f64::from(temperature.max(0.0)) * f64::from(config.temp_multiplier);
    let multiplier = temp_mult * f64::from(height) / f64::from(MAX_HEIGHT);
    let scaled = (f64::from(current_max) * multiplier).clamp(0.0, f64::from(i32::MAX)) as u32;
    scaled.min(current_max)
}

/// Whether a tower in this state may react at all.
pub fn is_eligible(structured: bool, height: u32, can_operate: bool) -> bool {
    structured && (MIN_HEIGHT..=MAX_HEIGHT).contains(&height) && can_operate
}

// ---------------------------------------------------------------------------
// Cached reaction
// ---------------------------------------------------------------------------

/// The reaction bound to the current input fluid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedReaction {
    pub recipe: RecipeId,
    pub input: FluidId,
}

/// Everything about the tower the reaction needs for one tick.
#[derive(Debug, Clone, Copy)]
pub struct ReactionEnv {
    pub structured: bool,
    pub height: u32,
    pub temperature: f32,
    pub can_operate: bool,
}

/// Result of one processing step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionResult {
    /// Operations performed this tick.
    pub operations: u32,
    /// Whether either tank changed.
    pub state_changed: bool,
}

/// Idle, or active with a reaction bound to one input fluid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReactionSlot {
    #[default]
    Idle,
    Active(CachedReaction),
}

impl ReactionSlot {
    pub fn cached(&self) -> Option<CachedReaction> {
        match self {
            ReactionSlot::Idle => None,
            ReactionSlot::Active(cached) => Some(*cached),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ReactionSlot::Active(_))
    }

    /// Drop the cached reaction.
    pub fn invalidate(&mut self) {
        *self = ReactionSlot::Idle;
    }

    /// Rebind to the fluid currently in `input`. Keeps the cached reaction
    /// when the fluid did not change.
    pub fn refresh(&mut self, registry: &RecipeRegistry, input: &FluidTank) {
        let Some(fluid) = input.fluid() else {
            self.invalidate();
            return;
        };
        if let ReactionSlot::Active(cached) = self
            && cached.input == fluid
        {
            return;
        }
        *self = match registry.find_for_input(fluid) {
            Some(recipe) => ReactionSlot::Active(CachedReaction { recipe, input: fluid }),
            None => ReactionSlot::Idle,
        };
    }

    /// Run the cached reaction once.
    pub fn process(
        &self,
        registry: &RecipeRegistry,
        input: &mut FluidTank,
        output: &mut FluidTank,
        env: ReactionEnv,
        config: &TowerConfig,
    ) -> ReactionResult {
        let Some(cached) = self.cached() else {
            return ReactionResult::default();
        };
        let Some(recipe) = registry.get_recipe(cached.recipe) else {
            return ReactionResult::default();
        };
        if !is_eligible(env.structured, env.height, env.can_operate) {
            return ReactionResult::default();
        }

        let current_max = base_operations(recipe, input, output, config);
        let operations = throttled_operations(current_max, env.temperature, env.height, config);
        if operations == 0 {
            return ReactionResult::default();
        }

        let consumed = operations * recipe.input.amount;
        let produced = operations * recipe.output.amount;
        input.drain(consumed, TransferMode::Execute);
        output.fill(recipe.output.with_amount(produced), TransferMode::Execute);
        trace!(operations, consumed, produced, "reaction processed");

        ReactionResult {
            operations,
            state_changed: true,
        }
    }
}

/// Operations possible before the heat throttle.
fn base_operations(recipe: &RecipeDef, input: &FluidTank, output: &FluidTank, config: &TowerConfig) -> u32 {
    if input.fluid() != Some(recipe.input.fluid) {
        return 0;
    }
    let output_room = match output.fluid() {
        Some(fluid) if fluid != recipe.output.fluid => 0,
        _ => output.space(),
    };
    config
        .baseline_operations
        .min(input.amount() / recipe.input.amount)
        .min(output_room / recipe.output.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::water_brine_registry;
    use evaporite_fluid::FluidStack;

    fn env(temperature: f32) -> ReactionEnv {
        ReactionEnv {
            structured: true,
            height: 18,
            temperature,
            can_operate: true,
        }
    }

    #[test]
    fn redstone_modes() {
        assert!(RedstoneControl::Ignored.can_operate(false, false));
        assert!(RedstoneControl::High.can_operate(true, true));
        assert!(!RedstoneControl::High.can_operate(false, true));
        assert!(RedstoneControl::Low.can_operate(false, false));
        assert!(!RedstoneControl::Low.can_operate(true, false));
        assert!(RedstoneControl::Pulse.can_operate(true, false));
        assert!(!RedstoneControl::Pulse.can_operate(true, true));
        assert_eq!(RedstoneControl::default(), RedstoneControl::Ignored);
    }

    #[test]
    fn throttle_zero_when_not_hot() {
        let cfg = TowerConfig::default();
        assert_eq!(throttled_operations(10, 0.0, 18, &cfg), 0);
        assert_eq!(throttled_operations(10, -50.0, 18, &cfg), 0);
        assert_eq!(throttled_operations(0, 500.0, 18, &cfg), 0);
    }

    #[test]
    fn throttle_scales_and_caps() {
        let cfg = TowerConfig::default();
        // 100 * (5 * 0.1 * 18 / 18) = 50
        assert_eq!(throttled_operations(100, 5.0, 18, &cfg), 50);
        // 100 * (5 * 0.1 * 9 / 18) = 25
        assert_eq!(throttled_operations(100, 5.0, 9, &cfg), 25);
        assert_eq!(throttled_operations(100, 2000.0, 18, &cfg), 100);
    }

    #[test]
    fn eligibility() {
        assert!(is_eligible(true, 3, true));
        assert!(is_eligible(true, 18, true));
        assert!(!is_eligible(true, 2, true));
        assert!(!is_eligible(true, 19, true));
        assert!(!is_eligible(false, 10, true));
        assert!(!is_eligible(true, 10, false));
    }

    #[test]
    fn refresh_binds_and_unbinds() {
        let (reg, water, brine) = water_brine_registry();
        let mut input = FluidTank::new(1000);
        let mut slot = ReactionSlot::default();

        slot.refresh(&reg, &input);
        assert_eq!(slot, ReactionSlot::Idle);

        input.fill(FluidStack::new(water, 100), TransferMode::Execute);
        slot.refresh(&reg, &input);
        assert_eq!(slot.cached().map(|c| c.input), Some(water));

        input.set_contents(Some(FluidStack::new(brine, 100)));
        slot.refresh(&reg, &input);
        assert!(!slot.is_active());
    }

    #[test]
    fn process_converts_fluid() {
        let (reg, water, brine) = water_brine_registry();
        let cfg = TowerConfig::default();
        let mut input = FluidTank::new(1000);
        let mut output = FluidTank::new(cfg.output_capacity);
        input.fill(FluidStack::new(water, 100), TransferMode::Execute);

        let mut slot = ReactionSlot::default();
        slot.refresh(&reg, &input);
        let result = slot.process(&reg, &mut input, &mut output, env(100.0), &cfg);
        assert_eq!(result.operations, 1);
        assert!(result.state_changed);
        assert_eq!(input.amount(), 90);
        assert_eq!(output.contents(), Some(FluidStack::new(brine, 1)));
    }

    #[test]
    fn process_respects_baseline_and_input() {
        let (reg, water, _) = water_brine_registry();
        let cfg = TowerConfig {
            baseline_operations: 8,
            ..TowerConfig::default()
        };
        let mut input = FluidTank::new(1000);
        let mut output = FluidTank::new(cfg.output_capacity);
        input.fill(FluidStack::new(water, 35), TransferMode::Execute);

        let mut slot = ReactionSlot::default();
        slot.refresh(&reg, &input);
        let result = slot.process(&reg, &mut input, &mut output, env(1000.0), &cfg);
        assert_eq!(result.operations, 3);
        assert_eq!(input.amount(), 5);
    }

    #[test]
    fn process_blocked_by_foreign_output() {
        let (reg, water, _) = water_brine_registry();
        let cfg = TowerConfig::default();
        let mut input = FluidTank::new(1000);
        let mut output = FluidTank::new(cfg.output_capacity);
        input.fill(FluidStack::new(water, 100), TransferMode::Execute);
        output.fill(FluidStack::new(water, 1), TransferMode::Execute);

        let mut slot = ReactionSlot::default();
        slot.refresh(&reg, &input);
        let result = slot.process(&reg, &mut input, &mut output, env(1000.0), &cfg);
        assert_eq!(result, ReactionResult::default());
        assert_eq!(input.amount(), 100);
    }

    #[test]
    fn process_blocked_when_cold_or_ineligible() {
        let (reg, water, _) = water_brine_registry();
        let cfg = TowerConfig::default();
        let mut input = FluidTank::new(1000);
        let mut output = FluidTank::new(cfg.output_capacity);
        input.fill(FluidStack::new(water, 100), TransferMode::Execute);
        let mut slot = ReactionSlot::default();
        slot.refresh(&reg, &input);

        assert_eq!(slot.process(&reg, &mut input, &mut output, env(0.0), &cfg).operations, 0);
        let short = ReactionEnv { height: 2, ..env(1000.0) };
        assert_eq!(slot.process(&reg, &mut input, &mut output, short, &cfg).operations, 0);
        let off = ReactionEnv { can_operate: false, ..env(1000.0) };
        assert_eq!(slot.process(&reg, &mut input, &mut output, off, &cfg).operations, 0);
        assert_eq!(input.amount(), 100);
    }
}
