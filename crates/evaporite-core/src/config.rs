//! Tunable tower parameters and fixed structural constants.

use serde::{Deserialize, Serialize};

/// Minimum number of layers in a valid tower.
pub const MIN_HEIGHT: u32 = 3;

/// Maximum number of layers in a valid tower.
pub const MAX_HEIGHT: u32 = 18;

/// Width and depth of every layer.
pub const LAYER_SIZE: i32 = 4;

/// Input fill-ratio movement that forces a broadcast.
pub const FILL_RATIO_THRESHOLD: f32 = 0.01;

/// Distance from ambient below which the temperature snaps to ambient.
pub const SNAP_EPSILON: f32 = 0.001;

/// Per-tower tuning. Every field has a default, so partial config files
/// are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    /// Heat added per sky-visible solar collector per tick.
    pub solar_multiplier: f32,
    pub heat_dissipation: f32,
    pub max_temperature: f32,
    /// Throughput multiplier per degree of temperature.
    pub temp_multiplier: f32,
    /// Input capacity per layer per side.
    pub unit_capacity: u32,
    pub output_capacity: u32,
    /// Operations per tick before input, output and heat limits apply.
    pub baseline_operations: u32,
    /// Ticks after creation or load before the first scan.
    pub initial_scan_delay: u64,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            solar_multiplier: 0.2,
            heat_dissipation: 0.02,
            max_temperature: 3000.0,
            temp_multiplier: 0.1,
            unit_capacity: 64_000,
            output_capacity: 10_000,
            baseline_operations: 1,
            initial_scan_delay: 5,
        }
    }
}

impl TowerConfig {
    /// Input capacity of a tower `height` layers tall.
    pub fn input_capacity(&self, height: u32) -> u32 {
        height
            .saturating_mul(LAYER_SIZE as u32)
            .saturating_mul(self.unit_capacity)
    }

    /// Input capacity of the tallest possible tower. Bounds loaded contents
    /// before the first scan.
    pub fn max_input_capacity(&self) -> u32 {
        self.input_capacity(MAX_HEIGHT)
    }
}
