//! Tower heat model.
//!
//! Solar collectors add heat that is spread over the tower's height; the
//! tower then relaxes toward the ambient temperature of its biome at a rate
//! proportional to the square root of the distance.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{SNAP_EPSILON, TowerConfig};

/// Ambient temperature a tower relaxes toward in a biome of the given
/// temperature.
pub fn base_temperature(biome: f32) -> f32 {
    let warm = biome - 0.5;
    if warm > 0.0 { warm * 20.0 } else { biome * 40.0 }
}

/// Thermal state of one tower.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalState {
    pub temperature: f32,
    /// Ambient biome temperature, sampled once per validated structure.
    pub biome_temp: Option<f32>,
    /// Heat collected this tick. Zero between ticks.
    pub heat_to_absorb: f32,
    /// Temperature gained from absorbed heat on the last tick.
    pub last_gain: f32,
    /// Temperature lost to dissipation on the last tick.
    pub total_loss: f32,
}

impl ThermalState {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }

    /// Forget the cached biome temperature. Called when the structure is
    /// lost so the next valid structure samples it again.
    pub fn reset_biome(&mut self) {
        self.biome_temp = None;
    }

    /// The cached biome temperature, or `0.0` before the first sample.
    pub fn biome_temperature(&self) -> f32 {
        self.biome_temp.unwrap_or(0.0)
    }

    /// Advance one tick for a tower `height` layers tall with
    /// `active_solars` collectors in the sun.
    ///
    /// `biome` is only called when no biome temperature is cached.
    pub fn advance(
        &mut self,
        active_solars: u32,
        height: u32,
        config: &TowerConfig,
        biome: impl FnOnce() -> f32,
    ) {
        if height == 0 {
            return;
        }
        let biome_temp = *self.biome_temp.get_or_insert_with(biome);
        let height = height as f32;

        self.heat_to_absorb += active_solars as f32 * config.solar_multiplier;
        self.last_gain = self.heat_to_absorb / height;
        self.temperature += self.last_gain;

        let base = base_temperature(biome_temp);
        if (self.temperature - base).abs() < SNAP_EPSILON {
            self.temperature = base;
        }

        let mut incr = (self.temperature - base).abs().sqrt() * config.heat_dissipation;
        if self.temperature > base {
            incr = -incr;
        }

        let prev = self.temperature;
        self.temperature = config.max_temperature.min(self.temperature + incr / height);
        self.total_loss = if incr < 0.0 { prev - self.temperature } else { 0.0 };
        self.heat_to_absorb = 0.0;

        trace!(
            temperature = self.temperature,
            base,
            gain = self.last_gain,
            loss = self.total_loss,
            "thermal tick"
        );
    }

    /// Temperature as a gauge level in `0..=scale`.
    pub fn scaled_temp_level(&self, scale: u32, max_temperature: f32) -> u32 {
        let fraction = (self.temperature / max_temperature).min(1.0);
        (scale as f32 * fraction) as u32
    }
}
