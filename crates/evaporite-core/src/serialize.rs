//! Persistence of the durable tower fields.
//!
//! Only the two tanks and the temperature survive a save. Geometry is
//! derived from the grid and rebuilt by the first scan after loading.
//! Encoded with `bitcode` behind a versioned header.

use evaporite_fluid::FluidStack;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::TowerConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a saved tower.
pub const STATE_MAGIC: u32 = 0xE7A9_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", STATE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("state from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for StateHeader {
    fn default() -> Self {
        Self {
            magic: STATE_MAGIC,
            version: FORMAT_VERSION,
        }
    }
}

impl StateHeader {
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != STATE_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Durable state
// ---------------------------------------------------------------------------

/// The persisted fields of one tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableState {
    pub header: StateHeader,
    pub input: Option<FluidStack>,
    pub output: Option<FluidStack>,
    pub temperature: f32,
}

impl DurableState {
    pub fn new(input: Option<FluidStack>, output: Option<FluidStack>, temperature: f32) -> Self {
        Self {
            header: StateHeader::default(),
            input,
            output,
            temperature,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode and validate the header. Field values are not checked here;
    /// see [`DurableState::clamp`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, DeserializeError> {
        let state: DurableState =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        state.header.validate()?;
        Ok(state)
    }

    /// Bring loaded values into range. Returns `true` if anything changed.
    ///
    /// The input tank is bounded by the tallest possible tower, since the
    /// real capacity is unknown until the first scan.
    pub fn clamp(&mut self, config: &TowerConfig) -> bool {
        let mut changed = false;

        if let Some(stack) = self.input.as_mut()
            && stack.amount > config.max_input_capacity()
        {
            warn!(amount = stack.amount, max = config.max_input_capacity(), "clamping loaded input tank");
            stack.amount = config.max_input_capacity();
            changed = true;
        }
        if let Some(stack) = self.output.as_mut()
            && stack.amount > config.output_capacity
        {
            warn!(amount = stack.amount, max = config.output_capacity, "clamping loaded output tank");
            stack.amount = config.output_capacity;
            changed = true;
        }
        self.input = self.input.and_then(FluidStack::non_empty);
        self.output = self.output.and_then(FluidStack::non_empty);

        if !self.temperature.is_finite() {
            warn!(temperature = self.temperature, "resetting non-finite loaded temperature");
            self.temperature = 0.0;
            changed = true;
        } else if self.temperature > config.max_temperature {
            warn!(temperature = self.temperature, "clamping loaded temperature");
            self.temperature = config.max_temperature;
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FluidId;

    fn sample() -> DurableState {
        DurableState::new(
            Some(FluidStack::new(FluidId(0), 5000)),
            Some(FluidStack::new(FluidId(1), 42)),
            87.5,
        )
    }

    #[test]
    fn bytes_round_trip() {
        let state = sample();
        let bytes = state.to_bytes().unwrap();
        let back = DurableState::from_bytes(&bytes).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut state = sample();
        state.header.magic = 0xDEAD_BEEF;
        let bytes = state.to_bytes().unwrap();
        match DurableState::from_bytes(&bytes) {
            Err(DeserializeError::InvalidMagic(m)) => assert_eq!(m, 0xDEAD_BEEF),
            other => panic!("expected InvalidMagic, got: {other:?}"),
        }
    }

    #[test]
    fn version_mismatch_rejected() {
        let mut state = sample();
        state.header.version = FORMAT_VERSION + 1;
        let bytes = state.to_bytes().unwrap();
        assert!(matches!(
            DurableState::from_bytes(&bytes),
            Err(DeserializeError::FutureVersion(_))
        ));

        state.header.version = 0;
        let bytes = state.to_bytes().unwrap();
        assert!(matches!(
            DurableState::from_bytes(&bytes),
            Err(DeserializeError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn garbage_rejected() {
        let result = DurableState::from_bytes(&[]);
        assert!(matches!(result, Err(DeserializeError::Decode(_))));
    }

    #[test]
    fn clamp_leaves_valid_state_alone() {
        let mut state = sample();
        assert!(!state.clamp(&TowerConfig::default()));
        assert_eq!(state, sample());
    }

    #[test]
    fn clamp_bounds_tanks_and_temperature() {
        let cfg = TowerConfig::default();
        let mut state = DurableState::new(
            Some(FluidStack::new(FluidId(0), u32::MAX)),
            Some(FluidStack::new(FluidId(1), 20_000)),
            f32::NAN,
        );
        assert!(state.clamp(&cfg));
        assert_eq!(state.input.unwrap().amount, cfg.max_input_capacity());
        assert_eq!(state.output.unwrap().amount, cfg.output_capacity);
        assert_eq!(state.temperature, 0.0);

        let mut hot = DurableState::new(None, None, 1.0e9);
        assert!(hot.clamp(&cfg));
        assert_eq!(hot.temperature, cfg.max_temperature);
    }

    #[test]
    fn clamp_drops_zero_amount_stacks() {
        let mut state = DurableState::new(Some(FluidStack::new(FluidId(0), 0)), None, 10.0);
        state.clamp(&TowerConfig::default());
        assert_eq!(state.input, None);
    }
}
