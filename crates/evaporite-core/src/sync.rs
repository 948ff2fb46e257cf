//! Authoritative-to-replica state sync.
//!
//! The controller decides *when* to broadcast ([`SyncCoordinator`]) and
//! hands [`SyncUpdate`]s to an injected [`SyncChannel`]. Transport is the
//! host's business; [`SyncMessage::encode`] produces the wire bytes.
//! Replicas only decode and never scan.

use std::sync::mpsc::Sender;

use evaporite_fluid::FluidStack;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{FILL_RATIO_THRESHOLD, TowerConfig};
use crate::coord::{BlockPos, Facing};
use crate::scanner::{TowerBounds, TowerFrame};
use crate::serialize::{DeserializeError, SerializeError};

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Observable tower state. Field order is the wire order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub input: Option<FluidStack>,
    pub output: Option<FluidStack>,
    pub structured: bool,
    pub controller_conflict: bool,
    pub active_solars: u32,
    pub height: u32,
    pub temperature: f32,
    pub biome_temp: f32,
    pub left_on_face: bool,
    pub last_gain: f32,
    pub total_loss: f32,
    /// Lowest interior layer of the tower.
    pub render_y: i32,
}

impl SyncMessage {
    pub fn encode(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, DeserializeError> {
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
    }
}

/// A message addressed by the broadcasting controller's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncUpdate {
    pub controller: BlockPos,
    pub message: SyncMessage,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Where a controller sends its broadcasts.
pub trait SyncChannel {
    fn broadcast(&mut self, update: SyncUpdate);
}

impl SyncChannel for Sender<SyncUpdate> {
    fn broadcast(&mut self, update: SyncUpdate) {
        if self.send(update).is_err() {
            trace!(controller = ?update.controller, "sync receiver gone, update dropped");
        }
    }
}

impl SyncChannel for Vec<SyncUpdate> {
    fn broadcast(&mut self, update: SyncUpdate) {
        self.push(update);
    }
}

/// Discards every update.
impl SyncChannel for () {
    fn broadcast(&mut self, _update: SyncUpdate) {}
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Remembers what replicas were last told, to decide when to tell them
/// again.
#[derive(Debug, Clone, Default)]
pub struct SyncCoordinator {
    last_structured: bool,
    last_fill_ratio: f32,
}

impl SyncCoordinator {
    /// True when `structured` differs from the last broadcast value.
    /// Records the new value.
    pub fn structure_changed(&mut self, structured: bool) -> bool {
        if structured == self.last_structured {
            return false;
        }
        self.last_structured = structured;
        true
    }

    /// True when the input fill ratio moved by more than the threshold
    /// since it was last recorded. Records the new ratio.
    pub fn fill_ratio_moved(&mut self, ratio: f32) -> bool {
        if (ratio - self.last_fill_ratio).abs() <= FILL_RATIO_THRESHOLD {
            return false;
        }
        self.last_fill_ratio = ratio;
        true
    }

    pub fn last_fill_ratio(&self) -> f32 {
        self.last_fill_ratio
    }
}

// ---------------------------------------------------------------------------
// Replica
// ---------------------------------------------------------------------------

/// Passive mirror of a controller, fed only by sync messages.
#[derive(Debug, Clone)]
pub struct Replica {
    controller: BlockPos,
    facing: Facing,
    config: TowerConfig,
    state: SyncMessage,
    was_structured: bool,
}

impl Replica {
    pub fn new(controller: BlockPos, facing: Facing, config: TowerConfig) -> Self {
        Self {
            controller,
            facing,
            config,
            state: SyncMessage::default(),
            was_structured: false,
        }
    }

    pub fn controller(&self) -> BlockPos {
        self.controller
    }

    /// Last received state.
    pub fn state(&self) -> &SyncMessage {
        &self.state
    }

    /// Store `message`. On a flip to structured, returns the tower volume
    /// for a one-shot effect.
    pub fn apply(&mut self, message: SyncMessage) -> Option<TowerBounds> {
        self.state = message;
        if message.structured == self.was_structured {
            return None;
        }
        self.was_structured = message.structured;
        if message.structured { self.bounds() } else { None }
    }

    /// Decode and apply wire bytes.
    pub fn apply_bytes(&mut self, data: &[u8]) -> Result<Option<TowerBounds>, DeserializeError> {
        Ok(self.apply(SyncMessage::decode(data)?))
    }

    pub fn is_structured(&self) -> bool {
        self.state.structured
    }

    /// Input capacity implied by the reported height.
    pub fn input_capacity(&self) -> u32 {
        self.config.input_capacity(self.state.height)
    }

    pub fn fill_ratio(&self) -> f32 {
        let capacity = self.input_capacity();
        if capacity == 0 {
            return 0.0;
        }
        self.state.input.map_or(0, |s| s.amount) as f32 / capacity as f32
    }

    pub fn scaled_temp_level(&self, scale: u32) -> u32 {
        let fraction = (self.state.temperature / self.config.max_temperature).min(1.0);
        (scale as f32 * fraction) as u32
    }

    fn frame(&self) -> TowerFrame {
        TowerFrame::from_controller(self.controller, self.facing, self.state.left_on_face)
    }

    /// The lowest interior cell with minimal x and z, while structured.
    pub fn render_anchor(&self) -> Option<BlockPos> {
        self.state
            .structured
            .then(|| self.frame().render_anchor(self.state.render_y))
    }

    /// The tower volume, while structured.
    pub fn bounds(&self) -> Option<TowerBounds> {
        self.state
            .structured
            .then(|| self.frame().bounds(self.state.render_y, self.state.height))
    }
}
