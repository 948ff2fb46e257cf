//! Evaporite Core -- the thermal evaporation tower engine.
//!
//! A tower is a 4×4 shell of wall blocks, 3 to 18 layers tall, with a
//! controller set into its front face. The controller validates the shell,
//! heats up under sunlight collected at the top corners, and converts one
//! fluid into another at a rate throttled by its temperature and height.
//!
//! # Tick Pipeline
//!
//! Each call to [`tower::Tower::tick`] runs, in order:
//!
//! 1. **Scan** -- validate the structure when due ([`scanner`]).
//! 2. **Thermal** -- absorb solar heat and relax toward ambient ([`thermal`]).
//! 3. **Reaction** -- refresh the cached reaction and process it ([`reaction`]).
//! 4. **Exchange** -- fill and empty portable containers ([`exchange`]).
//! 5. **Sync** -- broadcast when the observable state moved ([`sync`]).
//!
//! Scans are also triggered between ticks (neighbour changes, chunk
//! reloads); the [`sim::TickPhase`] passed into every trigger guarantees at
//! most one scan per tick.
//!
//! # Key Types
//!
//! - [`tower::Tower`] -- the authoritative controller node.
//! - [`sync::Replica`] -- the passive observer fed by [`sync::SyncMessage`]s.
//! - [`engine::Engine`] -- hosts many towers on one grid and routes block
//!   changes to them.
//! - [`probe::GridProbe`] -- the read-only world interface the scanner needs.
//! - [`registry::RecipeRegistry`] -- immutable set of evaporation recipes.
//! - [`serialize`] -- versioned persistence of the durable tower fields.

pub mod config;
pub mod coord;
pub mod engine;
pub mod exchange;
pub mod grid;
pub mod id;
pub mod probe;
pub mod reaction;
pub mod registry;
pub mod scanner;
pub mod serialize;
pub mod sim;
pub mod sync;
pub mod thermal;
pub mod tower;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
