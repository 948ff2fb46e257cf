use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

pub use evaporite_fluid::FluidId;

new_key_type! {
    /// Identifies a tower hosted by the [`Engine`](crate::engine::Engine).
    pub struct TowerId;
}

/// Identifies a recipe in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);
