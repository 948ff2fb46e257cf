//! Serde data file structs for tower content.
//!
//! These structs define the on-disk format for fluids and evaporation
//! recipes. They are deserialized from RON, JSON, or TOML data files and
//! then resolved into engine types by the loader. Tower tuning is read
//! straight into [`evaporite_core::config::TowerConfig`].

use serde::Deserialize;

// ===========================================================================
// Fluids
// ===========================================================================

/// A fluid definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct FluidData {
    pub name: String,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A fluid amount, in short tuple form or with named fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FluidAmountData {
    /// Short form: `("water", 10)`.
    Short(String, u32),
    /// Full form: `(fluid: "water", amount: 10)`.
    Full { fluid: String, amount: u32 },
}

impl FluidAmountData {
    pub fn fluid(&self) -> &str {
        match self {
            FluidAmountData::Short(fluid, _) => fluid,
            FluidAmountData::Full { fluid, .. } => fluid,
        }
    }

    pub fn amount(&self) -> u32 {
        match self {
            FluidAmountData::Short(_, amount) => *amount,
            FluidAmountData::Full { amount, .. } => *amount,
        }
    }
}

/// An evaporation recipe in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub input: FluidAmountData,
    pub output: FluidAmountData,
}
