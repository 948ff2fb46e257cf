use std::collections::HashMap;

use evaporite_fluid::FluidStack;

use crate::id::*;

/// A named fluid.
#[derive(Debug, Clone)]
pub struct FluidDef {
    pub name: String,
}

/// An evaporation recipe: `input` is consumed and `output` produced once per
/// operation.
#[derive(Debug, Clone)]
pub struct RecipeDef {
    pub name: String,
    pub input: FluidStack,
    pub output: FluidStack,
}

impl RecipeDef {
    /// Whether `fluid` is this recipe's input.
    pub fn accepts(&self, fluid: FluidId) -> bool {
        self.input.fluid == fluid
    }
}

/// Builder for constructing an immutable [`RecipeRegistry`].
/// Two-phase lifecycle: registration -> finalization.
#[derive(Debug)]
pub struct RecipeRegistryBuilder {
    fluids: Vec<FluidDef>,
    fluid_name_to_id: HashMap<String, FluidId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    duplicates: Vec<String>,
}

impl Default for RecipeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeRegistryBuilder {
    pub fn new() -> Self {
        Self {
            fluids: Vec::new(),
            fluid_name_to_id: HashMap::new(),
            recipes: Vec::new(),
            recipe_name_to_id: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Register a fluid. Returns its ID.
    pub fn register_fluid(&mut self, name: &str) -> FluidId {
        let id = FluidId(self.fluids.len() as u32);
        self.fluids.push(FluidDef {
            name: name.to_string(),
        });
        if self.fluid_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        id
    }

    /// Register a recipe. Returns its ID.
    pub fn register_recipe(&mut self, name: &str, input: FluidStack, output: FluidStack) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            name: name.to_string(),
            input,
            output,
        });
        if self.recipe_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        id
    }

    pub fn fluid_id(&self, name: &str) -> Option<FluidId> {
        self.fluid_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable registry.
    pub fn build(self) -> Result<RecipeRegistry, RegistryError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(RegistryError::Duplicate(name));
        }
        for recipe in &self.recipes {
            for stack in [&recipe.input, &recipe.output] {
                if stack.fluid.0 as usize >= self.fluids.len() {
                    return Err(RegistryError::InvalidFluidRef(stack.fluid));
                }
                if stack.amount == 0 {
                    return Err(RegistryError::ZeroAmount(recipe.name.clone()));
                }
            }
        }

        Ok(RecipeRegistry {
            fluids: self.fluids,
            fluid_name_to_id: self.fluid_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
        })
    }
}

/// Immutable recipe set. Frozen after build().
#[derive(Debug)]
pub struct RecipeRegistry {
    fluids: Vec<FluidDef>,
    fluid_name_to_id: HashMap<String, FluidId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
}

impl RecipeRegistry {
    pub fn get_fluid(&self, id: FluidId) -> Option<&FluidDef> {
        self.fluids.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn fluid_id(&self, name: &str) -> Option<FluidId> {
        self.fluid_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn fluid_count(&self) -> usize {
        self.fluids.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// First recipe matching `predicate`, in registration order.
    pub fn find_first(&self, predicate: impl Fn(&RecipeDef) -> bool) -> Option<RecipeId> {
        self.recipes
            .iter()
            .position(predicate)
            .map(|i| RecipeId(i as u32))
    }

    /// The recipe consuming `fluid`, if any.
    pub fn find_for_input(&self, fluid: FluidId) -> Option<RecipeId> {
        self.find_first(|r| r.accepts(fluid))
    }

    /// Whether any recipe consumes `fluid`. Gates what containers may pour
    /// into the input tank.
    pub fn accepts_input(&self, fluid: FluidId) -> bool {
        self.recipes.iter().any(|r| r.accepts(fluid))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate name: {0}")]
    Duplicate(String),
    #[error("invalid fluid reference: {0:?}")]
    InvalidFluidRef(FluidId),
    #[error("recipe {0} has a zero amount")]
    ZeroAmount(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_builder() -> RecipeRegistryBuilder {
        let mut b = RecipeRegistryBuilder::new();
        let water = b.register_fluid("water");
        let brine = b.register_fluid("brine");
        b.register_recipe(
            "water_to_brine",
            FluidStack::new(water, 10),
            FluidStack::new(brine, 1),
        );
        b
    }

    #[test]
    fn register_and_build() {
        let reg = setup_builder().build().unwrap();
        assert_eq!(reg.fluid_count(), 2);
        assert_eq!(reg.recipe_count(), 1);
        assert_eq!(reg.get_fluid(FluidId(1)).unwrap().name, "brine");
    }

    #[test]
    fn lookup_by_name() {
        let reg = setup_builder().build().unwrap();
        assert!(reg.fluid_id("water").is_some());
        assert!(reg.fluid_id("lava").is_none());
        assert_eq!(reg.recipe_id("water_to_brine"), Some(RecipeId(0)));
    }

    #[test]
    fn find_for_input_matches_fluid_type() {
        let reg = setup_builder().build().unwrap();
        let water = reg.fluid_id("water").unwrap();
        let brine = reg.fluid_id("brine").unwrap();
        assert_eq!(reg.find_for_input(water), Some(RecipeId(0)));
        assert_eq!(reg.find_for_input(brine), None);
        assert!(reg.accepts_input(water));
        assert!(!reg.accepts_input(brine));
    }

    #[test]
    fn find_first_respects_registration_order() {
        let mut b = setup_builder();
        let water = b.fluid_id("water").unwrap();
        let steam = b.register_fluid("steam");
        b.register_recipe("water_to_steam", FluidStack::new(water, 1), FluidStack::new(steam, 1));
        let reg = b.build().unwrap();
        assert_eq!(reg.find_for_input(water), Some(RecipeId(0)));
        assert_eq!(reg.find_first(|r| r.output.fluid == steam), Some(RecipeId(1)));
    }

    // -----------------------------------------------------------------------
    // Error path tests
    // -----------------------------------------------------------------------

    #[test]
    fn duplicate_fluid_fails() {
        let mut b = setup_builder();
        b.register_fluid("water");
        match b.build() {
            Err(RegistryError::Duplicate(name)) => assert_eq!(name, "water"),
            other => panic!("expected Duplicate, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_recipe_fails() {
        let mut b = setup_builder();
        let water = b.fluid_id("water").unwrap();
        b.register_recipe("water_to_brine", FluidStack::new(water, 1), FluidStack::new(water, 1));
        assert!(matches!(b.build(), Err(RegistryError::Duplicate(_))));
    }

    #[test]
    fn invalid_fluid_ref_fails() {
        let mut b = RecipeRegistryBuilder::new();
        let water = b.register_fluid("water");
        b.register_recipe("bad", FluidStack::new(water, 1), FluidStack::new(FluidId(999), 1));
        match b.build() {
            Err(RegistryError::InvalidFluidRef(id)) => {
                assert_eq!(id, FluidId(999));
                let msg = format!("{}", RegistryError::InvalidFluidRef(id));
                assert!(msg.contains("invalid fluid reference"), "got: {msg}");
            }
            other => panic!("expected InvalidFluidRef, got: {other:?}"),
        }
    }

    #[test]
    fn zero_amount_fails() {
        let mut b = RecipeRegistryBuilder::new();
        let water = b.register_fluid("water");
        b.register_recipe("empty", FluidStack::new(water, 0), FluidStack::new(water, 1));
        assert!(matches!(b.build(), Err(RegistryError::ZeroAmount(_))));
    }
}
