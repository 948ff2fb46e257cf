//! Resolution pipeline: reads data files, resolves fluid names, builds the
//! recipe registry and tower config.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_tower_data`] which ties them
//! together for a data directory laid out as:
//!
//! - `fluids.{ron,toml,json}` (required)
//! - `recipes.{ron,toml,json}` (required)
//! - `config.{ron,toml,json}` (optional, defaults otherwise)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use evaporite_core::config::TowerConfig;
use evaporite_core::id::{FluidId, RecipeId};
use evaporite_core::registry::{RecipeRegistry, RecipeRegistryBuilder, RegistryError};
use evaporite_fluid::FluidStack;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::schema::{FluidAmountData, FluidData, RecipeData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved registry failed validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. TOML has no top-level arrays, so there
/// the list is read from the array at `toml_key`. RON and JSON files hold
/// the list directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }

    let content = std::fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything a host needs to run towers.
#[derive(Debug)]
pub struct TowerData {
    pub registry: RecipeRegistry,
    pub config: TowerConfig,
}

fn resolve_stack(
    fluids: &HashMap<String, FluidId>,
    data: &FluidAmountData,
    file: &Path,
) -> Result<FluidStack, DataLoadError> {
    let id = resolve_name(fluids, data.fluid(), file, "fluid")?;
    Ok(FluidStack::new(*id, data.amount()))
}

/// Load fluids, recipes and tower config from `dir`.
pub fn load_tower_data(dir: &Path) -> Result<TowerData, DataLoadError> {
    let config = match find_data_file(dir, "config")? {
        Some(path) => {
            debug!(file = %path.display(), "loading tower config");
            deserialize_file::<TowerConfig>(&path)?
        }
        None => TowerConfig::default(),
    };

    let mut builder = RecipeRegistryBuilder::new();

    let fluids_path = require_data_file(dir, "fluids")?;
    let fluid_list: Vec<FluidData> = deserialize_list(&fluids_path, "fluids")?;
    let mut fluids: HashMap<String, FluidId> = HashMap::with_capacity(fluid_list.len());
    for fluid in &fluid_list {
        check_duplicate(&fluids, &fluid.name, &fluids_path)?;
        fluids.insert(fluid.name.clone(), builder.register_fluid(&fluid.name));
    }

    let recipes_path = require_data_file(dir, "recipes")?;
    let recipe_list: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    let mut recipes: HashMap<String, RecipeId> = HashMap::with_capacity(recipe_list.len());
    for recipe in &recipe_list {
        check_duplicate(&recipes, &recipe.name, &recipes_path)?;
        let input = resolve_stack(&fluids, &recipe.input, &recipes_path)?;
        let output = resolve_stack(&fluids, &recipe.output, &recipes_path)?;
        let id = builder.register_recipe(&recipe.name, input, output);
        recipes.insert(recipe.name.clone(), id);
    }

    let registry = builder.build()?;
    info!(
        dir = %dir.display(),
        fluids = registry.fluid_count(),
        recipes = registry.recipe_count(),
        "tower data loaded"
    );
    Ok(TowerData { registry, config })
}

// ===========================================================================
// Tests
// ===========================================================================
