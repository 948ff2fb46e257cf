pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, TowerData, load_tower_data};
