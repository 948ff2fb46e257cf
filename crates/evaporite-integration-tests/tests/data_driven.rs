//! Towers driven by recipes and tuning loaded from data files.

use std::fs;
use std::path::{Path, PathBuf};

use evaporite_core::coord::{BlockPos, Facing};
use evaporite_core::engine::Engine;
use evaporite_core::grid::VoxelGrid;
use evaporite_core::test_utils::*;
use evaporite_data::{DataLoadError, load_tower_data};
use evaporite_fluid::{FluidStack, TransferMode};

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "evaporite_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

fn write_lithium_pack(dir: &Path) {
    fs::write(
        dir.join("fluids.json"),
        r#"[{"name": "water"}, {"name": "brine"}, {"name": "lithium"}]"#,
    )
    .unwrap();
    fs::write(
        dir.join("recipes.toml"),
        r#"
[[recipes]]
name = "water_to_brine"
input = ["water", 10]
output = ["brine", 1]

[[recipes]]
name = "brine_to_lithium"
input = { fluid = "brine", amount = 10 }
output = { fluid = "lithium", amount = 1 }
"#,
    )
    .unwrap();
    fs::write(
        dir.join("config.ron"),
        "(solar_multiplier: 2.0, baseline_operations: 4, initial_scan_delay: 0)",
    )
    .unwrap();
}

#[test]
fn loaded_recipes_drive_a_tower() {
    let dir = make_test_dir("lithium");
    write_lithium_pack(&dir);
    let data = load_tower_data(&dir).unwrap();
    cleanup(&dir);

    assert_eq!(data.config.baseline_operations, 4);
    let brine = data.registry.fluid_id("brine").unwrap();
    let lithium = data.registry.fluid_id("lithium").unwrap();
    assert!(data.registry.accepts_input(brine));
    assert!(!data.registry.accepts_input(lithium));

    let mut engine = Engine::new(VoxelGrid::new(), data.registry, data.config, ());
    let layout = build_tower(
        &mut engine.grid,
        &TowerBlueprint::new(BlockPos::new(0, 64, 0), Facing::South, 18).solars([true; 4]),
    );
    let id = engine.add_tower(layout.controller, Facing::South);

    // No settle delay: the first step scans.
    assert_eq!(engine.step().scans, 1);
    assert!(engine.tower(id).unwrap().is_active());

    // Nothing to evaporate yet.
    let report = engine.advance(100);
    assert_eq!(report.operations, 0);
    assert!(engine.tower(id).unwrap().output_tank().is_empty());
}

#[test]
fn broken_data_reported() {
    let dir = make_test_dir("broken");
    write_lithium_pack(&dir);
    fs::write(dir.join("fluids.ron"), "[]").unwrap();

    assert!(matches!(
        load_tower_data(&dir),
        Err(DataLoadError::ConflictingFormats { .. })
    ));
    cleanup(&dir);
}

#[test]
fn fill_uses_loaded_registry() {
    let dir = make_test_dir("fill");
    write_lithium_pack(&dir);
    let data = load_tower_data(&dir).unwrap();
    // A second copy for filling, since the engine owns the first.
    let check = load_tower_data(&dir).unwrap();
    cleanup(&dir);

    let brine = check.registry.fluid_id("brine").unwrap();
    let lithium = check.registry.fluid_id("lithium").unwrap();
    let mut engine = Engine::new(VoxelGrid::new(), data.registry, data.config, ());
    let layout = build_tower(
        &mut engine.grid,
        &TowerBlueprint::new(BlockPos::new(0, 64, 0), Facing::South, 18).solars([true; 4]),
    );
    let id = engine.add_tower(layout.controller, Facing::South);
    engine.step();

    let tower = engine.tower_mut(id).unwrap();
    assert_eq!(
        tower.fill_input(FluidStack::new(lithium, 100), &check.registry, TransferMode::Execute),
        0
    );
    assert_eq!(
        tower.fill_input(FluidStack::new(brine, 100_000), &check.registry, TransferMode::Execute),
        100_000
    );

    // Ten times the default solar gain: hot within a few dozen ticks, then
    // four operations per tick.
    let report = engine.advance(1_000);
    assert!(report.operations > 0);
    let tower = engine.tower(id).unwrap();
    assert_eq!(tower.output_tank().contents(), Some(FluidStack::new(lithium, report.operations)));
    assert_eq!(tower.input_tank().amount(), 100_000 - report.operations * 10);
}
