//! Headless tower: one controller, one replica, a day/night cycle.
//!
//! Builds an 18-layer tower with four solar collectors, fills it with water
//! and runs a few in-game days. Sync updates travel over an mpsc channel as
//! wire bytes to a replica, which prints what an observer would see.
//!
//! Run with: `RUST_LOG=evaporite_core=debug cargo run -p evaporite-core --example headless_tower`

use std::sync::mpsc::channel;

use evaporite_core::config::{MAX_HEIGHT, TowerConfig};
use evaporite_core::coord::{BlockPos, Facing};
use evaporite_core::engine::Engine;
use evaporite_core::grid::VoxelGrid;
use evaporite_core::sync::Replica;
use evaporite_core::test_utils::{TowerBlueprint, build_tower, water_brine_registry};
use evaporite_fluid::{FluidStack, TransferMode};
use tracing_subscriber::EnvFilter;

const DAY_LENGTH: u64 = 24_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (registry, water, _brine) = water_brine_registry();
    let config = TowerConfig::default();
    let (tx, rx) = channel();
    let mut engine = Engine::new(VoxelGrid::new(), registry, config.clone(), tx);

    // --- Step 1: Build the shell and host the controller ---

    let controller = BlockPos::new(0, 64, 0);
    let layout = build_tower(
        &mut engine.grid,
        &TowerBlueprint::new(controller, Facing::South, MAX_HEIGHT).solars([true; 4]),
    );
    let id = engine.add_tower(layout.controller, Facing::South);
    let mut replica = Replica::new(layout.controller, Facing::South, config.clone());

    // --- Step 2: Let it settle and form ---

    engine.advance(config.initial_scan_delay + 1);

    // --- Step 3: Fill the input tank ---

    let (registry, _, _) = water_brine_registry();
    if let Some(tower) = engine.tower_mut(id) {
        let capacity = tower.input_tank().capacity();
        let taken = tower.fill_input(FluidStack::new(water, capacity), &registry, TransferMode::Execute);
        println!("Filled {taken} mB of water into a {capacity} mB tank\n");
    }

    // --- Step 4: Run three days ---

    for day in 0..3 {
        for half in [true, false] {
            engine.grid.set_daylight(half);
            engine.advance(DAY_LENGTH / 2);

            for update in rx.try_iter() {
                let Ok(bytes) = update.message.encode() else {
                    continue;
                };
                if let Ok(Some(bounds)) = replica.apply_bytes(&bytes) {
                    println!("Replica saw the tower form: {:?} .. {:?}", bounds.min, bounds.max);
                }
            }

            let Some(tower) = engine.tower(id) else {
                return;
            };
            println!(
                "Day {} {}: {:.1}°, input {} mB, output {} mB, gauge {}/100",
                day + 1,
                if half { "dusk" } else { "dawn" },
                tower.temperature(),
                tower.input_tank().amount(),
                tower.output_tank().amount(),
                replica.scaled_temp_level(100),
            );
        }
    }

    println!("\nReplica fill ratio: {:.3}", replica.fill_ratio());
}
