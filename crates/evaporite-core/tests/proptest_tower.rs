//! Property-based tests for the tower engine.
//!
//! Uses proptest to generate random tower shapes, temperatures and heights,
//! then verify the structural and thermal invariants hold.

use evaporite_core::config::{MAX_HEIGHT, MIN_HEIGHT, TowerConfig};
use evaporite_core::coord::{BlockPos, Facing};
use evaporite_core::grid::VoxelGrid;
use evaporite_core::reaction::throttled_operations;
use evaporite_core::scanner::scan;
use evaporite_core::test_utils::*;
use evaporite_core::thermal::{ThermalState, base_temperature};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_facing() -> impl Strategy<Value = Facing> {
    prop_oneof![
        Just(Facing::North),
        Just(Facing::East),
        Just(Facing::South),
        Just(Facing::West),
    ]
}

fn arb_origin() -> impl Strategy<Value = BlockPos> {
    (-1000..1000i32, 0..200i32, -1000..1000i32).prop_map(|(x, y, z)| BlockPos::new(x, y, z))
}

/// A valid blueprint: any height in range, controller on any layer.
fn arb_blueprint(heights: std::ops::RangeInclusive<u32>) -> impl Strategy<Value = TowerBlueprint> {
    (arb_origin(), arb_facing(), heights, any::<bool>(), any::<[bool; 4]>()).prop_flat_map(
        |(origin, facing, height, left, solars)| {
            (0..height).prop_map(move |depth| {
                TowerBlueprint::new(origin, facing, height)
                    .controller_depth(depth)
                    .left_on_face(left)
                    .solars(solars)
            })
        },
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every well-formed tower in the height range scans to its own height.
    #[test]
    fn well_formed_towers_scan(bp in arb_blueprint(MIN_HEIGHT..=MAX_HEIGHT)) {
        let mut grid = VoxelGrid::new();
        let layout = build_tower(&mut grid, &bp);
        let s = scan(layout.controller, bp.facing, &grid);
        prop_assert!(s.is_ok(), "rejected: {:?}", s.as_ref().err());
        let s = s.unwrap();
        prop_assert_eq!(s.height, bp.height);
        prop_assert_eq!(s.left_on_face, bp.left_on_face);
        prop_assert_eq!(s.top_y(), layout.top_y);
        prop_assert_eq!(s.floor_y(), layout.floor_y);
        prop_assert!(!s.parts.contains(&layout.controller));
        let solars = s.solars.iter().filter(|f| f.is_some()).count();
        prop_assert_eq!(solars, bp.solars.iter().filter(|b| **b).count());
    }

    /// Towers outside the height range never validate.
    #[test]
    fn out_of_range_heights_rejected(
        bp in prop_oneof![
            arb_blueprint(1..=MIN_HEIGHT - 1),
            arb_blueprint(MAX_HEIGHT + 1..=MAX_HEIGHT + 6),
        ]
    ) {
        let mut grid = VoxelGrid::new();
        let layout = build_tower(&mut grid, &bp);
        prop_assert!(scan(layout.controller, bp.facing, &grid).is_err());
    }

    /// Scanning twice over an unchanged grid gives the same structure.
    #[test]
    fn rescan_is_idempotent(bp in arb_blueprint(MIN_HEIGHT..=MAX_HEIGHT)) {
        let mut grid = VoxelGrid::new();
        let layout = build_tower(&mut grid, &bp);
        let a = scan(layout.controller, bp.facing, &grid).unwrap();
        let b = scan(layout.controller, bp.facing, &grid).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Without sunlight the temperature approaches ambient and never
    /// crosses it.
    #[test]
    fn temperature_relaxes_without_overshoot(
        start in -200.0f32..3000.0,
        biome in -0.5f32..2.0,
        height in MIN_HEIGHT..=MAX_HEIGHT,
    ) {
        let cfg = TowerConfig::default();
        let base = base_temperature(biome);
        let mut t = ThermalState::with_temperature(start);
        let mut distance = (start - base).abs();
        let above = start > base;

        for _ in 0..500 {
            t.advance(0, height, &cfg, || biome);
            let d = (t.temperature - base).abs();
            prop_assert!(d <= distance + 1e-3, "moved away: {} -> {}", distance, d);
            if above {
                prop_assert!(t.temperature >= base - 1e-3);
            } else {
                prop_assert!(t.temperature <= base + 1e-3);
            }
            distance = d;
        }
    }

    /// Hotter towers never run fewer operations, and frozen ones run none.
    #[test]
    fn throttle_monotone_in_temperature(
        current_max in 0u32..64,
        a in -100.0f32..3000.0,
        b in -100.0f32..3000.0,
        height in MIN_HEIGHT..=MAX_HEIGHT,
    ) {
        let cfg = TowerConfig::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let ops_lo = throttled_operations(current_max, lo, height, &cfg);
        let ops_hi = throttled_operations(current_max, hi, height, &cfg);
        prop_assert!(ops_lo <= ops_hi);
        prop_assert!(ops_hi <= current_max);
        if lo <= 0.0 {
            prop_assert_eq!(ops_lo, 0);
        }
    }
}
