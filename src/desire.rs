//! Desire-path stress tracking and its feedback into traversal costs.
//!
//! Every villager arrival on grass bumps the tile's stress; a periodic decay
//! pass drains it again. Crossing each 64-unit stress threshold makes the
//! tile one cost point cheaper (up to -3 at saturation), which pulls later
//! paths onto already-trodden ground. That feedback loop carves the trails.

use crate::grid::Grid;
use crate::tile::CostMap;

/// Per-tile traffic accumulator, 0..=255.
pub type StressMap = Grid<u8>;

/// Stress lost per tile and decay pass.
pub const DECAY_STEP: i32 = -2;

/// Adjust a tile's stress by `adjustment`, clamped into 0..=255, and apply
/// the cost coupling: the cost discount is `floor(stress / 64)`, so the cost
/// changes by exactly the signed difference of that term before and after.
/// Returns the new stress value.
pub fn adjust_stress(
    x: usize,
    y: usize,
    stress: &mut StressMap,
    costs: &mut CostMap,
    adjustment: i32,
) -> u8 {
    let before = *stress.at(x, y);
    let after = (before as i32 + adjustment).clamp(0, 255) as u8;

    if before != after {
        stress.set(x, y, after);

        let discount_before = (before / 64) as i32;
        let discount_after = (after / 64) as i32;

        let cost = *costs.at(x, y) as i32 + discount_before - discount_after;
        costs.set(x, y, cost.clamp(0, 255) as u8);
    }

    after
}

/// Periodic decay pass: every tile loses [`DECAY_STEP`] stress, restoring
/// cost as thresholds are crossed downwards.
pub fn decay(stress: &mut StressMap, costs: &mut CostMap) {
    for y in 0..stress.height() {
        for x in 0..stress.width() {
            adjust_stress(x, y, stress, costs, DECAY_STEP);
        }
    }
}
