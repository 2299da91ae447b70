//! Tile classification for the town map.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// What occupies a world tile.
///
/// `Temporary`, `Any` and `Keep` never appear in a finished world map; they
/// only exist inside the generation engine (provisional flood fills, pattern
/// wildcards and patch no-write markers).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Grass,
    Street,
    Building,
    BuildingEntrance,
    Tree,
    Water,
    /// Provisional fill marker used while a flood fill awaits commit/revert.
    Temporary,
    /// Pattern wildcard: matches any world tile.
    Any,
    /// Patch marker: leave the world tile unchanged.
    Keep,
}

impl TileKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TileKind::Grass => "Grass",
            TileKind::Street => "Street",
            TileKind::Building => "Building",
            TileKind::BuildingEntrance => "Building entrance",
            TileKind::Tree => "Tree",
            TileKind::Water => "Water",
            TileKind::Temporary => "Temporary",
            TileKind::Any => "Any",
            TileKind::Keep => "Keep",
        }
    }
}

/// The world tile grid.
pub type WorldMap = Grid<TileKind>;

/// Per-tile base traversal cost.
pub type CostMap = Grid<u8>;

/// Base traversal cost of a tile kind.
///
/// Buildings and trees cost 0 because they are blocked outright by the
/// traversability rule; the value is never consulted.
pub fn base_cost_for(kind: TileKind, rng: &mut impl Rng) -> u8 {
    match kind {
        TileKind::Grass => rng.gen_range(14..=16),
        TileKind::Street => 10,
        TileKind::BuildingEntrance => 12,
        TileKind::Water => 100,
        TileKind::Building | TileKind::Tree => 0,
        _ => 0,
    }
}

/// Recompute the whole cost map from the world map.
pub fn derive_cost_map(world: &WorldMap, rng: &mut impl Rng) -> CostMap {
    let mut costs = CostMap::new(world.width(), world.height(), 0);

    for y in 0..world.height() {
        for x in 0..world.width() {
            costs.set(x, y, base_cost_for(*world.at(x, y), rng));
        }
    }

    costs
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fixed_base_costs() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(base_cost_for(TileKind::Street, &mut rng), 10);
        assert_eq!(base_cost_for(TileKind::BuildingEntrance, &mut rng), 12);
        assert_eq!(base_cost_for(TileKind::Water, &mut rng), 100);
        assert_eq!(base_cost_for(TileKind::Building, &mut rng), 0);
        assert_eq!(base_cost_for(TileKind::Tree, &mut rng), 0);
    }

    #[test]
    fn grass_cost_stays_in_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        for _ in 0..100 {
            let cost = base_cost_for(TileKind::Grass, &mut rng);
            assert!((14..=16).contains(&cost));
        }
    }
}
