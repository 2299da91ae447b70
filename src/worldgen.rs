//! Procedural town generation on top of the Voronoi partition.
//!
//! Streets come first (partition boundaries), then a pattern/patch stamping
//! engine fills the blocks: building estates in four rotations, tree
//! clusters, flood-filled ponds and paved plazas, optional roundabouts.
//! Patterns are match templates (with `Any` wildcards), patches the paired
//! replacements (with `Keep` no-write markers); both are plain tile grids so
//! the whole catalog can be rotated with the grid rotation helpers.

use rand::Rng;

use crate::grid::Grid;
use crate::tile::{TileKind, WorldMap};
use crate::voronoi::VoronoiMap;

pub type Pattern = Grid<TileKind>;
pub type Patch = Grid<TileKind>;

/// Percent rolls are scaled by this factor so fractional per-pattern
/// acceptance rates survive integer arithmetic.
const SCALED_PERCENT_FACTOR: i64 = 1_000;

/// Stamping and fill operations on a world map under construction.
pub struct WorldGen<'a, R: Rng> {
    world: &'a mut WorldMap,
    rng: &'a mut R,
}

impl<'a, R: Rng> WorldGen<'a, R> {
    pub fn new(world: &'a mut WorldMap, rng: &'a mut R) -> Self {
        Self { world, rng }
    }

    fn roll_scaled_percent(&mut self) -> i64 {
        self.rng.gen_range(1..=100 * SCALED_PERCENT_FACTOR)
    }

    /// A tile lies on a street when any of its 8 neighbors belongs to a
    /// different partition cell.
    pub fn place_streets_from_voronoi(&mut self, voronoi: &VoronoiMap) {
        let width = voronoi.width();
        let height = voronoi.height();

        const NEIGHBORS: [(i32, i32); 8] = [
            (-1, -1),
            (-1, 1),
            (-1, 0),
            (1, -1),
            (1, 1),
            (1, 0),
            (0, -1),
            (0, 1),
        ];

        for y in 0..height {
            for x in 0..width {
                let own = *voronoi.at(x, y);

                for (dx, dy) in NEIGHBORS {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;

                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }

                    if *voronoi.at(nx as usize, ny as usize) != own {
                        self.world.set(x, y, TileKind::Street);
                        break;
                    }
                }
            }
        }
    }

    /// Scan row-major from `(start_x, start_y)` for the first window whose
    /// non-`Any` cells all match the world.
    pub fn find_pattern(
        &self,
        pattern: &Pattern,
        start_x: usize,
        start_y: usize,
    ) -> Option<(usize, usize)> {
        if pattern.width() > self.world.width() || pattern.height() > self.world.height() {
            return None;
        }

        for map_y in start_y..=self.world.height() - pattern.height() {
            let row_start = if map_y == start_y { start_x } else { 0 };

            'window: for map_x in row_start..=self.world.width() - pattern.width() {
                for pattern_y in 0..pattern.height() {
                    for pattern_x in 0..pattern.width() {
                        let wanted = *pattern.at(pattern_x, pattern_y);

                        if wanted == TileKind::Any {
                            continue;
                        }

                        if *self.world.at(map_x + pattern_x, map_y + pattern_y) != wanted {
                            continue 'window;
                        }
                    }
                }

                return Some((map_x, map_y));
            }
        }

        None
    }

    /// Stamp `patch` at `(x, y)`, skipping `Keep` cells.
    pub fn apply_patch(&mut self, patch: &Patch, x: usize, y: usize) {
        for patch_y in 0..patch.height() {
            for patch_x in 0..patch.width() {
                let value = *patch.at(patch_x, patch_y);

                if value == TileKind::Keep {
                    continue;
                }

                self.world.set(x + patch_x, y + patch_y, value);
            }
        }
    }

    /// 4-connected flood fill replacing the seed cell's tile kind with
    /// `fill`. Explicit stack, no recursion. Returns the number of cells
    /// replaced.
    pub fn flood_fill(&mut self, x: usize, y: usize, fill: TileKind) -> usize {
        let target = *self.world.at(x, y);

        if target == fill {
            return 0;
        }

        let mut count = 0;
        let mut stack = vec![(x, y)];

        while let Some((cx, cy)) = stack.pop() {
            if *self.world.at(cx, cy) != target {
                continue;
            }

            self.world.set(cx, cy, fill);
            count += 1;

            if cy < self.world.height() - 1 {
                stack.push((cx, cy + 1));
            }
            if cy > 0 {
                stack.push((cx, cy - 1));
            }
            if cx < self.world.width() - 1 {
                stack.push((cx + 1, cy));
            }
            if cx > 0 {
                stack.push((cx - 1, cy));
            }
        }

        count
    }

    /// Flood-fill ponds onto random grass until the water budget is spent.
    ///
    /// Each of up to 100 attempts fills provisionally and commits only when
    /// the new pond stays under `area_size_limit_percent` of the map and the
    /// cumulative water under `fill_limit_percent`; otherwise the fill is
    /// reverted cell for cell. Stops early once no grass can be found.
    pub fn place_ponds(&mut self, fill_limit_percent: f32, area_size_limit_percent: f32) {
        let total_tiles = self.world.width() * self.world.height();

        let mut water_tiles = 0usize;

        for _ in 0..100 {
            let start_x = self.rng.gen_range(0..self.world.width());
            let start_y = self.rng.gen_range(0..self.world.height());

            let Some((x, y)) = self.world.find(&TileKind::Grass, start_x, start_y, true)
            else {
                break;
            };

            let filled = self.flood_fill(x, y, TileKind::Water);

            let area_percent = filled as f32 * 100.0 / total_tiles as f32;
            let fill_percent = (water_tiles + filled) as f32 * 100.0 / total_tiles as f32;

            if area_percent <= area_size_limit_percent && fill_percent <= fill_limit_percent {
                water_tiles += filled;
                continue;
            }

            self.flood_fill(x, y, TileKind::Grass);
        }
    }

    /// Like [`place_ponds`](Self::place_ponds) but via the `Temporary`
    /// sentinel: a committed area is re-filled to `Street`, a rejected one
    /// back to `Grass`, so partial plazas never leak into the map.
    pub fn place_full_paved_areas(
        &mut self,
        fill_limit_percent: f32,
        area_size_limit_percent: f32,
    ) {
        let total_tiles = self.world.width() * self.world.height();

        let mut paved_tiles = 0usize;

        for _ in 0..100 {
            let start_x = self.rng.gen_range(0..self.world.width());
            let start_y = self.rng.gen_range(0..self.world.height());

            let Some((x, y)) = self.world.find(&TileKind::Grass, start_x, start_y, true)
            else {
                break;
            };

            let filled = self.flood_fill(x, y, TileKind::Temporary);

            let area_percent = filled as f32 * 100.0 / total_tiles as f32;
            let fill_percent = (paved_tiles + filled) as f32 * 100.0 / total_tiles as f32;

            if area_percent <= area_size_limit_percent && fill_percent <= fill_limit_percent {
                self.flood_fill(x, y, TileKind::Street);
                paved_tiles += filled;
                continue;
            }

            self.flood_fill(x, y, TileKind::Grass);
        }
    }

    pub fn replace_all(&mut self, replace_what: TileKind, replace_with: TileKind) {
        for y in 0..self.world.height() {
            for x in 0..self.world.width() {
                if *self.world.at(x, y) == replace_what {
                    self.world.set(x, y, replace_with);
                }
            }
        }
    }

    /// Repeatedly find `pattern` and, with `scaled_fill_rate` probability,
    /// stamp a uniformly-chosen patch variant. The scan resumes one pattern
    /// width past each match so accepted and rejected sites are not
    /// revisited.
    fn stamp_all(&mut self, pattern: &Pattern, variants: &[Patch], scaled_fill_rate: i64) {
        let mut find_start_x = 0;
        let mut find_start_y = 0;

        while let Some((x, y)) = self.find_pattern(pattern, find_start_x, find_start_y) {
            if self.roll_scaled_percent() <= scaled_fill_rate {
                let patch = &variants[self.rng.gen_range(0..variants.len())];

                self.apply_patch(patch, x, y);
            }

            find_start_x = x + pattern.width();
            find_start_y = y;
        }
    }

    /// Place building estates over the street grid.
    ///
    /// The catalog holds one pattern per estate footprint (building width
    /// 6..=10 plus a 1-tile yard each side, height 4..=12 plus yard and a
    /// 2-row street band) and, per footprint, patch variants: the full
    /// rectangle, corners removed, and four L-shapes, each with a randomized
    /// entrance path (narrow, wide or full width) leading to the street.
    /// The catalog is applied largest-first, then rotated 90° clockwise and
    /// reapplied, four passes in total to cover all street orientations.
    pub fn place_buildings(&mut self, fill_rate: i64) {
        const MIN_BUILDING_WIDTH: usize = 6;
        const MAX_BUILDING_WIDTH: usize = 10;
        const MIN_BUILDING_HEIGHT: usize = 4;
        const MAX_BUILDING_HEIGHT: usize = 12;

        const MIN_ESTATE_WIDTH: usize = MIN_BUILDING_WIDTH + 2;
        const MAX_ESTATE_WIDTH: usize = MAX_BUILDING_WIDTH + 2;
        const MIN_ESTATE_HEIGHT: usize = MIN_BUILDING_HEIGHT + 5;
        const MAX_ESTATE_HEIGHT: usize = MAX_BUILDING_HEIGHT + 5;

        let mut patterns: Vec<Pattern> = Vec::new();
        let mut patches: Vec<Vec<Patch>> = Vec::new();

        for estate_height in MIN_ESTATE_HEIGHT..=MAX_ESTATE_HEIGHT {
            for estate_width in MIN_ESTATE_WIDTH..=MAX_ESTATE_WIDTH {
                patterns.push(estate_pattern(estate_width, estate_height));
                patches.push(self.estate_patch_variants(estate_width, estate_height));
            }
        }

        for _pass in 0..4 {
            for index in (0..patterns.len()).rev() {
                let scaled_fill_rate = fill_rate * SCALED_PERCENT_FACTOR
                    / patterns.len() as i64
                    * SCALED_PERCENT_FACTOR;

                // Split borrows: stamp_all takes &mut self, the catalog is
                // moved out and back to keep the borrow checker happy.
                let pattern = std::mem::replace(&mut patterns[index], Pattern::new(1, 1, TileKind::Any));
                let variants = std::mem::take(&mut patches[index]);

                self.stamp_all(&pattern, &variants, scaled_fill_rate);

                patterns[index] = pattern;
                patches[index] = variants;
            }

            for pattern in &mut patterns {
                *pattern = pattern.rotated_90_cw();
            }

            for variants in &mut patches {
                for patch in variants.iter_mut() {
                    *patch = patch.rotated_90_cw();
                }
            }
        }
    }

    /// All patch variants for one estate footprint.
    fn estate_patch_variants(&mut self, estate_width: usize, estate_height: usize) -> Vec<Patch> {
        let mut variants = Vec::new();

        let building_width = estate_width - 2;

        for building_height in 4..=estate_height - 5 {
            let mut patch = Patch::new(estate_width, estate_height, TileKind::Keep);

            for y in 1..=building_height {
                for x in 1..=building_width {
                    patch.set(x, y, TileKind::Building);
                }
            }

            // Entrance style is decided once per catalog entry
            let wide_entrance = self.roll_scaled_percent() <= 50 * SCALED_PERCENT_FACTOR;
            let full_width_entrance =
                wide_entrance && self.roll_scaled_percent() <= 50 * SCALED_PERCENT_FACTOR;

            for y in 1 + building_height..estate_height - 3 {
                for x in 1..=building_width {
                    if x == building_width / 2 {
                        patch.set(x, y, TileKind::BuildingEntrance);
                    } else if x == building_width / 2 + 1 {
                        if wide_entrance {
                            patch.set(x, y, TileKind::BuildingEntrance);
                        }
                    } else if full_width_entrance {
                        patch.set(x, y, TileKind::BuildingEntrance);
                    }
                }
            }

            variants.push(patch.clone());

            if building_width >= 5 && building_height >= 5 {
                // Corners removed
                {
                    let mut variant = patch.clone();

                    variant.set(1, 1, TileKind::Keep);
                    variant.set(1, building_height, TileKind::Keep);
                    variant.set(building_width, 1, TileKind::Keep);
                    variant.set(building_width, building_height, TileKind::Keep);

                    variants.push(variant);
                }

                // L shape, top-left quadrant cut out
                {
                    let mut variant = patch.clone();

                    for y in 1..=building_height / 2 {
                        for x in 1..=building_width / 2 {
                            variant.set(x, y, TileKind::Keep);
                        }
                    }

                    variants.push(variant);
                }

                // L shape, top-right quadrant cut out
                {
                    let mut variant = patch.clone();

                    for y in 1..=building_height / 2 {
                        for x in building_width / 2..=building_width {
                            variant.set(x, y, TileKind::Keep);
                        }
                    }

                    variants.push(variant);
                }

                // L shape, bottom-left cut out; the entrance path grows
                // upward into the freed space
                {
                    let mut variant = patch.clone();

                    for y in (building_height / 2 + 1..=building_height).rev() {
                        for x in 1..=building_width / 2 {
                            if *variant.at(x, y + 1) == TileKind::BuildingEntrance {
                                variant.set(x, y, TileKind::BuildingEntrance);
                            } else {
                                variant.set(x, y, TileKind::Keep);
                            }
                        }
                    }

                    variants.push(variant);
                }

                // L shape, bottom-right cut out
                {
                    let mut variant = patch.clone();

                    for y in (building_height / 2 + 1..=building_height).rev() {
                        for x in building_width / 2..=building_width {
                            if *variant.at(x, y + 1) == TileKind::BuildingEntrance {
                                variant.set(x, y, TileKind::BuildingEntrance);
                            } else {
                                variant.set(x, y, TileKind::Keep);
                            }
                        }
                    }

                    variants.push(variant);
                }
            }
        }

        variants
    }

    /// Scatter large tree clusters over open grass.
    pub fn place_large_trees(&mut self, fill_rate: i64) {
        use TileKind::{Keep as K, Tree as T};

        let pattern = Pattern::new(9, 9, TileKind::Grass);

        let patch = Patch::from_rows(&[
            &[K, K, K, K, K, K, K, K, K],
            &[K, K, K, T, T, T, K, K, K],
            &[K, K, T, T, T, T, T, K, K],
            &[K, T, T, T, T, T, T, T, K],
            &[K, T, T, T, T, T, T, T, K],
            &[K, T, T, T, T, T, T, T, K],
            &[K, K, T, T, T, T, T, K, K],
            &[K, K, K, T, T, T, K, K, K],
            &[K, K, K, K, K, K, K, K, K],
        ]);

        self.stamp_all(&pattern, &[patch], fill_rate * SCALED_PERCENT_FACTOR);
    }

    /// Scatter small tree clusters over open grass.
    pub fn place_small_trees(&mut self, fill_rate: i64) {
        use TileKind::{Keep as K, Tree as T};

        let pattern = Pattern::new(6, 6, TileKind::Grass);

        let patch = Patch::from_rows(&[
            &[K, K, K, K, K, K],
            &[K, K, T, T, K, K],
            &[K, T, T, T, T, K],
            &[K, T, T, T, T, K],
            &[K, K, T, T, K, K],
            &[K, K, K, K, K, K],
        ]);

        self.stamp_all(&pattern, &[patch], fill_rate * SCALED_PERCENT_FACTOR);
    }

    /// Turn plus-shaped street crossings into small roundabouts by rounding
    /// the inner corners and cutting a grass island into the center.
    pub fn place_roundabouts_a(&mut self) {
        use TileKind::{Grass as G, Street as S};

        let crossing = Pattern::from_rows(&[
            &[G, G, G, S, S, G, G, G],
            &[G, G, G, S, S, G, G, G],
            &[G, G, G, S, S, G, G, G],
            &[S, S, S, S, S, S, S, S],
            &[S, S, S, S, S, S, S, S],
            &[G, G, G, S, S, G, G, G],
            &[G, G, G, S, S, G, G, G],
            &[G, G, G, S, S, G, G, G],
        ]);

        let mut find_start_x = 0;
        let mut find_start_y = 0;

        while let Some((x, y)) = self.find_pattern(&crossing, find_start_x, find_start_y) {
            // Rounded corners
            for (dx, dy) in [
                (2, 1),
                (1, 2),
                (2, 2),
                (5, 1),
                (6, 2),
                (5, 2),
                (1, 5),
                (2, 6),
                (2, 5),
                (5, 5),
                (6, 5),
                (5, 6),
            ] {
                self.world.set(x + dx, y + dy, TileKind::Street);
            }

            // Center island
            for (dx, dy) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
                self.world.set(x + dx, y + dy, TileKind::Grass);
            }

            find_start_x = x + crossing.width();
            find_start_y = y;
        }
    }

    /// Ring solid street blocks with street and cut a grass island into the
    /// middle, producing roundabouts at wide crossings.
    pub fn place_roundabouts_b(&mut self) {
        let block_tall = Pattern::new(4, 5, TileKind::Street);
        let block_wide = Pattern::new(5, 4, TileKind::Street);

        for block in [&block_tall, &block_wide] {
            let mut find_start_x = 0;
            let mut find_start_y = 0;

            while let Some((x, y)) = self.find_pattern(block, find_start_x, find_start_y) {
                // The stamp reaches one tile beyond the block on every
                // side; blocks touching the map border are left alone.
                if x > 0
                    && y > 0
                    && x + 4 < self.world.width()
                    && y + 4 < self.world.height()
                {
                    for dx in 0..4 {
                        self.world.set(x + dx, y - 1, TileKind::Street);
                        self.world.set(x + dx, y + 4, TileKind::Street);
                    }

                    for dy in 0..4 {
                        self.world.set(x - 1, y + dy, TileKind::Street);
                        self.world.set(x + 4, y + dy, TileKind::Street);
                    }

                    for (dx, dy) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
                        self.world.set(x + dx, y + dy, TileKind::Grass);
                    }
                }

                find_start_x = x + 8;
                find_start_y = y;
            }
        }
    }
}

/// Match template for one estate footprint: all grass except a 2-row street
/// band near the bottom, with wildcards in the 2-column margins so estates
/// can sit side by side along the same street.
fn estate_pattern(estate_width: usize, estate_height: usize) -> Pattern {
    let mut pattern = Pattern::new(estate_width, estate_height, TileKind::Grass);

    for x in 0..estate_width {
        if x < 2 || x > estate_width - 3 {
            pattern.set(x, estate_height - 4, TileKind::Any);
            pattern.set(x, estate_height - 3, TileKind::Any);
            pattern.set(x, estate_height - 2, TileKind::Any);
            pattern.set(x, estate_height - 1, TileKind::Any);
        } else {
            pattern.set(x, estate_height - 3, TileKind::Street);
            pattern.set(x, estate_height - 2, TileKind::Street);
        }
    }

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grass_world(width: usize, height: usize) -> WorldMap {
        WorldMap::new(width, height, TileKind::Grass)
    }

    #[test]
    fn streets_appear_exactly_on_partition_boundaries() {
        let mut voronoi = VoronoiMap::new(6, 6, 0);
        for y in 0..6 {
            for x in 3..6 {
                voronoi.set(x, y, 1);
            }
        }

        let mut world = grass_world(6, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        WorldGen::new(&mut world, &mut rng).place_streets_from_voronoi(&voronoi);

        for y in 0..6 {
            // Columns 2 and 3 touch the boundary, the rest do not
            assert_eq!(*world.at(2, y), TileKind::Street);
            assert_eq!(*world.at(3, y), TileKind::Street);
            assert_eq!(*world.at(0, y), TileKind::Grass);
            assert_eq!(*world.at(5, y), TileKind::Grass);
        }
    }

    #[test]
    fn pattern_wildcards_match_anything() {
        let mut world = grass_world(5, 5);
        world.set(1, 1, TileKind::Water);

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let gen = WorldGen::new(&mut world, &mut rng);

        use TileKind::{Any as A, Grass as G};

        let with_wildcard = Pattern::from_rows(&[&[G, G], &[G, A]]);
        assert_eq!(gen.find_pattern(&with_wildcard, 0, 0), Some((0, 0)));

        let strict = Pattern::from_rows(&[&[G, G], &[G, G]]);
        assert_eq!(gen.find_pattern(&strict, 0, 0), Some((1, 0)));
    }

    #[test]
    fn patch_keep_cells_leave_world_untouched() {
        let mut world = grass_world(4, 4);
        world.set(1, 1, TileKind::Water);
        world.set(2, 1, TileKind::Water);

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        use TileKind::{Keep as K, Street as S};

        let patch = Patch::from_rows(&[&[S, K], &[K, S]]);
        gen.apply_patch(&patch, 1, 1);

        assert_eq!(*world.at(1, 1), TileKind::Street);
        assert_eq!(*world.at(2, 1), TileKind::Water); // Keep
        assert_eq!(*world.at(1, 2), TileKind::Grass); // Keep
        assert_eq!(*world.at(2, 2), TileKind::Street);
    }

    #[test]
    fn flood_fill_is_4_connected_and_counts_cells() {
        let mut world = grass_world(5, 5);

        // Diagonal water barrier; the fill must not leak across it
        for i in 0..5 {
            world.set(i, i, TileKind::Water);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        let filled = gen.flood_fill(4, 0, TileKind::Street);

        assert_eq!(filled, 10); // Upper triangle minus the diagonal
        assert_eq!(*world.at(0, 4), TileKind::Grass);
        assert_eq!(*world.at(4, 0), TileKind::Street);
    }

    #[test]
    fn reverted_flood_fill_restores_the_exact_world() {
        let mut world = grass_world(8, 8);
        world.set(3, 3, TileKind::Street);
        world.set(4, 6, TileKind::Water);

        let before = world.clone();

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        let filled = gen.flood_fill(0, 0, TileKind::Temporary);
        assert!(filled > 0);

        let reverted = gen.flood_fill(0, 0, TileKind::Grass);
        assert_eq!(filled, reverted);

        assert_eq!(world, before);
    }

    #[test]
    fn ponds_respect_the_area_budget() {
        let mut world = grass_world(32, 32);

        // A street frame splits off a small enclosed pocket
        for x in 0..32 {
            world.set(x, 4, TileKind::Street);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        gen.place_ponds(4.0, 5.0);

        let water = world.iter().filter(|(_, _, &t)| t == TileKind::Water).count();
        let total = 32 * 32;

        // Cumulative cap of 4%
        assert!(water as f32 * 100.0 / total as f32 <= 4.0);
    }

    #[test]
    fn paved_areas_never_leave_temporary_tiles() {
        let mut world = grass_world(24, 24);
        for x in 0..24 {
            world.set(x, 11, TileKind::Street);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        gen.place_full_paved_areas(2.0, 0.5);

        assert!(world.iter().all(|(_, _, &t)| t != TileKind::Temporary));
    }

    #[test]
    fn buildings_come_with_entrances_on_street_adjacent_estates() {
        let mut world = grass_world(64, 64);

        // A horizontal street so estates have something to attach to
        for x in 0..64 {
            world.set(x, 30, TileKind::Street);
            world.set(x, 31, TileKind::Street);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        gen.place_buildings(100);

        let buildings = world
            .iter()
            .filter(|(_, _, &t)| t == TileKind::Building)
            .count();
        let entrances = world
            .iter()
            .filter(|(_, _, &t)| t == TileKind::BuildingEntrance)
            .count();

        assert!(buildings > 0, "no buildings were placed");
        assert!(entrances > 0, "buildings must come with entrances");
    }

    #[test]
    fn replace_all_swaps_every_occurrence() {
        let mut world = grass_world(8, 8);
        world.set(2, 2, TileKind::Street);
        world.set(5, 7, TileKind::Street);

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        gen.replace_all(TileKind::Street, TileKind::Grass);

        assert!(world.iter().all(|(_, _, &t)| t == TileKind::Grass));
    }

    #[test]
    fn tree_clusters_only_grow_on_open_grass() {
        let mut world = grass_world(40, 40);
        for x in 0..40 {
            world.set(x, 20, TileKind::Street);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut gen = WorldGen::new(&mut world, &mut rng);

        gen.place_large_trees(100);
        gen.place_small_trees(100);

        // The street row survives untouched
        for x in 0..40 {
            assert_eq!(*world.at(x, 20), TileKind::Street);
        }

        assert!(world.iter().any(|(_, _, &t)| t == TileKind::Tree));
    }
}
