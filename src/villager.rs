//! Villagers walking entrance to entrance, wearing down the grass.
//!
//! A villager cycles through four states: waiting for a path, enqueued for
//! the pathfinding workers, holding a freshly computed path, and moving.
//! Movement is continuous in pixel space; tile-level effects (stress, paving)
//! fire once per tile arrival.

use rand::Rng;

use crate::desire::{self, StressMap};
use crate::pathfinding::{octile_heuristic, Pathfinder, DIAGONAL_SCALE, ORTHOGONAL_SCALE};
use crate::tile::{base_cost_for, CostMap, TileKind, WorldMap};
use crate::update_rect::UpdateRect;

/// 2D position in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;

        (dx * dx + dy * dy).sqrt()
    }

    pub fn normalized(self) -> Self {
        let length = (self.x * self.x + self.y * self.y).sqrt();

        if length == 0.0 {
            return Self::default();
        }

        Self {
            x: self.x / length,
            y: self.y / length,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VillagerState {
    /// No path and not yet handed to the workers.
    #[default]
    AwaitingPath,
    /// Sitting in the pathfinding queue.
    EnqueuedForPath,
    /// Path assigned but movement not yet started.
    PathProvided,
    /// Walking the current path.
    Moving,
}

#[derive(Clone, Debug, Default)]
pub struct Villager {
    pub position: Vec2,
    pub movement_pixels_per_sec: f32,
    pub color: [u8; 3],

    state: VillagerState,

    path: Vec<(usize, usize)>,
    current_path_index: usize,

    segment_start: Vec2,
    segment_target: Vec2,
    segment_direction: Vec2,
    segment_distance: f32,
}

impl Villager {
    pub fn state(&self) -> VillagerState {
        self.state
    }

    pub fn mark_enqueued(&mut self) {
        self.state = VillagerState::EnqueuedForPath;
    }

    /// Hand over a path computed by a worker.
    pub fn provide_path(&mut self, path: Vec<(usize, usize)>) {
        self.path = path;
        self.current_path_index = 0;
        self.state = VillagerState::PathProvided;
    }

    pub fn tick(
        &mut self,
        world: &mut WorldMap,
        update_rect: &mut UpdateRect,
        costs: &mut CostMap,
        stress: &mut StressMap,
        pave_paths: bool,
        tile_width_pixels: i32,
        tile_height_pixels: i32,
        rng: &mut impl Rng,
        delta: f32,
    ) {
        match self.state {
            VillagerState::AwaitingPath | VillagerState::EnqueuedForPath => {}
            VillagerState::PathProvided => {
                if self.path.len() < 2 {
                    // No route between the chosen entrances. The villager
                    // stays put; there is no retry.
                    return;
                }

                // Spawn at the first path tile
                self.current_path_index = 0;

                let (start_x, start_y) = self.path[0];

                self.move_onto_tile(
                    start_x,
                    start_y,
                    world,
                    update_rect,
                    costs,
                    stress,
                    pave_paths,
                    rng,
                );

                self.position = tile_to_pixels(start_x, start_y, tile_width_pixels, tile_height_pixels);

                self.begin_segment(tile_width_pixels, tile_height_pixels);

                self.state = VillagerState::Moving;
            }
            VillagerState::Moving => {
                self.position.x += self.segment_direction.x * self.movement_pixels_per_sec * delta;
                self.position.y += self.segment_direction.y * self.movement_pixels_per_sec * delta;

                if self.position.distance(self.segment_start) >= self.segment_distance {
                    // Next tile reached; snap to its exact position
                    self.position = self.segment_target;

                    self.current_path_index += 1;

                    let (reached_x, reached_y) = self.path[self.current_path_index];

                    self.move_onto_tile(
                        reached_x,
                        reached_y,
                        world,
                        update_rect,
                        costs,
                        stress,
                        pave_paths,
                        rng,
                    );

                    if self.path.len() > self.current_path_index + 1 {
                        self.begin_segment(tile_width_pixels, tile_height_pixels);
                    } else {
                        self.path.clear();
                        self.current_path_index = 0;

                        self.state = VillagerState::AwaitingPath;
                    }
                }
            }
        }
    }

    fn begin_segment(&mut self, tile_width_pixels: i32, tile_height_pixels: i32) {
        self.segment_start = self.position;

        let (next_x, next_y) = self.path[self.current_path_index + 1];

        self.segment_target = tile_to_pixels(next_x, next_y, tile_width_pixels, tile_height_pixels);

        self.segment_direction = Vec2::new(
            self.segment_target.x - self.position.x,
            self.segment_target.y - self.position.y,
        )
        .normalized();

        self.segment_distance = self.segment_target.distance(self.position);
    }

    /// Tile arrival: bump the tile's stress and, when it saturates next to
    /// pavement, pave it along with its grass neighbors.
    #[allow(clippy::too_many_arguments)]
    fn move_onto_tile(
        &mut self,
        tile_x: usize,
        tile_y: usize,
        world: &mut WorldMap,
        update_rect: &mut UpdateRect,
        costs: &mut CostMap,
        stress: &mut StressMap,
        pave_paths: bool,
        rng: &mut impl Rng,
    ) {
        if *world.at(tile_x, tile_y) != TileKind::Grass {
            return;
        }

        let new_stress = desire::adjust_stress(tile_x, tile_y, stress, costs, rng.gen_range(2..=6));

        let should_pave = pave_paths && new_stress == 255;

        let mut neighbors: Vec<(usize, usize)> = Vec::with_capacity(8);

        if tile_y > 0 {
            neighbors.push((tile_x, tile_y - 1));

            if tile_x > 0 {
                neighbors.push((tile_x - 1, tile_y - 1));
            }
            if tile_x < world.width() - 1 {
                neighbors.push((tile_x + 1, tile_y - 1));
            }
        }

        if tile_x > 0 {
            neighbors.push((tile_x - 1, tile_y));
        }
        if tile_x < world.width() - 1 {
            neighbors.push((tile_x + 1, tile_y));
        }

        if tile_y < world.height() - 1 {
            neighbors.push((tile_x, tile_y + 1));

            if tile_x > 0 {
                neighbors.push((tile_x - 1, tile_y + 1));
            }
            if tile_x < world.width() - 1 {
                neighbors.push((tile_x + 1, tile_y + 1));
            }
        }

        let mut paved = false;

        if should_pave {
            // Only pave once the trail has met existing pavement
            for &(nx, ny) in &neighbors {
                let neighbor = *world.at(nx, ny);

                if neighbor == TileKind::Street || neighbor == TileKind::BuildingEntrance {
                    pave_tile(tile_x, tile_y, world, update_rect, costs, stress, rng);
                    paved = true;
                    break;
                }
            }
        }

        // Widen the new pavement into the surrounding grass
        if paved {
            for &(nx, ny) in &neighbors {
                if *world.at(nx, ny) == TileKind::Grass {
                    pave_tile(nx, ny, world, update_rect, costs, stress, rng);
                }
            }
        }
    }
}

fn tile_to_pixels(tile_x: usize, tile_y: usize, tile_width_pixels: i32, tile_height_pixels: i32) -> Vec2 {
    Vec2::new(
        (tile_x as i32 * tile_width_pixels) as f32,
        (tile_y as i32 * tile_height_pixels) as f32,
    )
}

/// Turn a single tile into street: base street cost, stress cleared, change
/// recorded in the dirty rectangle.
pub fn pave_tile(
    tile_x: usize,
    tile_y: usize,
    world: &mut WorldMap,
    update_rect: &mut UpdateRect,
    costs: &mut CostMap,
    stress: &mut StressMap,
    rng: &mut impl Rng,
) {
    if *world.at(tile_x, tile_y) == TileKind::Street {
        return;
    }

    world.set(tile_x, tile_y, TileKind::Street);
    costs.set(tile_x, tile_y, base_cost_for(TileKind::Street, rng));
    stress.set(tile_x, tile_y, 0);

    update_rect.add(tile_x, tile_y);
}

/// Wrapped row-major scan for a building entrance from a random start.
fn random_entrance(world: &WorldMap, rng: &mut impl Rng) -> Option<(usize, usize)> {
    let start_x = rng.gen_range(0..world.width());
    let start_y = rng.gen_range(0..world.height());

    world.find(&TileKind::BuildingEntrance, start_x, start_y, true)
}

fn is_blocked(kind: TileKind) -> bool {
    !matches!(
        kind,
        TileKind::Street | TileKind::BuildingEntrance | TileKind::Grass
    )
}

/// Worker-side path computation: pick two distinct random building
/// entrances and run A* between them over street, entrance and grass tiles.
/// Returns an empty path when no route exists or no pair of distinct
/// entrances can be found.
pub fn compute_path(
    world: &WorldMap,
    costs: &CostMap,
    pathfinder: &mut Pathfinder,
    rng: &mut impl Rng,
) -> Vec<(usize, usize)> {
    let Some((spawn_x, spawn_y)) = random_entrance(world, rng) else {
        return Vec::new();
    };

    let mut destination = None;

    for _ in 0..100 {
        match random_entrance(world, rng) {
            Some(candidate) if candidate != (spawn_x, spawn_y) => {
                destination = Some(candidate);
                break;
            }
            _ => {}
        }
    }

    let Some((destination_x, destination_y)) = destination else {
        // A single-entrance town; nowhere to go
        return Vec::new();
    };

    let can_traverse = |from: (usize, usize), to: (usize, usize)| {
        if is_blocked(*world.at(to.0, to.1)) {
            return false;
        }

        if from.0 == to.0 || from.1 == to.1 {
            return true;
        }

        // Diagonal movement needs both corner tiles free
        !is_blocked(*world.at(from.0, to.1)) && !is_blocked(*world.at(to.0, from.1))
    };

    let traversal_cost = |from: (usize, usize), to: (usize, usize)| {
        let diagonal = from.0 != to.0 && from.1 != to.1;

        let factor: i32 = if diagonal { DIAGONAL_SCALE } else { ORTHOGONAL_SCALE };

        factor * *costs.at(to.0, to.1) as i32
    };

    pathfinder.find_path(
        (spawn_x, spawn_y),
        (destination_x, destination_y),
        can_traverse,
        traversal_cost,
        octile_heuristic,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TILE_W: i32 = 6;
    const TILE_H: i32 = 6;

    fn open_world(width: usize, height: usize) -> WorldMap {
        WorldMap::new(width, height, TileKind::Grass)
    }

    fn walking_villager(path: Vec<(usize, usize)>) -> Villager {
        let mut villager = Villager {
            movement_pixels_per_sec: 60.0,
            ..Villager::default()
        };
        villager.provide_path(path);
        villager
    }

    #[test]
    fn spawns_on_first_path_tile_and_walks_to_the_end() {
        let mut world = open_world(8, 8);
        let mut update_rect = UpdateRect::default();
        let mut costs = CostMap::new(8, 8, 15);
        let mut stress = StressMap::new(8, 8, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut villager = walking_villager(vec![(1, 1), (2, 1), (3, 1)]);

        // First tick spawns and starts the first segment
        villager.tick(
            &mut world, &mut update_rect, &mut costs, &mut stress, false, TILE_W, TILE_H,
            &mut rng, 0.0,
        );

        assert_eq!(villager.state(), VillagerState::Moving);
        assert_eq!(villager.position, Vec2::new(6.0, 6.0));

        // One tile is 6 px; at 60 px/s a 0.1 s tick crosses exactly one tile
        villager.tick(
            &mut world, &mut update_rect, &mut costs, &mut stress, false, TILE_W, TILE_H,
            &mut rng, 0.1,
        );

        assert_eq!(villager.position, Vec2::new(12.0, 6.0));
        assert_eq!(villager.state(), VillagerState::Moving);

        villager.tick(
            &mut world, &mut update_rect, &mut costs, &mut stress, false, TILE_W, TILE_H,
            &mut rng, 0.1,
        );

        // Path exhausted; snapped to the final tile and waiting again
        assert_eq!(villager.position, Vec2::new(18.0, 6.0));
        assert_eq!(villager.state(), VillagerState::AwaitingPath);
    }

    #[test]
    fn overshoot_snaps_to_the_tile_corner() {
        let mut world = open_world(8, 8);
        let mut update_rect = UpdateRect::default();
        let mut costs = CostMap::new(8, 8, 15);
        let mut stress = StressMap::new(8, 8, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let mut villager = walking_villager(vec![(0, 0), (1, 1)]);

        villager.tick(
            &mut world, &mut update_rect, &mut costs, &mut stress, false, TILE_W, TILE_H,
            &mut rng, 0.0,
        );

        // Way more than the diagonal distance in one tick
        villager.tick(
            &mut world, &mut update_rect, &mut costs, &mut stress, false, TILE_W, TILE_H,
            &mut rng, 10.0,
        );

        assert_eq!(villager.position, Vec2::new(6.0, 6.0));
    }

    #[test]
    fn short_path_parks_the_villager() {
        let mut world = open_world(4, 4);
        let mut update_rect = UpdateRect::default();
        let mut costs = CostMap::new(4, 4, 15);
        let mut stress = StressMap::new(4, 4, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut villager = walking_villager(Vec::new());

        for _ in 0..5 {
            villager.tick(
                &mut world, &mut update_rect, &mut costs, &mut stress, false, TILE_W, TILE_H,
                &mut rng, 0.1,
            );
        }

        assert_eq!(villager.state(), VillagerState::PathProvided);
    }

    #[test]
    fn saturated_grass_next_to_street_gets_paved_with_its_neighbors() {
        let mut world = open_world(6, 6);
        let mut update_rect = UpdateRect::default();
        let mut costs = CostMap::new(6, 6, 15);
        let mut stress = StressMap::new(6, 6, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        world.set(2, 2, TileKind::Street);

        // One arrival away from saturation
        stress.set(3, 3, 254);

        let mut villager = walking_villager(vec![(3, 3), (4, 3)]);

        villager.tick(
            &mut world, &mut update_rect, &mut costs, &mut stress, true, TILE_W, TILE_H,
            &mut rng, 0.0,
        );

        assert_eq!(*world.at(3, 3), TileKind::Street);
        assert_eq!(*costs.at(3, 3), 10);
        assert_eq!(*stress.at(3, 3), 0);

        // All former grass neighbors paved too
        for (nx, ny) in [
            (2, 3),
            (4, 3),
            (2, 4),
            (3, 4),
            (4, 4),
            (3, 2),
            (4, 2),
        ] {
            assert_eq!(*world.at(nx, ny), TileKind::Street, "neighbor ({nx}, {ny})");
        }

        // The pre-existing street tile is untouched by the widening pass
        assert_eq!(*world.at(2, 2), TileKind::Street);

        assert!(!update_rect.is_empty());
        assert!(update_rect.left <= 2 && update_rect.right >= 4);
        assert!(update_rect.top <= 2 && update_rect.bottom >= 4);
    }

    #[test]
    fn saturated_grass_far_from_pavement_stays_grass() {
        let mut world = open_world(9, 9);
        let mut update_rect = UpdateRect::default();
        let mut costs = CostMap::new(9, 9, 15);
        let mut stress = StressMap::new(9, 9, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        stress.set(4, 4, 254);

        let mut villager = walking_villager(vec![(4, 4), (5, 4)]);

        villager.tick(
            &mut world, &mut update_rect, &mut costs, &mut stress, true, TILE_W, TILE_H,
            &mut rng, 0.0,
        );

        assert_eq!(*world.at(4, 4), TileKind::Grass);
        assert_eq!(*stress.at(4, 4), 255);
        assert!(update_rect.is_empty());
    }

    #[test]
    fn computed_path_connects_two_entrances_over_walkable_tiles() {
        let mut world = open_world(16, 16);

        world.set(2, 2, TileKind::BuildingEntrance);
        world.set(13, 13, TileKind::BuildingEntrance);

        // A building wall with a gap forces a detour
        for y in 0..16 {
            if y != 8 {
                world.set(8, y, TileKind::Building);
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let costs = crate::tile::derive_cost_map(&world, &mut rng);

        let mut pathfinder = Pathfinder::new(16, 16);

        let path = compute_path(&world, &costs, &mut pathfinder, &mut rng);

        assert!(path.len() >= 2);

        let endpoints = [path[0], *path.last().unwrap()];
        assert!(endpoints.contains(&(2, 2)));
        assert!(endpoints.contains(&(13, 13)));

        for &(x, y) in &path {
            assert_ne!(*world.at(x, y), TileKind::Building);
        }

        // The only opening in the wall
        assert!(path.contains(&(8, 8)));
    }

    #[test]
    fn compute_path_with_no_entrances_returns_empty() {
        let world = open_world(8, 8);
        let costs = CostMap::new(8, 8, 15);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut pathfinder = Pathfinder::new(8, 8);

        assert!(compute_path(&world, &costs, &mut pathfinder, &mut rng).is_empty());
    }
}
