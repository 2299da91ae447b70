//! Simulation driver: town generation, villager bookkeeping and the
//! pathfinding worker pool.
//!
//! The three tile maps live behind one `RwLock`; workers take read locks to
//! compute paths while the main loop takes the write lock once per tick to
//! move villagers and apply stress. Path requests travel through a blocking
//! queue of villager indices, finished paths come back over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::desire::{self, StressMap};
use crate::pathfinding::Pathfinder;
use crate::queue::Queue;
use crate::tile::{derive_cost_map, CostMap, TileKind, WorldMap};
use crate::update_rect::UpdateRect;
use crate::villager::{self, Villager, VillagerState};
use crate::voronoi::{
    self, assign_cells, generate_centroids, minkowski_distance, CentroidSamplingError,
    VoronoiMap,
};
use crate::worldgen::WorldGen;

pub const TILE_WIDTH_PIXELS: i32 = 6;
pub const TILE_HEIGHT_PIXELS: i32 = 6;

/// Stress decay passes per second.
pub const DECAY_RATE_PER_SEC: f32 = 0.25;

/// How long a worker waits on the queue before re-checking the stop flag.
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub screen_width_pixels: i32,
    pub screen_height_pixels: i32,

    pub target_fps: i32,

    pub remove_streets_after_generation: bool,

    pub villager_count: usize,

    pub voronoi_centroid_count_per_level: usize,
    pub voronoi_subdivide_probability_level1: i32,
    pub voronoi_subdivide_probability_level2: i32,
    pub voronoi_level0_minkowski_p: f32,
    pub voronoi_level1_minkowski_p: f32,
    pub voronoi_level2_minkowski_p: f32,

    pub place_roundabouts: bool,
    pub place_ponds: bool,
    pub place_full_paved_areas: bool,
    pub place_large_trees: bool,
    pub place_small_trees: bool,

    pub pathfinding_thread_count: usize,

    pub pave_desire_paths: bool,
    pub decay_desire_paths: bool,

    /// World seed; `None` draws one from the system RNG.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            screen_width_pixels: 1920,
            screen_height_pixels: 1080,
            target_fps: 60,
            remove_streets_after_generation: false,
            villager_count: 1000,
            voronoi_centroid_count_per_level: 6,
            voronoi_subdivide_probability_level1: 90,
            voronoi_subdivide_probability_level2: 80,
            // Higher exponents give the long top-level streets more curve;
            // p=1 keeps the smallest blocks rectangular
            voronoi_level0_minkowski_p: 3.0,
            voronoi_level1_minkowski_p: 3.0,
            voronoi_level2_minkowski_p: 1.0,
            place_roundabouts: false,
            place_ponds: true,
            place_full_paved_areas: true,
            place_large_trees: true,
            place_small_trees: true,
            pathfinding_thread_count: 4,
            pave_desire_paths: true,
            decay_desire_paths: true,
            seed: None,
        }
    }
}

/// The shared tile maps. World and cost are read by the pathfinding workers,
/// all three are written by the main loop.
pub struct Maps {
    pub world: WorldMap,
    pub costs: CostMap,
    pub stress: StressMap,
}

type PathResult = (usize, Vec<(usize, usize)>);

pub struct Simulation {
    config: SimConfig,

    world_width_tiles: usize,
    world_height_tiles: usize,

    seed: u64,

    rng: ChaCha8Rng,

    voronoi: VoronoiMap,
    centroid_count: usize,

    maps: Arc<RwLock<Maps>>,

    villagers: Vec<Villager>,

    path_queue: Arc<Queue<usize>>,
    path_results: mpsc::Receiver<PathResult>,

    stop_workers: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,

    map_update_rect: UpdateRect,

    decay_accumulator: f32,
}

impl Simulation {
    /// Generate the town and spin up the worker pool. Every villager starts
    /// enqueued for a path.
    pub fn new(config: SimConfig) -> Result<Self, CentroidSamplingError> {
        let seed = config.seed.unwrap_or_else(rand::random);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        // The world is twice the screen in both dimensions
        let world_width_tiles = (config.screen_width_pixels * 2 / TILE_WIDTH_PIXELS) as usize;
        let world_height_tiles = (config.screen_height_pixels * 2 / TILE_HEIGHT_PIXELS) as usize;

        let (voronoi, centroid_count) = build_voronoi(&config, world_width_tiles, world_height_tiles, &mut rng)?;

        let mut world = WorldMap::new(world_width_tiles, world_height_tiles, TileKind::Grass);

        {
            let mut worldgen = WorldGen::new(&mut world, &mut rng);

            worldgen.place_streets_from_voronoi(&voronoi);

            if config.place_roundabouts {
                worldgen.place_roundabouts_a();
                worldgen.place_roundabouts_b();
            }

            if config.place_ponds {
                worldgen.place_ponds(4.0, 5.0);
            }

            worldgen.place_buildings(100);

            if config.place_full_paved_areas {
                worldgen.place_full_paved_areas(2.0, 0.5);
            }

            if config.place_large_trees {
                worldgen.place_large_trees(5);
            }

            if config.place_small_trees {
                worldgen.place_small_trees(10);
            }

            if config.remove_streets_after_generation {
                worldgen.replace_all(TileKind::Street, TileKind::Grass);
            }
        }

        let costs = derive_cost_map(&world, &mut rng);
        let stress = StressMap::new(world_width_tiles, world_height_tiles, 0);

        let maps = Arc::new(RwLock::new(Maps {
            world,
            costs,
            stress,
        }));

        let path_queue = Arc::new(Queue::new());

        let mut villagers = Vec::with_capacity(config.villager_count);

        for index in 0..config.villager_count {
            let mut villager = Villager::default();

            villager.color = [
                rng.gen_range(8..=128),
                rng.gen_range(8..=128),
                rng.gen_range(8..=128),
            ];
            villager.movement_pixels_per_sec = rng.gen_range(15..=20) as f32 * 4.0;

            villager.mark_enqueued();
            path_queue.push(index);

            villagers.push(villager);
        }

        let stop_workers = Arc::new(AtomicBool::new(false));

        let (result_sender, path_results) = mpsc::channel();

        let mut workers = Vec::with_capacity(config.pathfinding_thread_count);

        for _ in 0..config.pathfinding_thread_count {
            workers.push(spawn_worker(
                Arc::clone(&maps),
                Arc::clone(&path_queue),
                Arc::clone(&stop_workers),
                result_sender.clone(),
                world_width_tiles,
                world_height_tiles,
                rng.gen(),
            ));
        }

        Ok(Self {
            config,
            world_width_tiles,
            world_height_tiles,
            seed,
            rng,
            voronoi,
            centroid_count,
            maps,
            villagers,
            path_queue,
            path_results,
            stop_workers,
            workers,
            map_update_rect: UpdateRect::default(),
            decay_accumulator: 0.0,
        })
    }

    /// Advance the simulation by `delta` seconds: deliver finished paths,
    /// move every villager, re-enqueue the ones that arrived, and run the
    /// periodic stress decay.
    pub fn tick(&mut self, delta: f32) {
        while let Ok((index, path)) = self.path_results.try_recv() {
            self.villagers[index].provide_path(path);
        }

        {
            let mut maps = self.maps.write().expect("maps lock poisoned");

            let Maps {
                world,
                costs,
                stress,
            } = &mut *maps;

            for (index, villager) in self.villagers.iter_mut().enumerate() {
                villager.tick(
                    world,
                    &mut self.map_update_rect,
                    costs,
                    stress,
                    self.config.pave_desire_paths,
                    TILE_WIDTH_PIXELS,
                    TILE_HEIGHT_PIXELS,
                    &mut self.rng,
                    delta,
                );

                if villager.state() == VillagerState::AwaitingPath {
                    villager.mark_enqueued();
                    self.path_queue.push(index);
                }
            }

            self.decay_accumulator += delta;

            if self.decay_accumulator >= 1.0 / DECAY_RATE_PER_SEC {
                if self.config.decay_desire_paths {
                    desire::decay(stress, costs);
                }

                self.decay_accumulator = 0.0;
            }
        }
    }

    /// The area of the world changed by paving since the last call, in tile
    /// coordinates. Resets the rectangle.
    pub fn take_update_rect(&mut self) -> UpdateRect {
        std::mem::take(&mut self.map_update_rect)
    }

    pub fn maps(&self) -> &Arc<RwLock<Maps>> {
        &self.maps
    }

    pub fn voronoi(&self) -> &VoronoiMap {
        &self.voronoi
    }

    pub fn villagers(&self) -> &[Villager] {
        &self.villagers
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn centroid_count(&self) -> usize {
        self.centroid_count
    }

    pub fn world_width_tiles(&self) -> usize {
        self.world_width_tiles
    }

    pub fn world_height_tiles(&self) -> usize {
        self.world_height_tiles
    }

    /// Stop and join the worker pool. Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        self.stop_workers.store(true, Ordering::SeqCst);

        for worker in self.workers.drain(..) {
            // A panicked worker has nothing left to clean up
            let _ = worker.join();
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Three-level hierarchical partition: one coarse level, then two rounds of
/// probabilistic per-cell subdivision, each level with its own Minkowski
/// exponent. Returns the map and the final number of partition cells.
fn build_voronoi(
    config: &SimConfig,
    width: usize,
    height: usize,
    rng: &mut ChaCha8Rng,
) -> Result<(VoronoiMap, usize), CentroidSamplingError> {
    let count = config.voronoi_centroid_count_per_level;

    let mut centroids = generate_centroids(
        0,
        0,
        width as i32,
        height as i32,
        count,
        rng,
        |_, _| true,
    )?;

    let level0_p = config.voronoi_level0_minkowski_p;

    let mut map = assign_cells(width, height, &centroids, |ax, ay, bx, by| {
        minkowski_distance(ax, ay, bx, by, level0_p)
    });

    let level1_p = config.voronoi_level1_minkowski_p;

    for parent_index in 0..count {
        if rng.gen_range(1..=100) <= config.voronoi_subdivide_probability_level1 {
            voronoi::subdivide(&mut centroids, parent_index, &mut map, count, rng, |ax, ay, bx, by| {
                minkowski_distance(ax, ay, bx, by, level1_p)
            })?;
        }
    }

    let level2_p = config.voronoi_level2_minkowski_p;

    // Level-1 children occupy indices count..count + count^2; parents that
    // were never subdivided simply own no cells at those indices
    for parent_index in count..count + count * count {
        if rng.gen_range(1..=100) <= config.voronoi_subdivide_probability_level2 {
            voronoi::subdivide(&mut centroids, parent_index, &mut map, count, rng, |ax, ay, bx, by| {
                minkowski_distance(ax, ay, bx, by, level2_p)
            })?;
        }
    }

    let centroid_count = centroids.len();

    Ok((map, centroid_count))
}

fn spawn_worker(
    maps: Arc<RwLock<Maps>>,
    queue: Arc<Queue<usize>>,
    stop: Arc<AtomicBool>,
    results: mpsc::Sender<PathResult>,
    width: usize,
    height: usize,
    seed: u64,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut pathfinder = Pathfinder::new(width, height);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        while !stop.load(Ordering::SeqCst) {
            let Some(villager_index) = queue.try_pop_for(WORKER_POLL_INTERVAL) else {
                continue;
            };

            let path = {
                let maps = maps.read().expect("maps lock poisoned");

                villager::compute_path(&maps.world, &maps.costs, &mut pathfinder, &mut rng)
            };

            if results.send((villager_index, path)).is_err() {
                // Simulation gone; nothing left to do
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            screen_width_pixels: 480,
            screen_height_pixels: 480,
            villager_count: 50,
            pathfinding_thread_count: 1,
            place_roundabouts: false,
            seed: Some(0xD5),
            ..SimConfig::default()
        }
    }

    #[test]
    fn defaults_match_the_documented_setup() {
        let config = SimConfig::default();

        assert_eq!(config.screen_width_pixels, 1920);
        assert_eq!(config.screen_height_pixels, 1080);
        assert_eq!(config.villager_count, 1000);
        assert_eq!(config.voronoi_centroid_count_per_level, 6);
        assert_eq!(config.pathfinding_thread_count, 4);
        assert!(config.pave_desire_paths);
        assert!(config.decay_desire_paths);
        assert!(!config.place_roundabouts);
    }

    #[test]
    fn generation_produces_a_walkable_town() {
        let mut sim = Simulation::new(small_config()).unwrap();

        assert_eq!(sim.world_width_tiles(), 160);
        assert_eq!(sim.world_height_tiles(), 160);

        {
            let maps = sim.maps().read().unwrap();

            let mut streets = 0;
            let mut buildings = 0;
            let mut entrances = 0;

            for (_, _, &tile) in maps.world.iter() {
                match tile {
                    TileKind::Street => streets += 1,
                    TileKind::Building => buildings += 1,
                    TileKind::BuildingEntrance => entrances += 1,
                    _ => {}
                }
            }

            assert!(streets > 0);
            assert!(buildings > 0);
            assert!(entrances > 0, "villagers need entrances to travel between");

            // No generation sentinels may survive
            assert!(maps
                .world
                .iter()
                .all(|(_, _, &t)| t != TileKind::Temporary && t != TileKind::Any && t != TileKind::Keep));
        }

        sim.shutdown();
    }

    #[test]
    fn identical_seeds_generate_identical_towns() {
        let mut first = Simulation::new(small_config()).unwrap();
        let mut second = Simulation::new(small_config()).unwrap();

        {
            let a = first.maps().read().unwrap();
            let b = second.maps().read().unwrap();

            assert_eq!(a.world, b.world);
            assert_eq!(a.costs, b.costs);
        }

        assert_eq!(first.centroid_count(), second.centroid_count());

        first.shutdown();
        second.shutdown();
    }

    #[test]
    fn villagers_receive_paths_and_start_wearing_trails() {
        let mut sim = Simulation::new(small_config()).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(30);

        let mut trails_started = false;

        while std::time::Instant::now() < deadline {
            sim.tick(1.0 / 60.0);

            let maps = sim.maps().read().unwrap();

            if maps.stress.iter().any(|(_, _, &s)| s > 0) {
                trails_started = true;
                break;
            }

            drop(maps);

            thread::sleep(Duration::from_millis(5));
        }

        assert!(trails_started, "no villager stressed any grass tile in time");

        sim.shutdown();
    }

    #[test]
    fn update_rect_is_consumed_by_take() {
        let mut sim = Simulation::new(small_config()).unwrap();

        sim.tick(1.0 / 60.0);

        let _ = sim.take_update_rect();
        assert!(sim.take_update_rect().is_empty());

        sim.shutdown();
    }
}
