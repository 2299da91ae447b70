//! Headless exports: PNG renderings of the town and a JSON run summary.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;

use image::{ImageBuffer, Rgb, RgbImage};
use rand::Rng;
use serde::Serialize;

use crate::desire::StressMap;
use crate::sim::Simulation;
use crate::tile::{TileKind, WorldMap};

/// Render the world map at one pixel per tile.
///
/// Water, trees and buildings get a checker pattern plus a beveled edge
/// against unlike neighbors; streets and grass get light random shade
/// variation, which is why this takes an RNG.
pub fn render_world_map(world: &WorldMap, rng: &mut impl Rng) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(world.width() as u32, world.height() as u32);

    for y in 0..world.height() {
        for x in 0..world.width() {
            let color = tile_color(world, x, y, rng);
            img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }

    img
}

pub fn export_world_map(
    world: &WorldMap,
    path: &str,
    rng: &mut impl Rng,
) -> Result<(), image::ImageError> {
    render_world_map(world, rng).save(path)
}

/// Render the stress map as grayscale; worn trails show up white.
pub fn render_stress_map(stress: &StressMap) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(stress.width() as u32, stress.height() as u32);

    for y in 0..stress.height() {
        for x in 0..stress.width() {
            let value = *stress.at(x, y);
            img.put_pixel(x as u32, y as u32, Rgb([value, value, value]));
        }
    }

    img
}

pub fn export_stress_map(stress: &StressMap, path: &str) -> Result<(), image::ImageError> {
    render_stress_map(stress).save(path)
}

fn tile_color(world: &WorldMap, x: usize, y: usize, rng: &mut impl Rng) -> [u8; 3] {
    let at = |x: usize, y: usize| *world.at(x, y);

    match at(x, y) {
        TileKind::Water => {
            let mut color: [u8; 3] = if y % 3 == 1 {
                if x % 3 == 0 {
                    [60, 170, 255]
                } else {
                    [20, 130, 230]
                }
            } else if y % 3 == 0 {
                if x % 3 > 0 {
                    [60, 170, 255]
                } else {
                    [20, 130, 230]
                }
            } else {
                [20, 130, 230]
            };

            // Bevel against the shore
            if (x > 0 && at(x - 1, y) != TileKind::Water)
                || (y > 0 && at(x, y - 1) != TileKind::Water)
            {
                for channel in &mut color {
                    *channel = channel.saturating_sub(20);
                }
            }

            color
        }
        TileKind::Tree => {
            let mut color: [u8; 3] = if (x + y) % 2 == 1 {
                [90, 180, 40]
            } else {
                [70, 160, 20]
            };

            if (x < world.width() - 1 && at(x + 1, y) != TileKind::Tree)
                || (y < world.height() - 1 && at(x, y + 1) != TileKind::Tree)
            {
                for channel in &mut color {
                    *channel = channel.saturating_sub(20);
                }
            }

            color
        }
        TileKind::Building => {
            let mut color: [u8; 3] = if x % 2 == 1 {
                [230, 130, 80]
            } else {
                [210, 110, 60]
            };

            // Lit on the top-left edges, shaded on the bottom-right
            if (x > 0 && at(x - 1, y) != TileKind::Building)
                || (y > 0 && at(x, y - 1) != TileKind::Building)
            {
                for channel in &mut color {
                    *channel = channel.saturating_add(20);
                }
            } else if (x < world.width() - 1 && at(x + 1, y) != TileKind::Building)
                || (y < world.height() - 1 && at(x, y + 1) != TileKind::Building)
            {
                for channel in &mut color {
                    *channel = channel.saturating_sub(20);
                }
            }

            color
        }
        TileKind::Street | TileKind::BuildingEntrance => {
            if rng.gen_range(1..=100) <= 90 {
                [150, 150, 150]
            } else {
                [130, 130, 130]
            }
        }
        TileKind::Grass => {
            if rng.gen_range(1..=100) <= 20 {
                [110, 200, 60]
            } else {
                [130, 220, 80]
            }
        }
        _ => [0, 0, 0],
    }
}

/// Machine-readable summary of a run, written next to the PNG exports.
#[derive(Debug, Serialize)]
pub struct GenerationSummary {
    pub seed: u64,
    pub world_width_tiles: usize,
    pub world_height_tiles: usize,
    pub voronoi_cell_count: usize,
    pub villager_count: usize,
    pub tile_counts: BTreeMap<&'static str, usize>,
}

impl GenerationSummary {
    pub fn from_simulation(sim: &Simulation) -> Self {
        let maps = sim.maps().read().expect("maps lock poisoned");

        let mut tile_counts = BTreeMap::new();

        for (_, _, &tile) in maps.world.iter() {
            *tile_counts.entry(tile.display_name()).or_insert(0) += 1;
        }

        Self {
            seed: sim.seed(),
            world_width_tiles: sim.world_width_tiles(),
            world_height_tiles: sim.world_height_tiles(),
            voronoi_cell_count: sim.centroid_count(),
            villager_count: sim.villagers().len(),
            tile_counts,
        }
    }
}

pub fn export_summary(summary: &GenerationSummary, path: &str) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;

    serde_json::to_writer_pretty(file, summary)?;

    Ok(())
}
