use std::process::ExitCode;

use clap::Parser;

use desire_paths::export;
use desire_paths::sim::{SimConfig, Simulation};
use desire_paths::tile::TileKind;

#[derive(Parser, Debug)]
#[command(name = "desire_paths")]
#[command(about = "Simulate villagers wearing desire paths into a generated town")]
struct Args {
    /// Screen width in pixels (the world is twice this size)
    #[arg(long, default_value = "1920")]
    screen_width: i32,

    /// Screen height in pixels (the world is twice this size)
    #[arg(long, default_value = "1080")]
    screen_height: i32,

    /// Simulation ticks per second
    #[arg(long, default_value = "60")]
    fps: i32,

    /// Simulated time to run, in seconds
    #[arg(short, long, default_value = "60")]
    duration_secs: f32,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of villagers
    #[arg(short, long, default_value = "1000")]
    villagers: usize,

    /// Voronoi centroids per subdivision level
    #[arg(long, default_value = "6")]
    centroids_per_level: usize,

    /// Probability (percent) of subdividing a level-1 cell
    #[arg(long, default_value = "90")]
    subdivide_level1: i32,

    /// Probability (percent) of subdividing a level-2 cell
    #[arg(long, default_value = "80")]
    subdivide_level2: i32,

    /// Minkowski distance exponent for level-0 cell assignment
    #[arg(long, default_value = "3.0")]
    minkowski_0: f32,

    /// Minkowski distance exponent for level-1 cell assignment
    #[arg(long, default_value = "3.0")]
    minkowski_1: f32,

    /// Minkowski distance exponent for level-2 cell assignment
    #[arg(long, default_value = "1.0")]
    minkowski_2: f32,

    /// Place roundabouts on street crossings
    #[arg(long)]
    roundabouts: bool,

    /// Skip pond placement
    #[arg(long)]
    no_ponds: bool,

    /// Skip paved plaza placement
    #[arg(long)]
    no_paved_areas: bool,

    /// Skip large tree clusters
    #[arg(long)]
    no_large_trees: bool,

    /// Skip small tree clusters
    #[arg(long)]
    no_small_trees: bool,

    /// Remove all generated streets before the simulation starts
    #[arg(long)]
    remove_streets: bool,

    /// Pathfinding worker threads
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Never turn saturated trails into streets
    #[arg(long)]
    no_pave: bool,

    /// Never decay trail stress
    #[arg(long)]
    no_decay: bool,

    /// Export the final world map to a PNG (specify output path)
    #[arg(long)]
    export_map: Option<String>,

    /// Export the final stress map to a grayscale PNG
    #[arg(long)]
    export_stress: Option<String>,

    /// Export a JSON summary of the run
    #[arg(long)]
    export_summary: Option<String>,
}

impl Args {
    fn to_config(&self) -> SimConfig {
        SimConfig {
            screen_width_pixels: self.screen_width,
            screen_height_pixels: self.screen_height,
            target_fps: self.fps,
            remove_streets_after_generation: self.remove_streets,
            villager_count: self.villagers,
            voronoi_centroid_count_per_level: self.centroids_per_level,
            voronoi_subdivide_probability_level1: self.subdivide_level1,
            voronoi_subdivide_probability_level2: self.subdivide_level2,
            voronoi_level0_minkowski_p: self.minkowski_0,
            voronoi_level1_minkowski_p: self.minkowski_1,
            voronoi_level2_minkowski_p: self.minkowski_2,
            place_roundabouts: self.roundabouts,
            place_ponds: !self.no_ponds,
            place_full_paved_areas: !self.no_paved_areas,
            place_large_trees: !self.no_large_trees,
            place_small_trees: !self.no_small_trees,
            pathfinding_thread_count: self.threads,
            pave_desire_paths: !self.no_pave,
            decay_desire_paths: !self.no_decay,
            seed: self.seed,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating town...");

    let config = args.to_config();
    let fps = if config.target_fps > 0 { config.target_fps } else { 60 };

    let mut sim = Simulation::new(config)?;

    println!("Seed: {}", sim.seed());
    println!(
        "World size: {}x{} tiles, {} partition cells",
        sim.world_width_tiles(),
        sim.world_height_tiles(),
        sim.centroid_count()
    );

    print_tile_stats(&sim);

    let delta = 1.0 / fps as f32;
    let total_ticks = (args.duration_secs * fps as f32).ceil() as u64;

    println!(
        "Simulating {} villagers for {:.0}s ({} ticks at {} tps, {} pathfinding threads)...",
        args.villagers, args.duration_secs, total_ticks, fps, args.threads
    );

    let mut paved_tiles = 0usize;

    for tick in 0..total_ticks {
        sim.tick(delta);

        let update = sim.take_update_rect();

        if !update.is_empty() {
            paved_tiles += update.width() * update.height();
        }

        // Progress roughly every simulated 10 seconds
        if tick > 0 && tick % (fps as u64 * 10) == 0 {
            let stressed = {
                let maps = sim.maps().read().expect("maps lock poisoned");
                maps.stress.iter().filter(|(_, _, &s)| s > 0).count()
            };

            println!(
                "  t={:>5.0}s  {} tiles under stress, ~{} tiles of map touched by paving",
                tick as f32 * delta,
                stressed,
                paved_tiles
            );
        }
    }

    println!("Simulation finished.");
    print_tile_stats(&sim);

    {
        let maps = sim.maps().read().expect("maps lock poisoned");

        if let Some(path) = &args.export_map {
            let mut render_rng = rand::thread_rng();
            export::export_world_map(&maps.world, path, &mut render_rng)?;
            println!("World map written to {path}");
        }

        if let Some(path) = &args.export_stress {
            export::export_stress_map(&maps.stress, path)?;
            println!("Stress map written to {path}");
        }
    }

    if let Some(path) = &args.export_summary {
        let summary = export::GenerationSummary::from_simulation(&sim);
        export::export_summary(&summary, path)?;
        println!("Summary written to {path}");
    }

    sim.shutdown();

    Ok(())
}

fn print_tile_stats(sim: &Simulation) {
    let maps = sim.maps().read().expect("maps lock poisoned");

    let mut grass = 0usize;
    let mut street = 0usize;
    let mut building = 0usize;
    let mut entrance = 0usize;
    let mut tree = 0usize;
    let mut water = 0usize;

    for (_, _, &tile) in maps.world.iter() {
        match tile {
            TileKind::Grass => grass += 1,
            TileKind::Street => street += 1,
            TileKind::Building => building += 1,
            TileKind::BuildingEntrance => entrance += 1,
            TileKind::Tree => tree += 1,
            TileKind::Water => water += 1,
            _ => {}
        }
    }

    println!(
        "Tiles: {} grass, {} street, {} building, {} entrance, {} tree, {} water",
        grass, street, building, entrance, tree, water
    );
}
