//! Desire paths town simulation library
//!
//! Re-exports modules for use by the binary and tests.

pub mod desire;
pub mod export;
pub mod grid;
pub mod pathfinding;
pub mod queue;
pub mod sim;
pub mod tile;
pub mod update_rect;
pub mod villager;
pub mod voronoi;
pub mod worldgen;
