//! Hierarchical nearest-centroid partitioning of the town area.
//!
//! The partition boundaries become the street skeleton: a coarse first level
//! is subdivided cell by cell into finer levels, each level with its own
//! distance exponent, so primary streets curve differently than the small
//! blocks between them.

use std::error::Error;
use std::fmt;

use rand::Rng;
use rayon::prelude::*;

use crate::grid::Grid;

/// Integer anchor point of a partition cell. A cell's partition id is the
/// centroid's index into the global, append-only centroid list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

/// For each world tile, the index of the nearest centroid.
pub type VoronoiMap = Grid<usize>;

/// Rejection sampling budget per centroid. Exceeding it means the area
/// cannot hold `count` centroids at the required spacing.
const MAX_SAMPLE_ATTEMPTS: usize = 100_000;

/// Centroid rejection sampling ran out of attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CentroidSamplingError {
    pub placed: usize,
    pub requested: usize,
    pub attempts: usize,
}

impl fmt::Display for CentroidSamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "centroid sampling failed after {} attempts ({} of {} placed); \
             the area is too small for the requested centroid count",
            self.attempts, self.placed, self.requested
        )
    }
}

impl Error for CentroidSamplingError {}

/// Minkowski distance with exponent `p`. p=1 is Manhattan, p=2 Euclidean;
/// p=3 produces the rounder, longer partition boundaries used for the
/// top-level streets.
pub fn minkowski_distance(ax: i32, ay: i32, bx: i32, by: i32, p: f32) -> f32 {
    let dx = (ax - bx).abs() as f32;
    let dy = (ay - by).abs() as f32;

    (dx.powf(p) + dy.powf(p)).powf(1.0 / p)
}

pub fn euclidean_distance(ax: i32, ay: i32, bx: i32, by: i32) -> f32 {
    minkowski_distance(ax, ay, bx, by, 2.0)
}

/// Rejection-sample `count` centroids inside the given area, keeping every
/// new point at least `(area_w + area_h) / (count * 1.5)` (Euclidean) away
/// from the points already accepted in this batch. `predicate` restricts
/// sampling to a sub-region (used when subdividing a single parent cell).
pub fn generate_centroids(
    area_left: i32,
    area_top: i32,
    area_width: i32,
    area_height: i32,
    count: usize,
    rng: &mut impl Rng,
    mut predicate: impl FnMut(i32, i32) -> bool,
) -> Result<Vec<Centroid>, CentroidSamplingError> {
    let mut centroids: Vec<Centroid> = Vec::with_capacity(count);

    let min_distance = (area_width + area_height) as f32 / (count as f32 * 1.5);

    for placed in 0..count {
        let mut accepted = None;

        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let x = rng.gen_range(area_left..area_left + area_width);
            let y = rng.gen_range(area_top..area_top + area_height);

            if !predicate(x, y) {
                continue;
            }

            let closest = centroids
                .iter()
                .map(|other| euclidean_distance(x, y, other.x, other.y))
                .fold(f32::MAX, f32::min);

            if closest >= min_distance {
                accepted = Some(Centroid { x, y });
                break;
            }
        }

        match accepted {
            Some(centroid) => centroids.push(centroid),
            None => {
                return Err(CentroidSamplingError {
                    placed,
                    requested: count,
                    attempts: MAX_SAMPLE_ATTEMPTS,
                })
            }
        }
    }

    Ok(centroids)
}

/// Index of the centroid nearest to `(x, y)` under `distance`.
pub fn nearest_centroid_index(
    x: i32,
    y: i32,
    centroids: &[Centroid],
    distance: impl Fn(i32, i32, i32, i32) -> f32,
) -> usize {
    let mut shortest = f32::MAX;
    let mut shortest_index = 0;

    for (index, centroid) in centroids.iter().enumerate() {
        let d = distance(x, y, centroid.x, centroid.y);

        if d < shortest {
            shortest = d;
            shortest_index = index;
        }
    }

    shortest_index
}

/// Assign every cell of a `width` x `height` map to its nearest centroid.
/// One nearest-centroid scan per cell; rows are independent, so this runs
/// on the rayon pool.
pub fn assign_cells(
    width: usize,
    height: usize,
    centroids: &[Centroid],
    distance: impl Fn(i32, i32, i32, i32) -> f32 + Sync,
) -> VoronoiMap {
    let cells: Vec<usize> = (0..width * height)
        .into_par_iter()
        .map(|idx| {
            let x = (idx % width) as i32;
            let y = (idx / width) as i32;
            nearest_centroid_index(x, y, centroids, &distance)
        })
        .collect();

    VoronoiMap::from_vec(width, height, cells)
}

/// Split the cell owned by `parent_index` into `child_count` sub-cells.
///
/// A fresh centroid batch is sampled inside the parent's bounding box,
/// restricted to tiles the parent actually owns; only those tiles are
/// reassigned. Child ids continue after the current end of the centroid
/// list, which the children are then appended to.
pub fn subdivide(
    centroids: &mut Vec<Centroid>,
    parent_index: usize,
    map: &mut VoronoiMap,
    child_count: usize,
    rng: &mut impl Rng,
    distance: impl Fn(i32, i32, i32, i32) -> f32,
) -> Result<(), CentroidSamplingError> {
    let child_start_index = centroids.len();

    // Bounding box of the parent's cells
    let mut left = usize::MAX;
    let mut top = usize::MAX;
    let mut right = 0;
    let mut bottom = 0;

    for (x, y, &owner) in map.iter() {
        if owner == parent_index {
            left = left.min(x);
            top = top.min(y);
            right = right.max(x);
            bottom = bottom.max(y);
        }
    }

    if left > right {
        // Parent owns no cells (fully overwritten by an earlier subdivision)
        return Ok(());
    }

    let box_width = right - left + 1;
    let box_height = bottom - top + 1;

    let children = generate_centroids(
        left as i32,
        top as i32,
        box_width as i32,
        box_height as i32,
        child_count,
        rng,
        |x, y| *map.at(x as usize, y as usize) == parent_index,
    )?;

    for y in top..=bottom {
        for x in left..=right {
            if *map.at(x, y) == parent_index {
                let child =
                    nearest_centroid_index(x as i32, y as i32, &children, &distance);

                map.set(x, y, child_start_index + child);
            }
        }
    }

    centroids.extend_from_slice(&children);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn minkowski_special_cases() {
        // p=1 Manhattan, p=2 Euclidean
        assert_eq!(minkowski_distance(0, 0, 3, 4, 1.0), 7.0);
        assert!((minkowski_distance(0, 0, 3, 4, 2.0) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn every_cell_gets_its_nearest_centroid() {
        let centroids = vec![
            Centroid { x: 2, y: 2 },
            Centroid { x: 12, y: 3 },
            Centroid { x: 7, y: 12 },
        ];

        let map = assign_cells(16, 16, &centroids, euclidean_distance);

        for (x, y, &assigned) in map.iter() {
            let assigned_distance = euclidean_distance(
                x as i32,
                y as i32,
                centroids[assigned].x,
                centroids[assigned].y,
            );

            for centroid in &centroids {
                let d = euclidean_distance(x as i32, y as i32, centroid.x, centroid.y);
                assert!(
                    d >= assigned_distance,
                    "cell ({x}, {y}) has a strictly closer centroid"
                );
            }
        }
    }

    #[test]
    fn centroids_respect_minimum_spacing() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let centroids =
            generate_centroids(0, 0, 100, 100, 6, &mut rng, |_, _| true).unwrap();

        assert_eq!(centroids.len(), 6);

        let min_distance = 200.0 / (6.0 * 1.5);

        for (i, a) in centroids.iter().enumerate() {
            for b in centroids.iter().skip(i + 1) {
                assert!(euclidean_distance(a.x, a.y, b.x, b.y) >= min_distance);
            }
        }
    }

    #[test]
    fn oversubscribed_area_reports_failure_instead_of_hanging() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        // 2x2 area cannot hold 50 spaced centroids
        let result = generate_centroids(0, 0, 2, 2, 50, &mut rng, |_, _| true);

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.requested, 50);
        assert!(err.placed < 50);
    }

    #[test]
    fn subdivision_appends_children_and_reassigns_only_parent_cells() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let mut centroids = vec![Centroid { x: 8, y: 8 }, Centroid { x: 40, y: 40 }];
        let mut map = assign_cells(48, 48, &centroids, euclidean_distance);

        let foreign_cells: Vec<(usize, usize)> = map
            .iter()
            .filter(|(_, _, &owner)| owner == 1)
            .map(|(x, y, _)| (x, y))
            .collect();

        subdivide(&mut centroids, 0, &mut map, 3, &mut rng, euclidean_distance)
            .unwrap();

        assert_eq!(centroids.len(), 5);

        // Cells of the untouched parent keep their id
        for (x, y) in foreign_cells {
            assert_eq!(*map.at(x, y), 1);
        }

        // Former parent cells now carry child ids in 2..5
        for (_, _, &owner) in map.iter() {
            assert!(owner == 1 || (2..5).contains(&owner));
        }
    }
}
