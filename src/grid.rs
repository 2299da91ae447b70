//! Generic fixed-size 2D grid used for the world map, cost map, stress map,
//! Voronoi cell map and the generation patterns/patches.

/// A dense row-major 2D grid with fixed dimensions.
///
/// `at`/`at_mut` do no bounds checking in release builds; staying in bounds
/// is the caller's contract (these sit on the pathfinding and stamping hot
/// paths). Debug builds assert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Build a grid from an already-filled row-major cell vector.
    pub fn from_vec(width: usize, height: usize, cells: Vec<T>) -> Self {
        debug_assert_eq!(cells.len(), width * height);

        Self {
            width,
            height,
            cells,
        }
    }

    /// Build a grid from row literals. All rows must have equal length.
    /// Used for hand-drawn patterns and patches.
    pub fn from_rows(rows: &[&[T]]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());

        debug_assert!(rows.iter().all(|row| row.len() == width));

        let mut cells = Vec::with_capacity(width * height);

        for row in rows {
            cells.extend_from_slice(row);
        }

        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.cells[y * self.width + x]
    }

    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut T {
        debug_assert!(x < self.width && y < self.height);
        &mut self.cells[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.at_mut(x, y) = value;
    }

    /// New grid rotated 90° clockwise. Dimensions swap.
    pub fn rotated_90_cw(&self) -> Self {
        if self.cells.is_empty() {
            return Self::from_vec(self.height, self.width, Vec::new());
        }

        let mut rotated = Self::new(self.height, self.width, self.cells[0].clone());

        for y in 0..self.height {
            for x in 0..self.width {
                rotated.set(rotated.width - y - 1, x, self.at(x, y).clone());
            }
        }

        rotated
    }

    /// New grid rotated 90° counter-clockwise. Dimensions swap.
    pub fn rotated_90_ccw(&self) -> Self {
        if self.cells.is_empty() {
            return Self::from_vec(self.height, self.width, Vec::new());
        }

        let mut rotated = Self::new(self.height, self.width, self.cells[0].clone());

        for y in 0..self.height {
            for x in 0..self.width {
                rotated.set(y, rotated.height - x - 1, self.at(x, y).clone());
            }
        }

        rotated
    }

    /// New grid rotated 180°. Dimensions stay.
    pub fn rotated_180(&self) -> Self {
        if self.cells.is_empty() {
            return self.clone();
        }

        let mut rotated = Self::new(self.width, self.height, self.cells[0].clone());

        for y in 0..self.height {
            for x in 0..self.width {
                rotated.set(rotated.width - x - 1, rotated.height - y - 1, self.at(x, y).clone());
            }
        }

        rotated
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.cells.iter().enumerate().map(move |(idx, val)| {
            let x = idx % self.width;
            let y = idx / self.width;
            (x, y, val)
        })
    }
}

impl<T: Clone + PartialEq> Grid<T> {
    /// Scan row-major from `(start_x, start_y)` for the first cell equal to
    /// `value`. With `wrap`, the scan continues from the top of the grid back
    /// up to (but excluding) the start cell.
    pub fn find(
        &self,
        value: &T,
        start_x: usize,
        start_y: usize,
        wrap: bool,
    ) -> Option<(usize, usize)> {
        if start_y >= self.height || start_x >= self.width {
            return None;
        }

        // Remainder of the starting row
        for x in start_x..self.width {
            if self.at(x, start_y) == value {
                return Some((x, start_y));
            }
        }

        for y in start_y + 1..self.height {
            for x in 0..self.width {
                if self.at(x, y) == value {
                    return Some((x, y));
                }
            }
        }

        if wrap {
            for y in 0..=start_y {
                let row_end = if y == start_y { start_x } else { self.width };

                for x in 0..row_end {
                    if self.at(x, y) == value {
                        return Some((x, y));
                    }
                }
            }
        }

        None
    }
}
