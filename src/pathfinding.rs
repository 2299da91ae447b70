//! A* pathfinding over an 8-connected grid.
//!
//! One `Pathfinder` owns a node pool sized to the grid and is reused across
//! searches; each pathfinding worker thread keeps its own instance, so no
//! locking happens inside a search. Traversability, edge cost and heuristic
//! are supplied by the caller, which keeps the engine reusable under
//! different blocking and weighting rules.

/// Orthogonal step cost scale.
pub const ORTHOGONAL_SCALE: i32 = 10;
/// Diagonal step cost scale (fixed-point sqrt(2) * 10).
pub const DIAGONAL_SCALE: i32 = 14;

/// Octile distance scaled to match the 10/14 edge costs, which keeps it
/// admissible for 8-directional movement.
/// See <http://theory.stanford.edu/~amitp/GameProgramming/Heuristics.html>.
pub fn octile_heuristic(from: (usize, usize), to: (usize, usize)) -> i32 {
    let dx = from.0.abs_diff(to.0) as i32;
    let dy = from.1.abs_diff(to.1) as i32;

    ORTHOGONAL_SCALE * (dx + dy) + (DIAGONAL_SCALE - 2 * ORTHOGONAL_SCALE) * dx.min(dy)
}

#[derive(Clone, Copy, Default)]
struct PathNode {
    parent: Option<u32>,
    in_open_list: bool,
    closed: bool,
    open_list_index: u32,
    g: i32,
    h: i32,
    f: i32,
}

/// Reusable A* searcher for a fixed-size grid.
pub struct Pathfinder {
    width: usize,
    height: usize,
    nodes: Vec<PathNode>,
    /// Node indices sorted ascending by f. Consumed entries are skipped via
    /// a cursor instead of being removed from the front, which keeps pops
    /// O(1) and indices stable.
    open_list: Vec<u32>,
}

impl Pathfinder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            nodes: vec![PathNode::default(); width * height],
            open_list: Vec::new(),
        }
    }

    /// Find a path from `start` to `goal`, both inclusive.
    ///
    /// `can_traverse(from, to)` gates each step (including the diagonal
    /// corner rule, which is the caller's responsibility), `traversal_cost`
    /// prices a step and `heuristic` estimates the remaining cost. Returns
    /// the tile sequence from start to goal, or an empty vector when the
    /// goal is unreachable. The node pool is reset before returning either
    /// way.
    pub fn find_path(
        &mut self,
        start: (usize, usize),
        goal: (usize, usize),
        can_traverse: impl Fn((usize, usize), (usize, usize)) -> bool,
        traversal_cost: impl Fn((usize, usize), (usize, usize)) -> i32,
        heuristic: impl Fn((usize, usize), (usize, usize)) -> i32,
    ) -> Vec<(usize, usize)> {
        debug_assert!(start.0 < self.width && start.1 < self.height);
        debug_assert!(goal.0 < self.width && goal.1 < self.height);

        let start_index = (start.1 * self.width + start.0) as u32;
        let goal_index = (goal.1 * self.width + goal.0) as u32;

        self.open_list
            .reserve(start.0.abs_diff(goal.0).max(start.1.abs_diff(goal.1)));

        self.open_list.push(start_index);

        {
            let start_node = &mut self.nodes[start_index as usize];
            start_node.in_open_list = true;
            start_node.open_list_index = 0;
            start_node.g = 0;
            start_node.h = heuristic(start, goal);
            start_node.f = start_node.h;
        }

        // Nothing is popped off the front; `cursor` marks the consumed
        // prefix so earlier entries keep their positions.
        let mut cursor = 0usize;
        let mut success = false;

        while cursor < self.open_list.len() {
            let current_index = self.open_list[cursor];
            cursor += 1;

            let current = self.coords_of(current_index);

            self.nodes[current_index as usize].in_open_list = false;
            self.nodes[current_index as usize].closed = true;

            if current_index == goal_index {
                success = true;
                break;
            }

            let (x, y) = current;

            // North first, with its diagonals, then south and its
            // diagonals, then west, then east.
            if y > 0 {
                self.visit_neighbor(current, (x, y - 1), goal, cursor, &can_traverse, &traversal_cost, &heuristic);

                if x > 0 {
                    self.visit_neighbor(current, (x - 1, y - 1), goal, cursor, &can_traverse, &traversal_cost, &heuristic);
                }

                if x < self.width - 1 {
                    self.visit_neighbor(current, (x + 1, y - 1), goal, cursor, &can_traverse, &traversal_cost, &heuristic);
                }
            }

            if y < self.height - 1 {
                self.visit_neighbor(current, (x, y + 1), goal, cursor, &can_traverse, &traversal_cost, &heuristic);

                if x > 0 {
                    self.visit_neighbor(current, (x - 1, y + 1), goal, cursor, &can_traverse, &traversal_cost, &heuristic);
                }

                if x < self.width - 1 {
                    self.visit_neighbor(current, (x + 1, y + 1), goal, cursor, &can_traverse, &traversal_cost, &heuristic);
                }
            }

            if x > 0 {
                self.visit_neighbor(current, (x - 1, y), goal, cursor, &can_traverse, &traversal_cost, &heuristic);
            }

            if x < self.width - 1 {
                self.visit_neighbor(current, (x + 1, y), goal, cursor, &can_traverse, &traversal_cost, &heuristic);
            }
        }

        let path = if success {
            let mut path = Vec::with_capacity(self.width + self.height);

            let mut node_index = goal_index;
            path.push(self.coords_of(node_index));

            while let Some(parent_index) = self.nodes[node_index as usize].parent {
                path.push(self.coords_of(parent_index));
                node_index = parent_index;
            }

            path.reverse();
            path
        } else {
            Vec::new()
        };

        self.clear_open_list();

        path
    }

    fn coords_of(&self, index: u32) -> (usize, usize) {
        (index as usize % self.width, index as usize / self.width)
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_neighbor(
        &mut self,
        from: (usize, usize),
        to: (usize, usize),
        goal: (usize, usize),
        cursor: usize,
        can_traverse: &impl Fn((usize, usize), (usize, usize)) -> bool,
        traversal_cost: &impl Fn((usize, usize), (usize, usize)) -> i32,
        heuristic: &impl Fn((usize, usize), (usize, usize)) -> i32,
    ) {
        let from_index = (from.1 * self.width + from.0) as u32;
        let to_index = (to.1 * self.width + to.0) as u32;

        if self.nodes[to_index as usize].closed || !can_traverse(from, to) {
            return;
        }

        let tentative_g = self.nodes[from_index as usize].g + traversal_cost(from, to);

        if !self.nodes[to_index as usize].in_open_list {
            let h = heuristic(to, goal);

            let node = &mut self.nodes[to_index as usize];
            node.parent = Some(from_index);
            node.g = tentative_g;
            node.h = h;
            node.f = tentative_g + h;
            node.in_open_list = true;

            let f = node.f;

            // Sorted insertion past the consumed prefix
            let offset = self.open_list[cursor..]
                .partition_point(|&index| self.nodes[index as usize].f <= f);
            let insert_at = cursor + offset;

            self.open_list.insert(insert_at, to_index);
            self.reindex_from(insert_at);
        } else if tentative_g < self.nodes[to_index as usize].g {
            // Better route to an already-open node; its f shrinks, so it
            // may have to move towards the front to keep the list sorted.
            let node = &mut self.nodes[to_index as usize];
            node.parent = Some(from_index);
            node.g = tentative_g;
            node.f = tentative_g + node.h;

            let f = node.f;
            let current_position = node.open_list_index as usize;

            let mut new_position = current_position;

            while new_position > cursor
                && self.nodes[self.open_list[new_position - 1] as usize].f > f
            {
                new_position -= 1;
            }

            if new_position < current_position {
                self.open_list[new_position..=current_position].rotate_right(1);
                self.reindex_from(new_position);
            }
        }
    }

    /// Restore `open_list_index` back-pointers after entries shifted.
    fn reindex_from(&mut self, position: usize) {
        for i in position..self.open_list.len() {
            let node_index = self.open_list[i] as usize;
            self.nodes[node_index].open_list_index = i as u32;
        }
    }

    /// Reset every node touched by the last search. Consumed entries stay in
    /// the list (the cursor only advances), so this covers closed nodes too.
    fn clear_open_list(&mut self) {
        for &node_index in &self.open_list {
            let node = &mut self.nodes[node_index as usize];

            node.parent = None;
            node.in_open_list = false;
            node.closed = false;
        }

        self.open_list.clear();
    }
}
