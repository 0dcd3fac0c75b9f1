//! Maze generation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, warn};

use crate::error::Result;
use crate::grid::{Direction, Grid, Point};
use crate::stack::Stack;

/// Wall pair removed during generation: the wall of `from` facing
/// `direction`, and its counterpart on the neighboring cell.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Passage {
    pub from: Point,
    pub direction: Direction,
}

/// Perfect maze generator (randomized depth-first search).
pub struct MazeGenerator {
    random: StdRng,
    /// Backtracking stack bound, `None` if unbounded
    stack_limit: Option<usize>,
}

impl MazeGenerator {
    /// Seeded generator; `None` draws the seed from system entropy.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            random: if let Some(state) = seed {
                StdRng::seed_from_u64(state)
            } else {
                StdRng::from_entropy()
            },
            stack_limit: None,
        }
    }

    /// Limit the depth of the backtracking stack.
    ///
    /// Generation fails once the carved path would exceed `limit` cells.
    pub fn with_stack_limit(mut self, limit: usize) -> Self {
        self.stack_limit = Some(limit);
        self
    }

    /// Carve a perfect maze into `grid`.
    ///
    /// The grid is reset first. Starting from its start cell, walk to a
    /// random unvisited neighbor, removing the wall in between, and
    /// backtrack whenever the current cell has none left. Every cell ends up
    /// visited and the open passages form a spanning tree.
    ///
    /// Returns the removed wall pairs in carving order. If the stack cannot
    /// grow, generation stops with the error and the grid keeps the
    /// passages carved so far.
    pub fn generate(&mut self, grid: &mut Grid) -> Result<Vec<Passage>> {
        grid.reset();

        let mut stack: Stack<usize> = Stack::new(self.stack_limit);
        debug!(limit = ?stack.capacity_limit(), "backtracking stack created");

        let mut passages = Vec::with_capacity(grid.cells().len().saturating_sub(1));
        let start = grid.start();
        grid.mark_visited(start);
        if let Some(index) = grid.index_of(start) {
            stack.push(index)?;
        }

        while let Some(&top) = stack.peek() {
            let Some(current) = grid.point_of(top) else {
                break;
            };

            if let Some((direction, next)) = self.unvisited_neighbor(grid, current) {
                grid.remove_wall(current, next, direction);
                grid.mark_visited(next);
                passages.push(Passage {
                    from: current,
                    direction,
                });
                if let Some(index) = grid.index_of(next) {
                    if let Err(e) = stack.push(index) {
                        warn!(carved = passages.len(), "maze generation aborted: {e}");
                        return Err(e);
                    }
                }
            } else {
                // Dead end
                stack.pop();
            }
        }

        debug!(
            passages = passages.len(),
            visited = grid.visited_count(),
            "maze carved"
        );
        Ok(passages)
    }

    /// Random unvisited neighbor of `point`.
    ///
    /// All four directions are shuffled and scanned in that order, so every
    /// call draws from the random generator, found or not.
    fn unvisited_neighbor(&mut self, grid: &Grid, point: Point) -> Option<(Direction, Point)> {
        let mut directions = Direction::ALL;
        directions.shuffle(&mut self.random);

        directions.into_iter().find_map(|direction| {
            grid.neighbor(point, direction)
                .filter(|n| !grid.is_visited(*n))
                .map(|n| (direction, n))
        })
    }
}
