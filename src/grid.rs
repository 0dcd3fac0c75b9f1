//! Maze topology: a rectangular grid of cells with paired walls

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::error::{Error, Result};

/// Cell location in grid coordinates
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Default)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Parse `x,y`
impl FromStr for Point {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| Error::InvalidParameter(format!("expected `x,y`, got `{s}`")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|e| Error::InvalidParameter(format!("bad coordinate `{v}`: {e}")))
        };
        Ok(Point::new(parse(x)?, parse(y)?))
    }
}

/// Side of a cell. The discriminant is the slot in [Cell::walls].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Grid offset (dx, dy); y grows downwards
    fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// Single maze cell
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Cell {
    position: Point,
    visited: bool,
    /// Wall presence, indexed by [Direction::index]
    walls: [bool; 4],
}

impl Cell {
    fn new(position: Point) -> Self {
        Self {
            position,
            visited: false,
            walls: [true; 4],
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn has_wall(&self, direction: Direction) -> bool {
        self.walls[direction.index()]
    }

    pub fn walls(&self) -> [bool; 4] {
        self.walls
    }
}

/// Rectangular maze grid.
///
/// Cells are stored row-major in a single buffer, `width` cells per row.
/// A wall between two cells is always present on both sides or on neither.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Grid {
    /// Width in cells
    width: usize,
    /// Height in cells
    height: usize,
    /// Edge length of one cell in pixels
    cell_size: u32,
    /// Wall stripe thickness in pixels, already clamped
    wall_thickness: u32,
    start: Point,
    end: Point,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a fully walled grid where only the start cell is visited.
    ///
    /// Wall thickness is clamped to `1..=cell_size / 2`.
    ///
    /// Returns error if a dimension is zero, `cell_size` is 2 or less,
    /// start or end lies outside the grid, or the resulting image would be
    /// too large for a bitmap.
    pub fn new(
        width: usize,
        height: usize,
        cell_size: u32,
        start: Point,
        end: Point,
        wall_thickness: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        if cell_size <= 2 {
            return Err(Error::InvalidParameter(format!(
                "cell size must be greater than 2, got {cell_size}"
            )));
        }
        for (name, point) in [("start", start), ("end", end)] {
            if point.x >= width || point.y >= height {
                return Err(Error::InvalidParameter(format!(
                    "{name} cell {point} outside {width}x{height} grid"
                )));
            }
        }
        for (name, cells) in [("width", width), ("height", height)] {
            let fits = u64::try_from(cells)
                .ok()
                .and_then(|c| c.checked_mul(u64::from(cell_size)))
                .is_some_and(|px| px <= i32::MAX as u64);
            if !fits {
                return Err(Error::InvalidParameter(format!(
                    "image {name} of {cells} cells x {cell_size} px is too large"
                )));
            }
        }

        let wall_thickness = wall_thickness.min(cell_size / 2).max(1);

        let count = width
            .checked_mul(height)
            .ok_or_else(|| Error::InvalidParameter("grid has too many cells".into()))?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(count)?;
        cells.extend((0..count).map(|i| Cell::new(Point::new(i % width, i / width))));

        let mut grid = Self {
            width,
            height,
            cell_size,
            wall_thickness,
            start,
            end,
            cells,
        };
        grid.mark_visited(start);
        Ok(grid)
    }

    /// Restore all walls and clear visited flags, except on the start cell.
    pub fn reset(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.visited = false;
            cell.walls = [true; 4];
        }
        self.mark_visited(self.start);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn wall_thickness(&self) -> u32 {
        self.wall_thickness
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// Rendered image width in pixels
    pub fn pixel_width(&self) -> u32 {
        // Bounded by i32::MAX in Self::new
        (self.width as u64 * u64::from(self.cell_size)) as u32
    }

    /// Rendered image height in pixels
    pub fn pixel_height(&self) -> u32 {
        (self.height as u64 * u64::from(self.cell_size)) as u32
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Buffer index of `point`, `None` if it lies outside the grid
    pub fn index_of(&self, point: Point) -> Option<usize> {
        (point.x < self.width && point.y < self.height).then(|| point.y * self.width + point.x)
    }

    pub fn point_of(&self, index: usize) -> Option<Point> {
        (index < self.cells.len()).then(|| Point::new(index % self.width, index / self.width))
    }

    pub fn cell(&self, point: Point) -> Option<&Cell> {
        self.index_of(point).map(|i| &self.cells[i])
    }

    pub fn is_visited(&self, point: Point) -> bool {
        self.cell(point).is_some_and(Cell::is_visited)
    }

    pub fn mark_visited(&mut self, point: Point) {
        if let Some(i) = self.index_of(point) {
            self.cells[i].visited = true;
        }
    }

    /// Adjacent cell in `direction`, `None` if that would leave the grid
    pub fn neighbor(&self, point: Point, direction: Direction) -> Option<Point> {
        self.index_of(point)?;
        let (dx, dy) = direction.offset();
        let x = point.x.checked_add_signed(dx)?;
        let y = point.y.checked_add_signed(dy)?;
        let next = Point::new(x, y);
        self.index_of(next).map(|_| next)
    }

    /// Existing neighbors that have not been visited yet, in [Direction::ALL] order
    pub fn unvisited_neighbors(&self, point: Point) -> Vec<(Direction, Point)> {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.neighbor(point, d).map(|n| (d, n)))
            .filter(|(_, n)| !self.is_visited(*n))
            .collect()
    }

    /// Remove the wall of `a` facing `direction` together with the wall of
    /// `b` facing back.
    ///
    /// Nothing happens unless both cells are on the grid and `b` is the
    /// neighbor of `a` in `direction`.
    pub fn remove_wall(&mut self, a: Point, b: Point, direction: Direction) {
        if self.neighbor(a, direction) != Some(b) {
            return;
        }
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return;
        };
        self.cells[ia].walls[direction.index()] = false;
        self.cells[ib].walls[direction.opposite().index()] = false;
    }

    /// Number of removed wall pairs
    pub fn passage_count(&self) -> usize {
        // Each passage is counted from its lower/right side only
        self.cells
            .iter()
            .map(|c| {
                [Direction::Right, Direction::Down]
                    .into_iter()
                    .filter(|d| !c.has_wall(*d) && self.neighbor(c.position, *d).is_some())
                    .count()
            })
            .sum()
    }

    pub fn visited_count(&self) -> usize {
        self.cells.iter().filter(|c| c.visited).count()
    }
}

/// ASCII preview, one text cell of three characters per maze cell
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.cells.chunks(self.width).map(|row| {
            let top = row
                .iter()
                .map(|c| if c.has_wall(Direction::Up) { "--+" } else { "  +" })
                .join("");
            let body = row
                .iter()
                .map(|c| {
                    let mark = if c.position == self.start {
                        " S"
                    } else if c.position == self.end {
                        " E"
                    } else {
                        "  "
                    };
                    let side = if c.has_wall(Direction::Right) { "|" } else { " " };
                    format!("{mark}{side}")
                })
                .join("");
            let left = if row[0].has_wall(Direction::Left) { "|" } else { " " };
            format!("+{top}\n{left}{body}")
        });
        let bottom = self.cells[self.cells.len() - self.width..]
            .iter()
            .map(|c| if c.has_wall(Direction::Down) { "--+" } else { "  +" })
            .join("");
        write!(f, "{}\n+{}", rows.format("\n"), bottom)
    }
}
