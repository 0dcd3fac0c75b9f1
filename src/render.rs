//! Maze rendering into a pixel buffer

use itertools::iproduct;
use tracing::{debug, warn};

use crate::bmp::{Image, Rgb};
use crate::error::Result;
use crate::grid::{Cell, Direction, Grid, Point};

/// Colors used when painting a maze
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Palette {
    pub background: Rgb,
    pub wall: Rgb,
    /// Fill of the start cell, inside its walls
    pub start: Rgb,
    /// Fill of the end cell, inside its walls
    pub end: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::WHITE,
            wall: Rgb::BLACK,
            start: Rgb::new(0, 255, 0),
            end: Rgb::new(0, 0, 255),
        }
    }
}

/// Inclusive pixel rectangle. Coordinates may fall outside the image.
#[derive(Clone, Copy, Debug)]
struct Rect {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl Rect {
    fn fill(self, image: &mut Image, color: Rgb) {
        for (y, x) in iproduct!(self.y0..=self.y1, self.x0..=self.x1) {
            image.set_pixel(x, y, color);
        }
    }
}

/// Allocate an image of the grid's pixel size and render the maze into it
pub fn render_image(grid: &Grid, palette: &Palette) -> Result<Image> {
    let mut image = Image::new(grid.pixel_width(), grid.pixel_height())?;
    render(grid, palette, &mut image);
    Ok(image)
}

/// Paint `grid` onto `image`.
///
/// The image is expected to be `width * cell_size` by
/// `height * cell_size` pixels; anything falling outside it is clipped.
/// Start and end markers are painted last so walls never cover them.
pub fn render(grid: &Grid, palette: &Palette, image: &mut Image) {
    if (image.width(), image.height()) != (grid.pixel_width(), grid.pixel_height()) {
        warn!(
            image_width = image.width(),
            image_height = image.height(),
            maze_width = grid.pixel_width(),
            maze_height = grid.pixel_height(),
            "image size does not match maze, output will be clipped"
        );
    }
    debug!(
        cell_size = grid.cell_size(),
        wall_thickness = grid.wall_thickness(),
        "rendering maze"
    );

    image.fill(palette.background);

    for cell in grid.cells() {
        paint_cell(grid, palette, image, cell);
    }

    paint_marker(grid, image, grid.start(), palette.start);
    paint_marker(grid, image, grid.end(), palette.end);
}

/// Pixel bounds of the cell at `point`
fn cell_rect(grid: &Grid, point: Point) -> Rect {
    let size = i64::from(grid.cell_size());
    let x0 = point.x as i64 * size;
    let y0 = point.y as i64 * size;
    Rect {
        x0,
        y0,
        x1: x0 + size - 1,
        y1: y0 + size - 1,
    }
}

/// Background block plus one stripe per standing wall
fn paint_cell(grid: &Grid, palette: &Palette, image: &mut Image, cell: &Cell) {
    let bounds = cell_rect(grid, cell.position());
    bounds.fill(image, palette.background);

    let t = i64::from(grid.wall_thickness());
    for direction in Direction::ALL {
        if !cell.has_wall(direction) {
            continue;
        }
        let stripe = match direction {
            Direction::Up => Rect {
                y1: bounds.y0 + t - 1,
                ..bounds
            },
            Direction::Down => Rect {
                y0: bounds.y1 - t + 1,
                ..bounds
            },
            Direction::Left => Rect {
                x1: bounds.x0 + t - 1,
                ..bounds
            },
            Direction::Right => Rect {
                x0: bounds.x1 - t + 1,
                ..bounds
            },
        };
        stripe.fill(image, palette.wall);
    }
}

/// Fill the inside of a cell, leaving `wall_thickness` pixels on each side
fn paint_marker(grid: &Grid, image: &mut Image, point: Point, color: Rgb) {
    let t = i64::from(grid.wall_thickness());
    let bounds = cell_rect(grid, point);
    Rect {
        x0: bounds.x0 + t,
        y0: bounds.y0 + t,
        x1: bounds.x1 - t,
        y1: bounds.y1 - t,
    }
    .fill(image, color);
}
