//! Generate perfect mazes and save them as 24-bit BMP images
//!
//! A [Grid] of walled cells is carved by [MazeGenerator] with a randomized
//! depth-first search, painted into an [Image] by [render], and written with
//! [Image::save].
//!
//! # Examples
//! ## Generate and render a maze
//! ```
//! use maze_bmp::{render_image, Grid, MazeGenerator, Palette, Point};
//!
//! let mut grid = Grid::new(3, 3, 10, Point::new(0, 0), Point::new(2, 2), 1).unwrap();
//! let passages = MazeGenerator::new(Some(42)).generate(&mut grid).unwrap();
//! assert_eq!(passages.len(), 8);
//!
//! let image = render_image(&grid, &Palette::default()).unwrap();
//! assert_eq!((image.width(), image.height()), (30, 30));
//! println!("{grid}");
//! ```
//!
//! ## Encode and decode a bitmap
//! ```
//! use std::io::Cursor;
//! use maze_bmp::{Image, Rgb};
//!
//! let mut image = Image::new(5, 2).unwrap();
//! image.set_pixel(4, 1, Rgb::new(10, 20, 30));
//!
//! let mut bytes = vec![];
//! image.encode(&mut bytes).unwrap();
//! assert_eq!(bytes.len(), 14 + 40 + (5 * 3 + 1) * 2);
//!
//! let decoded = Image::decode(&mut Cursor::new(bytes)).unwrap();
//! assert_eq!(decoded, image);
//! ```

pub mod bmp;
pub mod config;
pub mod error;
pub mod grid;
pub mod maze_generator;
pub mod render;
pub mod stack;

pub use bmp::{Image, Rgb};
pub use config::{MazeConfig, MazeSummary};
pub use error::{Error, Result};
pub use grid::{Cell, Direction, Grid, Point};
pub use maze_generator::{MazeGenerator, Passage};
pub use render::{render, render_image, Palette};
pub use stack::Stack;
