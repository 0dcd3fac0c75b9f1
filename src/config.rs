//! Generation parameters and the generate, render, save pipeline

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::bmp::Image;
use crate::error::Result;
use crate::grid::{Grid, Point};
use crate::maze_generator::MazeGenerator;
use crate::render::{render_image, Palette};

/// Everything needed to produce one maze image
#[derive(Clone, Debug)]
pub struct MazeConfig {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    /// Cell edge length in pixels
    pub cell_size: u32,
    /// Requested wall thickness in pixels, clamped by [Grid::new]
    pub wall_thickness: u32,
    pub start: Point,
    pub end: Point,
    pub palette: Palette,
    /// Random seed; drawn from entropy when `None`
    pub seed: Option<u64>,
    /// Where the bitmap is written
    pub output: PathBuf,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            cell_size: 10,
            wall_thickness: 1,
            start: Point::new(0, 0),
            end: Point::new(19, 19),
            palette: Palette::default(),
            seed: None,
            output: PathBuf::from("output/maze.bmp"),
        }
    }
}

/// Outcome of [MazeConfig::run]
#[derive(Debug)]
pub struct MazeSummary {
    /// Seed actually used, so the maze can be reproduced
    pub seed: u64,
    pub grid: Grid,
    pub image: Image,
    pub output: PathBuf,
}

impl MazeConfig {
    /// Create the grid, carve the maze with `seed` and render it.
    pub fn build(&self, seed: u64) -> Result<(Grid, Image)> {
        let mut grid = Grid::new(
            self.width,
            self.height,
            self.cell_size,
            self.start,
            self.end,
            self.wall_thickness,
        )?;

        let timer = Instant::now();
        let passages = MazeGenerator::new(Some(seed)).generate(&mut grid)?;
        info!(
            passages = passages.len(),
            elapsed = ?timer.elapsed(),
            "generated {}x{} maze",
            self.width,
            self.height
        );

        let timer = Instant::now();
        let image = render_image(&grid, &self.palette)?;
        info!(
            width = image.width(),
            height = image.height(),
            elapsed = ?timer.elapsed(),
            "rendered maze"
        );
        Ok((grid, image))
    }

    /// Build the maze and save it to [Self::output], creating missing
    /// parent directories.
    pub fn run(&self) -> anyhow::Result<MazeSummary> {
        let seed = self.seed.unwrap_or_else(rand::random);
        info!(seed, "generating maze");

        let (grid, image) = self.build(seed).context("Could not build maze")?;

        if let Some(dir) = self.output.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create directory {}", dir.display()))?;
        }
        let timer = Instant::now();
        image
            .save(&self.output)
            .with_context(|| format!("Could not write {}", self.output.display()))?;
        info!(
            path = %self.output.display(),
            bytes = image.file_size(),
            elapsed = ?timer.elapsed(),
            "saved maze"
        );

        Ok(MazeSummary {
            seed,
            grid,
            image,
            output: self.output.clone(),
        })
    }
}
