//! CLI for maze generation

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use maze_bmp::{Image, MazeConfig, Palette, Point, Rgb};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Generate a perfect maze and save it as a BMP image
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maze width in cells
    #[arg(long, default_value_t = 20)]
    width: usize,

    /// Maze height in cells
    #[arg(long, default_value_t = 20)]
    height: usize,

    /// Cell edge length in pixels
    #[arg(short, long, default_value_t = 10)]
    cell_size: u32,

    /// Wall thickness in pixels, at most half the cell size
    #[arg(short = 't', long, default_value_t = 1)]
    wall_thickness: u32,

    /// Start cell as `x,y`
    #[arg(long, default_value = "0,0")]
    start: Point,

    /// End cell as `x,y`. Defaults to the bottom-right cell.
    #[arg(long)]
    end: Option<Point>,

    /// Background color (`#rrggbb` or `r,g,b`)
    #[arg(long, default_value = "#c8c8c8")]
    background: Rgb,

    /// Wall color
    #[arg(long, default_value = "#323232")]
    wall: Rgb,

    /// Start cell color
    #[arg(long, default_value = "#00ffff")]
    start_color: Rgb,

    /// End cell color
    #[arg(long, default_value = "#ff0000")]
    end_color: Rgb,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print an ASCII preview of the maze
    #[arg(short, long)]
    print: bool,

    /// Read the written file back and compare it with the rendered image
    #[arg(long)]
    verify: bool,

    /// Output file
    #[arg(short, long, default_value = "output/maze.bmp")]
    output: PathBuf,
}

impl Args {
    fn config(&self) -> anyhow::Result<MazeConfig> {
        let end = match self.end {
            Some(end) => end,
            None => Point::new(
                self.width.checked_sub(1).context("Width must be positive")?,
                self.height.checked_sub(1).context("Height must be positive")?,
            ),
        };
        Ok(MazeConfig {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            wall_thickness: self.wall_thickness,
            start: self.start,
            end,
            palette: Palette {
                background: self.background,
                wall: self.wall,
                start: self.start_color,
                end: self.end_color,
            },
            seed: self.seed,
            output: self.output.clone(),
        })
    }
}

/// `RUST_LOG` style directives, `info` when none are given
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Generate maze, write bitmap
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            &std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default(),
        ))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let summary = args.config()?.run()?;

    if args.print {
        println!("{}", summary.grid);
    }
    if args.verify {
        let loaded = Image::load(&summary.output)
            .with_context(|| format!("Could not read back {}", summary.output.display()))?;
        if loaded != summary.image {
            bail!("{} does not match the rendered maze", summary.output.display());
        }
        tracing::info!("verified {}", summary.output.display());
    }
    println!("Maze written to {} (seed {})", summary.output.display(), summary.seed);
    Ok(())
}
