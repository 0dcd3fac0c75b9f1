//! Error type shared by the maze, stack and bitmap modules

use std::collections::TryReserveError;
use std::io;

/// Failures reported by the core library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected construction parameters (dimensions, coordinates, cell size)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A grid, stack or pixel buffer could not be allocated
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// Push onto a bounded stack that is already full
    #[error("stack capacity of {0} exceeded")]
    CapacityExceeded(usize),

    /// Bitmap data that this codec does not understand
    #[error("unsupported bitmap: {0}")]
    Format(String),

    /// File could not be opened, read or written
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
