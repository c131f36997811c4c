use thiserror::Error;

/// Errors returned by the public entry points of this crate.
///
/// Nodata is expected data, not an error condition; it is never represented
/// here. These variants only cover malformed inputs and cooperative
/// cancellation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error(
        "grid shape mismatch: expected {expected:?}, found {actual:?} for `{which}`"
    )]
    InvalidShape {
        which: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(
        "seed ({row}, {col}) is outside the grid bounds ({height} x {width})"
    )]
    OutOfGridSeed {
        row: i32,
        col: i32,
        height: usize,
        width: usize,
    },

    #[error("operation cancelled")]
    Cancelled,
}
