//! Core hydrological terrain-analysis algorithms over in-memory grids: sink
//! filling, D8 flow direction, upslope/watershed delineation, Strahler
//! stream ordering, and channel network extraction.
//!
//! This crate has no knowledge of rasters, vectors, or coordinate reference
//! systems — it operates on dense 2-D grids the caller already holds in
//! memory, and returns dense grids or grid-coordinate feature lists in turn.

pub mod algorithms;
pub mod cancel;
pub mod error;
pub mod grid;

pub use crate::algorithms::{channels, fill_sinks, flow_direction, strahler, upslope, watershed, ChannelNetwork};
pub use crate::cancel::CancelToken;
pub use crate::error::TerrainError;
pub use crate::grid::{Grid, GridView, GridViewMut};
