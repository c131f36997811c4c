use crate::error::TerrainError;
use crate::grid::{in_grid, GridView, DI, DJ, UPWARD};

/// The outlets, confluences, and traced polyline segments of a channel
/// network, in grid coordinates `(row, col)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelNetwork {
    pub outlets: Vec<(i32, i32)>,
    pub confluences: Vec<(i32, i32)>,
    pub segments: Vec<Vec<(i32, i32)>>,
}

/// Extracts outlets, confluences, and downstream-traced polyline segments
/// from a channel mask `c` routed by the D8 flow grid `f`.
///
/// A channel cell is a **source** if no channel neighbor flows into it, a
/// **confluence** if two or more do, and an **outlet** if it has no flow
/// direction, or its downstream neighbor is off-grid or not itself a
/// channel cell. A cell can be both a source and an outlet (an isolated
/// channel cell) or both a confluence and an outlet.
///
/// Segments are traced downstream starting at every source and every
/// confluence, and end (inclusive) at the next confluence or outlet. This
/// means every channel cell belongs to exactly one segment: the one
/// segment whose trace passes through it. Segments shorter than
/// `min_length` cells are dropped from the output, but the classification
/// of their endpoints as outlets/confluences is unaffected.
pub fn channels(
    f: GridView<u8>,
    c: GridView<bool>,
    min_length: u32,
) -> Result<ChannelNetwork, TerrainError> {
    let (h, w) = f.shape();
    if c.shape() != (h, w) {
        return Err(TerrainError::InvalidShape {
            which: "channels: c",
            expected: (h, w),
            actual: c.shape(),
        });
    }
    if min_length == 0 {
        return Err(TerrainError::InvalidParameter(
            "min_length must be at least 1".to_string(),
        ));
    }

    let mut outlets = Vec::new();
    let mut confluences = Vec::new();
    let mut sources = Vec::new();

    for i in 0..h as i32 {
        for j in 0..w as i32 {
            if c.get(i, j) != Some(true) {
                continue;
            }

            let inflow = count_channel_inflow(f, c, i, j);
            if inflow == 0 {
                sources.push((i, j));
            }
            if inflow >= 2 {
                confluences.push((i, j));
            }
            if is_outlet(f, c, h, w, i, j) {
                outlets.push((i, j));
            }
        }
    }

    let is_confluence_cell = |i: i32, j: i32| confluences.contains(&(i, j));

    let mut segments = Vec::new();
    for &start in sources.iter().chain(confluences.iter()) {
        let segment = trace_segment(f, c, h, w, start, &is_confluence_cell);
        if segment.len() as u32 >= min_length {
            segments.push(segment);
        }
    }

    Ok(ChannelNetwork {
        outlets,
        confluences,
        segments,
    })
}

/// Counts channel neighbors of `(i, j)` whose flow direction points into it.
fn count_channel_inflow(f: GridView<u8>, c: GridView<bool>, i: i32, j: i32) -> usize {
    let (h, w) = f.shape();
    let mut n = 0;
    for k in 0..8 {
        let ni = i + DI[k];
        let nj = j + DJ[k];
        if !in_grid(h, w, ni, nj) {
            continue;
        }
        if c.get(ni, nj) != Some(true) {
            continue;
        }
        if f.get(ni, nj) == Some(UPWARD[k]) {
            n += 1;
        }
    }
    n
}

/// True if `(i, j)` has no downstream channel neighbor to continue into.
fn is_outlet(f: GridView<u8>, c: GridView<bool>, h: usize, w: usize, i: i32, j: i32) -> bool {
    let Some(code) = f.get(i, j) else { return true };
    if code == 0 {
        return true;
    }
    let k = code.trailing_zeros() as usize;
    let ni = i + DI[k];
    let nj = j + DJ[k];
    !in_grid(h, w, ni, nj) || c.get(ni, nj) != Some(true)
}

/// Walks downstream from `start` cell by cell, stopping (inclusive) at the
/// next confluence or outlet.
fn trace_segment(
    f: GridView<u8>,
    c: GridView<bool>,
    h: usize,
    w: usize,
    start: (i32, i32),
    is_confluence_cell: &dyn Fn(i32, i32) -> bool,
) -> Vec<(i32, i32)> {
    let mut path = vec![start];
    let (mut i, mut j) = start;

    loop {
        let code = f.get(i, j).unwrap_or(0);
        if code == 0 {
            break;
        }
        let k = code.trailing_zeros() as usize;
        let ni = i + DI[k];
        let nj = j + DJ[k];
        if !in_grid(h, w, ni, nj) || c.get(ni, nj) != Some(true) {
            break;
        }
        path.push((ni, nj));
        if is_confluence_cell(ni, nj) {
            break;
        }
        i = ni;
        j = nj;
    }

    path
}
