use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::cancel::CancelToken;
use crate::error::TerrainError;
use crate::grid::{direction_distances, in_grid, Grid, GridView, GridViewMut, DI, DJ};

/// How often `fill_sinks` polls its `CancelToken`, in priority-queue pops.
const CANCEL_CHECK_INTERVAL: u64 = 1 << 16;

/// A queued cell in the priority-flood, ordered so that a `BinaryHeap`
/// (a max-heap) yields the *smallest* `(z, seq)` pair first — the same
/// reversed-`Ord` trick the grounding codebase's own Wang & Liu
/// implementation uses for its min-priority queue.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FillCell {
    z: f32,
    seq: u64,
    row: i32,
    col: i32,
}

impl Eq for FillCell {}

impl Ord for FillCell {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .z
            .partial_cmp(&self.z)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FillCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fills topographic depressions using the Wang & Liu (2006) priority-flood
/// algorithm: every interior cell reachable from the grid boundary ends up
/// with a monotonically non-increasing path back to that boundary, with at
/// least `minslope` of drop per unit of horizontal distance between
/// consecutive cells on that path.
///
/// `z` and `z_out` share shape `(h, w)`; `z_out` receives the filled surface
/// (cells already draining at `minslope` or better keep their original
/// elevation — this never lowers a cell). Nodata cells are left untouched
/// and never contribute to, or receive, a fill.
pub fn fill_sinks(
    z: GridView<f32>,
    rx: f64,
    ry: f64,
    nodata_z: f32,
    minslope: f32,
    mut z_out: GridViewMut<f32>,
    cancel: Option<&CancelToken>,
) -> Result<(), TerrainError> {
    if !(rx > 0.0 && rx.is_finite()) {
        return Err(TerrainError::InvalidParameter(format!(
            "rx must be positive and finite, got {rx}"
        )));
    }
    if !(ry > 0.0 && ry.is_finite()) {
        return Err(TerrainError::InvalidParameter(format!(
            "ry must be positive and finite, got {ry}"
        )));
    }
    if !(minslope >= 0.0 && minslope.is_finite()) {
        return Err(TerrainError::InvalidParameter(format!(
            "minslope must be non-negative and finite, got {minslope}"
        )));
    }
    if !nodata_z.is_finite() {
        return Err(TerrainError::InvalidParameter(format!(
            "nodata_z must be finite, got {nodata_z}"
        )));
    }
    if z.shape() != z_out.shape() {
        return Err(TerrainError::InvalidShape {
            which: "fill_sinks: z_out",
            expected: z.shape(),
            actual: z_out.shape(),
        });
    }

    let (h, w) = z.shape();
    let d2d = direction_distances(rx, ry);
    let mindiff: [f32; 8] = {
        let mut m = [0f32; 8];
        for k in 0..8 {
            m[k] = (minslope as f64 * d2d[k]) as f32;
        }
        m
    };

    // Copy the source surface; only cells the flood visits are ever raised.
    for i in 0..h {
        for j in 0..w {
            z_out.set(i as i32, j as i32, z.get(i as i32, j as i32).unwrap());
        }
    }

    let mut visited: Grid<bool> = Grid::filled(h, w, false);
    let mut heap: BinaryHeap<FillCell> = BinaryHeap::new();
    let mut seq: u64 = 0;

    // Seed every non-nodata cell that has at least one neighbor which is
    // out-of-grid or itself nodata — not just the literal outer ring. A
    // nodata-edged DEM, or a cell bordering an interior nodata hole (a lake),
    // is just as much a drainage outlet as the raster's physical border.
    for i in 0..h as i32 {
        for j in 0..w as i32 {
            let zv = z.get(i, j).unwrap();
            if zv == nodata_z {
                continue;
            }
            let touches_edge_or_nodata = (0..8).any(|k| match z.get(i + DI[k], j + DJ[k]) {
                None => true,
                Some(nz) => nz == nodata_z,
            });
            if touches_edge_or_nodata {
                visited.set(i, j, true);
                heap.push(FillCell { z: zv, seq, row: i, col: j });
                seq += 1;
            }
        }
    }

    let mut pops: u64 = 0;
    while let Some(cell) = heap.pop() {
        pops += 1;
        if pops % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(TerrainError::Cancelled);
                }
            }
        }

        let current_z = z_out.get(cell.row, cell.col).unwrap();
        for k in 0..8 {
            let ni = cell.row + DI[k];
            let nj = cell.col + DJ[k];
            if !in_grid(h, w, ni, nj) || visited.get(ni, nj) == Some(true) {
                continue;
            }
            let Some(nz) = z.get(ni, nj) else { continue };
            visited.set(ni, nj, true);
            if nz == nodata_z {
                continue;
            }
            let raised = (current_z + mindiff[k]).max(nz);
            z_out.set(ni, nj, raised);
            heap.push(FillCell {
                z: raised,
                seq,
                row: ni,
                col: nj,
            });
            seq += 1;
        }
    }

    Ok(())
}
