use crate::cancel::CancelToken;
use crate::error::TerrainError;
use crate::grid::{in_grid, GridView, GridViewMut, DI, DJ, UPWARD};

/// How often `upslope`/`watershed` poll their `CancelToken`, in cells popped
/// off the traversal stack.
const CANCEL_CHECK_INTERVAL: u64 = 1 << 16;

/// Paints the upslope contributing area of `seed` with `basin_id`.
///
/// Walks the flow graph backwards: starting from `seed`, repeatedly visits
/// every neighbor whose flow direction points *into* the current cell
/// (`F[neighbor] == UPWARD[k]`). Cells are marked `-1` while still on the
/// traversal stack and finalized to `basin_id` once popped, matching
/// spec.md's basin-painting convention; a grid cell that is never reached is
/// left at whatever value `b` already held (`0` for a freshly zeroed grid).
///
/// Returns the number of cells painted. `seed` outside the grid is rejected
/// with [`TerrainError::OutOfGridSeed`].
pub fn upslope(
    f: GridView<u8>,
    seed: (i32, i32),
    basin_id: i32,
    mut b: GridViewMut<i32>,
    cancel: Option<&CancelToken>,
) -> Result<u64, TerrainError> {
    let (h, w) = f.shape();
    if b.shape() != (h, w) {
        return Err(TerrainError::InvalidShape {
            which: "upslope: b",
            expected: (h, w),
            actual: b.shape(),
        });
    }
    let (si, sj) = seed;
    if !in_grid(h, w, si, sj) {
        return Err(TerrainError::OutOfGridSeed {
            row: si,
            col: sj,
            height: h,
            width: w,
        });
    }

    traverse_upslope(f, si, sj, basin_id, &mut b, cancel)
}

/// Shared DFS core: marks cells `-1` on entry and `basin_id` on exit,
/// pushing every cell found to flow into the current one.
fn traverse_upslope(
    f: GridView<u8>,
    si: i32,
    sj: i32,
    basin_id: i32,
    b: &mut GridViewMut<i32>,
    cancel: Option<&CancelToken>,
) -> Result<u64, TerrainError> {
    let (h, w) = f.shape();
    let mut stack: Vec<(i32, i32)> = vec![(si, sj)];
    b.set(si, sj, -1);
    let mut painted: u64 = 0;
    let mut pops: u64 = 0;

    while let Some((i, j)) = stack.pop() {
        pops += 1;
        if pops % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(TerrainError::Cancelled);
                }
            }
        }

        b.set(i, j, basin_id);
        painted += 1;

        for k in 0..8 {
            let ni = i + DI[k];
            let nj = j + DJ[k];
            if !in_grid(h, w, ni, nj) {
                continue;
            }
            let Some(fn_code) = f.get(ni, nj) else { continue };
            if fn_code != UPWARD[k] {
                continue;
            }
            if b.get(ni, nj) != Some(0) {
                continue; // already visited or already on the stack
            }
            b.set(ni, nj, -1);
            stack.push((ni, nj));
        }
    }

    Ok(painted)
}

/// Delineates the watershed draining through an arbitrary seed cell.
///
/// First walks *downstream* from `seed` along `f` until it either runs off
/// the grid or lands on a cell whose own flow direction is `0` (a true
/// outlet). It then runs the same upslope traversal as [`upslope`] from that
/// last in-grid cell — since `seed` flows into it by construction, the
/// backward traversal rediscovers the downstream path on its way to `seed`
/// and everything draining into it, so the two walks need not both paint.
///
/// Returns the total number of cells painted. `seed` outside the grid is
/// rejected with [`TerrainError::OutOfGridSeed`].
pub fn watershed(
    f: GridView<u8>,
    seed: (i32, i32),
    basin_id: i32,
    mut b: GridViewMut<i32>,
    cancel: Option<&CancelToken>,
) -> Result<u64, TerrainError> {
    let (h, w) = f.shape();
    if b.shape() != (h, w) {
        return Err(TerrainError::InvalidShape {
            which: "watershed: b",
            expected: (h, w),
            actual: b.shape(),
        });
    }
    let (si, sj) = seed;
    if !in_grid(h, w, si, sj) {
        return Err(TerrainError::OutOfGridSeed {
            row: si,
            col: sj,
            height: h,
            width: w,
        });
    }

    let mut i = si;
    let mut j = sj;
    loop {
        let Some(code) = f.get(i, j) else { break };
        if code == 0 {
            break;
        }
        let k = code.trailing_zeros() as usize;
        let ni = i + DI[k];
        let nj = j + DJ[k];
        if !in_grid(h, w, ni, nj) {
            break;
        }
        i = ni;
        j = nj;
    }

    traverse_upslope(f, i, j, basin_id, &mut b, cancel)
}
