use crate::cancel::CancelToken;
use crate::error::TerrainError;
use crate::grid::{in_grid, Grid, GridView, GridViewMut, DI, DJ};

/// How often `strahler` polls its `CancelToken`, in processed cells.
const CANCEL_CHECK_INTERVAL: u64 = 1 << 16;

/// Assigns a Horton–Strahler stream order to every non-nodata cell of `o`.
///
/// Cells are visited once, from the highest elevation down to the lowest —
/// a stable sort by elevation gives a total order consistent with any
/// acyclic flow graph, since every cell's single downstream neighbor is
/// guaranteed to sort no higher than the cell itself. Each cell starts at
/// order 1; when two or more inflows of the same order `n` meet at a cell,
/// that cell is promoted to order `n + 1` (tracked via an auxiliary
/// `count` grid of same-order confluences seen so far).
///
/// Nodata cells (`z == nodata_z`) are skipped and left at order `0`; this
/// is the only way `0` appears in `o`.
pub fn strahler(
    z: GridView<f32>,
    f: GridView<u8>,
    nodata_z: f32,
    mut o: GridViewMut<u8>,
    cancel: Option<&CancelToken>,
) -> Result<(), TerrainError> {
    if !nodata_z.is_finite() {
        return Err(TerrainError::InvalidParameter(format!(
            "nodata_z must be finite, got {nodata_z}"
        )));
    }

    let (h, w) = z.shape();
    if f.shape() != (h, w) {
        return Err(TerrainError::InvalidShape {
            which: "strahler: f",
            expected: (h, w),
            actual: f.shape(),
        });
    }
    if o.shape() != (h, w) {
        return Err(TerrainError::InvalidShape {
            which: "strahler: o",
            expected: (h, w),
            actual: o.shape(),
        });
    }

    let n = h * w;
    let mut order: Vec<(f32, usize)> = Vec::with_capacity(n);
    for i in 0..h {
        for j in 0..w {
            let zv = z.get(i as i32, j as i32).unwrap();
            order.push((zv, i * w + j));
            o.set(i as i32, j as i32, if zv == nodata_z { 0 } else { 1 });
        }
    }
    // A stable sort preserves row-major order among equal elevations,
    // matching the reference implementation's stable `argsort`.
    order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut count: Grid<u8> = Grid::filled(h, w, 0);
    let mut processed: u64 = 0;

    for &(zv, flat) in order.iter().rev() {
        processed += 1;
        if processed % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(TerrainError::Cancelled);
                }
            }
        }

        if zv == nodata_z {
            continue;
        }
        let i = (flat / w) as i32;
        let j = (flat % w) as i32;

        if count[(i as usize, j as usize)] > 1 {
            let here = o.get(i, j).unwrap();
            o.set(i, j, here + 1);
        }

        let code = f.get(i, j).unwrap();
        if code == 0 {
            continue;
        }
        let k = code.trailing_zeros() as usize;
        let ix = i + DI[k];
        let jx = j + DJ[k];
        if !in_grid(h, w, ix, jx) {
            continue;
        }

        let here = o.get(i, j).unwrap();
        let down = o.get(ix, jx).unwrap();
        if here > down {
            o.set(ix, jx, here);
            count[(ix as usize, jx as usize)] = 1;
        } else if here == down {
            count[(ix as usize, jx as usize)] += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::strahler;
    use crate::grid::{GridView, GridViewMut};

    // Two headwater branches (order 1) join at (1, 1), becoming order 2,
    // then drain south to the outlet at (2, 1), which stays order 2.
    //
    //   9  8  9       .  S  .
    //   8  5  8  -->  W  .  E   (flow direction)
    //   9  4  9       .  S  .
    #[test]
    fn test_t_junction_promotes_confluence() {
        #[rustfmt::skip]
        let z = [
            9.0f32, 8.0, 9.0,
            8.0,    5.0, 8.0,
            9.0,    4.0, 9.0,
        ];
        #[rustfmt::skip]
        let f = [
            0u8, 16, 0,
            64,  16, 4,
            0,   16, 0,
        ];
        let zv = GridView::new(&z, 3, 3).unwrap();
        let fv = GridView::new(&f, 3, 3).unwrap();
        let mut o = [0u8; 9];
        {
            let ov = GridViewMut::new(&mut o, 3, 3).unwrap();
            strahler(zv, fv, -9999.0, ov, None).unwrap();
        }
        assert_eq!(o[1], 1); // north headwater
        assert_eq!(o[3], 1); // west headwater
        assert_eq!(o[4], 2); // confluence
        assert_eq!(o[7], 2); // outlet, order unchanged downstream
    }

    #[test]
    fn test_nodata_cells_stay_zero() {
        #[rustfmt::skip]
        let z = [
            1.0f32, 2.0,     3.0,
        ];
        let z = [z[0], z[1], -9999.0];
        let zv = GridView::new(&z, 1, 3).unwrap();
        let f = [4u8, 0, 0]; // (0,1) does not flow into the nodata cell
        let fv = GridView::new(&f, 1, 3).unwrap();
        let mut o = [9u8; 3];
        {
            let ov = GridViewMut::new(&mut o, 1, 3).unwrap();
            strahler(zv, fv, -9999.0, ov, None).unwrap();
        }
        assert_eq!(o[2], 0);
        assert_eq!(o[0], 1);
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let z = [1.0f32; 4];
        let zv = GridView::new(&z, 2, 2).unwrap();
        let f = [0u8; 6];
        let fv = GridView::new(&f, 2, 3).unwrap();
        let mut o = [0u8; 4];
        let ov = GridViewMut::new(&mut o, 2, 2).unwrap();
        assert!(strahler(zv, fv, -9999.0, ov, None).is_err());
    }

    #[test]
    fn test_rejects_non_finite_nodata() {
        let z = [1.0f32; 4];
        let zv = GridView::new(&z, 2, 2).unwrap();
        let f = [0u8; 4];
        let fv = GridView::new(&f, 2, 2).unwrap();
        let mut o = [0u8; 4];
        let ov = GridViewMut::new(&mut o, 2, 2).unwrap();
        assert!(strahler(zv, fv, f32::NAN, ov, None).is_err());
    }
}
