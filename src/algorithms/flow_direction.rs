use crate::error::TerrainError;
use crate::grid::{direction_distances, GridView, GridViewMut, DI, DJ};

/// Computes a D8 flow-direction grid from a padded elevation grid.
///
/// `z` must carry a one-cell halo on every side (shape `(h + 2, w + 2)` for
/// an output of shape `(h, w)`); padding is the caller's responsibility —
/// passing an unpadded grid is a programmer error and is rejected with
/// [`TerrainError::InvalidShape`].
///
/// For each interior cell with a defined elevation, `f[i, j]` is set to
/// `1 << k` where `k` minimizes `(z[neighbor_k] - z[i, j]) / d2d[k]`, ties
/// broken in favor of the lowest `k` (the clockwise order N, NE, E, SE, S,
/// SW, W, NW). A cell keeps this direction even when every neighbor is
/// higher (an ascending cell) or exactly level — only a completely
/// nodata-surrounded cell, or a nodata cell itself, is assigned `0`.
///
/// `max_threads` bounds how many worker threads tile the row range; `None`
/// uses [`num_cpus::get`]. The call blocks until every tile has completed.
pub fn flow_direction(
    z: GridView<f32>,
    rx: f64,
    ry: f64,
    nodata_z: f32,
    mut f: GridViewMut<u8>,
    max_threads: Option<usize>,
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
    if !nodata_z.is_finite() {
        return Err(TerrainError::InvalidParameter(format!(
            "nodata_z must be finite, got {nodata_z}"
        )));
    }

    let (h, w) = f.shape();
    let expected_z_shape = (h + 2, w + 2);
    if z.shape() != expected_z_shape {
        return Err(TerrainError::InvalidShape {
            which: "flow_direction: z (expected a one-cell halo around f)",
            expected: expected_z_shape,
            actual: z.shape(),
        });
    }

    let d2d = direction_distances(rx, ry);
    let threads = max_threads.unwrap_or_else(num_cpus::get).max(1);
    let rows_per_chunk = (h + threads - 1) / threads.max(1);
    let rows_per_chunk = rows_per_chunk.max(1);

    let chunks = f.split_row_chunks_mut(rows_per_chunk);

    std::thread::scope(|scope| {
        for (row_offset, mut out_chunk) in chunks {
            let z = &z;
            scope.spawn(move || {
                for local_i in 0..out_chunk.height() {
                    let i = row_offset + local_i;
                    for j in 0..w {
                        let code = classify_cell(z, i, j, nodata_z, &d2d);
                        out_chunk.set(local_i as i32, j as i32, code);
                    }
                }
            });
        }
    });

    Ok(())
}

/// Classifies the flow direction of interior cell `(i, j)` (0-based, not
/// counting the halo) given the padded elevation view `z`.
#[inline]
fn classify_cell(z: &GridView<f32>, i: usize, j: usize, nodata_z: f32, d2d: &[f64; 8]) -> u8 {
    let zi = (i + 1) as i32;
    let zj = (j + 1) as i32;
    let center = z.get(zi, zj).expect("interior cell is within the padded view");
    if center == nodata_z {
        return 0;
    }

    let mut best_k: Option<usize> = None;
    let mut best_val = f64::INFINITY;
    for k in 0..8 {
        let Some(neighbor) = z.get(zi + DI[k], zj + DJ[k]) else {
            continue;
        };
        if neighbor == nodata_z {
            continue;
        }
        let val = (neighbor as f64 - center as f64) / d2d[k];
        if val < best_val {
            best_val = val;
            best_k = Some(k);
        }
    }

    match best_k {
        Some(k) => 1u8 << k,
        None => 0,
    }
}

#[cfg(test)]
mod test {
    use super::flow_direction;
    use crate::grid::{GridView, GridViewMut};

    fn pad(rows: &[Vec<f32>], nodata: f32) -> (Vec<f32>, usize, usize) {
        let h = rows.len();
        let w = rows[0].len();
        let mut out = vec![nodata; (h + 2) * (w + 2)];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                out[(i + 1) * (w + 2) + (j + 1)] = v;
            }
        }
        (out, h, w)
    }

    #[test]
    fn test_linear_slope_points_east() {
        // Z = [[3, 2, 1]], only the single interior cell (0, 1) has 8
        // defined neighbors to compare against; it descends steepest to the
        // east.
        let (data, h, w) = pad(&[vec![3.0, 2.0, 1.0]], -1.0);
        let z = GridView::new(&data, h + 2, w + 2).unwrap();
        let mut f = vec![0u8; h * w];
        {
            let fview = GridViewMut::new(&mut f, h, w).unwrap();
            flow_direction(z, 1.0, 1.0, -1.0, fview, Some(1)).unwrap();
        }
        assert_eq!(f[1], 4); // east
    }

    #[test]
    fn test_nodata_center_yields_zero() {
        let (data, h, w) = pad(&[vec![-1.0, -1.0, -1.0]], -1.0);
        let z = GridView::new(&data, h + 2, w + 2).unwrap();
        let mut f = vec![9u8; h * w];
        {
            let fview = GridViewMut::new(&mut f, h, w).unwrap();
            flow_direction(z, 1.0, 1.0, -1.0, fview, Some(1)).unwrap();
        }
        assert!(f.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_rejects_unpadded_input() {
        let data = vec![1.0f32; 9];
        let z = GridView::new(&data, 3, 3).unwrap();
        let mut f = vec![0u8; 9];
        let fview = GridViewMut::new(&mut f, 3, 3).unwrap();
        assert!(flow_direction(z, 1.0, 1.0, -1.0, fview, Some(1)).is_err());
    }

    #[test]
    fn test_rejects_non_positive_resolution() {
        let data = vec![1.0f32; 9];
        let z = GridView::new(&data, 3, 3).unwrap();
        let mut f = vec![0u8; 1];
        let fview = GridViewMut::new(&mut f, 1, 1).unwrap();
        assert!(flow_direction(z, 0.0, 1.0, -1.0, fview, Some(1)).is_err());
    }

    #[test]
    fn test_rejects_non_finite_nodata() {
        let data = vec![1.0f32; 9];
        let z = GridView::new(&data, 3, 3).unwrap();
        let mut f = vec![0u8; 1];
        let fview = GridViewMut::new(&mut f, 1, 1).unwrap();
        assert!(flow_direction(z, 1.0, 1.0, f32::NAN, fview, Some(1)).is_err());
    }

    #[test]
    fn test_flow_direction_exclusivity() {
        let rows = vec![
            vec![5.0, 4.0, 5.0],
            vec![4.0, 3.0, 4.0],
            vec![5.0, 4.0, 5.0],
        ];
        let (data, h, w) = pad(&rows, -1.0);
        let z = GridView::new(&data, h + 2, w + 2).unwrap();
        let mut f = vec![0u8; h * w];
        {
            let fview = GridViewMut::new(&mut f, h, w).unwrap();
            flow_direction(z, 1.0, 1.0, -1.0, fview, Some(2)).unwrap();
        }
        for &code in &f {
            assert!(code == 0 || code.is_power_of_two());
        }
    }
}
