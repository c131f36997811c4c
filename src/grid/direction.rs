/// D8 search directions, clockwise starting from north.
///
/// ```text
/// index:  0   1   2   3   4   5   6   7
/// dir:    N  NE   E  SE   S  SW   W  NW
/// code:   1   2   4   8  16  32  64 128
/// ```
/// `(DI[k], DJ[k])` is the `(row, col)` offset of direction `k`; the D8 code
/// for direction `k` is `1 << k`.
pub const DI: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];
pub const DJ: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];

/// `UPWARD[k]` is the D8 code that the neighbor at offset `(DI[k], DJ[k])`
/// must carry for that neighbor to be flowing into the current cell, i.e.
/// `UPWARD[k] = 2^((k+4) mod 8)` — the direction code pointing back the other
/// way around the compass.
pub const UPWARD: [u8; 8] = [16, 32, 64, 128, 1, 2, 4, 8];

/// D8 direction code (`1 << k`) for search index `k`.
#[inline]
pub fn code(k: usize) -> u8 {
    1u8 << k
}

/// Returns `true` if `(i, j)` falls within a grid of the given shape.
#[inline]
pub fn in_grid(height: usize, width: usize, i: i32, j: i32) -> bool {
    i >= 0 && (i as usize) < height && j >= 0 && (j as usize) < width
}

/// The 3x3 matrix of Euclidean distances from the center cell to each of its
/// 8 neighbors (plus itself), for cell resolutions `(rx, ry)`. The center
/// element, which would otherwise be `0`, is replaced by `1` so that it can
/// be used directly as a divisor in gradient calculations.
pub fn distance_2d(rx: f64, ry: f64) -> [[f64; 3]; 3] {
    let mut d = [[0f64; 3]; 3];
    for (r, row) in d.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            let di = r as f64 - 1.0;
            let dj = c as f64 - 1.0;
            *cell = ((rx * dj).powi(2) + (ry * di).powi(2)).sqrt();
        }
    }
    d[1][1] = 1.0;
    d
}

/// Per-direction 2D distance `d2d[k]`, indexed the same way as [`DI`]/[`DJ`],
/// for cell resolutions `(rx, ry)`. Equivalent to reading [`distance_2d`] at
/// `(1 + DI[k], 1 + DJ[k])`, but computed directly without the unused corner
/// of the 3x3 matrix the D8 neighborhood skips.
pub fn direction_distances(rx: f64, ry: f64) -> [f64; 8] {
    let mut out = [0f64; 8];
    for (k, slot) in out.iter_mut().enumerate() {
        *slot = ((rx * DJ[k] as f64).powi(2) + (ry * DI[k] as f64).powi(2)).sqrt();
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_in_grid() {
        assert!(in_grid(5, 5, 0, 0));
        assert!(in_grid(5, 5, 4, 4));
        assert!(!in_grid(5, 5, -1, 0));
        assert!(!in_grid(5, 5, 0, 5));
        assert!(!in_grid(5, 5, 5, 0));
    }

    #[test]
    fn test_distance_2d_unit_cells() {
        let d = distance_2d(1.0, 1.0);
        assert_eq!(d[1][1], 1.0);
        assert_relative_eq!(d[0][1], 1.0, epsilon = 1e-12); // N
        assert_relative_eq!(d[0][0], 2f64.sqrt(), epsilon = 1e-12); // NW
    }

    #[test]
    fn test_direction_distances_match_matrix() {
        let rx = 2.0;
        let ry = 3.0;
        let mat = distance_2d(rx, ry);
        let per_dir = direction_distances(rx, ry);
        for k in 0..8 {
            let i = (1 + DI[k]) as usize;
            let j = (1 + DJ[k]) as usize;
            assert_relative_eq!(mat[i][j], per_dir[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_upward_table_is_involution() {
        // Walking direction k and looking back should land on the opposite code.
        for k in 0..8 {
            let opposite = (k + 4) % 8;
            assert_eq!(UPWARD[k], code(opposite));
        }
    }
}
