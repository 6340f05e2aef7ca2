//! LU factorization of the Newton iteration matrix.
//!
//! The iteration matrix of a chain-like system is banded. Factoring with
//! partial pivoting keeps the lower bandwidth `b` of `L` per elimination step
//! and widens the upper bandwidth of `U` to at most `2b`, so elimination only
//! has to touch a `b × 2b` window per pivot.
//!
//! Row interchanges only move the not yet eliminated columns. Each column of
//! `L` therefore keeps the multipliers exactly where its elimination step
//! left them, at most `b` rows below the diagonal, and the solve replays the
//! interchanges one step at a time inside the same band.

use nalgebra::{DMatrix, DVector};

/// The matrix has no usable pivot in column `pivot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SingularMatrix {
    pub pivot: usize,
}

/// Pivot magnitude below which the matrix is treated as singular.
const SINGULAR_PIVOT: f64 = 1e-300;

/// Lower bandwidth of `L` and upper bandwidth of `U` for an `n × n` matrix.
fn factor_bandwidths(n: usize, half_bandwidth: Option<usize>) -> (usize, usize) {
    match half_bandwidth {
        Some(b) => (b.min(n), (2 * b).min(n)),
        None => (n, n),
    }
}

/// Factor `A` in place into unit lower multipliers and `U`, recording the
/// pivot row of every elimination step in `piv`.
///
/// `half_bandwidth = Some(b)` restricts elimination to the band; entries
/// outside it must be zero. `None` factors a dense matrix. Pass the same
/// `half_bandwidth` to [`lu_solve_factored`].
pub(crate) fn lu_factor_in_place(
    a: &mut DMatrix<f64>,
    piv: &mut [usize],
    half_bandwidth: Option<usize>,
) -> Result<(), SingularMatrix> {
    let n = a.nrows();
    let (lower, upper) = factor_bandwidths(n, half_bandwidth);

    for k in 0..n {
        let row_end = (k + lower + 1).min(n);
        let col_end = (k + upper + 1).min(n);

        let mut pivot_row = k;
        let mut pivot_abs = a[(k, k)].abs();
        for i in (k + 1)..row_end {
            if a[(i, k)].abs() > pivot_abs {
                pivot_abs = a[(i, k)].abs();
                pivot_row = i;
            }
        }
        if !(pivot_abs > SINGULAR_PIVOT) {
            return Err(SingularMatrix { pivot: k });
        }
        piv[k] = pivot_row;

        if pivot_row != k {
            for j in k..col_end {
                a.swap((k, j), (pivot_row, j));
            }
        }

        let pivot = a[(k, k)];
        for i in (k + 1)..row_end {
            let factor = a[(i, k)] / pivot;
            a[(i, k)] = factor;
            if factor != 0.0 {
                for j in (k + 1)..col_end {
                    a[(i, j)] -= factor * a[(k, j)];
                }
            }
        }
    }
    Ok(())
}

/// Solve `A·x = b` from the factors of [`lu_factor_in_place`], overwriting
/// `x` (holding `b` on entry).
#[allow(clippy::needless_range_loop)]
pub(crate) fn lu_solve_factored(
    a: &DMatrix<f64>,
    piv: &[usize],
    half_bandwidth: Option<usize>,
    x: &mut DVector<f64>,
) {
    let n = a.nrows();
    let (lower, upper) = factor_bandwidths(n, half_bandwidth);

    // Replay interchanges and eliminations column by column
    for k in 0..n {
        if piv[k] != k {
            x.swap_rows(k, piv[k]);
        }
        let xk = x[k];
        if xk != 0.0 {
            for i in (k + 1)..(k + lower + 1).min(n) {
                x[i] -= a[(i, k)] * xk;
            }
        }
    }

    for i in (0..n).rev() {
        let mut sum = x[i];
        for j in (i + 1)..(i + upper + 1).min(n) {
            sum -= a[(i, j)] * x[j];
        }
        x[i] = sum / a[(i, i)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Tridiagonal-ish banded test matrix with a weak diagonal to force pivoting.
    fn banded(n: usize, b: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, n, |i, j| {
            if i.abs_diff(j) > b {
                0.0
            } else if i == j {
                0.1 + i as f64 * 0.01
            } else {
                1.0 + ((i * 7 + j * 3) % 5) as f64
            }
        })
    }

    #[test]
    fn test_dense_solve_matches_nalgebra() {
        let a = banded(12, 3);
        let rhs = DVector::from_fn(12, |i, _| (i as f64).sin());
        let expected = a.clone().lu().solve(&rhs).unwrap();

        let mut factors = a;
        let mut piv = vec![0; 12];
        lu_factor_in_place(&mut factors, &mut piv, None).unwrap();
        let mut x = rhs;
        lu_solve_factored(&factors, &piv, None, &mut x);

        for i in 0..12 {
            assert_relative_eq!(x[i], expected[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_banded_solve_matches_dense() {
        let a = banded(30, 5);
        let rhs = DVector::from_fn(30, |i, _| 1.0 + i as f64);

        let mut dense = a.clone();
        let mut piv_dense = vec![0; 30];
        lu_factor_in_place(&mut dense, &mut piv_dense, None).unwrap();
        let mut x_dense = rhs.clone();
        lu_solve_factored(&dense, &piv_dense, None, &mut x_dense);

        let mut band = a.clone();
        let mut piv_band = vec![0; 30];
        lu_factor_in_place(&mut band, &mut piv_band, Some(5)).unwrap();
        let mut x_band = rhs.clone();
        lu_solve_factored(&band, &piv_band, Some(5), &mut x_band);

        let residual = &a * &x_band - &rhs;
        assert!(residual.amax() < 1e-9);
        for i in 0..30 {
            assert_relative_eq!(x_band[i], x_dense[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_singular_rejected() {
        let mut a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let mut piv = vec![0; 2];
        let err = lu_factor_in_place(&mut a, &mut piv, None).unwrap_err();
        assert_eq!(err, SingularMatrix { pivot: 1 });
    }

    #[test]
    fn test_band_factors_stay_in_band() {
        let n = 40;
        let b = 3;
        let a = banded(n, b);
        let mut factors = a.clone();
        let mut piv = vec![0; n];
        lu_factor_in_place(&mut factors, &mut piv, Some(b)).unwrap();

        // Pivoting must actually have happened for this matrix
        assert!(piv.iter().enumerate().any(|(k, &p)| p != k));
        for i in 0..n {
            for j in 0..n {
                if j + b < i || i + 2 * b < j {
                    assert_eq!(factors[(i, j)], 0.0, "fill outside band at ({i}, {j})");
                }
            }
        }

        for seed in 0..3 {
            let rhs = DVector::from_fn(n, |i, _| ((i + seed) as f64 * 0.7).cos());
            let mut x = rhs.clone();
            lu_solve_factored(&factors, &piv, Some(b), &mut x);
            assert!((&a * &x - &rhs).amax() < 1e-9);
        }
    }

    #[test]
    fn test_bandwidth_wider_than_matrix() {
        let a = banded(4, 2);
        let rhs = DVector::from_element(4, 1.0);
        let expected = a.clone().lu().solve(&rhs).unwrap();

        let mut factors = a;
        let mut piv = vec![0; 4];
        lu_factor_in_place(&mut factors, &mut piv, Some(10)).unwrap();
        let mut x = rhs;
        lu_solve_factored(&factors, &piv, Some(10), &mut x);
        for i in 0..4 {
            assert_relative_eq!(x[i], expected[i], epsilon = 1e-10);
        }
    }
}
