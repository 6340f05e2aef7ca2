//! Finite-difference iteration matrix.
//!
//! Newton's method on the implicit step needs
//!
//! ```text
//! M = ∂F/∂y + α·∂F/∂y'        α = 1/h
//! ```
//!
//! Perturbing `y_j` by `δ` and `y'_j` by `α·δ` together yields column `j` of
//! `M` in one residual evaluation. For a banded system columns more than
//! `2b` apart touch disjoint rows, so they are perturbed simultaneously and
//! the matrix costs `2b + 1` evaluations regardless of dimension.

use nalgebra::{DMatrix, DVector};
use worm_types::Result;

use crate::{DaeSystem, JacobianStructure};

/// Scratch buffers reused across Jacobian evaluations.
#[derive(Debug, Clone)]
pub(crate) struct JacobianWorkspace {
    y: DVector<f64>,
    yp: DVector<f64>,
    perturbed: DVector<f64>,
    increments: DVector<f64>,
}

impl JacobianWorkspace {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            y: DVector::zeros(n),
            yp: DVector::zeros(n),
            perturbed: DVector::zeros(n),
            increments: DVector::zeros(n),
        }
    }
}

/// Number of residual evaluations one matrix costs for `structure`.
pub(crate) fn column_groups(structure: JacobianStructure, n: usize) -> usize {
    match structure {
        JacobianStructure::Dense => n,
        JacobianStructure::Banded { half_bandwidth } => (2 * half_bandwidth + 1).min(n),
    }
}

/// Fill `matrix` with the iteration matrix at `(t, y, yp)`.
///
/// `f0` is the residual at the unperturbed point and `weights` the error
/// weights, which bound the increment from below.
#[allow(clippy::too_many_arguments)]
pub(crate) fn iteration_matrix<S: DaeSystem + ?Sized>(
    system: &S,
    t: f64,
    y: &DVector<f64>,
    yp: &DVector<f64>,
    f0: &DVector<f64>,
    alpha: f64,
    weights: &DVector<f64>,
    work: &mut JacobianWorkspace,
    matrix: &mut DMatrix<f64>,
) -> Result<usize> {
    let n = y.len();
    let structure = system.structure();
    let groups = column_groups(structure, n);
    let sqrt_eps = f64::EPSILON.sqrt();
    let h = 1.0 / alpha;

    matrix.fill(0.0);
    for j in 0..n {
        let scale = y[j].abs().max((h * yp[j]).abs());
        work.increments[j] = (sqrt_eps * scale).max(1.0 / weights[j]);
    }

    for group in 0..groups {
        work.y.copy_from(y);
        work.yp.copy_from(yp);
        for j in (group..n).step_by(groups) {
            let inc = work.increments[j];
            work.y[j] += inc;
            work.yp[j] += alpha * inc;
        }

        system.residual(t, &work.y, &work.yp, &mut work.perturbed)?;

        for j in (group..n).step_by(groups) {
            let inc = work.increments[j];
            let (first, last) = match structure {
                JacobianStructure::Dense => (0, n),
                JacobianStructure::Banded { half_bandwidth } => (
                    j.saturating_sub(half_bandwidth),
                    (j + half_bandwidth + 1).min(n),
                ),
            };
            for i in first..last {
                matrix[(i, j)] = (work.perturbed[i] - f0[i]) / inc;
            }
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// F = y' + A·y with A tridiagonal, so M = A + α·I exactly.
    struct Chain;

    impl DaeSystem for Chain {
        fn dimension(&self) -> usize {
            6
        }

        fn residual(
            &self,
            _t: f64,
            y: &DVector<f64>,
            yp: &DVector<f64>,
            out: &mut DVector<f64>,
        ) -> Result<()> {
            for i in 0..6 {
                let left = if i > 0 { y[i - 1] } else { 0.0 };
                let right = if i < 5 { y[i + 1] } else { 0.0 };
                out[i] = yp[i] + 2.0 * y[i] - left - 0.5 * right;
            }
            Ok(())
        }

        fn structure(&self) -> JacobianStructure {
            JacobianStructure::Banded { half_bandwidth: 1 }
        }
    }

    #[test]
    fn test_banded_matrix_is_exact_for_linear_system() {
        let y = DVector::from_fn(6, |i, _| i as f64 * 0.1);
        let yp = DVector::from_element(6, 0.2);
        let mut f0 = DVector::zeros(6);
        Chain.residual(0.0, &y, &yp, &mut f0).unwrap();

        let weights = DVector::from_element(6, 1e6);
        let mut work = JacobianWorkspace::new(6);
        let mut m = DMatrix::zeros(6, 6);
        let alpha = 100.0;
        let evaluations =
            iteration_matrix(&Chain, 0.0, &y, &yp, &f0, alpha, &weights, &mut work, &mut m)
                .unwrap();

        assert_eq!(evaluations, 3);
        for i in 0..6 {
            assert_relative_eq!(m[(i, i)], 2.0 + alpha, epsilon = 1e-5);
            if i > 0 {
                assert_relative_eq!(m[(i, i - 1)], -1.0, epsilon = 1e-5);
            }
            if i < 5 {
                assert_relative_eq!(m[(i, i + 1)], -0.5, epsilon = 1e-5);
            }
            for j in 0..6 {
                if i.abs_diff(j) > 1 {
                    assert_eq!(m[(i, j)], 0.0);
                }
            }
        }
    }

    #[test]
    fn test_column_groups() {
        assert_eq!(column_groups(JacobianStructure::Dense, 7), 7);
        assert_eq!(
            column_groups(JacobianStructure::Banded { half_bandwidth: 5 }, 147),
            11
        );
        assert_eq!(
            column_groups(JacobianStructure::Banded { half_bandwidth: 5 }, 4),
            4
        );
    }
}
