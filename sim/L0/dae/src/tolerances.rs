//! Error tolerances and the weighted norm built from them.

use nalgebra::DVector;
use worm_types::{Result, SimError};

/// Relative tolerance plus one absolute tolerance per state component.
#[derive(Debug, Clone, PartialEq)]
pub struct Tolerances {
    /// Relative tolerance shared by every component.
    pub relative: f64,
    /// Absolute tolerance of each component.
    pub absolute: DVector<f64>,
}

impl Tolerances {
    /// Create tolerances from per-component absolute values.
    #[must_use]
    pub fn new(relative: f64, absolute: DVector<f64>) -> Self {
        Self { relative, absolute }
    }

    /// The same absolute tolerance for all `n` components.
    #[must_use]
    pub fn uniform(n: usize, relative: f64, absolute: f64) -> Self {
        Self::new(relative, DVector::from_element(n, absolute))
    }

    /// Multiply every tolerance by `factor`.
    #[must_use]
    pub fn scaled(mut self, factor: f64) -> Self {
        self.relative *= factor;
        self.absolute *= factor;
        self
    }

    /// Number of components covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.absolute.len()
    }

    /// True if no component is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.absolute.is_empty()
    }

    /// Check the tolerances against a system of dimension `n`.
    pub fn validate(&self, n: usize) -> Result<()> {
        if self.len() != n {
            return Err(SimError::solver_setup(format!(
                "{} absolute tolerances for a system of dimension {n}",
                self.len()
            )));
        }
        if !(self.relative.is_finite() && self.relative >= 0.0) {
            return Err(SimError::solver_setup(format!(
                "relative tolerance must be non-negative, got {}",
                self.relative
            )));
        }
        if let Some(bad) = self.absolute.iter().find(|a| !(a.is_finite() && **a > 0.0)) {
            return Err(SimError::solver_setup(format!(
                "absolute tolerances must be positive, got {bad}"
            )));
        }
        Ok(())
    }

    /// Error weights `1 / (rtol·|y| + atol)` for the state `y`.
    pub(crate) fn weights(&self, y: &DVector<f64>, out: &mut DVector<f64>) {
        for ((w, yi), atol) in out.iter_mut().zip(y.iter()).zip(self.absolute.iter()) {
            *w = 1.0 / (self.relative * yi.abs() + atol);
        }
    }
}

/// Weighted root-mean-square norm.
pub(crate) fn wrms_norm(v: &DVector<f64>, weights: &DVector<f64>) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v
        .iter()
        .zip(weights.iter())
        .map(|(vi, wi)| (vi * wi).powi(2))
        .sum();
    (sum / v.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_validate() {
        assert!(Tolerances::uniform(3, 1e-6, 1e-8).validate(3).is_ok());
        assert!(Tolerances::uniform(3, 1e-6, 1e-8).validate(4).is_err());
        assert!(Tolerances::uniform(3, -1.0, 1e-8).validate(3).is_err());
        assert!(Tolerances::uniform(3, 1e-6, 0.0).validate(3).is_err());
        assert!(Tolerances::uniform(3, f64::NAN, 1e-8).validate(3).is_err());
    }

    #[test]
    fn test_scaled() {
        let tol = Tolerances::new(1e-6, DVector::from_vec(vec![1e-9, 1e-5])).scaled(0.1);
        assert_relative_eq!(tol.relative, 1e-7);
        assert_relative_eq!(tol.absolute[0], 1e-10);
        assert_relative_eq!(tol.absolute[1], 1e-6);
    }

    #[test]
    fn test_weighted_norm() {
        let tol = Tolerances::uniform(2, 0.0, 0.5);
        let y = DVector::from_vec(vec![10.0, -10.0]);
        let mut w = DVector::zeros(2);
        tol.weights(&y, &mut w);
        assert_relative_eq!(w[0], 2.0);

        let v = DVector::from_vec(vec![0.5, 0.5]);
        assert_relative_eq!(wrms_norm(&v, &w), 1.0);
        assert_eq!(wrms_norm(&DVector::zeros(0), &DVector::zeros(0)), 0.0);
    }
}
