//! Box constraints on the parameter vector.

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use worm_types::{Parameters, Result, SimError};

/// Lower and upper bound of every parameter, in [`Parameters::NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterBounds {
    /// Lower bounds.
    pub lower: [f64; Parameters::COUNT],
    /// Upper bounds.
    pub upper: [f64; Parameters::COUNT],
}

impl Default for ParameterBounds {
    /// NMJ and SR gains in `[-10, 10]`, the ventral and dorsal gains in
    /// `[0, 10]`, the bilinear gain in `[-10, 10]`.
    fn default() -> Self {
        Self {
            lower: [-10.0, -10.0, 0.0, 0.0, -10.0],
            upper: [10.0; Parameters::COUNT],
        }
    }
}

impl ParameterBounds {
    /// Create bounds.
    pub fn new(lower: [f64; Parameters::COUNT], upper: [f64; Parameters::COUNT]) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check every interval is finite and non-empty.
    pub fn validate(&self) -> Result<()> {
        for (i, (lo, hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(SimError::invalid_config(format!(
                    "bounds of {} must satisfy lower <= upper, got [{lo}, {hi}]",
                    Parameters::NAMES[i]
                )));
            }
        }
        Ok(())
    }

    /// True if every parameter lies inside its interval.
    #[must_use]
    pub fn contains(&self, params: &Parameters) -> bool {
        params
            .to_array()
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .all(|(x, (lo, hi))| (lo..=hi).contains(&x))
    }

    /// Draw a parameter vector uniformly from the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Parameters {
        let mut x = [0.0; Parameters::COUNT];
        for (i, xi) in x.iter_mut().enumerate() {
            *xi = self.lower[i] + (self.upper[i] - self.lower[i]) * rng.gen_range(0.0..1.0);
        }
        Parameters::from_array(x)
    }

    /// Bring out-of-range coordinates back inside: reflect off the violated
    /// bound, then clamp what a single reflection cannot fix.
    pub fn repair(&self, x: &mut [f64; Parameters::COUNT]) {
        for (i, xi) in x.iter_mut().enumerate() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            if *xi < lo {
                *xi = 2.0 * lo - *xi;
            }
            if *xi > hi {
                *xi = 2.0 * hi - *xi;
            }
            *xi = xi.clamp(lo, hi);
        }
    }
}
