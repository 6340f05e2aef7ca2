//! The body mechanics as a [`DaeSystem`].

use nalgebra::DVector;
use worm_body::{COORDS_PER_ROD, Mechanics};
use worm_dae::{DaeSystem, JacobianStructure};
use worm_types::{Result, SidePair};

/// Coordinates of rod `i` couple only to those of rods `i − 1` and `i + 1`.
pub const HALF_BANDWIDTH: usize = 2 * COORDS_PER_ROD - 1;

/// Residual of the rod chain with muscle activations frozen for one solve.
#[derive(Debug, Clone, Copy)]
pub struct WormSystem<'a> {
    mechanics: &'a Mechanics,
    activations: &'a [SidePair<f64>],
}

impl<'a> WormSystem<'a> {
    /// Pair the mechanics with the activations of the current timestep.
    #[must_use]
    pub fn new(mechanics: &'a Mechanics, activations: &'a [SidePair<f64>]) -> Self {
        Self {
            mechanics,
            activations,
        }
    }
}

impl DaeSystem for WormSystem<'_> {
    fn dimension(&self) -> usize {
        self.mechanics.dimension()
    }

    fn residual(
        &self,
        _t: f64,
        y: &DVector<f64>,
        yp: &DVector<f64>,
        out: &mut DVector<f64>,
    ) -> Result<()> {
        self.mechanics
            .residual(y.as_slice(), yp.as_slice(), self.activations, out.as_mut_slice())
    }

    fn structure(&self) -> JacobianStructure {
        JacobianStructure::Banded {
            half_bandwidth: HALF_BANDWIDTH,
        }
    }
}
