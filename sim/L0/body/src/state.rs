//! Layout of the body in the integrator state vector.
//!
//! Rod `i` occupies three consecutive entries `(x, y, θ)` starting at
//! `3·i`; the derivative vector uses the same layout.

use nalgebra::{DVector, Point2, Vector2};

use crate::geometry::BodyGeometry;

/// Generalized coordinates per rod.
pub const COORDS_PER_ROD: usize = 3;

/// Position and orientation of one rod.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RodPose {
    /// Center of mass (m).
    pub position: Point2<f64>,
    /// Orientation of the rod axis (rad), measured from `+x`.
    pub angle: f64,
}

impl RodPose {
    /// Read rod `i` from a state vector.
    #[must_use]
    pub fn from_state(y: &[f64], i: usize) -> Self {
        let k = COORDS_PER_ROD * i;
        Self {
            position: Point2::new(y[k], y[k + 1]),
            angle: y[k + 2],
        }
    }

    /// Unit vector along the rod axis, pointing to the dorsal side.
    #[must_use]
    pub fn axis(&self) -> Vector2<f64> {
        Vector2::new(self.angle.cos(), self.angle.sin())
    }
}

/// Positions and velocities of every rod.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    /// Generalized coordinates.
    pub positions: DVector<f64>,
    /// Their time derivatives.
    pub velocities: DVector<f64>,
}

impl BodyState {
    /// A straight body at rest along `+x`, head (rod 0) at the origin.
    ///
    /// Every rod stands perpendicular to the body axis (`θ = π/2`) so its
    /// dorsal point lies at `+y`.
    #[must_use]
    pub fn straight(geometry: &BodyGeometry) -> Self {
        let rods = geometry.rods();
        let seg = geometry.segment_length();
        let positions = DVector::from_fn(COORDS_PER_ROD * rods, |k, _| {
            match k % COORDS_PER_ROD {
                0 => (k / COORDS_PER_ROD) as f64 * seg,
                1 => 0.0,
                _ => std::f64::consts::FRAC_PI_2,
            }
        });

        Self {
            positions,
            velocities: DVector::zeros(COORDS_PER_ROD * rods),
        }
    }

    /// Number of rods.
    #[must_use]
    pub fn rods(&self) -> usize {
        self.positions.len() / COORDS_PER_ROD
    }

    /// Pose of rod `i`.
    #[must_use]
    pub fn pose(&self, i: usize) -> RodPose {
        RodPose::from_state(self.positions.as_slice(), i)
    }

    /// Poses of every rod, head first.
    pub fn poses(&self) -> impl Iterator<Item = RodPose> + '_ {
        (0..self.rods()).map(|i| self.pose(i))
    }
}
