//! Implicit integrator for fully implicit differential-algebraic systems.
//!
//! Systems are written in residual form,
//!
//! ```text
//! F(t, y, y') = 0
//! ```
//!
//! which covers stiff ODEs and index-1 DAEs alike: the body mechanics of the
//! worm is a drag-dominated force balance, stiff because of the element
//! springs, with no inertia term.
//!
//! [`DaeSolver`] advances such a system with variable-step backward Euler,
//! modified Newton iterations and a finite-difference iteration matrix. A
//! system that declares a [`JacobianStructure::Banded`] structure gets a
//! matrix built from `2b + 1` residual evaluations and a banded
//! factorization.
//!
//! # Example
//!
//! ```
//! use nalgebra::DVector;
//! use worm_dae::{DaeSolver, DaeSystem, SolverSettings, Tolerances};
//!
//! /// y' = −y
//! struct Decay;
//!
//! impl DaeSystem for Decay {
//!     fn dimension(&self) -> usize {
//!         1
//!     }
//!
//!     fn residual(
//!         &self,
//!         _t: f64,
//!         y: &DVector<f64>,
//!         yp: &DVector<f64>,
//!         out: &mut DVector<f64>,
//!     ) -> worm_types::Result<()> {
//!         out[0] = yp[0] + y[0];
//!         Ok(())
//!     }
//! }
//!
//! let settings = SolverSettings { max_step: 0.01, ..SolverSettings::default() };
//! let mut solver = DaeSolver::new(
//!     0.0,
//!     DVector::from_element(1, 1.0),
//!     DVector::from_element(1, -1.0),
//!     Tolerances::uniform(1, 1e-4, 1e-4),
//!     settings,
//! )?;
//! let t = solver.solve_to(&Decay, 1.0)?;
//! assert_eq!(t, 1.0);
//! assert!((solver.state()[0] - (-1.0f64).exp()).abs() < 1e-2);
//! # Ok::<(), worm_types::SimError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It knows nothing
//! about worms; any [`DaeSystem`] can be integrated.

#![doc(html_root_url = "https://docs.rs/worm-dae/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc,
    clippy::many_single_char_names,
    clippy::cast_precision_loss,
    clippy::suboptimal_flops
)]
#![cfg_attr(
    test,
    allow(clippy::float_cmp, clippy::unwrap_used, clippy::expect_used)
)]

mod jacobian;
mod linalg;
mod solver;
mod tolerances;

use nalgebra::DVector;
use worm_types::Result;

pub use solver::{DaeSolver, SolverSettings, SolverStats};
pub use tolerances::Tolerances;

/// Sparsity of `∂F/∂y` and `∂F/∂y'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JacobianStructure {
    /// Any entry may be nonzero.
    #[default]
    Dense,
    /// Entry `(i, j)` is zero whenever `|i − j| > half_bandwidth`.
    Banded {
        /// Number of nonzero diagonals on each side of the main one.
        half_bandwidth: usize,
    },
}

impl JacobianStructure {
    /// Half bandwidth, or `None` for a dense structure.
    #[must_use]
    pub fn half_bandwidth(self) -> Option<usize> {
        match self {
            Self::Dense => None,
            Self::Banded { half_bandwidth } => Some(half_bandwidth),
        }
    }
}

/// A system `F(t, y, y') = 0`.
pub trait DaeSystem {
    /// Number of unknowns.
    fn dimension(&self) -> usize;

    /// Evaluate `F(t, y, y')` into `out`.
    ///
    /// An error aborts the integration and is returned by
    /// [`DaeSolver::solve_to`] unchanged.
    fn residual(
        &self,
        t: f64,
        y: &DVector<f64>,
        yp: &DVector<f64>,
        out: &mut DVector<f64>,
    ) -> Result<()>;

    /// Sparsity of the system's Jacobian.
    fn structure(&self) -> JacobianStructure {
        JacobianStructure::Dense
    }
}
