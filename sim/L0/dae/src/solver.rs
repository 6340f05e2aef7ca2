//! Variable-step implicit integrator.
//!
//! Each step solves the backward Euler discretization
//!
//! ```text
//! F(t + h, y_{n+1}, (y_{n+1} − y_n)/h) = 0
//! ```
//!
//! with modified Newton iterations that reuse one factored iteration
//! matrix across steps. The local error is estimated from the distance
//! between the converged solution and the explicit predictor
//! `y_n + h·y'_n`, measured in the weighted RMS norm of the tolerances.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};
use worm_types::{Result, SimError, SolverConfig};

use crate::jacobian::{self, JacobianWorkspace};
use crate::linalg::{lu_factor_in_place, lu_solve_factored};
use crate::tolerances::{wrms_norm, Tolerances};
use crate::DaeSystem;

/// Accepted steps after which the iteration matrix is rebuilt.
const MAX_JACOBIAN_AGE: usize = 20;

/// Relative change of `h` tolerated before the iteration matrix is rebuilt.
const MAX_STEP_RATIO_DRIFT: f64 = 0.25;

/// Newton contraction rate above which the iteration is abandoned.
const MAX_CONVERGENCE_RATE: f64 = 0.9;

/// Step size reduction after a Newton failure with a fresh matrix.
const CONVERGENCE_FAILURE_SHRINK: f64 = 0.25;

/// Safety factor on the optimal step size.
const SAFETY: f64 = 0.9;

/// Bounds on the step size ratio between consecutive steps.
const MIN_STEP_RATIO: f64 = 0.2;
const MAX_STEP_RATIO: f64 = 2.0;

/// Step control settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Largest internal step.
    pub max_step: f64,
    /// Smallest internal step before the integration fails.
    pub min_step: f64,
    /// First step; chosen from the initial derivative when `None`.
    pub initial_step: Option<f64>,
    /// Newton iterations per step attempt.
    pub max_newton_iterations: usize,
    /// Newton convergence threshold in the weighted norm.
    pub newton_tolerance: f64,
    /// Internal steps allowed per call to [`DaeSolver::solve_to`].
    pub max_steps: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self::from(&SolverConfig::default())
    }
}

impl From<&SolverConfig> for SolverSettings {
    fn from(config: &SolverConfig) -> Self {
        Self {
            max_step: config.max_step,
            min_step: config.min_step,
            initial_step: None,
            max_newton_iterations: config.max_newton_iterations,
            newton_tolerance: 0.1,
            max_steps: config.max_steps,
        }
    }
}

impl SolverSettings {
    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(SimError::solver_setup(format!(
                "max_step must be positive, got {}",
                self.max_step
            )));
        }
        if !(self.min_step >= 0.0 && self.min_step <= self.max_step) {
            return Err(SimError::solver_setup(format!(
                "min_step must lie in [0, max_step], got {}",
                self.min_step
            )));
        }
        if let Some(h0) = self.initial_step {
            if !(h0.is_finite() && h0 > 0.0) {
                return Err(SimError::solver_setup(format!(
                    "initial_step must be positive, got {h0}"
                )));
            }
        }
        if self.max_newton_iterations == 0 {
            return Err(SimError::solver_setup("max_newton_iterations must be at least 1"));
        }
        if !(self.newton_tolerance.is_finite() && self.newton_tolerance > 0.0) {
            return Err(SimError::solver_setup(format!(
                "newton_tolerance must be positive, got {}",
                self.newton_tolerance
            )));
        }
        if self.max_steps == 0 {
            return Err(SimError::solver_setup("max_steps must be at least 1"));
        }
        Ok(())
    }
}

/// Work counters accumulated over the solver's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverStats {
    /// Accepted steps.
    pub steps: usize,
    /// Residual evaluations, including those spent on Jacobians.
    pub residual_evaluations: usize,
    /// Iteration matrices built.
    pub jacobian_evaluations: usize,
    /// Newton iterations.
    pub newton_iterations: usize,
    /// Steps rejected by the local error test.
    pub error_test_failures: usize,
    /// Step attempts whose Newton iteration failed.
    pub convergence_failures: usize,
}

/// Outcome of one step attempt.
enum Attempt {
    Accepted { error: f64 },
    ErrorTestFailed { error: f64 },
    NewtonFailed { fresh_matrix: bool },
}

/// Implicit integrator for a [`DaeSystem`].
#[derive(Debug, Clone)]
pub struct DaeSolver {
    t: f64,
    y: DVector<f64>,
    yp: DVector<f64>,
    h: f64,
    tolerances: Tolerances,
    settings: SolverSettings,
    stats: SolverStats,

    // Factored iteration matrix
    matrix: DMatrix<f64>,
    pivots: Vec<usize>,
    matrix_band: Option<usize>,
    matrix_valid: bool,
    matrix_alpha: f64,
    matrix_age: usize,

    // Scratch
    work: JacobianWorkspace,
    weights: DVector<f64>,
    residual: DVector<f64>,
    delta: DVector<f64>,
    y_pred: DVector<f64>,
    y_new: DVector<f64>,
    yp_new: DVector<f64>,
}

impl DaeSolver {
    /// Create a solver at `(t0, y0, yp0)`.
    ///
    /// The initial values must be consistent (`F(t0, y0, yp0) ≈ 0`); the
    /// solver does not correct them.
    pub fn new(
        t0: f64,
        y0: DVector<f64>,
        yp0: DVector<f64>,
        tolerances: Tolerances,
        settings: SolverSettings,
    ) -> Result<Self> {
        let n = y0.len();
        if yp0.len() != n {
            return Err(SimError::solver_setup(format!(
                "state has {n} components but derivative has {}",
                yp0.len()
            )));
        }
        tolerances.validate(n)?;
        settings.validate()?;
        if !t0.is_finite() {
            return Err(SimError::solver_setup(format!("initial time {t0} is not finite")));
        }
        if y0.iter().chain(yp0.iter()).any(|v| !v.is_finite()) {
            return Err(SimError::solver_setup("initial values must be finite"));
        }

        let mut solver = Self {
            t: t0,
            y: y0,
            yp: yp0,
            h: settings.max_step,
            tolerances,
            settings,
            stats: SolverStats::default(),
            matrix: DMatrix::zeros(n, n),
            pivots: vec![0; n],
            matrix_band: None,
            matrix_valid: false,
            matrix_alpha: 0.0,
            matrix_age: 0,
            work: JacobianWorkspace::new(n),
            weights: DVector::zeros(n),
            residual: DVector::zeros(n),
            delta: DVector::zeros(n),
            y_pred: DVector::zeros(n),
            y_new: DVector::zeros(n),
            yp_new: DVector::zeros(n),
        };
        solver.h = solver.initial_step();
        Ok(solver)
    }

    /// Current time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &DVector<f64> {
        &self.y
    }

    /// Current state derivative.
    #[must_use]
    pub fn derivative(&self) -> &DVector<f64> {
        &self.yp
    }

    /// Work counters.
    #[must_use]
    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Step size the next attempt will use.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.h
    }

    /// Integrate up to exactly `tout` and return the reached time.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StepFailed`] if the step size falls below the
    /// minimum, the iteration matrix is singular, or more than `max_steps`
    /// steps are needed. Errors from the residual are returned unchanged.
    pub fn solve_to<S: DaeSystem + ?Sized>(&mut self, system: &S, tout: f64) -> Result<f64> {
        if system.dimension() != self.y.len() {
            return Err(SimError::solver_setup(format!(
                "system of dimension {} for a solver of dimension {}",
                system.dimension(),
                self.y.len()
            )));
        }
        let roundoff = 100.0 * f64::EPSILON * self.t.abs().max(tout.abs());
        if !tout.is_finite() || tout < self.t - roundoff {
            return Err(SimError::solver_setup(format!(
                "output time {tout} precedes current time {}",
                self.t
            )));
        }

        let mut steps = 0;
        while self.t < tout {
            let remaining = tout - self.t;
            if remaining <= roundoff {
                self.y.axpy(remaining, &self.yp, 1.0);
                self.t = tout;
                break;
            }
            if steps >= self.settings.max_steps {
                return Err(SimError::step_failed(
                    self.t,
                    format!(
                        "too many steps: {} steps did not reach t = {tout}",
                        self.settings.max_steps
                    ),
                ));
            }
            self.step(system, tout)?;
            steps += 1;
        }
        Ok(self.t)
    }

    fn initial_step(&mut self) -> f64 {
        if let Some(h0) = self.settings.initial_step {
            return h0.min(self.settings.max_step);
        }
        self.tolerances.weights(&self.y, &mut self.weights);
        let rate = wrms_norm(&self.yp, &self.weights);
        let h = if rate > 0.0 { 0.5 / rate } else { self.settings.max_step };
        h.min(self.settings.max_step).max(self.settings.min_step)
    }

    /// Take one accepted step toward `tout`, retrying with smaller steps.
    fn step<S: DaeSystem + ?Sized>(&mut self, system: &S, tout: f64) -> Result<()> {
        loop {
            let remaining = tout - self.t;
            let clipped = self.h >= remaining;
            let h = if clipped { remaining } else { self.h };
            if h < self.settings.min_step {
                return Err(SimError::step_failed(
                    self.t,
                    format!(
                        "step size {h:e} below minimum {:e}",
                        self.settings.min_step
                    ),
                ));
            }

            match self.attempt(system, h)? {
                Attempt::Accepted { error } => {
                    self.t = if clipped { tout } else { self.t + h };
                    std::mem::swap(&mut self.y, &mut self.y_new);
                    std::mem::swap(&mut self.yp, &mut self.yp_new);
                    self.stats.steps += 1;
                    self.matrix_age += 1;

                    let factor = step_ratio(error);
                    let proposed = if clipped && factor >= 1.0 {
                        self.h
                    } else {
                        h * factor
                    };
                    self.h = proposed.min(self.settings.max_step);
                    trace!(t = self.t, h, error, "step accepted");
                    return Ok(());
                }
                Attempt::ErrorTestFailed { error } => {
                    self.stats.error_test_failures += 1;
                    self.h = h * step_ratio(error).min(SAFETY);
                    debug!(t = self.t, h, error, "error test failed");
                }
                Attempt::NewtonFailed { fresh_matrix } => {
                    self.stats.convergence_failures += 1;
                    self.h = if fresh_matrix {
                        h * CONVERGENCE_FAILURE_SHRINK
                    } else {
                        h
                    };
                    self.matrix_valid = false;
                    debug!(t = self.t, h, "newton iteration failed");
                }
            }
        }
    }

    fn attempt<S: DaeSystem + ?Sized>(&mut self, system: &S, h: f64) -> Result<Attempt> {
        let t_new = self.t + h;
        let alpha = 1.0 / h;

        self.tolerances.weights(&self.y, &mut self.weights);
        self.y_pred.copy_from(&self.y);
        self.y_pred.axpy(h, &self.yp, 1.0);
        self.y_new.copy_from(&self.y_pred);
        self.yp_new.copy_from(&self.yp);

        system.residual(t_new, &self.y_new, &self.yp_new, &mut self.residual)?;
        self.stats.residual_evaluations += 1;

        let drift = (self.matrix_alpha / alpha - 1.0).abs();
        let fresh_matrix = !self.matrix_valid
            || drift > MAX_STEP_RATIO_DRIFT
            || self.matrix_age >= MAX_JACOBIAN_AGE;
        if fresh_matrix {
            let evaluations = jacobian::iteration_matrix(
                system,
                t_new,
                &self.y_new,
                &self.yp_new,
                &self.residual,
                alpha,
                &self.weights,
                &mut self.work,
                &mut self.matrix,
            )?;
            self.stats.residual_evaluations += evaluations;
            self.stats.jacobian_evaluations += 1;

            let band = system.structure().half_bandwidth();
            if let Err(singular) = lu_factor_in_place(&mut self.matrix, &mut self.pivots, band) {
                self.matrix_valid = false;
                return Err(SimError::step_failed(
                    self.t,
                    format!("singular iteration matrix at pivot {}", singular.pivot),
                ));
            }
            self.matrix_band = band;
            self.matrix_valid = true;
            self.matrix_alpha = alpha;
            self.matrix_age = 0;
        }

        // Rescale corrections computed with a matrix built for another step size
        let correction_scale = 2.0 / (1.0 + alpha / self.matrix_alpha);

        let tol = self.settings.newton_tolerance;
        let mut previous_norm = f64::INFINITY;
        let mut converged = false;
        for k in 0..self.settings.max_newton_iterations {
            if k > 0 {
                system.residual(t_new, &self.y_new, &self.yp_new, &mut self.residual)?;
                self.stats.residual_evaluations += 1;
            }
            self.stats.newton_iterations += 1;

            self.delta.copy_from(&self.residual);
            self.delta.neg_mut();
            lu_solve_factored(&self.matrix, &self.pivots, self.matrix_band, &mut self.delta);
            if correction_scale != 1.0 {
                self.delta *= correction_scale;
            }

            self.y_new += &self.delta;
            self.yp_new.axpy(alpha, &self.delta, 1.0);

            let norm = wrms_norm(&self.delta, &self.weights);
            if !norm.is_finite() {
                break;
            }
            if k == 0 {
                if norm <= 0.1 * tol {
                    converged = true;
                    break;
                }
            } else {
                let rate = norm / previous_norm;
                if rate > MAX_CONVERGENCE_RATE {
                    break;
                }
                if norm * rate / (1.0 - rate) <= tol {
                    converged = true;
                    break;
                }
            }
            previous_norm = norm;
        }

        if !converged {
            return Ok(Attempt::NewtonFailed { fresh_matrix });
        }

        self.delta.copy_from(&self.y_new);
        self.delta -= &self.y_pred;
        let error = 0.5 * wrms_norm(&self.delta, &self.weights);

        if error <= 1.0 {
            Ok(Attempt::Accepted { error })
        } else {
            Ok(Attempt::ErrorTestFailed { error })
        }
    }
}

fn step_ratio(error: f64) -> f64 {
    if error <= 0.0 {
        return MAX_STEP_RATIO;
    }
    (SAFETY / error.sqrt()).clamp(MIN_STEP_RATIO, MAX_STEP_RATIO)
}
