//! Error types for simulation operations.

use std::fmt;

use thiserror::Error;

/// The elastic elements spanning one body segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Dorsal horizontal element (dorsal point to dorsal point).
    DorsalHorizontal,
    /// Ventral horizontal element (ventral point to ventral point).
    VentralHorizontal,
    /// Diagonal from the dorsal point of rod `i` to the ventral point of rod `i + 1`.
    DorsalDiagonal,
    /// Diagonal from the ventral point of rod `i` to the dorsal point of rod `i + 1`.
    VentralDiagonal,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DorsalHorizontal => "dorsal horizontal",
            Self::VentralHorizontal => "ventral horizontal",
            Self::DorsalDiagonal => "dorsal-ventral diagonal",
            Self::VentralDiagonal => "ventral-dorsal diagonal",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while configuring or running a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Invalid configuration, rejected before the run starts.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// A search parameter is not usable (NaN or infinite).
    #[error("invalid parameter {name}: {value} (must be finite)")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The integrator could not be set up (vector sizes, tolerances).
    #[error("solver setup failed: {reason}")]
    SolverSetup {
        /// Description of what went wrong.
        reason: String,
    },

    /// A body element collapsed to (near) zero length during residual evaluation.
    #[error("degenerate geometry: {element} element of segment {segment} has length {length:e}")]
    DegenerateGeometry {
        /// Segment index (segment `i` joins rods `i` and `i + 1`).
        segment: usize,
        /// Which element degenerated.
        element: ElementKind,
        /// The measured length.
        length: f64,
    },

    /// Simulation diverged (`NaN` or `Inf` detected).
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// Description of what went wrong.
        reason: String,
    },

    /// The integrator failed to advance (non-convergence, error test, step limit).
    #[error("integration step failed at t = {time}: {reason}")]
    StepFailed {
        /// Simulated time of the last accepted step.
        time: f64,
        /// Description of the failure.
        reason: String,
    },

    /// A trajectory file could not be parsed.
    #[error("malformed trajectory at line {line}: {reason}")]
    TrajectoryParse {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// Writing or reading trajectory output failed.
    #[error("output error: {reason}")]
    Output {
        /// Description of the I/O failure.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a solver setup error.
    #[must_use]
    pub fn solver_setup(reason: impl Into<String>) -> Self {
        Self::SolverSetup {
            reason: reason.into(),
        }
    }

    /// Create a diverged error.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    /// Create a step failure error.
    #[must_use]
    pub fn step_failed(time: f64, reason: impl Into<String>) -> Self {
        Self::StepFailed {
            time,
            reason: reason.into(),
        }
    }

    /// Create a trajectory parse error.
    #[must_use]
    pub fn trajectory_parse(line: usize, reason: impl Into<String>) -> Self {
        Self::TrajectoryParse {
            line,
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::InvalidParameter { .. }
        )
    }

    /// Check if this error aborted a running simulation (as opposed to setup).
    #[must_use]
    pub fn is_run_failure(&self) -> bool {
        matches!(
            self,
            Self::DegenerateGeometry { .. } | Self::Diverged { .. } | Self::StepFailed { .. }
        )
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        Self::Output {
            reason: err.to_string(),
        }
    }
}
