//! Muscle activation dynamics.
//!
//! Body wall muscles do not follow the neural drive instantly. Their
//! activation is a first-order low-pass filter of the drive:
//!
//! ```text
//! da/dt = (u − a) / τ
//!
//! where:
//!   a = activation (signed: negative values are relaxation)
//!   u = neural drive from the motor neurons
//!   τ = muscle time constant (0.1 s)
//! ```
//!
//! The filter is advanced with explicit Euler once per physical timestep, so
//! the distance to a constant drive shrinks by `1 − dt/τ` every step. This
//! requires `dt < τ`, which [`MuscleConfig::validate`] enforces.
//!
//! Unlike vertebrate activation models the drive is not clamped to `[0, 1]`:
//! a muscle on the inhibited side of the body receives negative drive, and
//! the mechanics treats any negative activation as fully relaxed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use worm_types::{MuscleConfig, Result, SimError};

/// First-order muscle filter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MuscleDynamics {
    /// Time constant, in seconds.
    pub time_constant: f64,
}

impl Default for MuscleDynamics {
    fn default() -> Self {
        Self { time_constant: 0.1 }
    }
}

impl MuscleDynamics {
    /// Create dynamics with the given time constant.
    pub fn new(time_constant: f64) -> Result<Self> {
        if !time_constant.is_finite() || time_constant <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "muscle time constant must be positive, got {time_constant}"
            )));
        }
        Ok(Self { time_constant })
    }

    /// Create dynamics from configuration.
    pub fn from_config(config: &MuscleConfig) -> Result<Self> {
        Self::new(config.time_constant)
    }

    /// Compute the activation derivative (da/dt).
    #[must_use]
    pub fn derivative(&self, drive: f64, activation: f64) -> f64 {
        (drive - activation) / self.time_constant
    }

    /// Advance the activation by one explicit Euler step.
    #[must_use]
    pub fn integrate(&self, drive: f64, activation: f64, dt: f64) -> f64 {
        activation + self.derivative(drive, activation) * dt
    }
}

/// State of one muscle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MuscleState {
    /// Current activation.
    pub activation: f64,

    /// Most recent neural drive.
    pub drive: f64,
}

impl MuscleState {
    /// Create a state at the given activation, driven to hold it.
    #[must_use]
    pub fn new(activation: f64) -> Self {
        Self {
            activation,
            drive: activation,
        }
    }

    /// Set the neural drive.
    pub fn set_drive(&mut self, drive: f64) {
        self.drive = drive;
    }

    /// Advance the activation toward the drive.
    pub fn update(&mut self, dynamics: &MuscleDynamics, dt: f64) {
        self.activation = dynamics.integrate(self.drive, self.activation, dt);
    }

    /// Get the current activation level.
    #[must_use]
    pub fn activation(&self) -> f64 {
        self.activation
    }
}
