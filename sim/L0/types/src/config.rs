//! Configuration types for simulation.
//!
//! This module provides configuration types that control how a run is set up:
//! duration, timestep and frame rate, body shape, neural circuit constants,
//! muscle filtering and integrator tolerances. Defaults reproduce the
//! published model (48 segments, 1 mm body, 12 neural units, agar).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentConfig;
use crate::{Result, SimError};

/// Main configuration for a simulation run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// Simulated duration (seconds).
    pub duration: f64,
    /// Physical timestep between neural/muscle updates (seconds).
    pub timestep: f64,
    /// Rate at which frames are sampled into the trajectory (frames per second).
    pub frame_rate: f64,
    /// Body shape.
    pub body: BodyConfig,
    /// Medium and obstacles.
    pub environment: EnvironmentConfig,
    /// Neural circuit constants.
    pub neural: NeuralConfig,
    /// Muscle filtering.
    pub muscle: MuscleConfig,
    /// Integrator tolerances and limits.
    pub solver: SolverConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: 5.0,
            timestep: 0.001,
            frame_rate: 25.0,
            body: BodyConfig::default(),
            environment: EnvironmentConfig::default(),
            neural: NeuralConfig::default(),
            muscle: MuscleConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a default configuration with the given duration.
    #[must_use]
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    /// Set the physical timestep.
    #[must_use]
    pub fn timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    /// Set the frame rate.
    #[must_use]
    pub fn frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the medium mix (`0.0` water, `1.0` agar).
    #[must_use]
    pub fn medium(mut self, medium: f64) -> Self {
        self.environment.medium = medium;
        self
    }

    /// Set the body configuration.
    #[must_use]
    pub fn body(mut self, body: BodyConfig) -> Self {
        self.body = body;
        self
    }

    /// Set the environment configuration.
    #[must_use]
    pub fn environment(mut self, environment: EnvironmentConfig) -> Self {
        self.environment = environment;
        self
    }

    /// Set the neural configuration.
    #[must_use]
    pub fn neural(mut self, neural: NeuralConfig) -> Self {
        self.neural = neural;
        self
    }

    /// Set the muscle configuration.
    #[must_use]
    pub fn muscle(mut self, muscle: MuscleConfig) -> Self {
        self.muscle = muscle;
        self
    }

    /// Set the solver configuration.
    #[must_use]
    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "duration must be positive and finite, got {}",
                self.duration
            )));
        }

        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "timestep must be positive and finite, got {}",
                self.timestep
            )));
        }

        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "frame rate must be positive and finite, got {}",
                self.frame_rate
            )));
        }

        self.body.validate()?;
        self.environment.validate()?;
        self.neural.validate(self.body.segments)?;
        self.muscle.validate(self.timestep)?;
        self.solver.validate()?;

        Ok(())
    }

    /// Number of physical steps in the run.
    #[must_use]
    pub fn steps(&self) -> usize {
        // Guard against 0.1 / 0.001 evaluating to 99.999...
        (self.duration / self.timestep + 1e-9).floor() as usize
    }

    /// Number of physical steps between two sampled frames (at least one).
    #[must_use]
    pub fn steps_per_frame(&self) -> usize {
        ((1.0 / (self.timestep * self.frame_rate)).round() as usize).max(1)
    }
}

/// Body shape constants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BodyConfig {
    /// Number of segments (the body has `segments + 1` rods).
    pub segments: usize,
    /// Maximum body diameter (m).
    pub diameter: f64,
    /// Body length (m).
    pub length: f64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            segments: 48,
            diameter: 80e-6,
            length: 1e-3,
        }
    }
}

impl BodyConfig {
    /// Default body with a different segment count (length is kept).
    #[must_use]
    pub fn with_segments(segments: usize) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }

    /// Number of rods.
    #[must_use]
    pub fn rods(&self) -> usize {
        self.segments + 1
    }

    /// Undeformed segment length (m).
    #[must_use]
    pub fn segment_length(&self) -> f64 {
        self.length / self.segments as f64
    }

    /// Validate the body configuration.
    pub fn validate(&self) -> Result<()> {
        if self.segments == 0 {
            return Err(SimError::invalid_config("body needs at least one segment"));
        }
        if !self.diameter.is_finite() || self.diameter <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "body diameter must be positive, got {}",
                self.diameter
            )));
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "body length must be positive, got {}",
                self.length
            )));
        }
        Ok(())
    }
}

/// Neural circuit constants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NeuralConfig {
    /// Number of dorsal/ventral unit pairs along the body.
    pub units: usize,
    /// Number of consecutive units each unit receives receptor input from.
    pub receptive_field: usize,
    /// Hysteresis width of the bistable units.
    pub hysteresis: f64,
    /// Tonic (command interneuron) drive to every unit.
    pub tonic_drive: f64,
    /// Bias of the one-way dorsal-to-ventral inhibition.
    pub inhibition_bias: f64,
    /// Gap-junction coupling between neighbouring units (usually zero).
    pub coupling: f64,
    /// Dorsal receptor gain while the element is stretched.
    pub stretch_gain: f64,
    /// Dorsal receptor gain while the element is compressed.
    pub compression_gain: f64,
    /// Neuromuscular junction weight at the head.
    pub nmj_weight: f64,
    /// Fraction by which the junction weight decreases from head to tail.
    pub nmj_taper: f64,
    /// Divisor applied to the first segment's junction weight.
    pub head_attenuation: f64,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            units: 12,
            receptive_field: 6,
            hysteresis: 0.5,
            tonic_drive: 0.675,
            inhibition_bias: 0.5,
            coupling: 0.0,
            stretch_gain: 0.8,
            compression_gain: 1.2,
            nmj_weight: 0.7,
            nmj_taper: 0.6,
            head_attenuation: 1.5,
        }
    }
}

impl NeuralConfig {
    /// Set the number of units and the receptive field size.
    #[must_use]
    pub fn units(mut self, units: usize, receptive_field: usize) -> Self {
        self.units = units;
        self.receptive_field = receptive_field;
        self
    }

    /// Set the gap-junction coupling strength.
    #[must_use]
    pub fn coupling(mut self, coupling: f64) -> Self {
        self.coupling = coupling;
        self
    }

    /// Segments driven by each unit.
    #[must_use]
    pub fn segments_per_unit(&self, segments: usize) -> usize {
        segments / self.units.max(1)
    }

    /// Validate against the body's segment count.
    pub fn validate(&self, segments: usize) -> Result<()> {
        if self.units == 0 {
            return Err(SimError::invalid_config("neural circuit needs at least one unit"));
        }
        if segments < self.units || segments % self.units != 0 {
            return Err(SimError::invalid_config(format!(
                "{segments} segments cannot be divided evenly among {} units",
                self.units
            )));
        }
        if self.receptive_field == 0 || self.receptive_field > self.units {
            return Err(SimError::invalid_config(format!(
                "receptive field must lie in [1, {}], got {}",
                self.units, self.receptive_field
            )));
        }

        let finite = [
            self.hysteresis,
            self.tonic_drive,
            self.inhibition_bias,
            self.coupling,
            self.stretch_gain,
            self.compression_gain,
            self.nmj_weight,
            self.nmj_taper,
            self.head_attenuation,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(SimError::invalid_config("neural constants must be finite"));
        }
        if self.hysteresis < 0.0 {
            return Err(SimError::invalid_config("hysteresis cannot be negative"));
        }
        if self.head_attenuation <= 0.0 {
            return Err(SimError::invalid_config("head attenuation must be positive"));
        }
        Ok(())
    }
}

/// Muscle filtering constants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MuscleConfig {
    /// Low-pass time constant (seconds).
    pub time_constant: f64,
}

impl Default for MuscleConfig {
    fn default() -> Self {
        Self { time_constant: 0.1 }
    }
}

impl MuscleConfig {
    /// Validate against the physical timestep.
    ///
    /// The explicit filter overshoots once `timestep >= time_constant`.
    pub fn validate(&self, timestep: f64) -> Result<()> {
        if !self.time_constant.is_finite() || self.time_constant <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "muscle time constant must be positive, got {}",
                self.time_constant
            )));
        }
        if timestep >= self.time_constant {
            return Err(SimError::invalid_config(format!(
                "timestep {timestep} must be shorter than the muscle time constant {}",
                self.time_constant
            )));
        }
        Ok(())
    }
}

/// Integrator tolerances and limits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Relative tolerance.
    pub relative_tolerance: f64,
    /// Absolute tolerance on rod positions (m).
    pub position_tolerance: f64,
    /// Absolute tolerance on rod angles (rad).
    pub angle_tolerance: f64,
    /// Factor applied to every tolerance in low-drag media.
    pub low_drag_scale: f64,
    /// Largest internal step (seconds).
    pub max_step: f64,
    /// Smallest internal step before the integrator gives up (seconds).
    pub min_step: f64,
    /// Newton iterations per step attempt.
    pub max_newton_iterations: usize,
    /// Internal steps allowed per requested output time.
    pub max_steps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-12,
            position_tolerance: 1e-9,
            angle_tolerance: 1e-5,
            low_drag_scale: 0.1,
            max_step: 1e-3,
            min_step: 1e-14,
            max_newton_iterations: 4,
            max_steps: 500,
        }
    }
}

impl SolverConfig {
    /// Set the absolute tolerances.
    #[must_use]
    pub fn tolerances(mut self, position: f64, angle: f64) -> Self {
        self.position_tolerance = position;
        self.angle_tolerance = angle;
        self
    }

    /// Set the largest internal step.
    #[must_use]
    pub fn max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Tolerance multiplier for the given environment.
    #[must_use]
    pub fn tolerance_scale(&self, environment: &EnvironmentConfig) -> f64 {
        if environment.is_low_drag() {
            self.low_drag_scale
        } else {
            1.0
        }
    }

    /// Validate the solver configuration.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("relative_tolerance", self.relative_tolerance),
            ("position_tolerance", self.position_tolerance),
            ("angle_tolerance", self.angle_tolerance),
            ("low_drag_scale", self.low_drag_scale),
            ("max_step", self.max_step),
            ("min_step", self.min_step),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::invalid_config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.min_step > self.max_step {
            return Err(SimError::invalid_config("min_step exceeds max_step"));
        }
        if self.max_newton_iterations == 0 || self.max_steps == 0 {
            return Err(SimError::invalid_config(
                "iteration and step limits must be at least 1",
            ));
        }
        Ok(())
    }
}
