//! Environment configuration: surrounding medium and obstacles.

use nalgebra::Point2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// Upper bound on the number of obstacles in one environment.
pub const MAX_OBSTACLES: usize = 10_000;

/// Medium value below which the environment counts as low-drag (water-like).
pub const LOW_DRAG_MEDIUM: f64 = 0.015;

/// A fixed circular obstacle in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Obstacle {
    /// Center of the obstacle (m).
    pub center: Point2<f64>,
    /// Radius of the obstacle (m).
    pub radius: f64,
}

impl Obstacle {
    /// Create an obstacle.
    #[must_use]
    pub const fn new(center: Point2<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Validate the obstacle geometry.
    pub fn validate(&self) -> Result<()> {
        if !self.center.coords.iter().all(|c| c.is_finite()) {
            return Err(SimError::invalid_config("obstacle center must be finite"));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "obstacle radius must be positive, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// How obstacles are placed in the environment.
///
/// Layouts are expanded into a concrete obstacle list once, before a run
/// starts; the list never changes during the run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ObstacleLayout {
    /// No obstacles.
    #[default]
    None,
    /// An explicit obstacle list.
    Explicit {
        /// The obstacles.
        obstacles: Vec<Obstacle>,
    },
    /// Square grid, filled row by row from `origin`.
    Square {
        /// Number of obstacles.
        count: usize,
        /// Radius of each obstacle (m).
        radius: f64,
        /// Center-to-center distance (m).
        spacing: f64,
        /// Center of the first obstacle (m).
        origin: Point2<f64>,
    },
    /// Hexagonal grid (odd rows shifted by half a spacing).
    Hexagonal {
        /// Number of obstacles.
        count: usize,
        /// Radius of each obstacle (m).
        radius: f64,
        /// Center-to-center distance (m).
        spacing: f64,
        /// Center of the first obstacle (m).
        origin: Point2<f64>,
    },
    /// Uniformly scattered centers, reproducible from `seed`.
    Random {
        /// Number of obstacles.
        count: usize,
        /// Radius of each obstacle (m).
        radius: f64,
        /// Center of the scattering square (m).
        origin: Point2<f64>,
        /// Half-width of the scattering square (m).
        extent: f64,
        /// Seed of the placement generator.
        seed: u64,
    },
}

impl ObstacleLayout {
    /// Number of obstacles this layout produces.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Explicit { obstacles } => obstacles.len(),
            Self::Square { count, .. }
            | Self::Hexagonal { count, .. }
            | Self::Random { count, .. } => *count,
        }
    }

    /// Validate counts and dimensions.
    pub fn validate(&self) -> Result<()> {
        let count = self.count();
        if count > MAX_OBSTACLES {
            return Err(SimError::invalid_config(format!(
                "obstacle count {count} exceeds the maximum of {MAX_OBSTACLES}"
            )));
        }

        match self {
            Self::None => Ok(()),
            Self::Explicit { obstacles } => obstacles.iter().try_for_each(Obstacle::validate),
            Self::Square {
                radius,
                spacing,
                origin,
                ..
            }
            | Self::Hexagonal {
                radius,
                spacing,
                origin,
                ..
            } => {
                Obstacle::new(*origin, *radius).validate()?;
                if !spacing.is_finite() || *spacing <= 0.0 {
                    return Err(SimError::invalid_config(
                        "obstacle spacing must be positive",
                    ));
                }
                Ok(())
            }
            Self::Random {
                radius,
                origin,
                extent,
                ..
            } => {
                Obstacle::new(*origin, *radius).validate()?;
                if !extent.is_finite() || *extent < 0.0 {
                    return Err(SimError::invalid_config(
                        "obstacle extent cannot be negative",
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Configuration of the medium surrounding the body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvironmentConfig {
    /// Medium mix: `0.0` is water, `1.0` is agar.
    pub medium: f64,
    /// Obstacle placement.
    pub obstacles: ObstacleLayout,
    /// Obstacle stiffness as a multiple of the passive element stiffness.
    pub obstacle_stiffness_scale: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            medium: 1.0,
            obstacles: ObstacleLayout::None,
            obstacle_stiffness_scale: 5.0,
        }
    }
}

impl EnvironmentConfig {
    /// Water (lowest drag).
    #[must_use]
    pub fn water() -> Self {
        Self::default().with_medium(0.0)
    }

    /// Agar (highest drag).
    #[must_use]
    pub fn agar() -> Self {
        Self::default().with_medium(1.0)
    }

    /// Set the medium mix.
    #[must_use]
    pub fn with_medium(mut self, medium: f64) -> Self {
        self.medium = medium;
        self
    }

    /// Set the obstacle layout.
    #[must_use]
    pub fn with_obstacles(mut self, obstacles: ObstacleLayout) -> Self {
        self.obstacles = obstacles;
        self
    }

    /// Whether the medium is water-like, requiring tighter solver tolerances.
    #[must_use]
    pub fn is_low_drag(&self) -> bool {
        self.medium < LOW_DRAG_MEDIUM
    }

    /// Validate the environment configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.medium.is_finite() || !(0.0..=1.0).contains(&self.medium) {
            return Err(SimError::invalid_config(format!(
                "medium must lie in [0, 1], got {}",
                self.medium
            )));
        }
        if !self.obstacle_stiffness_scale.is_finite() || self.obstacle_stiffness_scale < 0.0 {
            return Err(SimError::invalid_config(
                "obstacle stiffness scale cannot be negative",
            ));
        }
        self.obstacles.validate()
    }
}
