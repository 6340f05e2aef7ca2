//! The medium around the body: anisotropic drag and fixed obstacles.
//!
//! Drag coefficients are interpolated linearly between water and agar by the
//! medium scalar. Obstacles are rigid circles that repel any terminal point
//! pushed inside them with a stiff nonlinear spring:
//!
//! ```text
//! |F| = k·(r − d) + s·k·((r − d)/s)²      s = 0.01·r
//! ```
//!
//! directed from the obstacle center toward the point.

use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use worm_types::{EnvironmentConfig, Obstacle, ObstacleLayout, Result, SimError};

/// Tangential drag in water, for the whole body.
pub const WATER_TANGENTIAL: f64 = 3.3e-6;
/// Normal drag in water, for the whole body.
pub const WATER_NORMAL: f64 = 5.2e-6;
/// Tangential drag in agar, for the whole body.
pub const AGAR_TANGENTIAL: f64 = 3.2e-3;
/// Normal drag in agar, for the whole body.
pub const AGAR_NORMAL: f64 = 128e-3;

/// Fraction of the obstacle radius used as the nonlinear contact scale.
const CONTACT_SCALE: f64 = 0.01;

/// Per-rod drag coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct DragCoefficients {
    normal: Vec<f64>,
    tangential: Vec<f64>,
}

impl DragCoefficients {
    /// Interpolate between water (`medium = 0`) and agar (`medium = 1`).
    ///
    /// Each rod carries an equal share `1 / (2·rods)` of the whole-body
    /// coefficient.
    pub fn interpolate(medium: f64, rods: usize) -> Result<Self> {
        if !medium.is_finite() || !(0.0..=1.0).contains(&medium) {
            return Err(SimError::invalid_config(format!(
                "medium must lie in [0, 1], got {medium}"
            )));
        }
        if rods == 0 {
            return Err(SimError::invalid_config("drag needs at least one rod"));
        }

        let share = 2.0 * rods as f64;
        let normal = (WATER_NORMAL + medium * (AGAR_NORMAL - WATER_NORMAL)) / share;
        let tangential =
            (WATER_TANGENTIAL + medium * (AGAR_TANGENTIAL - WATER_TANGENTIAL)) / share;

        Ok(Self {
            normal: vec![normal; rods],
            tangential: vec![tangential; rods],
        })
    }

    /// Number of rods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.normal.len()
    }

    /// Whether there are no rods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normal.is_empty()
    }

    /// Normal (perpendicular to the body axis) coefficient of rod `i`.
    #[must_use]
    pub fn normal(&self, i: usize) -> f64 {
        self.normal[i]
    }

    /// Tangential (along the body axis) coefficient of rod `i`.
    #[must_use]
    pub fn tangential(&self, i: usize) -> f64 {
        self.tangential[i]
    }
}

/// Contact of a point with the obstacle set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleContact {
    /// Net repulsive force.
    pub force: Vector2<f64>,
    /// Sum of the force magnitudes of every touching obstacle.
    pub magnitude: f64,
}

impl ObstacleContact {
    /// No contact.
    pub const NONE: Self = Self {
        force: Vector2::new(0.0, 0.0),
        magnitude: 0.0,
    };
}

/// Drag and obstacles surrounding the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    drag: DragCoefficients,
    obstacles: Vec<Obstacle>,
    stiffness: f64,
}

impl Environment {
    /// Build the environment for `rods` rods.
    ///
    /// `stiffness` is the obstacle contact stiffness (see
    /// [`ElementConstants::k_obstacle`](crate::ElementConstants::k_obstacle)).
    pub fn new(config: &EnvironmentConfig, rods: usize, stiffness: f64) -> Result<Self> {
        config.validate()?;
        let drag = DragCoefficients::interpolate(config.medium, rods)?;
        let obstacles = generate_obstacles(&config.obstacles)?;

        if !obstacles.is_empty() {
            tracing::debug!(count = obstacles.len(), "placed obstacles");
        }

        Ok(Self {
            drag,
            obstacles,
            stiffness,
        })
    }

    /// Drag coefficients.
    #[must_use]
    pub fn drag(&self) -> &DragCoefficients {
        &self.drag
    }

    /// The fixed obstacle set.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Whether any obstacle exists.
    #[must_use]
    pub fn has_obstacles(&self) -> bool {
        !self.obstacles.is_empty()
    }

    /// Obstacle contact stiffness.
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Repulsive force on a point from every obstacle it penetrates.
    ///
    /// A point only interacts with an obstacle when it lies strictly inside
    /// the obstacle's bounding square and strictly inside its circle. A point
    /// exactly at an obstacle center is pushed along `+x`.
    #[must_use]
    pub fn obstacle_force(&self, point: &Point2<f64>) -> ObstacleContact {
        let mut contact = ObstacleContact::NONE;

        for obstacle in &self.obstacles {
            let r = obstacle.radius;
            let offset = *point - obstacle.center;
            if offset.x.abs() >= r || offset.y.abs() >= r {
                continue;
            }

            let distance = offset.norm();
            if distance >= r {
                continue;
            }

            let depth = r - distance;
            let scale = CONTACT_SCALE * r;
            let magnitude =
                self.stiffness * depth + scale * self.stiffness * (depth / scale).powi(2);
            let direction = if distance > 0.0 {
                offset / distance
            } else {
                Vector2::x()
            };

            contact.force += direction * magnitude;
            contact.magnitude += magnitude;
        }

        contact
    }
}

/// Expand an obstacle layout into a concrete obstacle list.
///
/// Random layouts are reproducible: the same seed always yields the same
/// obstacles.
pub fn generate_obstacles(layout: &ObstacleLayout) -> Result<Vec<Obstacle>> {
    layout.validate()?;

    let obstacles = match layout {
        ObstacleLayout::None => Vec::new(),
        ObstacleLayout::Explicit { obstacles } => obstacles.clone(),
        ObstacleLayout::Square {
            count,
            radius,
            spacing,
            origin,
        } => {
            let columns = grid_columns(*count);
            (0..*count)
                .map(|k| {
                    let (row, col) = (k / columns, k % columns);
                    let center = *origin + Vector2::new(col as f64, row as f64) * *spacing;
                    Obstacle::new(center, *radius)
                })
                .collect()
        }
        ObstacleLayout::Hexagonal {
            count,
            radius,
            spacing,
            origin,
        } => {
            let columns = grid_columns(*count);
            let row_height = spacing * 3.0_f64.sqrt() / 2.0;
            (0..*count)
                .map(|k| {
                    let (row, col) = (k / columns, k % columns);
                    let shift = if row % 2 == 1 { 0.5 } else { 0.0 };
                    let center = *origin
                        + Vector2::new((col as f64 + shift) * spacing, row as f64 * row_height);
                    Obstacle::new(center, *radius)
                })
                .collect()
        }
        ObstacleLayout::Random {
            count,
            radius,
            origin,
            extent,
            seed,
        } => {
            let mut rng = StdRng::seed_from_u64(*seed);
            (0..*count)
                .map(|_| {
                    let dx = rng.gen_range(-*extent..=*extent);
                    let dy = rng.gen_range(-*extent..=*extent);
                    Obstacle::new(*origin + Vector2::new(dx, dy), *radius)
                })
                .collect()
        }
    };

    Ok(obstacles)
}

/// Columns of the most nearly square grid holding `count` cells.
fn grid_columns(count: usize) -> usize {
    let mut columns = 1;
    while columns * columns < count {
        columns += 1;
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_obstacle(radius: f64) -> Environment {
        let config = EnvironmentConfig::default().with_obstacles(ObstacleLayout::Explicit {
            obstacles: vec![Obstacle::new(Point2::origin(), radius)],
        });
        Environment::new(&config, 49, 0.1).unwrap()
    }

    #[test]
    fn test_drag_endpoints() {
        let water = DragCoefficients::interpolate(0.0, 49).unwrap();
        let agar = DragCoefficients::interpolate(1.0, 49).unwrap();

        assert_eq!(water.len(), 49);
        assert_relative_eq!(water.normal(0), 5.2e-6 / 98.0, epsilon = 1e-20);
        assert_relative_eq!(water.tangential(48), 3.3e-6 / 98.0, epsilon = 1e-20);
        assert_relative_eq!(agar.normal(10), 128e-3 / 98.0, epsilon = 1e-16);
        assert_relative_eq!(agar.tangential(0), 3.2e-3 / 98.0, epsilon = 1e-16);
    }

    #[test]
    fn test_drag_rejects_bad_medium() {
        assert!(DragCoefficients::interpolate(-0.01, 49).is_err());
        assert!(DragCoefficients::interpolate(1.01, 49).is_err());
        assert!(DragCoefficients::interpolate(f64::NAN, 49).is_err());
        assert!(DragCoefficients::interpolate(0.5, 0).is_err());
    }

    #[test]
    fn test_no_obstacles_no_force() {
        let env = Environment::new(&EnvironmentConfig::default(), 49, 0.1).unwrap();
        assert!(!env.has_obstacles());
        assert_eq!(env.obstacle_force(&Point2::origin()), ObstacleContact::NONE);
    }

    #[test]
    fn test_obstacle_force_direction_and_magnitude() {
        let env = single_obstacle(1e-4);
        let point = Point2::new(0.0, 0.5e-4);
        let contact = env.obstacle_force(&point);

        let depth: f64 = 0.5e-4;
        let scale = 1e-6;
        let expected = 0.1 * depth + scale * 0.1 * (depth / scale).powi(2);
        assert_relative_eq!(contact.magnitude, expected, epsilon = 1e-15);
        assert_relative_eq!(contact.force.x, 0.0, epsilon = 1e-18);
        assert_relative_eq!(contact.force.y, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_point_outside_circle_inside_square() {
        let env = single_obstacle(1e-4);
        // Corner of the bounding square, outside the circle
        let contact = env.obstacle_force(&Point2::new(0.9e-4, 0.9e-4));
        assert_eq!(contact, ObstacleContact::NONE);
        // On the boundary exactly
        let contact = env.obstacle_force(&Point2::new(1e-4, 0.0));
        assert_eq!(contact, ObstacleContact::NONE);
    }

    #[test]
    fn test_point_at_center() {
        let env = single_obstacle(1e-4);
        let contact = env.obstacle_force(&Point2::origin());
        assert!(contact.force.x > 0.0);
        assert!(contact.force.x.is_finite());
    }

    #[test]
    fn test_overlapping_obstacles_add_up() {
        let config = EnvironmentConfig::default().with_obstacles(ObstacleLayout::Explicit {
            obstacles: vec![
                Obstacle::new(Point2::new(-0.5e-4, 0.0), 1e-4),
                Obstacle::new(Point2::new(0.5e-4, 0.0), 1e-4),
            ],
        });
        let env = Environment::new(&config, 49, 0.1).unwrap();
        let contact = env.obstacle_force(&Point2::origin());

        // Symmetric pushes cancel, magnitudes add
        assert_relative_eq!(contact.force.x, 0.0, epsilon = 1e-15);
        assert!(contact.magnitude > 0.0);
        let single = single_obstacle(1e-4).obstacle_force(&Point2::new(0.5e-4, 0.0));
        assert_relative_eq!(contact.magnitude, 2.0 * single.magnitude, epsilon = 1e-15);
    }

    #[test]
    fn test_square_layout() {
        let obstacles = generate_obstacles(&ObstacleLayout::Square {
            count: 5,
            radius: 1e-4,
            spacing: 1e-3,
            origin: Point2::new(1.0, 2.0),
        })
        .unwrap();

        assert_eq!(obstacles.len(), 5);
        // Three columns for five obstacles
        assert_relative_eq!(obstacles[2].center.x, 1.002, epsilon = 1e-12);
        assert_relative_eq!(obstacles[3].center.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(obstacles[3].center.y, 2.001, epsilon = 1e-12);
    }

    #[test]
    fn test_hexagonal_layout_offsets_odd_rows() {
        let obstacles = generate_obstacles(&ObstacleLayout::Hexagonal {
            count: 4,
            radius: 1e-4,
            spacing: 1.0,
            origin: Point2::origin(),
        })
        .unwrap();

        assert_relative_eq!(obstacles[1].center.x, 1.0);
        assert_relative_eq!(obstacles[2].center.x, 0.5);
        assert_relative_eq!(obstacles[2].center.y, 3.0_f64.sqrt() / 2.0);
    }

    #[test]
    fn test_random_layout_is_reproducible() {
        let layout = ObstacleLayout::Random {
            count: 20,
            radius: 1e-4,
            origin: Point2::new(5e-4, 0.0),
            extent: 2e-3,
            seed: 42,
        };
        let a = generate_obstacles(&layout).unwrap();
        let b = generate_obstacles(&layout).unwrap();

        assert_eq!(a, b);
        for obstacle in &a {
            assert!((obstacle.center.x - 5e-4).abs() <= 2e-3);
            assert!(obstacle.center.y.abs() <= 2e-3);
        }
    }

    #[test]
    fn test_grid_columns() {
        assert_eq!(grid_columns(0), 1);
        assert_eq!(grid_columns(1), 1);
        assert_eq!(grid_columns(4), 2);
        assert_eq!(grid_columns(5), 3);
        assert_eq!(grid_columns(100), 10);
    }
}
