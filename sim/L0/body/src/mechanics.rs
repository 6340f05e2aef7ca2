//! Mechanical residual of the rod chain.
//!
//! The body moves in a low Reynolds number regime: inertia is negligible, so
//! the velocity of every rod is whatever the drag allows under the net
//! elastic, muscular and contact force. [`Mechanics::residual`] computes that
//! implied velocity and returns its difference from the velocity proposed by
//! the integrator, which drives the difference to zero.
//!
//! ```text
//!   state y, y' ──► terminal points ──► element lengths / rates
//!                                               │
//!                      muscle activations ──► element forces
//!                                               │
//!                          obstacles ──► net force per terminal point
//!                                               │
//!                                drag ──► implied rod velocity
//!                                               │
//!                         residual = implied − proposed
//! ```
//!
//! Nothing is cached between calls. The lengths needed by the stretch
//! receptors are extracted separately from accepted states by
//! [`Mechanics::observe`].

use nalgebra::{Point2, Vector2};
use worm_types::{
    BodyConfig, ElementKind, EnvironmentConfig, Result, Side, SidePair, SimError,
};

use crate::environment::Environment;
use crate::geometry::{BodyGeometry, ElementConstants};
use crate::state::{COORDS_PER_ROD, RodPose};

/// Element length below which the body is considered collapsed (m).
pub const MIN_ELEMENT_LENGTH: f64 = 1e-12;

/// Quantities read from an accepted state.
#[derive(Debug, Clone, PartialEq)]
pub struct Observables {
    /// Horizontal element lengths of every segment.
    pub lengths: Vec<SidePair<f64>>,
    /// Sum of obstacle force magnitudes over every terminal point.
    pub contact_force: f64,
}

/// Terminal (dorsal/ventral) points of one rod and their velocities.
#[derive(Debug, Clone, Copy)]
struct Terminals {
    points: SidePair<Point2<f64>>,
    velocities: SidePair<Vector2<f64>>,
}

/// One element spanning a segment.
#[derive(Debug, Clone, Copy)]
struct Element {
    length: f64,
    direction: Vector2<f64>,
    rate: f64,
}

/// Residual assembler for the rod chain.
#[derive(Debug, Clone)]
pub struct Mechanics {
    geometry: BodyGeometry,
    constants: ElementConstants,
    environment: Environment,
}

impl Mechanics {
    /// Build the assembler from configuration.
    pub fn new(body: &BodyConfig, environment: &EnvironmentConfig) -> Result<Self> {
        let geometry = BodyGeometry::new(body)?;
        let constants = ElementConstants::for_segments(geometry.segments())
            .with_obstacle_scale(environment.obstacle_stiffness_scale);
        let environment = Environment::new(environment, geometry.rods(), constants.k_obstacle)?;

        Ok(Self {
            geometry,
            constants,
            environment,
        })
    }

    /// Body geometry.
    #[must_use]
    pub fn geometry(&self) -> &BodyGeometry {
        &self.geometry
    }

    /// Element constants.
    #[must_use]
    pub fn constants(&self) -> &ElementConstants {
        &self.constants
    }

    /// Surrounding medium.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Length of the state vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        COORDS_PER_ROD * self.geometry.rods()
    }

    /// Evaluate the residual for state `y`, derivative `yp` and the current
    /// muscle activations, writing one entry per state coordinate to `out`.
    pub fn residual(
        &self,
        y: &[f64],
        yp: &[f64],
        muscles: &[SidePair<f64>],
        out: &mut [f64],
    ) -> Result<()> {
        let n = self.dimension();
        if y.len() != n || yp.len() != n || out.len() != n {
            return Err(SimError::solver_setup(format!(
                "state vectors have lengths {}/{}/{}, expected {n}",
                y.len(),
                yp.len(),
                out.len()
            )));
        }
        if muscles.len() != self.geometry.segments() {
            return Err(SimError::invalid_config(format!(
                "{} muscle pairs for {} segments",
                muscles.len(),
                self.geometry.segments()
            )));
        }
        if !y.iter().chain(yp).all(|v| v.is_finite()) {
            return Err(SimError::diverged("non-finite state passed to residual"));
        }

        let terminals: Vec<Terminals> = (0..self.geometry.rods())
            .map(|i| self.terminals(y, Some(yp), i))
            .collect();

        let forces = self.terminal_forces(&terminals, muscles)?;

        let drag = self.environment.drag();
        for (i, force) in forces.iter().enumerate() {
            let theta = y[COORDS_PER_ROD * i + 2];
            let (sin, cos) = theta.sin_cos();

            // Rotate into the rod frame: perpendicular to the rod axis is the
            // body's normal direction, along it the body's tangent.
            let perp = force.map(|f| f.x * cos + f.y * sin);
            let par = force.map(|f| f.x * sin - f.y * cos);

            let v_perp = (perp.dorsal + perp.ventral) / drag.normal(i);
            let v_par = (par.dorsal + par.ventral) / drag.tangential(i);
            let torque = (par.ventral - par.dorsal) / 2.0;
            let omega = (torque / drag.tangential(i))
                / (2.0 * std::f64::consts::PI * self.geometry.radius(i));

            let vx = v_perp * cos + v_par * sin;
            let vy = v_perp * sin - v_par * cos;

            let k = COORDS_PER_ROD * i;
            out[k] = vx - yp[k];
            out[k + 1] = vy - yp[k + 1];
            out[k + 2] = omega - yp[k + 2];
        }

        if let Some(k) = out.iter().position(|v| !v.is_finite()) {
            return Err(SimError::diverged(format!(
                "non-finite residual at coordinate {k}"
            )));
        }

        Ok(())
    }

    /// Extract receptor lengths and the contact readout from an accepted state.
    pub fn observe(&self, y: &[f64]) -> Result<Observables> {
        if y.len() != self.dimension() {
            return Err(SimError::solver_setup(format!(
                "state vector has length {}, expected {}",
                y.len(),
                self.dimension()
            )));
        }

        let terminals: Vec<Terminals> = (0..self.geometry.rods())
            .map(|i| self.terminals(y, None, i))
            .collect();

        let lengths = terminals
            .windows(2)
            .enumerate()
            .map(|(segment, pair)| {
                let mut lengths = SidePair::splat(0.0);
                for side in Side::BOTH {
                    let element = Self::element(
                        segment,
                        horizontal_kind(side),
                        (pair[0].points[side], pair[0].velocities[side]),
                        (pair[1].points[side], pair[1].velocities[side]),
                    )?;
                    lengths[side] = element.length;
                }
                Ok(lengths)
            })
            .collect::<Result<Vec<_>>>()?;

        let contact_force = if self.environment.has_obstacles() {
            terminals
                .iter()
                .flat_map(|t| [t.points.dorsal, t.points.ventral])
                .map(|p| self.environment.obstacle_force(&p).magnitude)
                .sum()
        } else {
            0.0
        };

        Ok(Observables {
            lengths,
            contact_force,
        })
    }

    /// Terminal points of rod `i`; velocities are zero when `yp` is `None`.
    fn terminals(&self, y: &[f64], yp: Option<&[f64]>, i: usize) -> Terminals {
        let pose = RodPose::from_state(y, i);
        let radius = self.geometry.radius(i);
        let arm = pose.axis() * radius;

        let velocities = match yp {
            Some(yp) => {
                let rate = RodPose::from_state(yp, i);
                // Rotation moves the points perpendicular to the rod axis
                let swing = Vector2::new(-pose.angle.sin(), pose.angle.cos()) * radius * rate.angle;
                let center = rate.position.coords;
                SidePair::new(center + swing, center - swing)
            }
            None => SidePair::splat(Vector2::zeros()),
        };

        Terminals {
            points: SidePair::new(pose.position + arm, pose.position - arm),
            velocities,
        }
    }

    /// Net force on every terminal point.
    fn terminal_forces(
        &self,
        terminals: &[Terminals],
        muscles: &[SidePair<f64>],
    ) -> Result<Vec<SidePair<Vector2<f64>>>> {
        let mut forces = vec![SidePair::splat(Vector2::zeros()); terminals.len()];
        let c = &self.constants;

        for (segment, pair) in terminals.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            let rest = self.geometry.rest_length(segment);
            let min = self.geometry.min_length(segment);
            let diagonal_rest = self.geometry.diagonal_rest_length(segment);

            for side in Side::BOTH {
                let other = side.opposite();

                let horizontal = Self::element(
                    segment,
                    horizontal_kind(side),
                    (a.points[side], a.velocities[side]),
                    (b.points[side], b.velocities[side]),
                )?;
                let f = c.horizontal_force(
                    rest,
                    min,
                    horizontal.length,
                    horizontal.rate,
                    muscles[segment][side],
                );
                forces[segment][side] -= horizontal.direction * f;
                forces[segment + 1][side] += horizontal.direction * f;

                // Diagonals cross from this side of rod i to the other side of rod i+1
                let diagonal = Self::element(
                    segment,
                    diagonal_kind(side),
                    (a.points[side], a.velocities[side]),
                    (b.points[other], b.velocities[other]),
                )?;
                let f = c.diagonal_force(diagonal_rest, diagonal.length, diagonal.rate);
                forces[segment][side] -= diagonal.direction * f;
                forces[segment + 1][other] += diagonal.direction * f;
            }
        }

        if self.environment.has_obstacles() {
            for (force, t) in forces.iter_mut().zip(terminals) {
                for side in Side::BOTH {
                    force[side] += self.environment.obstacle_force(&t.points[side]).force;
                }
            }
        }

        Ok(forces)
    }

    /// Length, unit direction and elongation rate of the element from `a` to `b`.
    fn element(
        segment: usize,
        kind: ElementKind,
        a: (Point2<f64>, Vector2<f64>),
        b: (Point2<f64>, Vector2<f64>),
    ) -> Result<Element> {
        let delta = b.0 - a.0;
        let length = delta.norm();
        if !length.is_finite() || length < MIN_ELEMENT_LENGTH {
            return Err(SimError::DegenerateGeometry {
                segment,
                element: kind,
                length,
            });
        }

        let direction = delta / length;
        Ok(Element {
            length,
            direction,
            rate: (b.1 - a.1).dot(&direction),
        })
    }
}

fn horizontal_kind(side: Side) -> ElementKind {
    match side {
        Side::Dorsal => ElementKind::DorsalHorizontal,
        Side::Ventral => ElementKind::VentralHorizontal,
    }
}

fn diagonal_kind(side: Side) -> ElementKind {
    match side {
        Side::Dorsal => ElementKind::DorsalDiagonal,
        Side::Ventral => ElementKind::VentralDiagonal,
    }
}
