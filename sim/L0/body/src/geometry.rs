//! Body geometry: rod radii and element rest lengths.
//!
//! The body outline is approximated by an ellipse. Rod `i` sits at
//! `u = (i - N/2) / (N/2 + 0.2)` along the major axis and its half-width is
//!
//! ```text
//! R[i] = D/2 · |sin(acos(u))|
//! ```
//!
//! The `+0.2` margin keeps the head and tail rods strictly wider than zero.
//! Everything in this module is computed once from [`BodyConfig`] and never
//! changes during a run.

use worm_types::{BodyConfig, Result, SimError};

/// Fraction of the local body width by which a fully active muscle shortens
/// its horizontal element.
const CONTRACTION_FRACTION: f64 = 0.65;

/// Margin added to the half-length of the ellipse so end rods keep a width.
const END_MARGIN: f64 = 0.2;

/// Stiffness and damping of the elastic elements.
///
/// Values are per segment and scale with the segment count so that the
/// whole body keeps the same compliance when it is discretised differently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementConstants {
    /// Passive horizontal stiffness.
    pub k_pe: f64,
    /// Passive horizontal damping.
    pub d_pe: f64,
    /// Active (muscle) horizontal stiffness at full activation.
    pub k_ae: f64,
    /// Active horizontal damping at full activation.
    pub d_ae: f64,
    /// Diagonal stiffness.
    pub k_de: f64,
    /// Diagonal damping.
    pub d_de: f64,
    /// Obstacle contact stiffness.
    pub k_obstacle: f64,
}

impl ElementConstants {
    /// Constants for a body of `segments` segments (obstacles at `5·k_pe`).
    #[must_use]
    pub fn for_segments(segments: usize) -> Self {
        let k_pe = (segments as f64 / 24.0) * 10e-3;
        let d_pe = 0.025 * k_pe;
        let k_de = 350.0 * k_pe;
        Self {
            k_pe,
            d_pe,
            k_ae: 20.0 * k_pe,
            d_ae: 5.0 * 20.0 * d_pe,
            k_de,
            d_de: 0.01 * k_de,
            k_obstacle: 5.0 * k_pe,
        }
    }

    /// Set the obstacle stiffness as a multiple of `k_pe`.
    #[must_use]
    pub fn with_obstacle_scale(mut self, scale: f64) -> Self {
        self.k_obstacle = scale * self.k_pe;
        self
    }

    /// Force along a horizontal element (positive pushes its ends apart).
    ///
    /// Combines the passive spring (with a quartic stiffening once stretched
    /// past rest), the muscle spring whose rest length shortens with
    /// activation, and activation-dependent damping. Negative activation is
    /// treated as zero.
    #[must_use]
    pub fn horizontal_force(
        &self,
        rest_length: f64,
        min_length: f64,
        length: f64,
        rate: f64,
        activation: f64,
    ) -> f64 {
        let a = activation.max(0.0);
        let active_rest = rest_length - a * (rest_length - min_length);

        let active = self.k_ae * a * (active_rest - length);
        let stretch = if length > rest_length {
            (2.0 * (length - rest_length)).powi(4)
        } else {
            0.0
        };
        let passive = self.k_pe * ((rest_length - length) + stretch);
        let damping = (self.d_pe + a * self.d_ae) * rate;

        passive + active - damping
    }

    /// Force along a diagonal element (positive pushes its ends apart).
    #[must_use]
    pub fn diagonal_force(&self, rest_length: f64, length: f64, rate: f64) -> f64 {
        self.k_de * (rest_length - length) - self.d_de * rate
    }
}

/// Immutable geometry of the segmented body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyGeometry {
    diameter: f64,
    segment_length: f64,
    radius: Vec<f64>,
    rest_length: Vec<f64>,
    diagonal_rest_length: Vec<f64>,
    min_length: Vec<f64>,
    compensation: Vec<f64>,
}

impl BodyGeometry {
    /// Compute the geometry for a body configuration.
    pub fn new(config: &BodyConfig) -> Result<Self> {
        config.validate()?;

        let segments = config.segments;
        let diameter = config.diameter;
        let segment_length = config.segment_length();
        let half = segments as f64 / 2.0;

        let radius: Vec<f64> = (0..=segments)
            .map(|i| {
                let u = (i as f64 - half) / (half + END_MARGIN);
                diameter / 2.0 * u.acos().sin().abs()
            })
            .collect();

        if let Some(i) = radius.iter().position(|r| !(r.is_finite() && *r > 0.0)) {
            return Err(SimError::invalid_config(format!(
                "rod {i} has non-positive radius {}",
                radius[i]
            )));
        }

        let mut rest_length = Vec::with_capacity(segments);
        let mut diagonal_rest_length = Vec::with_capacity(segments);
        let mut min_length = Vec::with_capacity(segments);
        let mut compensation = Vec::with_capacity(segments);

        for pair in radius.windows(2) {
            let (r0, r1) = (pair[0], pair[1]);
            let rest = segment_length.hypot(r0 - r1);
            rest_length.push(rest);
            diagonal_rest_length.push(segment_length.hypot(r0 + r1));
            min_length.push((1.0 - CONTRACTION_FRACTION * (r0 + r1) / diameter) * rest);
            compensation.push(diameter / (r0 + r1));
        }

        Ok(Self {
            diameter,
            segment_length,
            radius,
            rest_length,
            diagonal_rest_length,
            min_length,
            compensation,
        })
    }

    /// Number of segments.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.rest_length.len()
    }

    /// Number of rods (`segments + 1`).
    #[must_use]
    pub fn rods(&self) -> usize {
        self.radius.len()
    }

    /// Maximum body diameter.
    #[must_use]
    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    /// Undeformed segment length.
    #[must_use]
    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    /// Half-width of each rod.
    #[must_use]
    pub fn radii(&self) -> &[f64] {
        &self.radius
    }

    /// Half-width of rod `i`.
    #[must_use]
    pub fn radius(&self, i: usize) -> f64 {
        self.radius[i]
    }

    /// Rest lengths of the horizontal elements.
    #[must_use]
    pub fn rest_lengths(&self) -> &[f64] {
        &self.rest_length
    }

    /// Rest length of the horizontal elements of segment `i`.
    #[must_use]
    pub fn rest_length(&self, i: usize) -> f64 {
        self.rest_length[i]
    }

    /// Rest length of the diagonal elements of segment `i`.
    #[must_use]
    pub fn diagonal_rest_length(&self, i: usize) -> f64 {
        self.diagonal_rest_length[i]
    }

    /// Length of a fully contracted horizontal element of segment `i`.
    #[must_use]
    pub fn min_length(&self, i: usize) -> f64 {
        self.min_length[i]
    }

    /// How far a muscle of segment `i` can shorten its element.
    #[must_use]
    pub fn contraction_range(&self, i: usize) -> f64 {
        self.rest_length[i] - self.min_length[i]
    }

    /// Receptor shape compensation of segment `i` (`D / (R[i] + R[i+1])`).
    ///
    /// Thin segments near the head and tail stretch less for the same
    /// curvature; this factor equalises their receptor response.
    #[must_use]
    pub fn receptor_compensation(&self, i: usize) -> f64 {
        self.compensation[i]
    }

    /// Receptor shape compensation of every segment.
    #[must_use]
    pub fn receptor_compensations(&self) -> &[f64] {
        &self.compensation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_geometry() {
        let geometry = BodyGeometry::new(&BodyConfig::default()).unwrap();
        assert_eq!(geometry.segments(), 48);
        assert_eq!(geometry.rods(), 49);
        assert_relative_eq!(geometry.segment_length(), 1e-3 / 48.0, epsilon = 1e-18);

        // Widest at the middle rod, symmetric about it
        assert_relative_eq!(geometry.radius(24), 40e-6, epsilon = 1e-15);
        for i in 0..=24 {
            assert_relative_eq!(geometry.radius(i), geometry.radius(48 - i), epsilon = 1e-18);
        }
        assert!(geometry.radii().iter().all(|&r| r > 0.0 && r <= 40e-6));
    }

    #[test]
    fn test_end_radius_matches_ellipse() {
        let geometry = BodyGeometry::new(&BodyConfig::default()).unwrap();
        let u: f64 = -24.0 / 24.2;
        let expected = 40e-6 * (1.0 - u * u).sqrt();
        assert_relative_eq!(geometry.radius(0), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_rest_lengths() {
        let geometry = BodyGeometry::new(&BodyConfig::default()).unwrap();
        let seg = geometry.segment_length();

        for i in 0..geometry.segments() {
            let (r0, r1) = (geometry.radius(i), geometry.radius(i + 1));
            assert_relative_eq!(
                geometry.rest_length(i),
                (seg * seg + (r0 - r1).powi(2)).sqrt(),
                epsilon = 1e-18
            );
            assert_relative_eq!(
                geometry.diagonal_rest_length(i),
                (seg * seg + (r0 + r1).powi(2)).sqrt(),
                epsilon = 1e-18
            );
            assert!(geometry.min_length(i) < geometry.rest_length(i));
            assert!(geometry.min_length(i) > 0.0);
            assert_relative_eq!(
                geometry.contraction_range(i),
                geometry.rest_length(i) - geometry.min_length(i)
            );
        }
    }

    #[test]
    fn test_compensation_largest_at_ends() {
        let geometry = BodyGeometry::new(&BodyConfig::default()).unwrap();
        let mid = geometry.receptor_compensation(23);
        assert!(geometry.receptor_compensation(0) > mid);
        assert!(geometry.receptor_compensation(47) > mid);
        assert_relative_eq!(mid, 80e-6 / (geometry.radius(23) + geometry.radius(24)));
    }

    #[test]
    fn test_odd_segment_count() {
        let geometry = BodyGeometry::new(&BodyConfig::with_segments(7)).unwrap();
        assert_eq!(geometry.rods(), 8);
        assert!(geometry.radii().iter().all(|&r| r > 0.0));
    }

    #[test]
    fn test_invalid_body() {
        assert!(BodyGeometry::new(&BodyConfig::with_segments(0)).is_err());

        let mut config = BodyConfig::default();
        config.diameter = -1.0;
        assert!(BodyGeometry::new(&config).is_err());
    }

    #[test]
    fn test_element_constants() {
        let c = ElementConstants::for_segments(48);
        assert_relative_eq!(c.k_pe, 0.02, epsilon = 1e-15);
        assert_relative_eq!(c.d_pe, 0.025 * 0.02, epsilon = 1e-15);
        assert_relative_eq!(c.k_ae, 0.4, epsilon = 1e-15);
        assert_relative_eq!(c.d_ae, 100.0 * c.d_pe, epsilon = 1e-15);
        assert_relative_eq!(c.k_de, 7.0, epsilon = 1e-12);
        assert_relative_eq!(c.d_de, 0.07, epsilon = 1e-12);
        assert_relative_eq!(c.k_obstacle, 0.1, epsilon = 1e-15);
        assert_relative_eq!(c.with_obstacle_scale(2.0).k_obstacle, 0.04, epsilon = 1e-15);
    }

    #[test]
    fn test_horizontal_force() {
        let c = ElementConstants::for_segments(48);
        let (rest, min) = (2e-5, 1e-5);

        // At rest, relaxed, not moving
        assert_relative_eq!(c.horizontal_force(rest, min, rest, 0.0, 0.0), 0.0);

        // Negative activation is ignored
        assert_relative_eq!(
            c.horizontal_force(rest, min, rest, 0.0, -0.7),
            c.horizontal_force(rest, min, rest, 0.0, 0.0)
        );

        // Activation pulls the ends together
        let f = c.horizontal_force(rest, min, rest, 0.0, 1.0);
        assert_relative_eq!(f, c.k_ae * (min - rest), epsilon = 1e-18);
        assert!(f < 0.0);

        // Stretching adds the quartic term
        let l = 1.1 * rest;
        let expected = c.k_pe * ((rest - l) + (2.0 * (l - rest)).powi(4));
        assert_relative_eq!(c.horizontal_force(rest, min, l, 0.0, 0.0), expected);

        // Damping opposes elongation
        assert!(c.horizontal_force(rest, min, rest, 1e-3, 0.0) < 0.0);
    }

    #[test]
    fn test_diagonal_force() {
        let c = ElementConstants::for_segments(48);
        assert_relative_eq!(c.diagonal_force(3e-5, 3e-5, 0.0), 0.0);
        assert!(c.diagonal_force(3e-5, 2e-5, 0.0) > 0.0);
        assert!(c.diagonal_force(3e-5, 3e-5, 1.0) < 0.0);
    }
}
