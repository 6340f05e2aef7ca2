//! Stretch receptors: one dorsal/ventral pair per segment.
//!
//! Each receptor reports the relative elongation of its horizontal element.
//! The dorsal side responds bilinearly (weaker when stretched than when
//! compressed) to counter the left/right asymmetry of the one-way neural
//! inhibition:
//!
//! ```text
//! dorsal:  I = c · g_sr · (L − L0)/L0 · (0.8 if L > L0 else 1.2) · g_bilinear
//! ventral: I = c · g_sr · (L − L0)/L0
//! ```
//!
//! where `c` is the segment's shape compensation.

use worm_types::{NeuralConfig, Parameters, Result, SidePair, SimError};

/// Stretch receptor currents of every segment.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchReceptors {
    rest_lengths: Vec<f64>,
    compensation: Vec<f64>,
    stretch_gain: f64,
    compression_gain: f64,
    sr_gain: f64,
    bilinear_gain: f64,
    currents: Vec<SidePair<f64>>,
}

impl StretchReceptors {
    /// Create receptors for segments with the given rest lengths and shape
    /// compensation factors.
    pub fn new(
        rest_lengths: &[f64],
        compensation: &[f64],
        config: &NeuralConfig,
        params: &Parameters,
    ) -> Result<Self> {
        if rest_lengths.len() != compensation.len() {
            return Err(SimError::invalid_config(format!(
                "{} rest lengths but {} compensation factors",
                rest_lengths.len(),
                compensation.len()
            )));
        }
        if rest_lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(SimError::invalid_config(
                "receptor rest lengths must be positive",
            ));
        }
        params.validate()?;

        Ok(Self {
            rest_lengths: rest_lengths.to_vec(),
            compensation: compensation.to_vec(),
            stretch_gain: config.stretch_gain,
            compression_gain: config.compression_gain,
            sr_gain: params.sr_gain,
            bilinear_gain: params.bilinear_gain,
            currents: vec![SidePair::splat(0.0); rest_lengths.len()],
        })
    }

    /// Number of segments.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.rest_lengths.len()
    }

    /// Currents computed by the last update (zero after reset).
    #[must_use]
    pub fn currents(&self) -> &[SidePair<f64>] {
        &self.currents
    }

    /// Zero every current.
    pub fn reset(&mut self) {
        self.currents.fill(SidePair::splat(0.0));
    }

    /// Recompute the currents from horizontal element lengths.
    pub fn update(&mut self, lengths: &[SidePair<f64>]) -> Result<&[SidePair<f64>]> {
        if lengths.len() != self.segments() {
            return Err(SimError::invalid_config(format!(
                "{} length pairs for {} receptors",
                lengths.len(),
                self.segments()
            )));
        }

        for (i, (current, length)) in self.currents.iter_mut().zip(lengths).enumerate() {
            let rest = self.rest_lengths[i];
            let gain = self.compensation[i] * self.sr_gain;

            let dorsal_strain = (length.dorsal - rest) / rest;
            let bilinear = if length.dorsal > rest {
                self.stretch_gain
            } else {
                self.compression_gain
            };
            current.dorsal = gain * dorsal_strain * bilinear * self.bilinear_gain;
            current.ventral = gain * (length.ventral - rest) / rest;
        }

        Ok(&self.currents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn receptors(params: &Parameters) -> StretchReceptors {
        StretchReceptors::new(
            &[2e-5, 2e-5, 2e-5],
            &[4.0, 2.0, 4.0],
            &NeuralConfig::default(),
            params,
        )
        .unwrap()
    }

    #[test]
    fn test_rest_length_gives_zero_current() {
        let mut sr = receptors(&Parameters::new(3.0, -2.0, 1.0, 1.0, 7.0));
        let currents = sr.update(&[SidePair::splat(2e-5); 3]).unwrap();
        for c in currents {
            assert_eq!(c.dorsal, 0.0);
            assert_eq!(c.ventral, 0.0);
        }
    }

    #[test]
    fn test_bilinear_dorsal_response() {
        let mut sr = receptors(&Parameters::default());
        let lengths = [
            SidePair::new(2.2e-5, 2.2e-5),
            SidePair::new(1.8e-5, 1.8e-5),
            SidePair::splat(2e-5),
        ];
        let currents = sr.update(&lengths).unwrap();

        // 10% stretch, compensation 4
        assert_relative_eq!(currents[0].dorsal, 4.0 * 0.1 * 0.8, epsilon = 1e-12);
        assert_relative_eq!(currents[0].ventral, 4.0 * 0.1, epsilon = 1e-12);
        // 10% compression, compensation 2
        assert_relative_eq!(currents[1].dorsal, -2.0 * 0.1 * 1.2, epsilon = 1e-12);
        assert_relative_eq!(currents[1].ventral, -2.0 * 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_gains_scale_currents() {
        let mut base = receptors(&Parameters::default());
        let mut scaled = receptors(&Parameters::new(1.0, 2.0, 1.0, 1.0, 0.5));
        let lengths = [SidePair::new(2.1e-5, 1.9e-5); 3];

        let a = base.update(&lengths).unwrap().to_vec();
        let b = scaled.update(&lengths).unwrap();
        for (a, b) in a.iter().zip(b) {
            assert_relative_eq!(b.dorsal, a.dorsal * 2.0 * 0.5, epsilon = 1e-12);
            assert_relative_eq!(b.ventral, a.ventral * 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reset_and_size_check() {
        let mut sr = receptors(&Parameters::default());
        sr.update(&[SidePair::splat(3e-5); 3]).unwrap();
        assert!(sr.currents()[0].ventral > 0.0);

        sr.reset();
        assert!(sr.currents().iter().all(|c| *c == SidePair::splat(0.0)));

        assert!(sr.update(&[SidePair::splat(2e-5); 2]).is_err());
    }

    #[test]
    fn test_invalid_construction() {
        let config = NeuralConfig::default();
        let params = Parameters::default();
        assert!(StretchReceptors::new(&[1.0], &[1.0, 2.0], &config, &params).is_err());
        assert!(StretchReceptors::new(&[0.0], &[1.0], &config, &params).is_err());

        let params = Parameters::new(f64::NAN, 1.0, 1.0, 1.0, 1.0);
        assert!(StretchReceptors::new(&[1.0], &[1.0], &config, &params).is_err());
    }
}
