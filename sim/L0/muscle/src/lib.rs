//! Body wall muscles for the worm locomotion simulator.
//!
//! Every body segment carries one dorsal and one ventral muscle. A muscle's
//! activation follows the neural drive through a first-order low-pass
//! filter (see [`activation`]), and the activation sets how far the muscle
//! shortens the horizontal element it lies along.
//!
//! ```text
//!   drive u ──►  ┌──────────────┐  ──► activation a ──► body mechanics
//!                │ da/dt=(u−a)/τ│
//!                └──────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use worm_muscle::MuscleBank;
//! use worm_types::{MuscleConfig, SidePair};
//!
//! let mut bank = MuscleBank::new(48, &MuscleConfig::default())?;
//!
//! // Dorsal side driven, ventral side inhibited
//! let drive = vec![SidePair::new(0.5, -0.5); 48];
//! let activations = bank.update(&drive, 0.001)?;
//! assert!(activations[0].dorsal > 0.0);
//! # Ok::<(), worm_types::SimError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/worm-muscle/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::suboptimal_flops
)]
#![cfg_attr(
    test,
    allow(clippy::float_cmp, clippy::unwrap_used, clippy::let_underscore_must_use)
)]

pub mod activation;

pub use activation::{MuscleDynamics, MuscleState};

use worm_types::{MuscleConfig, Result, Side, SidePair, SimError};

/// The dorsal/ventral muscle pairs of every segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleBank {
    dynamics: MuscleDynamics,
    muscles: Vec<SidePair<MuscleState>>,
    activations: Vec<SidePair<f64>>,
}

impl MuscleBank {
    /// Create relaxed muscles for `segments` segments.
    pub fn new(segments: usize, config: &MuscleConfig) -> Result<Self> {
        Ok(Self {
            dynamics: MuscleDynamics::from_config(config)?,
            muscles: vec![SidePair::splat(MuscleState::default()); segments],
            activations: vec![SidePair::splat(0.0); segments],
        })
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.muscles.len()
    }

    /// Check if the bank is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.muscles.is_empty()
    }

    /// The filter shared by every muscle.
    #[must_use]
    pub fn dynamics(&self) -> &MuscleDynamics {
        &self.dynamics
    }

    /// Get one muscle.
    #[must_use]
    pub fn muscle(&self, segment: usize, side: Side) -> Option<&MuscleState> {
        self.muscles.get(segment).map(|pair| &pair[side])
    }

    /// Current activations, one pair per segment.
    #[must_use]
    pub fn activations(&self) -> &[SidePair<f64>] {
        &self.activations
    }

    /// Relax every muscle.
    pub fn reset(&mut self) {
        self.muscles.fill(SidePair::splat(MuscleState::default()));
        self.activations.fill(SidePair::splat(0.0));
    }

    /// Advance every muscle one step toward its drive.
    pub fn update(&mut self, drive: &[SidePair<f64>], dt: f64) -> Result<&[SidePair<f64>]> {
        if drive.len() != self.muscles.len() {
            return Err(SimError::invalid_config(format!(
                "{} drive pairs for {} muscle pairs",
                drive.len(),
                self.muscles.len()
            )));
        }

        for ((pair, activation), input) in
            self.muscles.iter_mut().zip(&mut self.activations).zip(drive)
        {
            for side in Side::BOTH {
                pair[side].set_drive(input[side]);
                pair[side].update(&self.dynamics, dt);
                activation[side] = pair[side].activation();
            }
        }

        Ok(&self.activations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_bank_is_relaxed() {
        let bank = MuscleBank::new(48, &MuscleConfig::default()).unwrap();
        assert_eq!(bank.len(), 48);
        assert!(!bank.is_empty());
        assert!(bank.activations().iter().all(|a| *a == SidePair::splat(0.0)));
        assert!(bank.muscle(48, Side::Dorsal).is_none());
    }

    #[test]
    fn test_bank_converges_to_drive() {
        let mut bank = MuscleBank::new(4, &MuscleConfig::default()).unwrap();
        let drive = vec![SidePair::new(0.6, -0.6); 4];

        for _ in 0..2000 {
            bank.update(&drive, 0.001).unwrap();
        }
        for a in bank.activations() {
            assert_relative_eq!(a.dorsal, 0.6, epsilon = 1e-6);
            assert_relative_eq!(a.ventral, -0.6, epsilon = 1e-6);
        }
        assert_relative_eq!(bank.muscle(2, Side::Ventral).unwrap().drive, -0.6);
    }

    #[test]
    fn test_reset() {
        let mut bank = MuscleBank::new(2, &MuscleConfig::default()).unwrap();
        bank.update(&[SidePair::splat(1.0); 2], 0.001).unwrap();
        assert!(bank.activations()[1].ventral > 0.0);

        bank.reset();
        assert_eq!(bank.activations(), &[SidePair::splat(0.0); 2]);
        assert_eq!(bank.muscle(0, Side::Dorsal), Some(&MuscleState::default()));
    }

    #[test]
    fn test_size_mismatch() {
        let mut bank = MuscleBank::new(3, &MuscleConfig::default()).unwrap();
        assert!(bank.update(&[SidePair::splat(1.0); 2], 0.001).is_err());
        assert!(MuscleBank::new(3, &MuscleConfig { time_constant: -1.0 }).is_err());
    }
}
