//! The five gains explored by the parameter search.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// Scalar gains applied on top of the neuromechanical model.
///
/// Each gain multiplies one pathway of the model, so `Parameters::default()`
/// (every gain at `1.0`) reproduces the unscaled model, while
/// [`Parameters::zero`] silences every scaled pathway.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Parameters {
    /// Neuromuscular-junction gain (scales neural drive to every muscle).
    pub nmj_gain: f64,
    /// Stretch-receptor gain (scales every receptor current).
    pub sr_gain: f64,
    /// Ventral ionic gain (scales sensory input to ventral units).
    pub ventral_gain: f64,
    /// Dorsal ionic gain (scales sensory input to dorsal units).
    pub dorsal_gain: f64,
    /// Bilinear-asymmetry gain (scales the dorsal receptor response).
    pub bilinear_gain: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::splat(1.0)
    }
}

impl Parameters {
    /// Number of parameters.
    pub const COUNT: usize = 5;

    /// Parameter names, in array order.
    pub const NAMES: [&'static str; Self::COUNT] = [
        "nmj_gain",
        "sr_gain",
        "ventral_gain",
        "dorsal_gain",
        "bilinear_gain",
    ];

    /// Create a parameter set.
    #[must_use]
    pub const fn new(
        nmj_gain: f64,
        sr_gain: f64,
        ventral_gain: f64,
        dorsal_gain: f64,
        bilinear_gain: f64,
    ) -> Self {
        Self {
            nmj_gain,
            sr_gain,
            ventral_gain,
            dorsal_gain,
            bilinear_gain,
        }
    }

    /// Every gain set to the same value.
    #[must_use]
    pub const fn splat(value: f64) -> Self {
        Self::new(value, value, value, value, value)
    }

    /// Every gain zero: no neural drive reaches the muscles.
    #[must_use]
    pub const fn zero() -> Self {
        Self::splat(0.0)
    }

    /// Build from an array in [`Parameters::NAMES`] order.
    #[must_use]
    pub const fn from_array(values: [f64; Self::COUNT]) -> Self {
        Self::new(values[0], values[1], values[2], values[3], values[4])
    }

    /// Convert to an array in [`Parameters::NAMES`] order.
    #[must_use]
    pub const fn to_array(&self) -> [f64; Self::COUNT] {
        [
            self.nmj_gain,
            self.sr_gain,
            self.ventral_gain,
            self.dorsal_gain,
            self.bilinear_gain,
        ]
    }

    /// Reject NaN or infinite gains.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in Self::NAMES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}
