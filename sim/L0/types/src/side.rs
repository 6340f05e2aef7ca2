//! Dorsal/ventral sides of the body.
//!
//! Every segment carries one muscle, one stretch receptor and one horizontal
//! element per side, and every neural unit is a dorsal/ventral pair. This
//! module provides a typed pair so those values are indexed by [`Side`]
//! instead of bare `0`/`1` offsets.

use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One side of the (planar) body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    /// Dorsal side (the `+R` terminal point of each rod).
    Dorsal,
    /// Ventral side (the `-R` terminal point of each rod).
    Ventral,
}

impl Side {
    /// Both sides, dorsal first.
    pub const BOTH: [Self; 2] = [Self::Dorsal, Self::Ventral];

    /// The contralateral side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Dorsal => Self::Ventral,
            Self::Ventral => Self::Dorsal,
        }
    }

    /// Sign of the terminal point offset along the rod axis (`+1` dorsal, `-1` ventral).
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Dorsal => 1.0,
            Self::Ventral => -1.0,
        }
    }
}

/// A value held once per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SidePair<T> {
    /// Dorsal value.
    pub dorsal: T,
    /// Ventral value.
    pub ventral: T,
}

impl<T> SidePair<T> {
    /// Create a pair from its dorsal and ventral values.
    #[must_use]
    pub const fn new(dorsal: T, ventral: T) -> Self {
        Self { dorsal, ventral }
    }

    /// Apply `f` to both values.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> SidePair<U> {
        SidePair {
            dorsal: f(self.dorsal),
            ventral: f(self.ventral),
        }
    }

    /// Build a pair by evaluating `f` for each side.
    #[must_use]
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self {
            dorsal: f(Side::Dorsal),
            ventral: f(Side::Ventral),
        }
    }
}

impl<T: Copy> SidePair<T> {
    /// Create a pair holding the same value on both sides.
    #[must_use]
    pub const fn splat(value: T) -> Self {
        Self {
            dorsal: value,
            ventral: value,
        }
    }
}

impl<T> Index<Side> for SidePair<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Dorsal => &self.dorsal,
            Side::Ventral => &self.ventral,
        }
    }
}

impl<T> IndexMut<Side> for SidePair<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Dorsal => &mut self.dorsal,
            Side::Ventral => &mut self.ventral,
        }
    }
}
