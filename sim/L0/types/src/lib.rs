//! Core types for the worm locomotion simulator.
//!
//! This crate provides the foundational data structures shared by every other
//! crate of the workspace:
//!
//! - [`SimulationConfig`] and its parts: run length, body shape, environment,
//!   neural constants, muscle filtering and integrator tolerances
//! - [`Parameters`]: the five gains explored by the parameter search
//! - [`Side`] and [`SidePair`]: typed dorsal/ventral pairs
//! - [`SimError`]: the error type of every fallible operation
//!
//! # Body Layout
//!
//! The body is a chain of `segments + 1` rigid rods. Neighbouring rods are
//! joined by one segment made of two horizontal (muscle-carrying) elements and
//! two diagonal elements:
//!
//! ```text
//!   rod i          rod i+1
//!     d ────────────── d      dorsal horizontal
//!     │ ╲            ╱ │
//!     │   ╲        ╱   │      diagonals: d_i → v_{i+1}, v_i → d_{i+1}
//!     │     ╲    ╱     │
//!     │       ╳        │
//!     │     ╱    ╲     │
//!     v ────────────── v      ventral horizontal
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Headless parameter searches
//! - Command-line tools
//! - Analysis of recorded trajectories

#![doc(html_root_url = "https://docs.rs/worm-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::return_self_not_must_use
)]
#![cfg_attr(
    test,
    allow(clippy::float_cmp, clippy::unwrap_used, clippy::expect_used)
)]

mod config;
mod environment;
mod error;
mod params;
mod side;

pub use config::{BodyConfig, MuscleConfig, NeuralConfig, SimulationConfig, SolverConfig};
pub use environment::{
    EnvironmentConfig, LOW_DRAG_MEDIUM, MAX_OBSTACLES, Obstacle, ObstacleLayout,
};
pub use error::{ElementKind, SimError};
pub use params::Parameters;
pub use side::{Side, SidePair};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
