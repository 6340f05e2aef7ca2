//! Body mechanics for the worm locomotion simulator.
//!
//! This crate models the physical body: a planar chain of rigid rods joined
//! by elastic segments, moving through a viscous medium.
//!
//! - [`BodyGeometry`]: rod radii and element rest lengths (computed once)
//! - [`ElementConstants`]: stiffness and damping of the elastic elements
//! - [`Environment`]: anisotropic drag and circular obstacles
//! - [`Mechanics`]: the residual `implied velocity − proposed velocity`
//!   handed to the implicit integrator
//! - [`BodyState`]: layout of rods in the state vector
//!
//! # Force Model
//!
//! Each segment carries two horizontal elements (one per side) that combine a
//! passive spring, a muscle whose rest length shortens with activation, and
//! damping. Two stiff diagonal elements keep the cross-section from shearing.
//! Forces act on the dorsal/ventral terminal points of each rod and are
//! converted into rod velocities through a resistive-force drag law, so the
//! model has no inertia.
//!
//! # Example
//!
//! ```
//! use worm_body::{BodyState, Mechanics};
//! use worm_types::{BodyConfig, EnvironmentConfig, SidePair};
//!
//! let mechanics = Mechanics::new(&BodyConfig::default(), &EnvironmentConfig::agar())?;
//! let state = BodyState::straight(mechanics.geometry());
//! let muscles = vec![SidePair::splat(0.0); mechanics.geometry().segments()];
//!
//! let mut residual = vec![0.0; mechanics.dimension()];
//! mechanics.residual(
//!     state.positions.as_slice(),
//!     state.velocities.as_slice(),
//!     &muscles,
//!     &mut residual,
//! )?;
//! # Ok::<(), worm_types::SimError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/worm-body/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss,
    clippy::many_single_char_names
)]
#![cfg_attr(
    test,
    allow(clippy::float_cmp, clippy::unwrap_used, clippy::expect_used)
)]

pub mod environment;
pub mod geometry;
pub mod mechanics;
pub mod state;

pub use environment::{DragCoefficients, Environment, ObstacleContact, generate_obstacles};
pub use geometry::{BodyGeometry, ElementConstants};
pub use mechanics::{MIN_ELEMENT_LENGTH, Mechanics, Observables};
pub use state::{BodyState, COORDS_PER_ROD, RodPose};
