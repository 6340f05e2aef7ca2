//! Sensory feedback and pattern generation for the worm locomotion simulator.
//!
//! Undulation is not produced by an intrinsic oscillator. It emerges from
//! proprioception: bistable motor neurons switch when the stretch receptors
//! of the body behind them report enough bending, and the resulting muscle
//! contraction bends the body the other way.
//!
//! ```text
//!   element lengths ──► StretchReceptors ──► NeuralCircuit ──► muscle drive
//!         ▲                                                         │
//!         └─────────────────── body mechanics ◄──── muscles ◄───────┘
//! ```
//!
//! - [`StretchReceptors`]: per-segment currents from relative elongation
//! - [`NeuralCircuit`]: bistable dorsal/ventral units with hysteresis
//!
//! Both are updated once per physical timestep, after the integrator has
//! accepted the mechanical state.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/worm-neural/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss,
    clippy::suboptimal_flops
)]
#![cfg_attr(
    test,
    allow(clippy::float_cmp, clippy::unwrap_used, clippy::expect_used)
)]

pub mod circuit;
pub mod receptor;

pub use circuit::NeuralCircuit;
pub use receptor::StretchReceptors;
