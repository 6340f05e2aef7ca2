//! Differential-evolution search over the simulator's five gain parameters.
//!
//! The search maximizes a [`FitnessFunction`], normally the squared head
//! displacement of a full simulation run:
//!
//! ```no_run
//! use worm_core::batch::BatchEvaluator;
//! use worm_evolve::{DifferentialEvolution, EvolutionConfig};
//! use worm_types::{Parameters, SimulationConfig};
//!
//! let evaluator = BatchEvaluator::new(SimulationConfig::default())?;
//! let fitness = |p: &Parameters| evaluator.evaluate(p);
//!
//! let search = DifferentialEvolution::new(EvolutionConfig::default().seed(1))?;
//! let report = search.run(&fitness);
//! println!("best {:?} -> {}", report.best, report.best_fitness);
//! # Ok::<(), worm_types::SimError>(())
//! ```
//!
//! Trials of one generation are simulated in parallel with rayon; each run
//! owns its simulation, so the outcome depends only on the seed.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/worm-evolve/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::needless_range_loop
)]
#![cfg_attr(
    test,
    allow(clippy::float_cmp, clippy::unwrap_used, clippy::expect_used)
)]

pub mod bounds;
pub mod config;
pub mod de;
pub mod report;

pub use bounds::ParameterBounds;
pub use config::{EvolutionConfig, MIN_POPULATION};
pub use de::{DifferentialEvolution, FitnessFunction, Member};
pub use report::{EvolutionReport, GenerationSummary};
