//! Simulation driver for the worm locomotion simulator.
//!
//! This crate couples the body mechanics, the neural circuit, the stretch
//! receptors and the muscles into one run:
//!
//! ```text
//!          ┌──────────────── SimulationContext ───────────────┐
//!          │                                                  │
//!  lengths │  StretchReceptors ─► NeuralCircuit ─► MuscleBank │ activations
//!     ┌────┤                                                  ├────┐
//!     │    └──────────────────────────────────────────────────┘    │
//!     │                                                            ▼
//!  Mechanics::observe ◄── DaeSolver::solve_to ◄── WormSystem (Mechanics + activations)
//! ```
//!
//! - [`Simulation`]: owns the configuration, the mechanics and the context;
//!   every run starts from the reset state
//! - [`Trajectory`], [`TrajectoryWriter`]: sampled frames and their text format
//! - [`fitness`], [`fitness_from_csv`]: squared head displacement
//! - [`batch::BatchEvaluator`]: many independent runs in parallel
//!
//! # Quick Start
//!
//! ```no_run
//! use worm_core::{Simulation, TrajectoryWriter, fitness};
//! use worm_types::{Parameters, SimulationConfig};
//!
//! let config = SimulationConfig::with_duration(1.0).medium(0.0);
//! let mut sim = Simulation::new(config, Parameters::default())?;
//!
//! let trajectory = sim.run()?;
//! println!("fitness = {}", fitness(&trajectory));
//!
//! // Or stream frames straight to a file
//! let file = std::fs::File::create("trajectory.csv")?;
//! let summary = sim.run_with(TrajectoryWriter::new(std::io::BufWriter::new(file)))?;
//! println!("{} frames", summary.frames);
//! # Ok::<(), worm_types::SimError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/worm-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![cfg_attr(
    test,
    allow(clippy::float_cmp, clippy::unwrap_used, clippy::expect_used)
)]

pub mod batch;
pub mod context;
pub mod fitness;
pub mod simulation;
pub mod system;
pub mod trajectory;

pub use batch::BatchEvaluator;
pub use context::SimulationContext;
pub use fitness::{fitness, fitness_from_csv, head_displacement, read_final_frame};
pub use simulation::{RunSummary, Simulation, evaluate, run_simulation};
pub use system::{HALF_BANDWIDTH, WormSystem};
pub use trajectory::{Discard, Frame, FrameSink, SEPARATOR, Trajectory, TrajectoryWriter};

pub use worm_dae::SolverStats;
