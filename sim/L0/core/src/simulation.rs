//! The simulation driver.
//!
//! One run advances the body through `⌊duration/dt⌋` physical timesteps:
//!
//! ```text
//! reset context, straight body at rest, frame 0
//! for k in 1..=steps:
//!     integrate the mechanics to k·dt        (activations frozen)
//!     observe element lengths of the accepted state
//!     receptors → neural circuit → muscles
//!     every steps_per_frame steps: emit a frame
//! ```
//!
//! A failed solve ends the run with that error.

use nalgebra::DVector;
use tracing::{debug, info, warn};
use worm_body::{BodyState, COORDS_PER_ROD, Mechanics};
use worm_dae::{DaeSolver, SolverSettings, SolverStats, Tolerances};
use worm_types::{Parameters, Result, SimulationConfig};

use crate::context::SimulationContext;
use crate::system::WormSystem;
use crate::trajectory::{Discard, Frame, FrameSink, Trajectory};

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Physical timesteps taken.
    pub steps: usize,
    /// Frames handed to the sink.
    pub frames: usize,
    /// Time reached.
    pub final_time: f64,
    /// Head `x` in the last emitted frame.
    pub head_displacement: f64,
    /// Integrator work counters.
    pub solver: SolverStats,
}

impl RunSummary {
    /// Squared head displacement.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.head_displacement * self.head_displacement
    }
}

/// A configured simulation of one body with one parameter set.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    params: Parameters,
    mechanics: Mechanics,
    context: SimulationContext,
}

impl Simulation {
    /// Validate the configuration and build the model.
    pub fn new(config: SimulationConfig, params: Parameters) -> Result<Self> {
        config.validate()?;
        params.validate()?;
        let mechanics = Mechanics::new(&config.body, &config.environment)?;
        let context = SimulationContext::new(&config, mechanics.geometry(), &params)?;

        Ok(Self {
            config,
            params,
            mechanics,
            context,
        })
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Parameters.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Body mechanics.
    #[must_use]
    pub fn mechanics(&self) -> &Mechanics {
        &self.mechanics
    }

    /// Neural and muscle state left by the last run.
    #[must_use]
    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Integrator tolerances: positions and angles get their own absolute
    /// tolerance, tightened in low-drag media.
    #[must_use]
    pub fn tolerances(&self) -> Tolerances {
        let solver = &self.config.solver;
        let absolute = DVector::from_fn(self.mechanics.dimension(), |k, _| {
            if k % COORDS_PER_ROD == COORDS_PER_ROD - 1 {
                solver.angle_tolerance
            } else {
                solver.position_tolerance
            }
        });
        Tolerances::new(solver.relative_tolerance, absolute)
            .scaled(solver.tolerance_scale(&self.config.environment))
    }

    /// Run and collect every frame.
    pub fn run(&mut self) -> Result<Trajectory> {
        let mut trajectory = Trajectory::new();
        self.run_with(&mut trajectory)?;
        Ok(trajectory)
    }

    /// Run, handing each frame to `sink` as soon as it is sampled.
    pub fn run_with<S: FrameSink>(&mut self, mut sink: S) -> Result<RunSummary> {
        info!(
            params = ?self.params.to_array(),
            segments = self.mechanics.geometry().segments(),
            duration = self.config.duration,
            medium = self.config.environment.medium,
            "starting run"
        );

        match self.integrate(&mut sink) {
            Ok(summary) => {
                info!(
                    steps = summary.steps,
                    frames = summary.frames,
                    head_displacement = summary.head_displacement,
                    solver_steps = summary.solver.steps,
                    residual_evaluations = summary.solver.residual_evaluations,
                    jacobian_evaluations = summary.solver.jacobian_evaluations,
                    error_test_failures = summary.solver.error_test_failures,
                    convergence_failures = summary.solver.convergence_failures,
                    "run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "run failed");
                Err(e)
            }
        }
    }

    fn integrate(&mut self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        self.context.reset();

        let initial = BodyState::straight(self.mechanics.geometry());
        let mut solver = DaeSolver::new(
            0.0,
            initial.positions,
            initial.velocities,
            self.tolerances(),
            SolverSettings::from(&self.config.solver),
        )?;

        let dt = self.config.timestep;
        let steps = self.config.steps();
        let steps_per_frame = self.config.steps_per_frame();

        let first = Frame::from_state(0.0, solver.state());
        let mut head_displacement = head_x(&first);
        sink.frame(&first)?;
        let mut frames = 1;

        for k in 1..=steps {
            let tout = k as f64 * dt;
            {
                let system = WormSystem::new(&self.mechanics, self.context.activations());
                solver.solve_to(&system, tout)?;
            }

            let observables = self.mechanics.observe(solver.state().as_slice())?;
            self.context.advance(&observables)?;

            if k % steps_per_frame == 0 {
                let frame = Frame::from_state(solver.time(), solver.state());
                head_displacement = head_x(&frame);
                debug!(
                    time = frame.time,
                    head = head_displacement,
                    step_size = solver.step_size(),
                    "frame"
                );
                sink.frame(&frame)?;
                frames += 1;
            }
        }

        Ok(RunSummary {
            steps,
            frames,
            final_time: solver.time(),
            head_displacement,
            solver: solver.stats(),
        })
    }
}

fn head_x(frame: &Frame) -> f64 {
    frame.head().map_or(0.0, |head| head.position.x)
}

/// Build and run a simulation, collecting its trajectory.
pub fn run_simulation(config: SimulationConfig, params: Parameters) -> Result<Trajectory> {
    Simulation::new(config, params)?.run()
}

/// Fitness of one run without keeping its frames.
pub fn evaluate(config: &SimulationConfig, params: &Parameters) -> Result<f64> {
    let summary = Simulation::new(config.clone(), *params)?.run_with(Discard)?;
    Ok(summary.fitness())
}
