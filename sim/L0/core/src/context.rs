//! Per-run state of the neural circuit, receptors and muscles.
//!
//! Everything that persists between accepted integrator steps, apart from
//! the body state owned by the integrator, lives in one
//! [`SimulationContext`]. A context is built in its reset state and belongs
//! to exactly one run at a time.

use worm_body::{BodyGeometry, Observables};
use worm_muscle::MuscleBank;
use worm_neural::{NeuralCircuit, StretchReceptors};
use worm_types::{Parameters, Result, SidePair, SimulationConfig};

/// Neural, sensory and muscle state of one run.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    receptors: StretchReceptors,
    circuit: NeuralCircuit,
    muscles: MuscleBank,
    timestep: f64,
    contact_force: f64,
}

impl SimulationContext {
    /// Build a context in the reset state.
    pub fn new(
        config: &SimulationConfig,
        geometry: &BodyGeometry,
        params: &Parameters,
    ) -> Result<Self> {
        let segments = geometry.segments();
        let receptors = StretchReceptors::new(
            geometry.rest_lengths(),
            geometry.receptor_compensations(),
            &config.neural,
            params,
        )?;
        let circuit = NeuralCircuit::new(&config.neural, segments, params)?;
        let muscles = MuscleBank::new(segments, &config.muscle)?;

        Ok(Self {
            receptors,
            circuit,
            muscles,
            timestep: config.timestep,
            contact_force: 0.0,
        })
    }

    /// Return to the start-of-run state: dorsal units ON, ventral OFF,
    /// relaxed muscles and silent receptors.
    pub fn reset(&mut self) {
        self.receptors.reset();
        self.circuit.reset();
        self.muscles.reset();
        self.contact_force = 0.0;
    }

    /// Muscle activations the mechanics sees during the next solve.
    #[must_use]
    pub fn activations(&self) -> &[SidePair<f64>] {
        self.muscles.activations()
    }

    /// Stretch receptors.
    #[must_use]
    pub fn receptors(&self) -> &StretchReceptors {
        &self.receptors
    }

    /// Neural circuit.
    #[must_use]
    pub fn circuit(&self) -> &NeuralCircuit {
        &self.circuit
    }

    /// Muscles.
    #[must_use]
    pub fn muscles(&self) -> &MuscleBank {
        &self.muscles
    }

    /// Total obstacle contact force at the last accepted state.
    #[must_use]
    pub fn contact_force(&self) -> f64 {
        self.contact_force
    }

    /// Advance receptors, then neurons, then muscles from the observables of
    /// an accepted state.
    pub fn advance(&mut self, observables: &Observables) -> Result<()> {
        let currents = self.receptors.update(&observables.lengths)?;
        let drive = self.circuit.update(currents)?;
        self.muscles.update(drive, self.timestep)?;
        self.contact_force = observables.contact_force;
        Ok(())
    }
}
