//! Bistable neural circuit (central pattern generator).
//!
//! The ventral nerve cord is reduced to a row of units, each a pair of
//! bistable B-class motor neurons (dorsal and ventral). A unit switches with
//! hysteresis:
//!
//! ```text
//! ON  iff  I > 0.5 + H/2 − H·S
//! ```
//!
//! so an active neuron stays active until its input drops below
//! `0.5 − H/2`, and an inactive one stays off until its input exceeds
//! `0.5 + H/2`.
//!
//! # Inputs
//!
//! ```text
//! I_D = I_on + w_i · I_SR_D · g_dorsal
//! I_V = (bias − S_D) + I_on + w_i · I_SR_V · g_ventral
//! ```
//!
//! Only the ventral neuron is inhibited by its dorsal partner; the constant
//! `bias` offsets that one-way inhibition. Each unit listens to the stretch
//! receptors of itself and the next `N_SR − 1` units toward the tail. Units
//! near the tail have fewer units behind them, and their summed input is
//! rescaled by `sqrt(N_SR / w)` where `w` is the number of units actually
//! heard.
//!
//! # Output
//!
//! Segment `i` is driven by unit `⌊i·units / segments⌋`:
//!
//! ```text
//! drive_D = NMJ_i · (S_D − S_V)       drive_V = NMJ_i · (S_V − S_D)
//! ```
//!
//! with a junction weight that decreases toward the tail and is attenuated at
//! the head to avoid excessive head bending.

use worm_types::{NeuralConfig, Parameters, Result, Side, SidePair, SimError};

/// Activity of a binary neuron as a number.
fn activity(on: bool) -> f64 {
    if on { 1.0 } else { 0.0 }
}

/// The neural circuit of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralCircuit {
    config: NeuralConfig,
    segments: usize,
    segments_per_unit: usize,
    dorsal_gain: f64,
    ventral_gain: f64,
    sr_weight: Vec<f64>,
    nmj_weight: Vec<f64>,
    states: Vec<SidePair<bool>>,
    drive: Vec<SidePair<f64>>,
}

impl NeuralCircuit {
    /// Build a circuit for `segments` body segments, in the reset state.
    pub fn new(config: &NeuralConfig, segments: usize, params: &Parameters) -> Result<Self> {
        config.validate(segments)?;
        params.validate()?;

        let units = config.units;
        let segments_per_unit = config.segments_per_unit(segments);

        let sr_weight = (0..units)
            .map(|i| {
                0.65 * (0.4 + 0.08 * i as f64)
                    * (units as f64 / 12.0)
                    * (2.0 / segments_per_unit as f64)
            })
            .collect();

        let mut nmj_weight: Vec<f64> = (0..segments)
            .map(|i| {
                config.nmj_weight
                    * (1.0 - config.nmj_taper * i as f64 / segments as f64)
                    * params.nmj_gain
            })
            .collect();
        if let Some(head) = nmj_weight.first_mut() {
            *head /= config.head_attenuation;
        }

        let mut circuit = Self {
            config: *config,
            segments,
            segments_per_unit,
            dorsal_gain: params.dorsal_gain,
            ventral_gain: params.ventral_gain,
            sr_weight,
            nmj_weight,
            states: Vec::new(),
            drive: Vec::new(),
        };
        circuit.reset();
        tracing::debug!(units, segments, segments_per_unit, "built neural circuit");
        Ok(circuit)
    }

    /// Put every dorsal neuron ON and every ventral neuron OFF, and clear the drive.
    pub fn reset(&mut self) {
        self.states = vec![SidePair::new(true, false); self.config.units];
        self.drive = vec![SidePair::splat(0.0); self.segments];
    }

    /// Number of units.
    #[must_use]
    pub fn units(&self) -> usize {
        self.config.units
    }

    /// Number of driven segments.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Binary state of every unit.
    #[must_use]
    pub fn states(&self) -> &[SidePair<bool>] {
        &self.states
    }

    /// Muscle drive computed by the last update (zero after reset).
    #[must_use]
    pub fn drive(&self) -> &[SidePair<f64>] {
        &self.drive
    }

    /// Unit driving segment `segment`.
    #[must_use]
    pub fn unit_of_segment(&self, segment: usize) -> usize {
        segment * self.config.units / self.segments
    }

    /// Receptor weighting of unit `unit`.
    #[must_use]
    pub fn sr_weight(&self, unit: usize) -> f64 {
        self.sr_weight[unit]
    }

    /// Neuromuscular junction weight of segment `segment`.
    #[must_use]
    pub fn nmj_weight(&self, segment: usize) -> f64 {
        self.nmj_weight[segment]
    }

    /// Summed receptor current heard by `unit`, including tail compensation.
    ///
    /// `currents` must hold one pair per segment.
    #[must_use]
    pub fn receptive_input(&self, currents: &[SidePair<f64>], unit: usize) -> SidePair<f64> {
        let field = self.config.receptive_field;
        let heard = field.min(self.config.units - unit);

        let first = unit * self.segments_per_unit;
        let last = (unit + heard) * self.segments_per_unit;
        let mut sum = currents[first..last]
            .iter()
            .fold(SidePair::splat(0.0), |acc, c| {
                SidePair::new(acc.dorsal + c.dorsal, acc.ventral + c.ventral)
            });

        if heard < field {
            let scale = (field as f64 / heard as f64).sqrt();
            sum = sum.map(|v| v * scale);
        }
        sum
    }

    /// Advance every unit one step given the receptor currents, then
    /// recompute the muscle drive.
    pub fn update(&mut self, currents: &[SidePair<f64>]) -> Result<&[SidePair<f64>]> {
        if currents.len() != self.segments {
            return Err(SimError::invalid_config(format!(
                "{} receptor pairs for {} segments",
                currents.len(),
                self.segments
            )));
        }

        let c = &self.config;
        let units = c.units;

        let inputs: Vec<SidePair<f64>> = (0..units)
            .map(|i| {
                let sensed = self.receptive_input(currents, i);
                let state = self.states[i].map(activity);
                let weight = self.sr_weight[i];

                let mut input = SidePair::new(
                    c.tonic_drive + weight * sensed.dorsal * self.dorsal_gain,
                    (c.inhibition_bias - state.dorsal)
                        + c.tonic_drive
                        + weight * sensed.ventral * self.ventral_gain,
                );

                if c.coupling != 0.0 {
                    for side in Side::BOTH {
                        let own = state[side];
                        let neighbours = [i.checked_sub(1), (i + 1 < units).then_some(i + 1)];
                        for j in neighbours.into_iter().flatten() {
                            input[side] += c.coupling * (activity(self.states[j][side]) - own);
                        }
                    }
                }
                input
            })
            .collect();

        // Synchronous update: every input was computed from the old states.
        let h = c.hysteresis;
        for (state, input) in self.states.iter_mut().zip(&inputs) {
            for side in Side::BOTH {
                let threshold = 0.5 + h / 2.0 - h * activity(state[side]);
                state[side] = input[side] > threshold;
            }
        }

        for segment in 0..self.segments {
            let unit = self.unit_of_segment(segment);
            let state = self.states[unit].map(activity);
            let weight = self.nmj_weight[segment];
            self.drive[segment] = SidePair::new(
                weight * (state.dorsal - state.ventral),
                weight * (state.ventral - state.dorsal),
            );
        }

        Ok(&self.drive)
    }
}
