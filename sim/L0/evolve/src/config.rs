//! Search settings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use worm_types::{Result, SimError};

use crate::bounds::ParameterBounds;

/// Smallest population that leaves three distinct donors for every member.
pub const MIN_POPULATION: usize = 4;

/// Differential-evolution settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvolutionConfig {
    /// Number of parameter vectors.
    pub population: usize,
    /// Number of generations.
    pub generations: usize,
    /// Probability of taking a coordinate from the mutant vector.
    pub crossover: f64,
    /// Lower end of the differential weight, drawn from `[min_weight, 1)`
    /// once per generation.
    pub min_weight: f64,
    /// Seed of the random generator.
    pub seed: u64,
    /// Search box.
    pub bounds: ParameterBounds,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: 10,
            generations: 50,
            crossover: 0.9,
            min_weight: 0.5,
            seed: 0,
            bounds: ParameterBounds::default(),
        }
    }
}

impl EvolutionConfig {
    /// Set the population size and generation count.
    #[must_use]
    pub fn size(mut self, population: usize, generations: usize) -> Self {
        self.population = population;
        self.generations = generations;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the search box.
    #[must_use]
    pub fn bounds(mut self, bounds: ParameterBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.population < MIN_POPULATION {
            return Err(SimError::invalid_config(format!(
                "population must be at least {MIN_POPULATION}, got {}",
                self.population
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover) {
            return Err(SimError::invalid_config(format!(
                "crossover rate must lie in [0, 1], got {}",
                self.crossover
            )));
        }
        if !(0.0..1.0).contains(&self.min_weight) {
            return Err(SimError::invalid_config(format!(
                "min_weight must lie in [0, 1), got {}",
                self.min_weight
            )));
        }
        self.bounds.validate()
    }
}
