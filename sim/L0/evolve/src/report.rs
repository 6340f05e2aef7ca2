//! Per-generation and final search results.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use worm_types::Parameters;

/// What one generation did.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationSummary {
    /// Generation number, starting at 1.
    pub generation: usize,
    /// Differential weight drawn for this generation.
    pub weight: f64,
    /// Best parameters evaluated so far.
    pub best: Parameters,
    /// Their fitness.
    pub best_fitness: f64,
    /// Mean fitness of the population after selection.
    pub mean_fitness: f64,
    /// Trials that replaced their member.
    pub replacements: usize,
    /// Trials whose run failed.
    pub failures: usize,
}

/// Result of a whole search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvolutionReport {
    /// Best parameters evaluated.
    pub best: Parameters,
    /// Their fitness.
    pub best_fitness: f64,
    /// One summary per generation.
    pub generations: Vec<GenerationSummary>,
    /// Fitness evaluations performed, initial population included.
    pub evaluations: usize,
}
