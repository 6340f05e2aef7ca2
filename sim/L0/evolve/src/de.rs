//! Differential evolution (DE/rand/1/bin) maximizing fitness.
//!
//! Each generation draws one differential weight `F ~ U[min_weight, 1)`
//! and builds one trial per member `k`:
//!
//! ```text
//! a, b, c distinct and ≠ k,  j_rand uniform
//! trial_j = x_c,j + F·(x_a,j − x_b,j)   if U < crossover or j = j_rand
//!         = x_k,j                        otherwise
//! ```
//!
//! Out-of-range coordinates are reflected back into the box. Trials are
//! evaluated in parallel, then each replaces its member only if strictly
//! fitter. Every member keeps the fitness it was admitted with, so a
//! surviving member is never simulated again.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use worm_types::{Parameters, Result};

use crate::config::EvolutionConfig;
use crate::report::{EvolutionReport, GenerationSummary};

/// Something that scores parameter vectors; higher is better.
///
/// Implemented for every `Fn(&Parameters) -> Result<f64>`, so a closure over
/// a [`BatchEvaluator`](worm_core::batch::BatchEvaluator) plugs in directly.
pub trait FitnessFunction: Sync {
    /// Score one parameter vector.
    fn evaluate(&self, params: &Parameters) -> Result<f64>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&Parameters) -> Result<f64> + Sync,
{
    fn evaluate(&self, params: &Parameters) -> Result<f64> {
        self(params)
    }
}

/// A population member and the fitness it was admitted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member {
    /// Parameter vector.
    pub params: Parameters,
    /// Cached fitness.
    pub fitness: f64,
}

/// Score of one evaluation; failed or non-finite runs score 0.
fn score(params: &Parameters, result: Result<f64>) -> (f64, bool) {
    match result {
        Ok(f) if f.is_finite() => (f, false),
        Ok(f) => {
            warn!(params = ?params.to_array(), fitness = f, "non-finite fitness, scoring 0");
            (0.0, true)
        }
        Err(e) => {
            warn!(params = ?params.to_array(), error = %e, "evaluation failed, scoring 0");
            (0.0, true)
        }
    }
}

/// Evaluate a batch in parallel, in input order.
fn evaluate_all<F: FitnessFunction + ?Sized>(
    fitness: &F,
    candidates: &[Parameters],
) -> Vec<(f64, bool)> {
    candidates
        .par_iter()
        .map(|p| score(p, fitness.evaluate(p)))
        .collect()
}

/// Search state.
#[derive(Debug, Clone)]
pub struct DifferentialEvolution {
    config: EvolutionConfig,
    rng: StdRng,
    population: Vec<Member>,
    best: Option<Member>,
    generations: Vec<GenerationSummary>,
    evaluations: usize,
}

impl DifferentialEvolution {
    /// Validate the settings and seed the generator. The population is drawn
    /// and scored by the first [`step`](Self::step) or [`run`](Self::run).
    pub fn new(config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            population: Vec::new(),
            best: None,
            generations: Vec::new(),
            evaluations: 0,
        })
    }

    /// Settings.
    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Current population (empty before initialization).
    #[must_use]
    pub fn population(&self) -> &[Member] {
        &self.population
    }

    /// Best member evaluated so far.
    #[must_use]
    pub fn best(&self) -> Option<&Member> {
        self.best.as_ref()
    }

    /// Fitness evaluations performed.
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Draw and score the initial population if that has not happened yet.
    pub fn initialize<F: FitnessFunction + ?Sized>(&mut self, fitness: &F) {
        if !self.population.is_empty() {
            return;
        }
        let bounds = self.config.bounds;
        let candidates: Vec<Parameters> = (0..self.config.population)
            .map(|_| bounds.sample(&mut self.rng))
            .collect();
        let scores = evaluate_all(fitness, &candidates);
        self.evaluations += candidates.len();

        self.population = candidates
            .into_iter()
            .zip(scores)
            .map(|(params, (fitness, _))| Member { params, fitness })
            .collect();
        for member in self.population.clone() {
            self.offer_best(member);
        }
        info!(
            population = self.population.len(),
            best_fitness = self.best.map_or(0.0, |b| b.fitness),
            "initial population scored"
        );
    }

    /// Run one generation.
    pub fn step<F: FitnessFunction + ?Sized>(&mut self, fitness: &F) -> GenerationSummary {
        self.initialize(fitness);

        let n = self.population.len();
        let weight = self.rng.gen_range(self.config.min_weight..1.0);
        let trials: Vec<Parameters> = (0..n).map(|k| self.trial(k, weight)).collect();

        let scores = evaluate_all(fitness, &trials);
        self.evaluations += trials.len();

        let mut replacements = 0;
        let mut failures = 0;
        for (k, (params, (trial_fitness, failed))) in trials.into_iter().zip(scores).enumerate() {
            if failed {
                failures += 1;
            }
            let trial = Member {
                params,
                fitness: trial_fitness,
            };
            self.offer_best(trial);
            if trial.fitness > self.population[k].fitness {
                self.population[k] = trial;
                replacements += 1;
            }
        }

        let best = self.best.unwrap_or(self.population[0]);
        let summary = GenerationSummary {
            generation: self.generations.len() + 1,
            weight,
            best: best.params,
            best_fitness: best.fitness,
            mean_fitness: self.population.iter().map(|m| m.fitness).sum::<f64>() / n as f64,
            replacements,
            failures,
        };
        info!(
            generation = summary.generation,
            best_fitness = summary.best_fitness,
            best = ?summary.best.to_array(),
            "generation finished"
        );
        debug!(
            weight,
            mean_fitness = summary.mean_fitness,
            replacements,
            failures,
            "generation detail"
        );
        self.generations.push(summary);
        summary
    }

    /// Run every configured generation and report the best vector found.
    pub fn run<F: FitnessFunction + ?Sized>(mut self, fitness: &F) -> EvolutionReport {
        self.initialize(fitness);
        for _ in 0..self.config.generations {
            self.step(fitness);
        }
        let best = self.best.unwrap_or(self.population[0]);
        EvolutionReport {
            best: best.params,
            best_fitness: best.fitness,
            generations: self.generations,
            evaluations: self.evaluations,
        }
    }

    fn offer_best(&mut self, candidate: Member) {
        if self.best.is_none_or(|b| candidate.fitness > b.fitness) {
            self.best = Some(candidate);
        }
    }

    /// Mutant/crossover trial for member `k`.
    fn trial(&mut self, k: usize, weight: f64) -> Parameters {
        let n = self.population.len();
        let a = self.pick(n, &[k]);
        let b = self.pick(n, &[k, a]);
        let c = self.pick(n, &[k, a, b]);
        let j_rand = self.rng.gen_range(0..Parameters::COUNT);

        let xa = self.population[a].params.to_array();
        let xb = self.population[b].params.to_array();
        let xc = self.population[c].params.to_array();
        let mut x = self.population[k].params.to_array();
        for j in 0..Parameters::COUNT {
            if self.rng.gen_range(0.0..1.0) < self.config.crossover || j == j_rand {
                x[j] = xc[j] + weight * (xa[j] - xb[j]);
            }
        }
        self.config.bounds.repair(&mut x);
        Parameters::from_array(x)
    }

    /// Uniform index in `0..n` not in `exclude`.
    fn pick(&mut self, n: usize, exclude: &[usize]) -> usize {
        loop {
            let i = self.rng.gen_range(0..n);
            if !exclude.contains(&i) {
                return i;
            }
        }
    }
}
