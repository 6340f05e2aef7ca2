//! Batched evaluation: many parameter sets under one configuration.
//!
//! Every parameter set gets its own [`Simulation`](crate::Simulation), so
//! runs share nothing but the immutable configuration. Runs are spread
//! across CPU cores via rayon when the `parallel` feature is enabled;
//! sequential fallback when disabled.
//!
//! # Examples
//!
//! ```no_run
//! use worm_core::batch::BatchEvaluator;
//! use worm_types::{Parameters, SimulationConfig};
//!
//! let evaluator = BatchEvaluator::new(SimulationConfig::with_duration(1.0))?;
//! let candidates = vec![Parameters::default(), Parameters::splat(2.0)];
//! for (params, fitness) in candidates.iter().zip(evaluator.evaluate_all(&candidates)) {
//!     println!("{params:?}: {fitness:?}");
//! }
//! # Ok::<(), worm_types::SimError>(())
//! ```

use std::sync::Arc;

use worm_types::{Parameters, Result, SimulationConfig};

use crate::simulation::evaluate;

/// Evaluates the fitness of parameter sets under a shared configuration.
///
/// # Determinism
///
/// Results are independent of thread count and scheduling order. Each
/// evaluation is a pure function of its parameters and the shared
/// configuration.
#[derive(Debug, Clone)]
pub struct BatchEvaluator {
    config: Arc<SimulationConfig>,
}

impl BatchEvaluator {
    /// Validate the configuration once for every later evaluation.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Fitness of one parameter set.
    pub fn evaluate(&self, params: &Parameters) -> Result<f64> {
        evaluate(&self.config, params)
    }

    /// Fitness of every parameter set, in input order.
    pub fn evaluate_all(&self, params: &[Parameters]) -> Vec<Result<f64>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
            params.par_iter().map(|p| self.evaluate(p)).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            params.iter().map(|p| self.evaluate(p)).collect()
        }
    }
}
