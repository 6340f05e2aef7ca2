//! Differential evolution of the five gains.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use worm_core::BatchEvaluator;
use worm_evolve::{DifferentialEvolution, EvolutionConfig};

use crate::run::write_trajectory;
use worm_types::{Parameters, SimulationConfig};

/// File holding the trajectory of the best parameters.
pub const BEST_TRAJECTORY: &str = "best.csv";

/// File holding the JSON search report.
pub const REPORT: &str = "evolution.json";

/// Run the search and write the best trajectory and the report to `output_dir`.
pub fn run(
    config: &SimulationConfig,
    population: usize,
    generations: usize,
    seed: u64,
    output_dir: &Path,
) -> Result<()> {
    let search = EvolutionConfig::default()
        .size(population, generations)
        .seed(seed);
    let evaluator = BatchEvaluator::new(config.clone())?;
    let de = DifferentialEvolution::new(search)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let report = de.run(&|params: &Parameters| evaluator.evaluate(params));
    info!(
        best = ?report.best,
        fitness = report.best_fitness,
        evaluations = report.evaluations,
        "search finished"
    );

    let report_path = output_dir.join(REPORT);
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&report_path, json)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    let best_path = output_dir.join(BEST_TRAJECTORY);
    write_trajectory(config, &report.best, &best_path)
        .context("rerunning the best parameters failed")?;

    let [nmj, sr, ventral, dorsal, bilinear] = report.best.to_array();
    println!(
        "best fitness {} with --nmj {nmj} --sr {sr} --ventral {ventral} --dorsal {dorsal} --bilinear {bilinear}",
        report.best_fitness
    );
    Ok(())
}
