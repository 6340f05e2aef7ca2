//! Single simulation run.

use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::info;
use worm_core::{RunSummary, Simulation, TrajectoryWriter};
use worm_types::{Parameters, SimulationConfig};

/// Simulate once, write the trajectory to `output` and print the fitness.
pub fn run(config: &SimulationConfig, params: &Parameters, output: &Path) -> Result<()> {
    let summary = write_trajectory(config, params, output)?;
    info!(
        frames = summary.frames,
        steps = summary.steps,
        fitness = summary.fitness(),
        path = %output.display(),
        "trajectory written"
    );
    println!("{}", summary.fitness());
    Ok(())
}

/// Simulate once and store every frame in `output`.
///
/// Frames are staged in a temporary file next to `output`, which is only
/// renamed into place once the run has finished. A failed run leaves no
/// file behind.
pub fn write_trajectory(
    config: &SimulationConfig,
    params: &Parameters,
    output: &Path,
) -> Result<RunSummary> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a file in {}", dir.display()))?;

    let mut sim = Simulation::new(config.clone(), *params)?;
    let summary = {
        let mut writer = TrajectoryWriter::new(BufWriter::new(staging.as_file_mut()));
        let summary = sim
            .run_with(&mut writer)
            .with_context(|| format!("simulation with {params:?} failed"))?;
        writer
            .finish()?
            .flush()
            .with_context(|| format!("failed to write {}", output.display()))?;
        summary
    };

    staging
        .persist(output)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to create {}", output.display()))?;
    Ok(summary)
}
