//! Scoring of existing trajectory files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use worm_core::{Frame, read_final_frame};
use worm_types::SimError;

/// Print the final head displacement and the fitness of a trajectory file.
pub fn run(path: &Path) -> Result<()> {
    let (frame, displacement) = score(path)?;
    println!("time {}", frame.time);
    println!("head displacement {displacement}");
    println!("fitness {}", displacement * displacement);
    Ok(())
}

/// Final frame of `path` and its head displacement.
///
/// A final frame without rods is an error, as in `worm_core::fitness_from_csv`.
fn score(path: &Path) -> Result<(Frame, f64)> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let frame = read_final_frame(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;
    let displacement = frame
        .head()
        .map(|head| head.position.x)
        .ok_or_else(|| SimError::trajectory_parse(0, "final frame has no rods"))
        .with_context(|| format!("failed to score {}", path.display()))?;
    Ok((frame, displacement))
}
