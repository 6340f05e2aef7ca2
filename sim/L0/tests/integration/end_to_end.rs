//! Integration tests for complete runs: configuration in, trajectory file
//! and fitness out.

use approx::assert_relative_eq;
use std::io::BufReader;
use worm_core::{
    SEPARATOR, Simulation, TrajectoryWriter, fitness, fitness_from_csv, read_final_frame,
    run_simulation,
};
use worm_tests::{csv_output, short_config};
use worm_types::{BodyConfig, NeuralConfig, Parameters, SimulationConfig};

/// Two runs with the same inputs write byte-identical files.
#[test]
fn identical_runs_write_identical_files() {
    let config = short_config(0.2);
    let params = Parameters::new(1.2, 0.8, 1.0, 1.1, 0.9);

    let (first, _) = csv_output(&config, &params).unwrap();
    let (second, _) = csv_output(&config, &params).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);

    // A reused simulation resets its state between runs
    let mut sim = Simulation::new(config, params).unwrap();
    let mut again = Vec::new();
    sim.run_with(TrajectoryWriter::new(&mut again)).unwrap();
    let mut third = Vec::new();
    sim.run_with(TrajectoryWriter::new(&mut third)).unwrap();
    assert_eq!(again, first);
    assert_eq!(third, first);
}

/// Every line holds the time followed by (x, y, θ) for all 49 rods.
#[test]
fn file_format_lists_every_rod() {
    let (bytes, summary) = csv_output(&short_config(0.1), &Parameters::default()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), summary.frames);
    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert_eq!(line.split(SEPARATOR).count(), 1 + 3 * 49);
    }
    assert!(lines[0].starts_with("0, 0, 0, "));
    assert!(lines[1].starts_with("0.04, "));
}

/// Fitness read back from the file equals the fitness of the run.
#[test]
fn fitness_round_trip_through_file() {
    let config = short_config(0.2);
    let params = Parameters::default();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trajectory.csv");
    let file = std::fs::File::create(&path).unwrap();
    let mut sim = Simulation::new(config.clone(), params).unwrap();
    let summary = sim
        .run_with(TrajectoryWriter::new(std::io::BufWriter::new(file)))
        .unwrap();

    let from_file = fitness_from_csv(BufReader::new(std::fs::File::open(&path).unwrap())).unwrap();
    assert_eq!(from_file, summary.fitness());

    let trajectory = run_simulation(config, params).unwrap();
    assert_eq!(fitness(&trajectory), summary.fitness());

    let last = read_final_frame(BufReader::new(std::fs::File::open(&path).unwrap())).unwrap();
    assert_eq!(&last, trajectory.last().unwrap());
}

/// With every gain at zero no muscle ever activates and the head stays put.
#[test]
fn zero_parameters_keep_head_in_place() {
    let trajectory = run_simulation(short_config(0.1), Parameters::zero()).unwrap();
    for frame in &trajectory.frames {
        let head = frame.head().unwrap();
        assert!(head.position.x.abs() < 1e-8, "head x {}", head.position.x);
        assert!(head.position.y.abs() < 1e-8, "head y {}", head.position.y);
    }
}

/// A body only as long as one receptive field: every unit past the first
/// hears a truncated field, and the run still completes.
#[test]
fn minimal_body_truncates_receptive_fields() {
    let config = short_config(0.1)
        .body(BodyConfig::with_segments(6))
        .neural(NeuralConfig::default().units(6, 6));
    let trajectory = run_simulation(config, Parameters::default()).unwrap();

    assert_eq!(trajectory.len(), 3);
    for frame in &trajectory.frames {
        assert_eq!(frame.rods.len(), 7);
        assert!(
            frame
                .rods
                .iter()
                .all(|r| r.position.x.is_finite() && r.position.y.is_finite())
        );
    }
}

/// The tonic reset state bends the body within the first tenths of a second.
#[test]
fn default_gains_move_the_body() {
    let trajectory = run_simulation(short_config(0.3), Parameters::default()).unwrap();
    let first = &trajectory.frames[0];
    let last = trajectory.last().unwrap();

    let max_shift = first
        .rods
        .iter()
        .zip(&last.rods)
        .map(|(a, b)| (b.position - a.position).norm())
        .fold(0.0, f64::max);
    assert!(max_shift > 1e-7, "body barely moved: {max_shift}");

    // Still a connected chain: neighbouring rods stay about a segment apart
    let segment = 1e-3 / 48.0;
    for pair in last.rods.windows(2) {
        let gap = (pair[1].position - pair[0].position).norm();
        assert_relative_eq!(gap, segment, max_relative = 0.5);
    }
}

/// With the default configuration and unit gains the worm crawls backwards
/// along x, by roughly 27 µm over the first second.
#[test]
fn default_run_crawls_along_x() {
    let trajectory = run_simulation(SimulationConfig::with_duration(1.0), Parameters::default())
        .unwrap();
    let last = trajectory.last().unwrap();
    assert!(last.time > 0.9);

    let head_x = last.head().unwrap().position.x;
    assert!(head_x < -1e-5, "head only reached x = {head_x}");
    assert!(head_x > -1e-3, "head overshot to x = {head_x}");

    let score = fitness(&trajectory);
    assert!(score > 0.0);
    assert_relative_eq!(score, head_x * head_x);
}
