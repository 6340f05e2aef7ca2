//! Fitness of a run: how far the head travelled along `x`.
//!
//! The body starts with its head at the origin, so the head's final `x`
//! coordinate is its displacement along the body axis. Fitness is the square
//! of that displacement; lateral (`y`) motion is ignored.

use std::io::BufRead;

use crate::trajectory::{Frame, Trajectory};
use worm_types::{Result, SimError};

/// Final `x` of the head rod, or `None` for an empty trajectory.
#[must_use]
pub fn head_displacement(trajectory: &Trajectory) -> Option<f64> {
    frame_displacement(trajectory.last()?)
}

/// Squared head displacement of a trajectory (0 when empty).
#[must_use]
pub fn fitness(trajectory: &Trajectory) -> f64 {
    head_displacement(trajectory).map_or(0.0, |x| x * x)
}

/// Read the last non-empty line of a trajectory file.
pub fn read_final_frame<R: BufRead>(reader: R) -> Result<Frame> {
    let mut last = None;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            last = Some((index + 1, line));
        }
    }
    let (number, line) =
        last.ok_or_else(|| SimError::trajectory_parse(0, "trajectory file is empty"))?;
    Frame::parse_line(&line, number)
}

/// Fitness of a trajectory file, from its final frame.
pub fn fitness_from_csv<R: BufRead>(reader: R) -> Result<f64> {
    let frame = read_final_frame(reader)?;
    let x = frame_displacement(&frame)
        .ok_or_else(|| SimError::trajectory_parse(0, "final frame has no rods"))?;
    Ok(x * x)
}

fn frame_displacement(frame: &Frame) -> Option<f64> {
    frame.head().map(|head| head.position.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    fn trajectory(head_x: &[f64]) -> Trajectory {
        Trajectory {
            frames: head_x
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    Frame::from_state(
                        i as f64 * 0.04,
                        &DVector::from_vec(vec![x, 3e-5, 1.5, x + 2e-5, 0.0, 1.5]),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_fitness_uses_final_head_x() {
        let t = trajectory(&[0.0, -1e-5, -4e-5]);
        assert_relative_eq!(head_displacement(&t).unwrap(), -4e-5);
        assert_relative_eq!(fitness(&t), 1.6e-9);

        assert_eq!(head_displacement(&Trajectory::new()), None);
        assert_eq!(fitness(&Trajectory::new()), 0.0);
    }

    #[test]
    fn test_file_round_trip() {
        let t = trajectory(&[0.0, 2e-5, 1.23456789e-4]);
        let mut buf = Vec::new();
        t.write_csv(&mut buf).unwrap();
        buf.extend_from_slice(b"\n\n");

        let frame = read_final_frame(buf.as_slice()).unwrap();
        assert_eq!(&frame, t.last().unwrap());
        assert_eq!(fitness_from_csv(buf.as_slice()).unwrap(), fitness(&t));
    }

    #[test]
    fn test_malformed_files() {
        let err = read_final_frame(&b""[..]).unwrap_err();
        assert!(matches!(err, SimError::TrajectoryParse { .. }));

        let text = b"0, 0, 0, 1.5\n0.04, 1e-5, x, 1.5\n";
        let err = fitness_from_csv(&text[..]).unwrap_err();
        assert!(matches!(err, SimError::TrajectoryParse { line: 2, .. }));
    }
}
