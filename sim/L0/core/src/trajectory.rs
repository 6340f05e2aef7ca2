//! Sampled body poses and their text format.
//!
//! One line per frame, values separated by `", "`:
//!
//! ```text
//! t, x_0, y_0, θ_0, x_1, y_1, θ_1, …, x_{N−1}, y_{N−1}, θ_{N−1}
//! ```
//!
//! Numbers are written in their shortest round-trip form, so a trajectory
//! read back reproduces the simulated values exactly.

use std::fmt::Write as _;
use std::io::Write;

use nalgebra::{DVector, Point2};
use worm_body::{COORDS_PER_ROD, RodPose};
use worm_types::{Result, SimError};

/// Separator between values on a trajectory line.
pub const SEPARATOR: &str = ", ";

/// Body pose at one sampled time.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Simulated time (s).
    pub time: f64,
    /// Pose of every rod, head first.
    pub rods: Vec<RodPose>,
}

impl Frame {
    /// Build a frame from a state vector laid out `(x, y, θ)` per rod.
    #[must_use]
    pub fn from_state(time: f64, y: &DVector<f64>) -> Self {
        let rods = (0..y.len() / COORDS_PER_ROD)
            .map(|i| RodPose::from_state(y.as_slice(), i))
            .collect();
        Self { time, rods }
    }

    /// Pose of the head rod.
    #[must_use]
    pub fn head(&self) -> Option<&RodPose> {
        self.rods.first()
    }

    /// Format as one trajectory line, without the newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(24 * (1 + COORDS_PER_ROD * self.rods.len()));
        let _ = write!(line, "{}", self.time);
        for rod in &self.rods {
            let _ = write!(
                line,
                "{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
                rod.position.x, rod.position.y, rod.angle
            );
        }
        line
    }

    /// Parse one trajectory line. `line_number` is only used in errors.
    pub fn parse_line(line: &str, line_number: usize) -> Result<Self> {
        let values = line
            .split(',')
            .map(|field| {
                let field = field.trim();
                field.parse::<f64>().map_err(|e| {
                    SimError::trajectory_parse(line_number, format!("bad value {field:?}: {e}"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let coords = values.len().saturating_sub(1);
        if coords == 0 || coords % COORDS_PER_ROD != 0 {
            return Err(SimError::trajectory_parse(
                line_number,
                format!(
                    "expected a time followed by (x, y, θ) triples, got {} values",
                    values.len()
                ),
            ));
        }

        let rods = values[1..]
            .chunks_exact(COORDS_PER_ROD)
            .map(|c| RodPose {
                position: Point2::new(c[0], c[1]),
                angle: c[2],
            })
            .collect();

        Ok(Self {
            time: values[0],
            rods,
        })
    }
}

/// Receives frames as a run produces them.
pub trait FrameSink {
    /// Accept the next frame.
    fn frame(&mut self, frame: &Frame) -> Result<()>;
}

/// Drops every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl FrameSink for Discard {
    fn frame(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

/// Every sampled frame of a run, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    /// Frames, starting with the initial pose at `t = 0`.
    pub frames: Vec<Frame>,
}

impl Trajectory {
    /// An empty trajectory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if no frame was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The last frame.
    #[must_use]
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Write every frame in the trajectory text format.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = TrajectoryWriter::new(writer);
        for frame in &self.frames {
            out.frame(frame)?;
        }
        out.finish()?;
        Ok(())
    }
}

impl FrameSink for Trajectory {
    fn frame(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// Streams frames to a writer, one line each.
#[derive(Debug)]
pub struct TrajectoryWriter<W: Write> {
    inner: W,
    frames: usize,
}

impl<W: Write> TrajectoryWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner, frames: 0 }
    }

    /// Frames written so far.
    #[must_use]
    pub fn frames_written(&self) -> usize {
        self.frames
    }

    /// Flush and return the writer.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> FrameSink for TrajectoryWriter<W> {
    fn frame(&mut self, frame: &Frame) -> Result<()> {
        writeln!(self.inner, "{}", frame.to_line())?;
        self.frames += 1;
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn frame(&mut self, frame: &Frame) -> Result<()> {
        (**self).frame(frame)
    }
}
