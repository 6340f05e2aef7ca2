//! Worm locomotion simulator command line.
//!
//! # Commands
//!
//! - `wormsim run --output <file>` - Simulate once and write the trajectory
//! - `wormsim evolve` - Search the five gains by differential evolution
//! - `wormsim fitness <file>` - Score an existing trajectory file
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod evolve;
mod fitness;
mod run;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use worm_types::SimulationConfig;

/// Neuromechanical C. elegans locomotion simulator
#[derive(Parser)]
#[command(name = "wormsim")]
#[command(about = "Simulate and evolve C. elegans forward locomotion", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and write its trajectory as CSV
    Run {
        /// Trajectory file to write
        #[arg(long, short)]
        output: PathBuf,

        /// Neuromuscular junction gain
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        nmj: f64,

        /// Stretch receptor gain
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        sr: f64,

        /// Ventral muscle gain
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        ventral: f64,

        /// Dorsal muscle gain
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        dorsal: f64,

        /// Dorsal stretch receptor asymmetry gain
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        bilinear: f64,

        #[command(flatten)]
        sim: SimArgs,
    },

    /// Search the gains by differential evolution
    Evolve {
        /// Candidates per generation
        #[arg(long, default_value_t = 10)]
        population: usize,

        /// Number of generations
        #[arg(long, default_value_t = 50)]
        generations: usize,

        /// Random seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Directory for the best trajectory and the search report
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        sim: SimArgs,
    },

    /// Print head displacement and fitness of a trajectory file
    Fitness {
        /// Trajectory file to score
        #[arg(name = "FILE")]
        file: PathBuf,
    },
}

/// Options shared by every command that simulates.
#[derive(clap::Args)]
struct SimArgs {
    /// Simulated time in seconds (overrides the config file)
    #[arg(long)]
    duration: Option<f64>,

    /// Medium mix, 0 for water and 1 for agar (overrides the config file)
    #[arg(long)]
    medium: Option<f64>,

    /// JSON file with a (partial) simulation configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

impl SimArgs {
    /// Build the configuration: file or defaults, then flag overrides.
    fn load(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(medium) = self.medium {
            config = config.medium(medium);
        }
        config.validate().context("invalid simulation configuration")?;
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<SimulationConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            output,
            nmj,
            sr,
            ventral,
            dorsal,
            bilinear,
            sim,
        } => {
            let params = worm_types::Parameters::new(nmj, sr, ventral, dorsal, bilinear);
            run::run(&sim.load()?, &params, &output)
        }
        Commands::Evolve {
            population,
            generations,
            seed,
            output_dir,
            sim,
        } => evolve::run(&sim.load()?, population, generations, seed, &output_dir),
        Commands::Fitness { file } => fitness::run(&file),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wormsim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_run_defaults_to_unit_gains() {
        let cli = parse(&["run", "--output", "out.csv"]);
        let Commands::Run {
            output,
            nmj,
            sr,
            ventral,
            dorsal,
            bilinear,
            sim,
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(output, PathBuf::from("out.csv"));
        assert_eq!([nmj, sr, ventral, dorsal, bilinear], [1.0; 5]);
        assert_eq!(sim.load().unwrap(), SimulationConfig::default());
    }

    #[test]
    fn test_negative_gains_and_overrides() {
        let cli = parse(&[
            "run", "-o", "x.csv", "--sr", "-2.5", "--duration", "0.5", "--medium", "0",
        ]);
        let Commands::Run { sr, sim, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(sr, -2.5);
        let config = sim.load().unwrap();
        assert_eq!(config.duration, 0.5);
        assert_eq!(config.environment.medium, 0.0);
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        fs::write(&path, r#"{ "duration": 2.0, "frame_rate": 50.0 }"#).unwrap();

        let sim = SimArgs {
            duration: Some(1.0),
            medium: None,
            config: Some(path),
        };
        let config = sim.load().unwrap();
        assert_eq!(config.duration, 1.0);
        assert_eq!(config.frame_rate, 50.0);
    }

    #[test]
    fn test_invalid_inputs_are_errors() {
        let missing = SimArgs {
            duration: None,
            medium: None,
            config: Some(PathBuf::from("/nonexistent/sim.json")),
        };
        assert!(missing.load().is_err());

        let negative = SimArgs {
            duration: Some(-1.0),
            medium: None,
            config: None,
        };
        assert!(negative.load().is_err());

        assert!(Cli::try_parse_from(["wormsim", "run"]).is_err());
    }

    #[test]
    fn test_evolve_arguments() {
        let cli = parse(&["evolve", "--population", "6", "--generations", "3", "--seed", "9"]);
        let Commands::Evolve {
            population,
            generations,
            seed,
            output_dir,
            ..
        } = cli.command
        else {
            panic!("expected evolve");
        };
        assert_eq!((population, generations, seed), (6, 3, 9));
        assert_eq!(output_dir, PathBuf::from("."));
    }
}
