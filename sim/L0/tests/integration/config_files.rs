//! Integration tests for JSON configuration files.

use approx::assert_relative_eq;
use worm_evolve::EvolutionConfig;
use worm_types::{ObstacleLayout, SimulationConfig};

/// A partial file fills every missing field with its default.
#[test]
fn partial_simulation_config() {
    let json = r#"{
        "duration": 2.5,
        "environment": {
            "medium": 0.0,
            "obstacles": {
                "kind": "hexagonal",
                "count": 20,
                "radius": 2e-5,
                "spacing": 1e-4,
                "origin": [0.0, 0.0005]
            }
        },
        "solver": { "position_tolerance": 1e-8 }
    }"#;
    let config: SimulationConfig = serde_json::from_str(json).unwrap();

    assert_relative_eq!(config.duration, 2.5);
    assert_relative_eq!(config.timestep, 0.001);
    assert_eq!(config.body.segments, 48);
    assert!(config.environment.is_low_drag());
    assert_eq!(config.environment.obstacles.count(), 20);
    assert!(matches!(
        config.environment.obstacles,
        ObstacleLayout::Hexagonal { .. }
    ));
    assert_relative_eq!(config.solver.position_tolerance, 1e-8);
    assert_relative_eq!(config.solver.angle_tolerance, 1e-5);
    assert!(config.validate().is_ok());
}

/// Configurations survive a write/read cycle.
#[test]
fn configs_round_trip() {
    let config = SimulationConfig::with_duration(3.0).medium(0.5);
    let text = serde_json::to_string_pretty(&config).unwrap();
    let back: SimulationConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);

    let search = EvolutionConfig::default().size(12, 30).seed(9);
    let text = serde_json::to_string(&search).unwrap();
    let back: EvolutionConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, search);
}

/// Invalid values load but fail validation.
#[test]
fn invalid_values_rejected_by_validation() {
    let config: SimulationConfig =
        serde_json::from_str(r#"{ "timestep": 0.5, "muscle": { "time_constant": 0.1 } }"#)
            .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.is_config_error());
}
