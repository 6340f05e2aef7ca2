//! Integration tests for drag media and obstacles.

use approx::assert_relative_eq;
use nalgebra::Point2;
use worm_body::{BodyState, Mechanics};
use worm_core::{Simulation, run_simulation};
use worm_tests::short_config;
use worm_types::{EnvironmentConfig, Obstacle, ObstacleLayout, Parameters};

/// Obstacle whose circle contains the dorsal point of the middle rod.
fn touching_obstacle() -> ObstacleLayout {
    ObstacleLayout::Explicit {
        obstacles: vec![Obstacle::new(Point2::new(5e-4, 4.5e-5), 1e-5)],
    }
}

/// Low-drag media run with tightened tolerances and still finish.
#[test]
fn water_run_completes_with_tight_tolerances() {
    let config = short_config(0.05).environment(EnvironmentConfig::water());
    let sim = Simulation::new(config.clone(), Parameters::default()).unwrap();
    assert_relative_eq!(sim.tolerances().absolute[0], 1e-10);

    let trajectory = run_simulation(config, Parameters::default()).unwrap();
    assert!(trajectory.frames.iter().all(|f| {
        f.rods
            .iter()
            .all(|r| r.position.x.is_finite() && r.angle.is_finite())
    }));
}

/// The medium changes how far the same drive moves the body.
#[test]
fn medium_changes_motion() {
    let agar = run_simulation(short_config(0.1), Parameters::default()).unwrap();
    let water = run_simulation(
        short_config(0.1).environment(EnvironmentConfig::water()),
        Parameters::default(),
    )
    .unwrap();
    assert_ne!(agar.last(), water.last());
}

/// An obstacle overlapping the body is felt by the mechanics and pushes it.
#[test]
fn touching_obstacle_pushes_body() {
    let environment = EnvironmentConfig::agar().with_obstacles(touching_obstacle());
    let config = short_config(0.04).environment(environment.clone());

    let mechanics = Mechanics::new(&config.body, &environment).unwrap();
    let state = BodyState::straight(mechanics.geometry());
    let observed = mechanics.observe(state.positions.as_slice()).unwrap();
    assert!(observed.contact_force > 0.0);

    let free = run_simulation(short_config(0.04), Parameters::zero()).unwrap();
    let blocked = run_simulation(config, Parameters::zero()).unwrap();
    let free_mid = free.last().unwrap().rods[24];
    let blocked_mid = blocked.last().unwrap().rods[24];

    // Pushed away from the obstacle center, toward -y
    assert!(blocked_mid.position.y < free_mid.position.y);
}

/// Obstacles far from the body leave the motion unchanged.
#[test]
fn distant_obstacles_have_no_effect() {
    let layout = ObstacleLayout::Square {
        count: 16,
        radius: 2e-5,
        spacing: 1e-4,
        origin: Point2::new(0.01, 0.01),
    };
    let config = short_config(0.1);
    let free = run_simulation(config.clone(), Parameters::default()).unwrap();
    let with_grid = run_simulation(
        config.environment(EnvironmentConfig::agar().with_obstacles(layout)),
        Parameters::default(),
    )
    .unwrap();

    for (a, b) in free.last().unwrap().rods.iter().zip(&with_grid.last().unwrap().rods) {
        assert_relative_eq!(a.position.x, b.position.x, epsilon = 1e-15);
        assert_relative_eq!(a.position.y, b.position.y, epsilon = 1e-15);
        assert_relative_eq!(a.angle, b.angle, epsilon = 1e-12);
    }
}
