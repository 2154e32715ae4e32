//! TOML scenario files describing obstacles and walking bodies.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use log::debug;
use serde::Deserialize;
use stride_core::{BodySpec, Command, Hitbox, Physics, ShapeKind, Vector};
use stride_system_stepping::Simulation;
use stride_system_walker::{PathfindingOptions, Walker};

const BUILTIN: &str = include_str!("../scenarios/detour.toml");

/// Scene layout loaded from a scenario file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default)]
    gravity: Vector,
    #[serde(default)]
    obstacles: Vec<ObstacleConfig>,
    #[serde(default)]
    movers: Vec<MoverConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObstacleConfig {
    name: String,
    position: Vector,
    shape: ShapeKind,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MoverConfig {
    name: String,
    position: Vector,
    shape: ShapeKind,
    speed: f32,
    waypoints: Vec<Vector>,
    #[serde(default)]
    cyclic: bool,
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    physics: Physics,
    #[serde(default)]
    pathfinding: PathfindingOptions,
}

impl Scenario {
    /// Scenario shipped with the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN).context("failed to parse built-in scenario")
    }

    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(contents).context("malformed scenario toml")?;
        for mover in &scenario.movers {
            if !(mover.speed.is_finite() && mover.speed > 0.0) {
                bail!("mover `{}` needs a positive speed", mover.name);
            }
            if mover.waypoints.is_empty() {
                bail!("mover `{}` has no waypoints", mover.name);
            }
        }
        Ok(scenario)
    }

    /// Builds a simulation with every walker already started.
    pub(crate) fn into_simulation(self) -> Simulation {
        let mut simulation = Simulation::default();
        let _ = simulation.apply(Command::SetGravity {
            gravity: self.gravity,
        });

        for obstacle in self.obstacles {
            let body = simulation.spawn(
                BodySpec::new(obstacle.name, obstacle.position)
                    .with_hitbox(hitbox(obstacle.shape))
                    .with_physics(Physics::immovable()),
            );
            debug!("spawned obstacle {}", body.get());
        }

        for mover in self.movers {
            let body = simulation.spawn(
                BodySpec::new(mover.name, mover.position)
                    .with_hitbox(hitbox(mover.shape))
                    .with_physics(mover.physics),
            );
            let mut walker = Walker::new(body, mover.speed)
                .with_waypoints(mover.waypoints, mover.cyclic)
                .with_pathfinding_options(mover.pathfinding)
                .with_debug(mover.debug);
            walker.start();
            simulation.add_walker(walker);
            debug!("spawned mover {}", body.get());
        }

        simulation
    }
}

fn hitbox(shape: ShapeKind) -> Hitbox {
    match shape {
        ShapeKind::Square { size } => Hitbox::square(Vector::ZERO, size),
        ShapeKind::Circle { radius } => Hitbox::circle(Vector::ZERO, radius),
    }
}
