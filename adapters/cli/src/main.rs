#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scenario headlessly and reports where
//! every body ended up.

mod canvas;
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use stride_core::{Bounds, Event, Vector};
use stride_system_stepping::Simulation;
use stride_world::query;

use crate::{canvas::AsciiCanvas, scenario::Scenario};

const RENDER_MARGIN: f32 = 16.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file to run. The built-in detour scenario runs when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 120)]
    ticks: u32,

    /// Keep ticking when a walker fails instead of aborting.
    #[arg(long)]
    isolate_failures: bool,

    /// Print an ASCII frame of the final state.
    #[arg(long)]
    render: bool,

    /// Side length of one character cell in world units.
    #[arg(long, default_value_t = 8.0)]
    cell: f32,
}

/// Entry point for the stride command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };
    let mut simulation = scenario.into_simulation();
    info!(
        "running {} ticks over {} bodies",
        args.ticks,
        query::body_count(simulation.scene())
    );

    for _ in 0..args.ticks {
        let events = if args.isolate_failures {
            let (events, failures) = simulation.tick_isolated();
            if !failures.is_empty() {
                warn!("{} walker(s) failed this tick", failures.len());
            }
            events
        } else {
            simulation
                .tick()
                .with_context(|| format!("tick {} failed", query::tick_index(simulation.scene())))?
        };
        report(&simulation, &events);
    }

    for body in query::bodies(simulation.scene()) {
        println!("{:>12} {}", body.name(), body.position());
    }

    if args.render {
        if let Some(bounds) = scene_bounds(&simulation) {
            let mut canvas = AsciiCanvas::covering(bounds, args.cell);
            simulation.render(&mut canvas);
            print!("{canvas}");
        }
    }

    Ok(())
}

fn report(simulation: &Simulation, events: &[Event]) {
    let name = |body| {
        query::body(simulation.scene(), body)
            .map_or_else(|| "<removed>".to_owned(), |body| body.name().to_owned())
    };
    for event in events {
        match event {
            Event::WalkerCompleted { body } => info!("{} completed its route", name(*body)),
            Event::WalkerStuck { body } => warn!("{} is stuck", name(*body)),
            Event::BodiesCollided {
                first,
                second,
                bounced,
            } => debug!(
                "{} hit {}{}",
                name(*first),
                name(*second),
                if *bounced { " and bounced" } else { "" }
            ),
            _ => {}
        }
    }
}

fn scene_bounds(simulation: &Simulation) -> Option<Bounds> {
    let scene = simulation.scene();
    let offset = query::offset(scene);
    query::bodies(scene)
        .flat_map(|body| query::placed_shapes(scene, body.id()))
        .map(|shape| shape.bounds())
        .reduce(|acc, bounds| acc.union(&bounds))
        .map(|bounds| Bounds {
            min: bounds
                .min
                .to_subtracted(offset)
                .to_subtracted(Vector::new(RENDER_MARGIN, RENDER_MARGIN)),
            max: bounds
                .max
                .to_subtracted(offset)
                .to_added(Vector::new(RENDER_MARGIN, RENDER_MARGIN)),
        })
}
