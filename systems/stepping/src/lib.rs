#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-timestep driver that orders walkers, integration and collisions.

pub mod input;

use std::{collections::BTreeMap, fmt};

use log::warn;
use stride_core::{draw_rotated, draw_shape, BodyId, BodySpec, Command, Event, ShapeDrawer};
use stride_system_collision::CollisionPass;
use stride_system_walker::{Walker, WalkerError, WalkerStatus};
use stride_world::{self as world, query, Body, Scene};

pub use input::{contains_point, InputEvent, InputRoute};

type TickHandler = Box<dyn FnMut(&Body, &Scene, &mut Vec<Command>)>;

/// Owns a scene together with the systems that advance it.
///
/// Every tick runs, in order: the registered per-body tick handlers, each
/// walker in ascending body order with its commands applied immediately, the
/// world integration step and finally the collision pass.
pub struct Simulation {
    scene: Scene,
    walkers: BTreeMap<BodyId, Walker>,
    tick_handlers: Vec<(BodyId, TickHandler)>,
    input_routes: BTreeMap<BodyId, Vec<InputRoute>>,
    collision: CollisionPass,
}

impl Simulation {
    /// Wraps an existing scene.
    #[must_use]
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            walkers: BTreeMap::new(),
            tick_handlers: Vec::new(),
            input_routes: BTreeMap::new(),
            collision: CollisionPass::default(),
        }
    }

    /// Read-only access to the scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Applies a command outside of the tick loop.
    pub fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.scene, command, &mut events);
        events
    }

    /// Spawns a body and returns its identifier.
    pub fn spawn(&mut self, spec: BodySpec) -> BodyId {
        self.scene.spawn(spec)
    }

    /// Removes a body together with its walker, handlers and input routes.
    pub fn remove(&mut self, body: BodyId) -> Vec<Event> {
        let _ = self.walkers.remove(&body);
        let _ = self.input_routes.remove(&body);
        self.tick_handlers.retain(|(owner, _)| *owner != body);
        self.apply(Command::RemoveBody { body })
    }

    /// Attaches a walker, replacing any walker already driving the same body.
    pub fn add_walker(&mut self, walker: Walker) {
        let _ = self.walkers.insert(walker.body(), walker);
    }

    /// Walker driving `body`, if any.
    #[must_use]
    pub fn walker(&self, body: BodyId) -> Option<&Walker> {
        self.walkers.get(&body)
    }

    /// Mutable walker driving `body`, if any.
    pub fn walker_mut(&mut self, body: BodyId) -> Option<&mut Walker> {
        self.walkers.get_mut(&body)
    }

    /// Registers a handler invoked at the start of every tick for `body`.
    pub fn on_tick(
        &mut self,
        body: BodyId,
        handler: impl FnMut(&Body, &Scene, &mut Vec<Command>) + 'static,
    ) {
        self.tick_handlers.push((body, Box::new(handler)));
    }

    /// Appends an input route to `body`.
    pub fn route_input(&mut self, body: BodyId, route: InputRoute) {
        self.input_routes.entry(body).or_default().push(route);
    }

    /// Advances the simulation by one tick.
    ///
    /// A walker failure aborts the tick before integration and collisions run.
    pub fn tick(&mut self) -> Result<Vec<Event>, WalkerError> {
        let mut events = Vec::new();
        self.run_tick_handlers(&mut events);
        for walker in self.walkers.values_mut() {
            tick_walker(walker, &mut self.scene, &mut events)?;
        }
        self.finish_tick(&mut events);
        Ok(events)
    }

    /// Advances the simulation by one tick, isolating walker failures.
    ///
    /// Failing walkers are logged and skipped; the rest of the tick proceeds.
    pub fn tick_isolated(&mut self) -> (Vec<Event>, Vec<WalkerError>) {
        let mut events = Vec::new();
        let mut failures = Vec::new();
        self.run_tick_handlers(&mut events);
        for walker in self.walkers.values_mut() {
            if let Err(error) = tick_walker(walker, &mut self.scene, &mut events) {
                warn!("walker for body {} failed: {error}", walker.body().get());
                failures.push(error);
            }
        }
        self.finish_tick(&mut events);
        (events, failures)
    }

    /// Delivers `event` to every matching input route.
    ///
    /// Bodies are visited in ascending identifier order and each body's routes
    /// in registration order.
    pub fn dispatch_input(&mut self, event: &InputEvent) -> Vec<Event> {
        let mut commands = Vec::new();
        for (&body, routes) in &mut self.input_routes {
            let shapes = query::placed_shapes(&self.scene, body);
            for route in routes.iter_mut() {
                if route.matches(event, &shapes) {
                    route.handle(body, event, &mut commands);
                }
            }
        }

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.scene, command, &mut events);
        }
        events
    }

    /// Draws every body and the debug overlay of each walker.
    pub fn render(&self, drawer: &mut dyn ShapeDrawer) {
        let offset = query::offset(&self.scene);
        for body in query::bodies(&self.scene) {
            let shapes = query::placed_shapes(&self.scene, body.id());
            let Some(pivot) = shapes
                .iter()
                .map(|shape| shape.bounds())
                .reduce(|acc, bounds| acc.union(&bounds))
                .map(|bounds| bounds.center())
            else {
                continue;
            };
            draw_rotated(drawer, pivot.to_subtracted(offset), body.rotation(), |drawer| {
                for shape in &shapes {
                    draw_shape(drawer, shape, offset);
                }
            });
        }
        for walker in self.walkers.values() {
            walker.draw_debug(&self.scene, drawer);
        }
    }

    fn run_tick_handlers(&mut self, events: &mut Vec<Event>) {
        let mut commands = Vec::new();
        for (body, handler) in &mut self.tick_handlers {
            if let Some(owner) = query::body(&self.scene, *body) {
                handler(owner, &self.scene, &mut commands);
            }
        }
        for command in commands {
            world::apply(&mut self.scene, command, events);
        }
    }

    fn finish_tick(&mut self, events: &mut Vec<Event>) {
        world::apply(&mut self.scene, Command::Tick, events);
        self.collision.handle(&mut self.scene, events);
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Scene::new())
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("scene", &self.scene)
            .field("walkers", &self.walkers)
            .field("tick_handlers", &self.tick_handlers.len())
            .field("input_routes", &self.input_routes)
            .finish()
    }
}

fn tick_walker(
    walker: &mut Walker,
    scene: &mut Scene,
    events: &mut Vec<Event>,
) -> Result<(), WalkerError> {
    let before = walker.status();
    let mut commands = Vec::new();
    let result = walker.tick(scene, &mut commands);
    for command in commands {
        world::apply(scene, command, events);
    }

    let body = walker.body();
    match (before, walker.status()) {
        (WalkerStatus::Active, WalkerStatus::Completed) => {
            events.push(Event::WalkerCompleted { body });
        }
        (WalkerStatus::Active, WalkerStatus::Stuck) => events.push(Event::WalkerStuck { body }),
        _ => {}
    }
    result
}
