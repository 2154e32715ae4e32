#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative scene state for the Stride movement engine.

use log::warn;
use stride_core::{BodyId, BodySpec, Command, Event, Hitbox, Physics, Vector};

/// A movable or static object living in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    id: BodyId,
    name: String,
    position: Vector,
    speed: Vector,
    rotation: f32,
    physics: Physics,
    hitboxes: Vec<Hitbox>,
    parent: Option<BodyId>,
}

impl Body {
    fn from_spec(id: BodyId, spec: BodySpec) -> Self {
        Self {
            id,
            name: spec.name,
            position: spec.position,
            speed: spec.speed,
            rotation: spec.rotation,
            physics: spec.physics,
            hitboxes: spec.hitboxes,
            parent: spec.parent,
        }
    }

    /// Identifier assigned by the scene.
    #[must_use]
    pub const fn id(&self) -> BodyId {
        self.id
    }

    /// Diagnostic name of the body.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position relative to the parent, or to the scene origin without one.
    #[must_use]
    pub const fn position(&self) -> Vector {
        self.position
    }

    /// Velocity applied once per tick.
    #[must_use]
    pub const fn speed(&self) -> Vector {
        self.speed
    }

    /// Rotation in radians.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Collision response parameters.
    #[must_use]
    pub const fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Shapes owned by the body.
    #[must_use]
    pub fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    /// Iterator over the shapes that obstruct movement.
    pub fn solid_hitboxes(&self) -> impl Iterator<Item = &Hitbox> {
        self.hitboxes.iter().filter(|hitbox| hitbox.solid)
    }

    /// Body this body is positioned relative to, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<BodyId> {
        self.parent
    }
}

/// Represents the authoritative scene state.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    bodies: Vec<Body>,
    next_id: u32,
    gravity: Vector,
    offset: Vector,
    tick_index: u64,
}

impl Scene {
    /// Creates an empty scene without gravity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body to the scene and returns its identifier.
    pub fn spawn(&mut self, spec: BodySpec) -> BodyId {
        let id = BodyId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.bodies.push(Body::from_spec(id, spec));
        id
    }

    fn body_index(&self, body: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&body, Body::id).ok()
    }

    fn body_mut(&mut self, body: BodyId) -> Option<&mut Body> {
        let index = self.body_index(body)?;
        self.bodies.get_mut(index)
    }

    fn parent_position(&self, body: BodyId) -> Vector {
        query::body(self, body)
            .and_then(Body::parent)
            .and_then(|parent| query::scene_position(self, parent))
            .unwrap_or(Vector::ZERO)
    }

    fn integrate(&mut self) {
        let gravity = self.gravity;
        for body in &mut self.bodies {
            if body.physics.immovable {
                continue;
            }
            if body.physics.affected_by_gravity {
                body.speed.add(gravity);
            }
            body.position.add(body.speed);
        }
    }
}

/// Applies the provided command to the scene, mutating state deterministically.
pub fn apply(scene: &mut Scene, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnBody { spec } => {
            let body = scene.spawn(spec);
            out_events.push(Event::BodySpawned { body });
        }
        Command::RemoveBody { body } => {
            if let Some(index) = scene.body_index(body) {
                let anchor = query::scene_position(scene, body).unwrap_or(Vector::ZERO);
                let _ = scene.bodies.remove(index);
                for orphan in scene.bodies.iter_mut().filter(|b| b.parent == Some(body)) {
                    orphan.parent = None;
                    orphan.position.add(anchor);
                }
                out_events.push(Event::BodyRemoved { body });
            } else {
                warn!("ignoring removal of unknown body {}", body.get());
            }
        }
        Command::SetSpeed { body, speed } => {
            if let Some(target) = scene.body_mut(body) {
                target.speed = speed;
            }
        }
        Command::SetPosition { body, position } => {
            let parent_position = scene.parent_position(body);
            if let Some(target) = scene.body_mut(body) {
                target.position = position.to_subtracted(parent_position);
            }
        }
        Command::Translate { body, delta } => {
            if let Some(target) = scene.body_mut(body) {
                target.position.add(delta);
            }
        }
        Command::SetGravity { gravity } => scene.gravity = gravity,
        Command::SetOffset { offset } => scene.offset = offset,
        Command::Tick => {
            scene.tick_index = scene.tick_index.saturating_add(1);
            scene.integrate();
            out_events.push(Event::TimeAdvanced {
                tick: scene.tick_index,
            });
        }
    }
}

/// Query functions that provide read-only access to the scene state.
pub mod query {
    use super::{Body, Scene};
    use stride_core::{BodyId, PlacedShape, Vector};

    /// Iterator over every body in ascending identifier order.
    pub fn bodies(scene: &Scene) -> impl Iterator<Item = &Body> {
        scene.bodies.iter()
    }

    /// Looks up a body by identifier.
    #[must_use]
    pub fn body(scene: &Scene, id: BodyId) -> Option<&Body> {
        scene.body_index(id).and_then(|index| scene.bodies.get(index))
    }

    /// Number of bodies currently in the scene.
    #[must_use]
    pub fn body_count(scene: &Scene) -> usize {
        scene.bodies.len()
    }

    /// Acceleration applied to bodies affected by gravity.
    #[must_use]
    pub fn gravity(scene: &Scene) -> Vector {
        scene.gravity
    }

    /// Camera offset used when presenting the scene.
    #[must_use]
    pub fn offset(scene: &Scene) -> Vector {
        scene.offset
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(scene: &Scene) -> u64 {
        scene.tick_index
    }

    /// Resolves a body's position in scene space by walking its parent chain.
    ///
    /// The walk stops after visiting as many ancestors as there are bodies, so
    /// an accidental parent cycle cannot loop forever.
    #[must_use]
    pub fn scene_position(scene: &Scene, id: BodyId) -> Option<Vector> {
        let mut current = body(scene, id)?;
        let mut position = current.position;
        for _ in 0..scene.bodies.len() {
            let Some(parent) = current.parent.and_then(|parent| body(scene, parent)) else {
                break;
            };
            position = position.to_added(parent.position);
            current = parent;
        }
        Some(position)
    }

    /// Every shape of the body placed in scene space.
    #[must_use]
    pub fn placed_shapes(scene: &Scene, id: BodyId) -> Vec<PlacedShape> {
        let Some(owner) = body(scene, id) else {
            return Vec::new();
        };
        let Some(position) = scene_position(scene, id) else {
            return Vec::new();
        };
        owner
            .hitboxes
            .iter()
            .map(|hitbox| hitbox.placed(position))
            .collect()
    }

    /// Solid shape owned by some other body.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct Obstacle {
        /// Owner of the shape.
        pub body: BodyId,
        /// The shape in scene space.
        pub shape: PlacedShape,
    }

    /// Solid shapes of every body except `excluding`, read live from the scene.
    #[must_use]
    pub fn obstacle_shapes(scene: &Scene, excluding: BodyId) -> Vec<Obstacle> {
        let mut obstacles = Vec::new();
        for owner in scene.bodies.iter().filter(|owner| owner.id != excluding) {
            let Some(position) = scene_position(scene, owner.id) else {
                continue;
            };
            obstacles.extend(owner.solid_hitboxes().map(|hitbox| Obstacle {
                body: owner.id,
                shape: hitbox.placed(position),
            }));
        }
        obstacles
    }
}
