#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stride movement engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative scene, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the scene executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Geometry shared by the collision resolver and the walker lives
//! here as well, so both always agree on what a shape occupies.

pub mod hitbox;
pub mod vector;

use serde::{Deserialize, Serialize};

pub use hitbox::{Bounds, Hitbox, PlacedShape, ShapeKind};
pub use vector::{Vector, SNAP_EPSILON};

/// Unique identifier assigned to a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    /// Creates a new body identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Physical response parameters of a body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Physics {
    /// Immovable bodies are never displaced by collisions nor integrated.
    pub immovable: bool,
    /// Bounciness in `0.0..=1.0`.
    pub restitution: f32,
    /// Coulomb friction coefficient in `0.0..=1.0`.
    pub friction: f32,
    /// Whether the scene gravity accelerates the body every tick.
    pub affected_by_gravity: bool,
}

impl Physics {
    /// Parameters for static scenery such as walls and furniture.
    #[must_use]
    pub const fn immovable() -> Self {
        Self {
            immovable: true,
            restitution: 0.0,
            friction: 0.0,
            affected_by_gravity: false,
        }
    }

    /// Inverse mass used by impulse resolution. Mass is not otherwise modelled.
    #[must_use]
    pub const fn inverse_mass(&self) -> f32 {
        if self.immovable {
            0.0
        } else {
            1.0
        }
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            immovable: false,
            restitution: 0.0,
            friction: 0.0,
            affected_by_gravity: false,
        }
    }
}

/// Blueprint used to spawn a body into the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
    /// Diagnostic name of the body.
    pub name: String,
    /// Initial position, relative to the parent when one is set.
    pub position: Vector,
    /// Initial velocity applied once per tick.
    pub speed: Vector,
    /// Rotation in radians. Shapes are treated as unrotated.
    pub rotation: f32,
    /// Collision response parameters.
    pub physics: Physics,
    /// Shapes owned by the body.
    pub hitboxes: Vec<Hitbox>,
    /// Body this body is positioned relative to, if any.
    pub parent: Option<BodyId>,
}

impl BodySpec {
    /// Starts a blueprint for a movable body without shapes.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vector) -> Self {
        Self {
            name: name.into(),
            position,
            speed: Vector::ZERO,
            rotation: 0.0,
            physics: Physics::default(),
            hitboxes: Vec::new(),
            parent: None,
        }
    }

    /// Adds a hitbox to the blueprint.
    #[must_use]
    pub fn with_hitbox(mut self, hitbox: Hitbox) -> Self {
        self.hitboxes.push(hitbox);
        self
    }

    /// Overrides the physics parameters.
    #[must_use]
    pub fn with_physics(mut self, physics: Physics) -> Self {
        self.physics = physics;
        self
    }

    /// Overrides the initial velocity.
    #[must_use]
    pub fn with_speed(mut self, speed: Vector) -> Self {
        self.speed = speed;
        self
    }

    /// Positions the body relative to `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: BodyId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Commands that express all permissible scene mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Adds a new body to the scene.
    SpawnBody {
        /// Blueprint describing the body.
        spec: BodySpec,
    },
    /// Removes a body from the scene.
    RemoveBody {
        /// Identifier of the body to remove.
        body: BodyId,
    },
    /// Replaces a body's velocity.
    SetSpeed {
        /// Identifier of the body to update.
        body: BodyId,
        /// Velocity applied on subsequent ticks.
        speed: Vector,
    },
    /// Moves a body to an absolute scene position.
    SetPosition {
        /// Identifier of the body to move.
        body: BodyId,
        /// Target position expressed in scene space.
        position: Vector,
    },
    /// Displaces a body by the provided delta.
    Translate {
        /// Identifier of the body to move.
        body: BodyId,
        /// Displacement to apply.
        delta: Vector,
    },
    /// Replaces the scene gravity.
    SetGravity {
        /// Acceleration applied to bodies affected by gravity.
        gravity: Vector,
    },
    /// Replaces the camera offset used for presentation.
    SetOffset {
        /// Offset subtracted from scene positions when drawing.
        offset: Vector,
    },
    /// Advances the simulation by one fixed step, integrating body velocities.
    Tick,
}

/// Events broadcast by the scene and the systems driving it.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Confirms that a body was added to the scene.
    BodySpawned {
        /// Identifier assigned to the new body.
        body: BodyId,
    },
    /// Confirms that a body left the scene.
    BodyRemoved {
        /// Identifier of the removed body.
        body: BodyId,
    },
    /// Reports that the collision pass separated two bodies.
    BodiesCollided {
        /// Body with the lower identifier.
        first: BodyId,
        /// Body with the higher identifier.
        second: BodyId,
        /// Whether an impulse changed the velocities, as opposed to pure separation.
        bounced: bool,
    },
    /// Reports that a non-cyclic walker reached its final waypoint.
    WalkerCompleted {
        /// Body driven by the walker.
        body: BodyId,
    },
    /// Reports that a walker gave up after failing to find a path.
    WalkerStuck {
        /// Body driven by the walker.
        body: BodyId,
    },
}

/// RGB colour used by debug drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DebugColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl DebugColor {
    /// Colour used for solid shapes.
    pub const SOLID: Self = Self::from_rgb(0xc8, 0x2a, 0x36);
    /// Colour used for non-solid shapes.
    pub const GHOST: Self = Self::from_rgb(0x9e, 0x9e, 0x9e);
    /// Colour used for computed path segments.
    pub const PATH: Self = Self::from_rgb(0x2f, 0x95, 0x32);
    /// Colour used for waypoints.
    pub const WAYPOINT: Self = Self::from_rgb(0x58, 0x47, 0xff);
    /// Colour used for snapped goals.
    pub const ADJUSTED: Self = Self::from_rgb(0xff, 0xc1, 0x07);

    /// Creates a new colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Drawing surface used by debug overlays.
///
/// Coordinates are in screen space: callers subtract the scene offset before
/// drawing. Implementations keep a stack of rotations so that
/// [`draw_rotated`] can scope a rotation to a group of primitives.
pub trait ShapeDrawer {
    /// Draws a circle outline.
    fn draw_circle(&mut self, center: Vector, radius: f32, color: DebugColor);

    /// Draws a line segment.
    fn draw_line(&mut self, from: Vector, to: Vector, color: DebugColor);

    /// Draws a rectangle outline anchored at its top-left corner.
    fn draw_rect(&mut self, origin: Vector, size: Vector, color: DebugColor);

    /// Pushes a rotation around `pivot` applied to subsequent primitives.
    fn push_rotation(&mut self, pivot: Vector, radians: f32);

    /// Pops the most recently pushed rotation.
    fn pop_rotation(&mut self);
}

/// Runs `draw` with a rotation around `pivot` pushed onto the drawer.
pub fn draw_rotated(
    drawer: &mut dyn ShapeDrawer,
    pivot: Vector,
    radians: f32,
    draw: impl FnOnce(&mut dyn ShapeDrawer),
) {
    drawer.push_rotation(pivot, radians);
    draw(&mut *drawer);
    drawer.pop_rotation();
}

/// Draws a placed shape, shifted by `-offset`.
pub fn draw_shape(drawer: &mut dyn ShapeDrawer, shape: &PlacedShape, offset: Vector) {
    let color = if shape.solid {
        DebugColor::SOLID
    } else {
        DebugColor::GHOST
    };
    let anchor = shape.position.to_subtracted(offset);
    match shape.kind {
        ShapeKind::Square { size } => drawer.draw_rect(anchor, size, color),
        ShapeKind::Circle { radius } => drawer.draw_circle(anchor, radius, color),
    }
}
