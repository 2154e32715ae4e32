//! Stand-in body used to probe hypothetical positions.

use std::fmt::Write as _;

use stride_core::{Bounds, Hitbox, PlacedShape, ShapeKind, Vector};
use stride_world::query::Obstacle;

/// Clone of a mover's solid shapes that can be placed anywhere without
/// touching the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct PathfindingProxy {
    position: Vector,
    rotation: f32,
    hitboxes: Vec<Hitbox>,
    signature: String,
}

impl PathfindingProxy {
    /// Builds a proxy from the solid shapes in `hitboxes`.
    pub fn from_hitboxes<'a>(hitboxes: impl IntoIterator<Item = &'a Hitbox>) -> Self {
        let hitboxes: Vec<Hitbox> = hitboxes
            .into_iter()
            .filter(|hitbox| hitbox.solid)
            .copied()
            .collect();
        let signature = signature_of(&hitboxes);
        Self {
            position: Vector::ZERO,
            rotation: 0.0,
            hitboxes,
            signature,
        }
    }

    /// Geometry signature the proxy was built from.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Moves the proxy.
    pub fn set_position(&mut self, position: Vector) {
        self.position = position;
    }

    /// Current proxy position.
    #[must_use]
    pub const fn position(&self) -> Vector {
        self.position
    }

    /// Copies the mover's rotation. Shapes are tested unrotated.
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Rotation copied from the mover.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Cloned solid shapes.
    #[must_use]
    pub fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    /// Reports whether the proxy carries at least one shape.
    #[must_use]
    pub fn has_shapes(&self) -> bool {
        !self.hitboxes.is_empty()
    }

    /// Shapes placed at the proxy position.
    pub fn placed_shapes(&self) -> impl Iterator<Item = PlacedShape> + '_ {
        self.hitboxes
            .iter()
            .map(move |hitbox| hitbox.placed(self.position))
    }

    /// Centre of the bounding box around every shape, or the position without shapes.
    #[must_use]
    pub fn rotation_center(&self) -> Vector {
        self.placed_shapes()
            .map(|shape| shape.bounds())
            .reduce(|acc, bounds| acc.union(&bounds))
            .map_or(self.position, |bounds: Bounds| bounds.center())
    }

    /// Reports whether any proxy shape overlaps any obstacle at the current position.
    #[must_use]
    pub fn overlaps(&self, obstacles: &[Obstacle]) -> bool {
        self.placed_shapes().any(|shape| {
            obstacles
                .iter()
                .any(|obstacle| shape.intersects(&obstacle.shape))
        })
    }

    /// Moves the proxy to `position` and reports whether it is clear of every obstacle.
    pub fn is_free_at(&mut self, position: Vector, obstacles: &[Obstacle]) -> bool {
        self.set_position(position);
        !self.overlaps(obstacles)
    }

    /// Distance the shapes extend behind the proxy position against `normal`.
    ///
    /// Placing the proxy this far along `normal` from an edge keeps every shape
    /// on the outer side of that edge.
    #[must_use]
    pub fn reach_against(&self, normal: Vector) -> f32 {
        self.hitboxes
            .iter()
            .map(|hitbox| match hitbox.kind {
                ShapeKind::Circle { radius } => radius - hitbox.offset.dot(normal),
                ShapeKind::Square { size } => {
                    let corners = [
                        hitbox.offset,
                        Vector::new(hitbox.offset.x + size.x, hitbox.offset.y),
                        Vector::new(hitbox.offset.x, hitbox.offset.y + size.y),
                        Vector::new(hitbox.offset.x + size.x, hitbox.offset.y + size.y),
                    ];
                    corners
                        .iter()
                        .map(|corner| -corner.dot(normal))
                        .fold(f32::MIN, f32::max)
                }
            })
            .fold(0.0, f32::max)
    }
}

/// Signature of the solid shapes among `hitboxes`, e.g. `square:0,0:8,8|circle:0,0:4`.
#[must_use]
pub fn signature_of<'a>(hitboxes: impl IntoIterator<Item = &'a Hitbox>) -> String {
    let mut signature = String::new();
    for hitbox in hitboxes.into_iter().filter(|hitbox| hitbox.solid) {
        if !signature.is_empty() {
            signature.push('|');
        }
        let _ = write!(
            signature,
            "{}:{},{}:",
            hitbox.kind.name(),
            hitbox.offset.x,
            hitbox.offset.y
        );
        let _ = match hitbox.kind {
            ShapeKind::Square { size } => write!(signature, "{},{}", size.x, size.y),
            ShapeKind::Circle { radius } => write!(signature, "{radius}"),
        };
    }
    signature
}
