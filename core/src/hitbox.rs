//! Collision shapes owned by bodies.

use serde::{Deserialize, Serialize};

use crate::Vector;

/// Geometry of a hitbox.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    /// Axis-aligned rectangle anchored at its top-left corner.
    Square {
        /// Width and height of the rectangle.
        size: Vector,
    },
    /// Circle anchored at its centre.
    Circle {
        /// Radius of the circle.
        radius: f32,
    },
}

impl ShapeKind {
    /// Short name used in signatures and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Square { .. } => "square",
            Self::Circle { .. } => "circle",
        }
    }
}

/// Shape owned by a body, positioned relative to the owner.
///
/// Solid hitboxes take part in collision response and obstruct pathfinding.
/// Non-solid hitboxes only answer point queries, e.g. click targets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    /// Offset from the owner's position.
    pub offset: Vector,
    /// Whether the shape participates in collisions.
    pub solid: bool,
    /// Geometry of the shape.
    pub kind: ShapeKind,
}

impl Hitbox {
    /// Creates a solid rectangle whose top-left corner sits at `offset`.
    #[must_use]
    pub const fn square(offset: Vector, size: Vector) -> Self {
        Self {
            offset,
            solid: true,
            kind: ShapeKind::Square { size },
        }
    }

    /// Creates a solid circle centred at `offset`.
    #[must_use]
    pub const fn circle(offset: Vector, radius: f32) -> Self {
        Self {
            offset,
            solid: true,
            kind: ShapeKind::Circle { radius },
        }
    }

    /// Marks the hitbox as non-solid.
    #[must_use]
    pub const fn non_solid(mut self) -> Self {
        self.solid = false;
        self
    }

    /// Absolute anchor of the shape for an owner located at `owner`.
    #[must_use]
    pub fn absolute_position(&self, owner: Vector) -> Vector {
        owner.to_added(self.offset)
    }

    /// Places the shape in absolute coordinates for an owner located at `owner`.
    #[must_use]
    pub fn placed(&self, owner: Vector) -> PlacedShape {
        PlacedShape {
            position: self.absolute_position(owner),
            kind: self.kind,
            solid: self.solid,
        }
    }
}

/// Axis-aligned bounds described by their minimum and maximum corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Top-left corner.
    pub min: Vector,
    /// Bottom-right corner.
    pub max: Vector,
}

impl Bounds {
    /// Centre of the bounds.
    #[must_use]
    pub fn center(&self) -> Vector {
        self.min.midpoint(self.max)
    }

    /// Smallest bounds containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Vector::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vector::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Clamps `point` into the bounds.
    #[must_use]
    pub fn clamp(&self, point: Vector) -> Vector {
        Vector::new(
            point.x.clamp(self.min.x, self.max.x.max(self.min.x)),
            point.y.clamp(self.min.y, self.max.y.max(self.min.y)),
        )
    }
}

/// Hitbox resolved into absolute coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedShape {
    /// Absolute anchor: top-left corner for squares, centre for circles.
    pub position: Vector,
    /// Geometry of the shape.
    pub kind: ShapeKind,
    /// Whether the shape participates in collisions.
    pub solid: bool,
}

impl PlacedShape {
    /// Axis-aligned bounds enclosing the shape.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        match self.kind {
            ShapeKind::Square { size } => Bounds {
                min: self.position,
                max: Vector::new(self.position.x + size.x, self.position.y + size.y),
            },
            ShapeKind::Circle { radius } => Bounds {
                min: Vector::new(self.position.x - radius, self.position.y - radius),
                max: Vector::new(self.position.x + radius, self.position.y + radius),
            },
        }
    }

    /// Geometric centre of the shape.
    #[must_use]
    pub fn center(&self) -> Vector {
        match self.kind {
            ShapeKind::Square { .. } => self.bounds().center(),
            ShapeKind::Circle { .. } => self.position,
        }
    }

    /// Returns the shape moved by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Vector) -> Self {
        Self {
            position: Vector::new(self.position.x + delta.x, self.position.y + delta.y),
            ..*self
        }
    }

    /// Reports whether the two shapes overlap. Touching shapes do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (ShapeKind::Square { .. }, ShapeKind::Square { .. }) => {
                let a = self.bounds();
                let b = other.bounds();
                a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
            }
            (ShapeKind::Circle { radius: a }, ShapeKind::Circle { radius: b }) => {
                let reach = a + b;
                self.position.distance_squared(other.position) < reach * reach
            }
            (ShapeKind::Square { .. }, ShapeKind::Circle { radius }) => {
                square_circle_overlap(&self.bounds(), other.position, radius)
            }
            (ShapeKind::Circle { radius }, ShapeKind::Square { .. }) => {
                square_circle_overlap(&other.bounds(), self.position, radius)
            }
        }
    }

    /// Reports whether `point` lies inside the shape.
    ///
    /// Squares include their top-left edges and exclude the bottom-right ones;
    /// circles exclude their boundary.
    #[must_use]
    pub fn intersects_with_point(&self, point: Vector) -> bool {
        match self.kind {
            ShapeKind::Square { .. } => {
                let bounds = self.bounds();
                point.x >= bounds.min.x
                    && point.x < bounds.max.x
                    && point.y >= bounds.min.y
                    && point.y < bounds.max.y
            }
            ShapeKind::Circle { radius } => {
                self.position.distance_squared(point) < radius * radius
            }
        }
    }

    /// Reports whether the shapes will overlap after each advances by its velocity.
    #[must_use]
    pub fn will_intersect_next_tick(
        &self,
        own_velocity: Vector,
        other: &Self,
        other_velocity: Vector,
    ) -> bool {
        self.translated(own_velocity)
            .intersects(&other.translated(other_velocity))
    }
}

fn square_circle_overlap(bounds: &Bounds, center: Vector, radius: f32) -> bool {
    let closest = bounds.clamp(center);
    closest.distance_squared(center) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square_at(x: f32, y: f32, w: f32, h: f32) -> PlacedShape {
        Hitbox::square(Vector::ZERO, Vector::new(w, h)).placed(Vector::new(x, y))
    }

    fn circle_at(x: f32, y: f32, radius: f32) -> PlacedShape {
        Hitbox::circle(Vector::ZERO, radius).placed(Vector::new(x, y))
    }

    #[test]
    fn absolute_position_adds_owner() {
        let hitbox = Hitbox::square(Vector::new(-4.0, -4.0), Vector::new(8.0, 8.0));
        assert_eq!(
            hitbox.absolute_position(Vector::new(10.0, 20.0)),
            Vector::new(6.0, 16.0)
        );
    }

    #[test]
    fn touching_squares_do_not_intersect() {
        let left = square_at(0.0, 0.0, 10.0, 10.0);
        let right = square_at(10.0, 0.0, 10.0, 10.0);
        assert!(!left.intersects(&right));
        assert!(left.intersects(&square_at(9.0, 9.0, 10.0, 10.0)));
    }

    #[test]
    fn circles_intersect_within_radius_sum() {
        assert!(circle_at(0.0, 0.0, 5.0).intersects(&circle_at(9.0, 0.0, 5.0)));
        assert!(!circle_at(0.0, 0.0, 5.0).intersects(&circle_at(10.0, 0.0, 5.0)));
    }

    #[test]
    fn mixed_shapes_dispatch_symmetrically() {
        let square = square_at(0.0, 0.0, 10.0, 10.0);
        let near = circle_at(13.0, 5.0, 4.0);
        let far = circle_at(15.0, 5.0, 4.0);
        assert!(square.intersects(&near));
        assert!(near.intersects(&square));
        assert!(!square.intersects(&far));
        assert!(!far.intersects(&square));
    }

    #[test]
    fn circle_boundary_point_is_outside() {
        let circle = circle_at(0.0, 0.0, 5.0);
        assert!(!circle.intersects_with_point(Vector::new(5.0, 0.0)));
        assert!(!circle.intersects_with_point(Vector::new(3.0, 4.0)));
        assert!(circle.intersects_with_point(Vector::new(4.9, 0.0)));
    }

    #[test]
    fn square_point_test_is_half_open() {
        let square = square_at(0.0, 0.0, 10.0, 10.0);
        assert!(square.intersects_with_point(Vector::new(0.0, 0.0)));
        assert!(!square.intersects_with_point(Vector::new(10.0, 5.0)));
    }

    #[test]
    fn predicts_contact_one_tick_ahead() {
        let mover = square_at(0.0, 0.0, 10.0, 10.0);
        let wall = square_at(15.0, 0.0, 10.0, 10.0);
        assert!(!mover.intersects(&wall));
        assert!(mover.will_intersect_next_tick(Vector::new(6.0, 0.0), &wall, Vector::ZERO));
        assert!(!mover.will_intersect_next_tick(Vector::new(-6.0, 0.0), &wall, Vector::ZERO));
    }

    #[test]
    fn degenerate_shapes_are_accepted() {
        let empty = square_at(0.0, 0.0, 0.0, 0.0);
        assert!(empty.intersects(&square_at(-5.0, -5.0, 10.0, 10.0)));
        assert!(!empty.intersects_with_point(Vector::ZERO));
        assert!(!circle_at(0.0, 0.0, 0.0).intersects_with_point(Vector::ZERO));
    }

    proptest! {
        #[test]
        fn square_intersection_is_symmetric(
            ax in -100.0f32..100.0, ay in -100.0f32..100.0,
            aw in 0.0f32..50.0, ah in 0.0f32..50.0,
            bx in -100.0f32..100.0, by in -100.0f32..100.0,
            bw in 0.0f32..50.0, bh in 0.0f32..50.0,
        ) {
            let a = square_at(ax, ay, aw, ah);
            let b = square_at(bx, by, bw, bh);
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }
    }
}
