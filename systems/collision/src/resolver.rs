//! Pure single-contact collision resolution.

use stride_core::{Bounds, PlacedShape, Physics, ShapeKind, Vector};

/// One side of a contact: a shape plus the owning body's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Shape in scene space.
    pub shape: PlacedShape,
    /// Collision response parameters of the owner.
    pub physics: Physics,
    /// Current velocity of the owner.
    pub velocity: Vector,
}

/// Outcome of resolving an overlap between two shapes.
///
/// Callers apply the deltas and velocities to the owning bodies, skipping
/// immovable ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    /// Displacement that would fully separate the first shape from the second.
    pub penetration: Vector,
    /// Unit normal pointing from the first shape towards the second.
    pub normal: Vector,
    /// Positional correction for the first body.
    pub delta_a: Vector,
    /// Positional correction for the second body.
    pub delta_b: Vector,
    /// Velocity of the first body after the response.
    pub velocity_a: Vector,
    /// Velocity of the second body after the response.
    pub velocity_b: Vector,
    /// Whether an impulse changed the velocities, as opposed to pure separation.
    pub impulse_applied: bool,
}

/// Resolves the overlap between two shapes owned by distinct bodies.
///
/// Returns `None` when either shape is non-solid, both owners are immovable,
/// or the shapes merely touch.
#[must_use]
pub fn resolve(a: &Contact, b: &Contact) -> Option<Resolution> {
    if !a.shape.solid || !b.shape.solid {
        return None;
    }
    if a.physics.immovable && b.physics.immovable {
        return None;
    }

    let penetration = penetration(&a.shape, &b.shape);
    if penetration.is_zero() {
        return None;
    }
    let normal = penetration.to_scaled(-1.0).to_normalized();

    let (delta_a, delta_b) = match (a.physics.immovable, b.physics.immovable) {
        (true, _) => (Vector::ZERO, penetration.to_scaled(-1.0)),
        (_, true) => (penetration, Vector::ZERO),
        _ => (penetration.to_scaled(0.5), penetration.to_scaled(-0.5)),
    };

    let mut resolution = Resolution {
        penetration,
        normal,
        delta_a,
        delta_b,
        velocity_a: a.velocity,
        velocity_b: b.velocity,
        impulse_applied: false,
    };

    let inverse_a = a.physics.inverse_mass();
    let inverse_b = b.physics.inverse_mass();
    let inverse_sum = inverse_a + inverse_b;

    let relative = b.velocity.to_subtracted(a.velocity);
    let velocity_along_normal = relative.dot(normal);
    if velocity_along_normal >= 0.0 {
        return Some(resolution);
    }

    let restitution = a.physics.restitution.min(b.physics.restitution);
    let normal_impulse = -(1.0 + restitution) * velocity_along_normal / inverse_sum;
    let impulse = normal.to_scaled(normal_impulse);
    resolution.velocity_a = a.velocity.to_subtracted(impulse.to_scaled(inverse_a));
    resolution.velocity_b = b.velocity.to_added(impulse.to_scaled(inverse_b));
    resolution.impulse_applied = normal_impulse != 0.0;

    let relative = resolution
        .velocity_b
        .to_subtracted(resolution.velocity_a);
    let tangent = relative.to_subtracted(normal.to_scaled(relative.dot(normal)));
    if resolution.impulse_applied && !tangent.is_zero() {
        let direction = tangent.to_normalized();
        let friction = a.physics.friction.min(b.physics.friction);
        let limit = friction * normal_impulse.abs();
        let tangent_impulse = (-relative.dot(direction) / inverse_sum).clamp(-limit, limit);
        let friction_impulse = direction.to_scaled(tangent_impulse);
        resolution.velocity_a = resolution
            .velocity_a
            .to_subtracted(friction_impulse.to_scaled(inverse_a));
        resolution.velocity_b = resolution
            .velocity_b
            .to_added(friction_impulse.to_scaled(inverse_b));
    }

    Some(resolution)
}

/// Minimum translation that moves `a` out of `b`, or zero when they do not overlap.
#[must_use]
pub fn penetration(a: &PlacedShape, b: &PlacedShape) -> Vector {
    match (a.kind, b.kind) {
        (ShapeKind::Square { .. }, ShapeKind::Square { .. }) => square_square(a, b),
        (ShapeKind::Circle { radius: ra }, ShapeKind::Circle { radius: rb }) => {
            circle_circle(a.position, ra, b.position, rb)
        }
        (ShapeKind::Circle { radius }, ShapeKind::Square { .. }) => {
            circle_out_of_square(&b.bounds(), a.position, radius)
        }
        (ShapeKind::Square { .. }, ShapeKind::Circle { radius }) => {
            circle_out_of_square(&a.bounds(), b.position, radius).to_scaled(-1.0)
        }
    }
}

fn square_square(a: &PlacedShape, b: &PlacedShape) -> Vector {
    let first = a.bounds();
    let second = b.bounds();
    let overlap_x = first.max.x.min(second.max.x) - first.min.x.max(second.min.x);
    let overlap_y = first.max.y.min(second.max.y) - first.min.y.max(second.min.y);
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return Vector::ZERO;
    }

    let a_center = first.center();
    let b_center = second.center();
    if overlap_x < overlap_y {
        let sign = if a_center.x < b_center.x { -1.0 } else { 1.0 };
        Vector::snapped(sign * overlap_x, 0.0)
    } else {
        let sign = if a_center.y < b_center.y { -1.0 } else { 1.0 };
        Vector::snapped(0.0, sign * overlap_y)
    }
}

fn circle_circle(a: Vector, radius_a: f32, b: Vector, radius_b: f32) -> Vector {
    let delta = Vector::new(b.x - a.x, b.y - a.y);
    let distance = delta.length();
    let reach = radius_a + radius_b;
    if distance >= reach {
        return Vector::ZERO;
    }

    let normal = if distance > 0.0 {
        Vector::new(delta.x / distance, delta.y / distance)
    } else {
        Vector::new(1.0, 0.0)
    };
    let depth = reach - distance;
    Vector::snapped(-normal.x * depth, -normal.y * depth)
}

/// Displacement that pushes a circle out of a rectangle.
fn circle_out_of_square(bounds: &Bounds, center: Vector, radius: f32) -> Vector {
    let closest = bounds.clamp(center);
    if closest != center {
        let away = Vector::new(center.x - closest.x, center.y - closest.y);
        let distance = away.length();
        if distance >= radius {
            return Vector::ZERO;
        }
        let depth = radius - distance;
        return Vector::snapped(away.x / distance * depth, away.y / distance * depth);
    }

    let exits = [
        (center.x - bounds.min.x, Vector::new(-1.0, 0.0)),
        (bounds.max.x - center.x, Vector::new(1.0, 0.0)),
        (center.y - bounds.min.y, Vector::new(0.0, -1.0)),
        (bounds.max.y - center.y, Vector::new(0.0, 1.0)),
    ];
    let mut best = exits[0];
    for exit in &exits[1..] {
        if exit.0 < best.0 {
            best = *exit;
        }
    }
    let (distance, direction) = best;
    direction.to_scaled(distance + radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::Hitbox;

    fn square(x: f32, y: f32, w: f32, h: f32) -> PlacedShape {
        Hitbox::square(Vector::ZERO, Vector::new(w, h)).placed(Vector::new(x, y))
    }

    fn circle(x: f32, y: f32, radius: f32) -> PlacedShape {
        Hitbox::circle(Vector::ZERO, radius).placed(Vector::new(x, y))
    }

    fn movable(shape: PlacedShape, velocity: Vector) -> Contact {
        Contact {
            shape,
            physics: Physics::default(),
            velocity,
        }
    }

    fn fixed(shape: PlacedShape) -> Contact {
        Contact {
            shape,
            physics: Physics::immovable(),
            velocity: Vector::ZERO,
        }
    }

    #[test]
    fn left_square_is_pushed_further_left() {
        let push = penetration(&square(0.0, 0.0, 10.0, 10.0), &square(8.0, 1.0, 10.0, 10.0));
        assert_eq!(push, Vector::new(-2.0, 0.0));
    }

    #[test]
    fn square_pair_picks_shallower_axis() {
        let push = penetration(&square(0.0, 0.0, 10.0, 10.0), &square(1.0, -7.0, 10.0, 10.0));
        assert_eq!(push, Vector::new(0.0, 3.0));
    }

    #[test]
    fn coincident_circles_use_fallback_normal() {
        let push = penetration(&circle(5.0, 5.0, 2.0), &circle(5.0, 5.0, 3.0));
        assert_eq!(push, Vector::new(-5.0, 0.0));
    }

    #[test]
    fn circle_outside_square_is_pushed_away_from_nearest_point() {
        let push = penetration(&circle(12.0, 5.0, 4.0), &square(0.0, 0.0, 10.0, 10.0));
        assert_eq!(push, Vector::new(2.0, 0.0));
        let reverse = penetration(&square(0.0, 0.0, 10.0, 10.0), &circle(12.0, 5.0, 4.0));
        assert_eq!(reverse, Vector::new(-2.0, 0.0));
    }

    #[test]
    fn circle_inside_square_exits_through_nearest_edge() {
        let push = penetration(&circle(7.0, 5.0, 1.0), &square(0.0, 0.0, 10.0, 10.0));
        assert_eq!(push, Vector::new(4.0, 0.0));
    }

    #[test]
    fn centred_circle_prefers_left_edge_on_ties() {
        let push = penetration(&circle(5.0, 5.0, 1.0), &square(0.0, 0.0, 10.0, 10.0));
        assert_eq!(push, Vector::new(-6.0, 0.0));
    }

    #[test]
    fn two_immovable_solids_do_not_resolve() {
        let a = fixed(square(0.0, 0.0, 10.0, 10.0));
        let b = fixed(square(5.0, 0.0, 10.0, 10.0));
        assert_eq!(resolve(&a, &b), None);
    }

    #[test]
    fn non_solid_shapes_do_not_resolve() {
        let a = movable(square(0.0, 0.0, 10.0, 10.0), Vector::ZERO);
        let mut b = movable(square(5.0, 0.0, 10.0, 10.0), Vector::ZERO);
        b.shape.solid = false;
        assert_eq!(resolve(&a, &b), None);
        assert_eq!(resolve(&b, &a), None);
    }

    #[test]
    fn touching_shapes_do_not_resolve() {
        let a = movable(square(0.0, 0.0, 10.0, 10.0), Vector::ZERO);
        let b = fixed(square(10.0, 0.0, 10.0, 10.0));
        assert_eq!(resolve(&a, &b), None);
    }

    #[test]
    fn movable_body_takes_full_correction_against_immovable() {
        let a = fixed(square(0.0, 0.0, 10.0, 10.0));
        let b = movable(square(8.0, 0.0, 10.0, 10.0), Vector::ZERO);
        let resolution = resolve(&a, &b).expect("overlap");
        assert_eq!(resolution.delta_a, Vector::ZERO);
        assert_eq!(resolution.delta_b, Vector::new(2.0, 0.0));
        assert!(!resolution.impulse_applied);
    }

    #[test]
    fn movable_pair_splits_correction() {
        let a = movable(square(0.0, 0.0, 10.0, 10.0), Vector::ZERO);
        let b = movable(square(8.0, 0.0, 10.0, 10.0), Vector::ZERO);
        let resolution = resolve(&a, &b).expect("overlap");
        assert_eq!(resolution.delta_a, Vector::new(-1.0, 0.0));
        assert_eq!(resolution.delta_b, Vector::new(1.0, 0.0));
        assert_eq!(resolution.normal, Vector::new(1.0, 0.0));
    }

    #[test]
    fn separating_bodies_are_only_corrected() {
        let a = movable(square(0.0, 0.0, 10.0, 10.0), Vector::new(-3.0, 0.0));
        let b = fixed(square(8.0, 0.0, 10.0, 10.0));
        let resolution = resolve(&a, &b).expect("overlap");
        assert!(!resolution.impulse_applied);
        assert_eq!(resolution.velocity_a, Vector::new(-3.0, 0.0));
        assert_eq!(resolution.delta_a, Vector::new(-2.0, 0.0));
    }

    #[test]
    fn approaching_body_bounces_with_min_restitution() {
        let mut a = movable(square(0.0, 0.0, 10.0, 10.0), Vector::new(4.0, 0.0));
        a.physics.restitution = 0.5;
        let mut b = fixed(square(8.0, 0.0, 10.0, 10.0));
        b.physics.restitution = 1.0;
        let resolution = resolve(&a, &b).expect("overlap");
        assert!(resolution.impulse_applied);
        assert_eq!(resolution.velocity_a, Vector::new(-2.0, 0.0));
        assert_eq!(resolution.velocity_b, Vector::ZERO);
    }

    #[test]
    fn friction_is_capped_by_normal_impulse() {
        let mut a = movable(square(0.0, 0.0, 10.0, 10.0), Vector::new(6.0, 2.0));
        a.physics.friction = 0.5;
        let mut b = fixed(square(-20.0, 8.0, 50.0, 10.0));
        b.physics.friction = 0.5;
        let resolution = resolve(&a, &b).expect("overlap");
        assert_eq!(resolution.normal, Vector::new(0.0, 1.0));
        assert!(resolution.impulse_applied);
        // normal impulse 2.0, friction cap 1.0
        assert_eq!(resolution.velocity_a, Vector::new(5.0, 0.0));
    }
}
