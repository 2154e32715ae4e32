//! Replacement goals on obstacle boundaries.

use stride_core::{PlacedShape, ShapeKind, Vector};
use stride_world::query::Obstacle;

/// Point on an obstacle boundary with the boundary's outward normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePoint {
    /// Boundary point closest to the queried position.
    pub point: Vector,
    /// Unit normal pointing out of the obstacle.
    pub normal: Vector,
    /// Distance between the queried position and `point`.
    pub distance: f32,
}

impl EdgePoint {
    /// Point moved `distance` units out of the obstacle.
    #[must_use]
    pub fn nudged(&self, distance: f32) -> Vector {
        self.point.to_added(self.normal.to_scaled(distance))
    }
}

/// Boundary point of `shape` closest to `target`.
///
/// A target inside a rectangle exits through the nearest edge, preferring
/// left, right, top and bottom in that order on ties.
#[must_use]
pub fn closest_edge_point(shape: &PlacedShape, target: Vector) -> EdgePoint {
    match shape.kind {
        ShapeKind::Square { .. } => {
            let bounds = shape.bounds();
            let clamped = bounds.clamp(target);
            if clamped != target {
                let away = Vector::new(target.x - clamped.x, target.y - clamped.y);
                return EdgePoint {
                    point: clamped,
                    normal: away.to_normalized(),
                    distance: away.length(),
                };
            }

            let exits = [
                (
                    target.x - bounds.min.x,
                    Vector::new(bounds.min.x, target.y),
                    Vector::new(-1.0, 0.0),
                ),
                (
                    bounds.max.x - target.x,
                    Vector::new(bounds.max.x, target.y),
                    Vector::new(1.0, 0.0),
                ),
                (
                    target.y - bounds.min.y,
                    Vector::new(target.x, bounds.min.y),
                    Vector::new(0.0, -1.0),
                ),
                (
                    bounds.max.y - target.y,
                    Vector::new(target.x, bounds.max.y),
                    Vector::new(0.0, 1.0),
                ),
            ];
            let mut best = exits[0];
            for exit in &exits[1..] {
                if exit.0 < best.0 {
                    best = *exit;
                }
            }
            EdgePoint {
                point: best.1,
                normal: best.2,
                distance: best.0,
            }
        }
        ShapeKind::Circle { radius } => {
            let away = Vector::new(target.x - shape.position.x, target.y - shape.position.y);
            let length = away.length();
            let normal = if length > 0.0 {
                Vector::new(away.x / length, away.y / length)
            } else {
                Vector::new(1.0, 0.0)
            };
            EdgePoint {
                point: Vector::new(
                    shape.position.x + normal.x * radius,
                    shape.position.y + normal.y * radius,
                ),
                normal,
                distance: (length - radius).abs(),
            }
        }
    }
}

/// Closest boundary point among all obstacles within `max_distance` of `target`.
///
/// Earlier obstacles win ties.
#[must_use]
pub fn nearest_edge(obstacles: &[Obstacle], target: Vector, max_distance: f32) -> Option<EdgePoint> {
    let mut best: Option<EdgePoint> = None;
    for obstacle in obstacles {
        let candidate = closest_edge_point(&obstacle.shape, target);
        if candidate.distance > max_distance {
            continue;
        }
        if best.map_or(true, |current| candidate.distance < current.distance) {
            best = Some(candidate);
        }
    }
    best
}
