//! Planar vector used for positions, displacements and velocities.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Magnitude below which an axis produced by a copying operation collapses to zero.
pub const SNAP_EPSILON: f32 = 0.05;

/// Two-dimensional point or displacement expressed in world units.
///
/// Operations prefixed with `to_` return a new vector and snap every axis whose
/// magnitude falls below [`SNAP_EPSILON`] to exactly `0.0`. Equality based
/// checks such as "is the body moving" rely on that snapping, so callers must
/// not bypass it by constructing near-zero vectors through arithmetic on the
/// raw fields. The in-place operations (`add`, `subtract`, `scale`) keep the
/// raw result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component, growing downwards in screen space.
    pub y: f32,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector from raw components without snapping.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Creates a vector whose near-zero components are snapped to zero.
    #[must_use]
    pub fn snapped(x: f32, y: f32) -> Self {
        Self {
            x: snap_axis(x),
            y: snap_axis(y),
        }
    }

    /// Returns `self + other`.
    #[must_use]
    pub fn to_added(self, other: Self) -> Self {
        Self::from_glam(self.as_glam() + other.as_glam())
    }

    /// Returns `self - other`.
    #[must_use]
    pub fn to_subtracted(self, other: Self) -> Self {
        Self::from_glam(self.as_glam() - other.as_glam())
    }

    /// Returns `self * factor`.
    #[must_use]
    pub fn to_scaled(self, factor: f32) -> Self {
        Self::from_glam(self.as_glam() * factor)
    }

    /// Returns the unit vector pointing in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn to_normalized(self) -> Self {
        Self::from_glam(self.as_glam().normalize_or_zero())
    }

    /// Returns the vector rotated a quarter turn counter-clockwise.
    #[must_use]
    pub fn to_perpendicular(self) -> Self {
        Self::from_glam(self.as_glam().perp())
    }

    /// Returns the point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::from_glam((self.as_glam() + other.as_glam()) * 0.5)
    }

    /// Adds `other` in place.
    pub fn add(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }

    /// Subtracts `other` in place.
    pub fn subtract(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }

    /// Scales the vector in place.
    pub fn scale(&mut self, factor: f32) {
        self.x *= factor;
        self.y *= factor;
    }

    /// Dot product with `other`.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.as_glam().dot(other.as_glam())
    }

    /// Z component of the three-dimensional cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> f32 {
        self.as_glam().perp_dot(other.as_glam())
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.as_glam().length()
    }

    /// Squared Euclidean length.
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.as_glam().length_squared()
    }

    /// Squared distance between two points.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        self.as_glam().distance_squared(other.as_glam())
    }

    /// Reports whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Converts the vector into its `glam` representation.
    #[must_use]
    pub fn as_glam(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn from_glam(value: Vec2) -> Self {
        Self::snapped(value.x, value.y)
    }
}

impl From<Vec2> for Vector {
    fn from(value: Vec2) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Vector> for Vec2 {
    fn from(value: Vector) -> Self {
        value.as_glam()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

fn snap_axis(value: f32) -> f32 {
    if value.abs() < SNAP_EPSILON {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizing_zero_yields_zero() {
        assert_eq!(Vector::ZERO.to_normalized(), Vector::ZERO);
    }

    #[test]
    fn in_place_add_keeps_small_components() {
        let mut value = Vector::new(0.01, 0.0);
        value.add(Vector::new(0.01, 0.0));
        assert!((value.x - 0.02).abs() < f32::EPSILON);
    }

    #[test]
    fn copy_add_snaps_residue() {
        let sum = Vector::new(10.02, 5.0).to_added(Vector::new(-10.0, -5.0));
        assert_eq!(sum, Vector::ZERO);
        assert!(sum.is_zero());
    }

    #[test]
    fn cross_sign_follows_winding() {
        let east = Vector::new(1.0, 0.0);
        let south = Vector::new(0.0, 1.0);
        assert!(east.cross(south) > 0.0);
        assert!(south.cross(east) < 0.0);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Vector::new(1.0, -2.5).to_string(), "(1.00, -2.50)");
    }

    proptest! {
        #[test]
        fn copy_add_snaps_axes_below_epsilon(
            a in -1000.0f32..1000.0,
            delta in -0.049f32..0.049,
            y in -1000.0f32..1000.0,
        ) {
            let sum = Vector::new(a, y).to_added(Vector::new(-a + delta, 0.0));
            let raw = a + (-a + delta);
            if raw.abs() < SNAP_EPSILON {
                prop_assert_eq!(sum.x, 0.0);
            }
        }

        #[test]
        fn normalized_vectors_have_unit_length(x in 1.0f32..500.0, y in 1.0f32..500.0) {
            let unit = Vector::new(x, y).to_normalized();
            prop_assert!((unit.length() - 1.0).abs() < 0.06);
        }
    }
}
