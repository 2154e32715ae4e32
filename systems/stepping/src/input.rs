//! Explicit input routing for scene bodies.

use std::fmt;

use stride_core::{BodyId, Command, PlacedShape, Vector};

/// Input delivered to the simulation. Positions are in scene space.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed.
    Click {
        /// Pointer position.
        position: Vector,
    },
    /// Pointer moved.
    Hover {
        /// Pointer position.
        position: Vector,
    },
    /// Keyboard key pressed.
    KeyPress {
        /// Name of the key, e.g. `"Space"`.
        key: String,
    },
}

type Predicate = Box<dyn Fn(&InputEvent, &[PlacedShape]) -> bool>;
type Handler = Box<dyn FnMut(BodyId, &InputEvent, &mut Vec<Command>)>;

/// Predicate and handler pair registered for one body.
///
/// The predicate sees the event and the body's shapes in scene space; the
/// handler reacts by pushing commands.
pub struct InputRoute {
    predicate: Predicate,
    handler: Handler,
}

impl InputRoute {
    /// Creates a route from an arbitrary predicate.
    pub fn new(
        predicate: impl Fn(&InputEvent, &[PlacedShape]) -> bool + 'static,
        handler: impl FnMut(BodyId, &InputEvent, &mut Vec<Command>) + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        }
    }

    /// Route fired by clicks inside any of the body's shapes.
    pub fn click(handler: impl FnMut(BodyId, &InputEvent, &mut Vec<Command>) + 'static) -> Self {
        Self::new(
            |event, shapes| match event {
                InputEvent::Click { position } => contains_point(shapes, *position),
                _ => false,
            },
            handler,
        )
    }

    /// Route fired when the pointer hovers any of the body's shapes.
    pub fn hover(handler: impl FnMut(BodyId, &InputEvent, &mut Vec<Command>) + 'static) -> Self {
        Self::new(
            |event, shapes| match event {
                InputEvent::Hover { position } => contains_point(shapes, *position),
                _ => false,
            },
            handler,
        )
    }

    /// Route fired by presses of `key`.
    pub fn key(
        key: impl Into<String>,
        handler: impl FnMut(BodyId, &InputEvent, &mut Vec<Command>) + 'static,
    ) -> Self {
        let expected = key.into();
        Self::new(
            move |event, _| matches!(event, InputEvent::KeyPress { key } if *key == expected),
            handler,
        )
    }

    /// Reports whether the route reacts to `event`.
    #[must_use]
    pub fn matches(&self, event: &InputEvent, shapes: &[PlacedShape]) -> bool {
        (self.predicate)(event, shapes)
    }

    /// Runs the handler for `body`.
    pub fn handle(&mut self, body: BodyId, event: &InputEvent, out: &mut Vec<Command>) {
        (self.handler)(body, event, out);
    }
}

impl fmt::Debug for InputRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputRoute").finish_non_exhaustive()
    }
}

/// Reports whether `point` lies inside any shape, solid or not.
#[must_use]
pub fn contains_point(shapes: &[PlacedShape], point: Vector) -> bool {
    shapes
        .iter()
        .any(|shape| shape.intersects_with_point(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::Hitbox;

    fn button() -> Vec<PlacedShape> {
        vec![Hitbox::square(Vector::ZERO, Vector::new(20.0, 10.0))
            .non_solid()
            .placed(Vector::new(100.0, 100.0))]
    }

    #[test]
    fn click_route_requires_a_hit() {
        let route = InputRoute::click(|_, _, _| {});
        let shapes = button();
        assert!(route.matches(
            &InputEvent::Click {
                position: Vector::new(105.0, 105.0)
            },
            &shapes
        ));
        assert!(!route.matches(
            &InputEvent::Click {
                position: Vector::new(125.0, 105.0)
            },
            &shapes
        ));
        assert!(!route.matches(
            &InputEvent::Hover {
                position: Vector::new(105.0, 105.0)
            },
            &shapes
        ));
    }

    #[test]
    fn key_route_matches_named_key_only() {
        let route = InputRoute::key("Space", |_, _, _| {});
        assert!(route.matches(
            &InputEvent::KeyPress {
                key: "Space".to_owned()
            },
            &[]
        ));
        assert!(!route.matches(
            &InputEvent::KeyPress {
                key: "Enter".to_owned()
            },
            &[]
        ));
    }
}
