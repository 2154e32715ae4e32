#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scene-wide collision detection and response.

pub mod resolver;

use log::trace;
use stride_core::{BodyId, Command, Event};
use stride_world::{self as world, query, Body, Scene};

pub use resolver::{penetration, resolve, Contact, Resolution};

/// System that separates overlapping solid bodies once per tick.
///
/// Pairs are visited in ascending identifier order and every correction is
/// applied before the next pair is examined, so later pairs observe the
/// corrected positions.
#[derive(Debug, Default)]
pub struct CollisionPass {
    bodies: Vec<BodyId>,
}

impl CollisionPass {
    /// Resolves every overlapping pair of solid shapes in the scene.
    pub fn handle(&mut self, scene: &mut Scene, out_events: &mut Vec<Event>) {
        self.bodies.clear();
        self.bodies.extend(query::bodies(scene).map(Body::id));

        for (index, &first) in self.bodies.iter().enumerate() {
            for &second in &self.bodies[index + 1..] {
                resolve_pair(scene, first, second, out_events);
            }
        }
    }
}

fn resolve_pair(scene: &mut Scene, first: BodyId, second: BodyId, out_events: &mut Vec<Event>) {
    let (Some(a), Some(b)) = (query::body(scene, first), query::body(scene, second)) else {
        return;
    };
    if a.physics().immovable && b.physics().immovable {
        return;
    }
    let shapes_a = a.hitboxes().len();
    let shapes_b = b.hitboxes().len();

    let mut collided = false;
    let mut bounced = false;
    for index_a in 0..shapes_a {
        for index_b in 0..shapes_b {
            let (Some(contact_a), Some(contact_b)) = (
                contact(scene, first, index_a),
                contact(scene, second, index_b),
            ) else {
                continue;
            };
            if !contact_a.shape.intersects(&contact_b.shape) {
                continue;
            }
            let Some(resolution) = resolve(&contact_a, &contact_b) else {
                continue;
            };

            trace!(
                "separating {} and {} by {}",
                first.get(),
                second.get(),
                resolution.penetration
            );
            let mut scratch = Vec::new();
            if !contact_a.physics.immovable {
                correct(scene, first, &resolution, true, &mut scratch);
            }
            if !contact_b.physics.immovable {
                correct(scene, second, &resolution, false, &mut scratch);
            }
            collided = true;
            bounced |= resolution.impulse_applied;
        }
    }

    if collided {
        out_events.push(Event::BodiesCollided {
            first,
            second,
            bounced,
        });
    }
}

fn correct(
    scene: &mut Scene,
    body: BodyId,
    resolution: &Resolution,
    is_first: bool,
    scratch: &mut Vec<Event>,
) {
    let (delta, speed) = if is_first {
        (resolution.delta_a, resolution.velocity_a)
    } else {
        (resolution.delta_b, resolution.velocity_b)
    };
    world::apply(scene, Command::Translate { body, delta }, scratch);
    world::apply(scene, Command::SetSpeed { body, speed }, scratch);
}

fn contact(scene: &Scene, body: BodyId, index: usize) -> Option<Contact> {
    let owner = query::body(scene, body)?;
    let position = query::scene_position(scene, body)?;
    let hitbox = owner.hitboxes().get(index)?;
    Some(Contact {
        shape: hitbox.placed(position),
        physics: *owner.physics(),
        velocity: owner.speed(),
    })
}
