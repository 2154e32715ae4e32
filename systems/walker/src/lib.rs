#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Obstacle-aware waypoint following for scene bodies.
//!
//! A [`Walker`] steers one body through an ordered list of waypoints. When
//! obstacle avoidance is enabled it periodically runs a grid A* search against
//! the solid shapes of every other body, using a [`PathfindingProxy`] built
//! from the mover's own shapes, and follows the simplified result node by
//! node. Walkers never mutate the scene: they emit [`Command`]s that the
//! caller applies through `stride_world::apply`.

pub mod heap;
pub mod options;
pub mod proxy;
pub mod search;
pub mod snap;

use std::fmt;

use log::{debug, trace, warn};
use stride_core::{draw_rotated, draw_shape, BodyId, Command, DebugColor, ShapeDrawer, Vector};
use stride_world::{
    query::{self, Obstacle},
    Body, Scene,
};
use thiserror::Error;

pub use heap::MinHeap;
pub use options::{NotFoundBehavior, PathfindingOptions};
pub use proxy::PathfindingProxy;
pub use search::{find_path, simplify_path, SearchOutcome, Tile};
pub use snap::{closest_edge_point, nearest_edge, EdgePoint};

/// Consumed nodes are dropped once the cursor passes this count and half the path.
const COMPACT_THRESHOLD: usize = 32;
/// Path nodes this close (squared) to the body count as reached.
const REACHED_DISTANCE_SQUARED: f32 = 0.5;
/// Clearance added beyond the proxy's reach when nudging a snapped goal.
const SNAP_MARGIN: f32 = 1.0;

/// Fatal walker failures.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum WalkerError {
    /// The search found no route and the policy asked to fail.
    #[error("{body} cannot reach {destination}")]
    Unreachable {
        /// Name of the moving body.
        body: String,
        /// Waypoint that could not be reached.
        destination: Vector,
    },
}

/// Lifecycle of a walker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WalkerStatus {
    /// Constructed or paused; ticks do nothing.
    #[default]
    Idle,
    /// Following the route.
    Active,
    /// Reached the final waypoint of a non-cyclic route.
    Completed,
    /// Gave up after failing to find a path.
    Stuck,
}

/// Data handed to the recalculation predicate.
pub struct RecalculateContext<'a> {
    /// The walker asking.
    pub walker: &'a Walker,
    /// Body driven by the walker.
    pub body: &'a Body,
    /// Scene holding every other body.
    pub scene: &'a Scene,
    /// Current scene position of the body.
    pub start: Vector,
    /// Waypoint the walker heads for.
    pub goal: Vector,
}

/// Data handed to the path-not-found hook.
pub struct PathNotFoundContext<'a> {
    /// The walker asking; its proxy was last placed by the failed search.
    pub walker: &'a Walker,
    /// Body driven by the walker.
    pub body: &'a Body,
    /// Scene holding every other body.
    pub scene: &'a Scene,
    /// Scene position the search started from.
    pub start: Vector,
    /// Waypoint that could not be reached.
    pub goal: Vector,
    /// Obstacles the search ran against.
    pub obstacles: &'a [Obstacle],
}

type CompleteHook = Box<dyn FnMut(BodyId)>;
type PathNotFoundHook = Box<dyn FnMut(&PathNotFoundContext<'_>) -> Option<NotFoundBehavior>>;
type RecalculateHook = Box<dyn FnMut(&RecalculateContext<'_>) -> bool>;

/// Steers one body along a route of waypoints.
pub struct Walker {
    body: BodyId,
    speed: f32,
    waypoints: Vec<Vector>,
    cyclic: bool,
    waypoint_index: usize,
    status: WalkerStatus,
    path: Vec<Vector>,
    path_index: usize,
    tick_count: u64,
    adjusted_waypoint: Option<Vector>,
    recalculate_requested: bool,
    options: PathfindingOptions,
    proxy: PathfindingProxy,
    debug: bool,
    on_complete: Option<CompleteHook>,
    on_path_not_found: Option<PathNotFoundHook>,
    should_recalculate_path: Option<RecalculateHook>,
}

impl Walker {
    /// Creates an idle walker moving `body` at `speed` units per tick.
    #[must_use]
    pub fn new(body: BodyId, speed: f32) -> Self {
        Self {
            body,
            speed,
            waypoints: Vec::new(),
            cyclic: false,
            waypoint_index: 0,
            status: WalkerStatus::Idle,
            path: Vec::new(),
            path_index: 0,
            tick_count: 0,
            adjusted_waypoint: None,
            recalculate_requested: true,
            options: PathfindingOptions::default(),
            proxy: PathfindingProxy::from_hitboxes(std::iter::empty()),
            debug: false,
            on_complete: None,
            on_path_not_found: None,
            should_recalculate_path: None,
        }
    }

    /// Sets the initial route.
    #[must_use]
    pub fn with_waypoints(mut self, waypoints: Vec<Vector>, cyclic: bool) -> Self {
        self.waypoints = waypoints;
        self.cyclic = cyclic;
        self
    }

    /// Sets the pathfinding configuration.
    #[must_use]
    pub fn with_pathfinding_options(mut self, options: PathfindingOptions) -> Self {
        self.options = options.normalized();
        self
    }

    /// Enables or disables the debug overlay.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Registers a callback fired when a non-cyclic route completes.
    #[must_use]
    pub fn on_complete(mut self, hook: impl FnMut(BodyId) + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Registers a hook that may override the configured not-found policy.
    #[must_use]
    pub fn on_path_not_found(
        mut self,
        hook: impl FnMut(&PathNotFoundContext<'_>) -> Option<NotFoundBehavior> + 'static,
    ) -> Self {
        self.on_path_not_found = Some(Box::new(hook));
        self
    }

    /// Registers a predicate consulted every tick for extra recalculations.
    #[must_use]
    pub fn should_recalculate_path(
        mut self,
        hook: impl FnMut(&RecalculateContext<'_>) -> bool + 'static,
    ) -> Self {
        self.should_recalculate_path = Some(Box::new(hook));
        self
    }

    /// Body driven by the walker.
    #[must_use]
    pub const fn body(&self) -> BodyId {
        self.body
    }

    /// Distance covered per tick.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Changes the distance covered per tick.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> WalkerStatus {
        self.status
    }

    /// Reports whether the walker is following its route.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == WalkerStatus::Active
    }

    /// Index of the waypoint currently targeted.
    #[must_use]
    pub const fn targeted_waypoint(&self) -> usize {
        self.waypoint_index
    }

    /// The route.
    #[must_use]
    pub fn waypoints(&self) -> &[Vector] {
        &self.waypoints
    }

    /// Whether the route restarts after the last waypoint.
    #[must_use]
    pub const fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Replacement goal chosen by snap recovery, if any.
    #[must_use]
    pub const fn adjusted_waypoint(&self) -> Option<Vector> {
        self.adjusted_waypoint
    }

    /// Copy of the path nodes not yet reached.
    #[must_use]
    pub fn current_path(&self) -> Vec<Vector> {
        self.path
            .get(self.path_index..)
            .map(<[Vector]>::to_vec)
            .unwrap_or_default()
    }

    /// Number of active ticks processed since the last reset.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Active pathfinding configuration.
    #[must_use]
    pub const fn pathfinding_options(&self) -> &PathfindingOptions {
        &self.options
    }

    /// Proxy used for free-space tests.
    #[must_use]
    pub const fn proxy(&self) -> &PathfindingProxy {
        &self.proxy
    }

    /// Whether the debug overlay is drawn.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// Replaces the route, stops the body and waits for [`Walker::start`].
    pub fn set_waypoints(&mut self, waypoints: Vec<Vector>, cyclic: bool, out: &mut Vec<Command>) {
        self.waypoints = waypoints;
        self.cyclic = cyclic;
        self.waypoint_index = 0;
        self.adjusted_waypoint = None;
        self.clear_path();
        self.status = WalkerStatus::Idle;
        self.recalculate_requested = true;
        out.push(Command::SetSpeed {
            body: self.body,
            speed: Vector::ZERO,
        });
    }

    /// Starts following the route.
    pub fn start(&mut self) {
        self.status = WalkerStatus::Active;
        self.recalculate_requested = true;
    }

    /// Pauses an active walker, stopping the body, or starts an inactive one.
    pub fn toggle(&mut self, out: &mut Vec<Command>) {
        if self.is_active() {
            self.status = WalkerStatus::Idle;
            out.push(Command::SetSpeed {
                body: self.body,
                speed: Vector::ZERO,
            });
        } else {
            self.start();
        }
    }

    /// Restarts the route from the first waypoint without moving the body.
    pub fn reset(&mut self) {
        self.waypoint_index = 0;
        self.adjusted_waypoint = None;
        self.clear_path();
        self.tick_count = 0;
        self.recalculate_requested = true;
        if matches!(self.status, WalkerStatus::Completed | WalkerStatus::Stuck) {
            self.status = WalkerStatus::Idle;
        }
    }

    /// Resets the route and places the body on the first waypoint.
    pub fn hard_reset(&mut self, out: &mut Vec<Command>) {
        let Some(&first) = self.waypoints.first() else {
            warn!(
                "hard reset requested for body {} without waypoints",
                self.body.get()
            );
            return;
        };
        self.reset();
        out.push(Command::SetPosition {
            body: self.body,
            position: first,
        });
        out.push(Command::SetSpeed {
            body: self.body,
            speed: Vector::ZERO,
        });
    }

    /// Replaces the pathfinding configuration and forces a recalculation.
    pub fn set_pathfinding_options(&mut self, options: PathfindingOptions) {
        self.options = options.normalized();
        self.recalculate_requested = true;
    }

    /// Advances the walker by one tick, pushing the commands that move its body.
    ///
    /// Does nothing unless the walker is active and its body is in `scene`.
    /// Fails only when no path exists and the not-found policy is
    /// [`NotFoundBehavior::Throw`].
    pub fn tick(&mut self, scene: &Scene, out: &mut Vec<Command>) -> Result<(), WalkerError> {
        if !self.is_active() {
            return Ok(());
        }
        let Some(body) = query::body(scene, self.body) else {
            trace!("walker body {} is not in the scene", self.body.get());
            return Ok(());
        };
        if self.waypoint_index >= self.waypoints.len() {
            self.waypoint_index = self.waypoints.len().saturating_sub(1);
        }
        let Some(waypoint) = self.waypoints.get(self.waypoint_index).copied() else {
            return Ok(());
        };
        let position = query::scene_position(scene, self.body).unwrap_or_else(|| body.position());
        self.tick_count = self.tick_count.wrapping_add(1);

        if self.options.avoid_obstacles && self.recalculation_due(scene, body, position, waypoint) {
            self.recalculate(scene, body, position, waypoint, out)?;
            if !self.is_active() {
                return Ok(());
            }
        }

        self.drop_reached_nodes(position);
        self.compact_path();
        self.advance(position, waypoint, out);
        Ok(())
    }

    /// Runs the obstacle-aware search from `start` to `goal` for this walker's body.
    ///
    /// Skipped when avoidance is disabled, the body is not in `scene`, the body
    /// has no solid shapes or the scene holds no other solid shapes.
    pub fn compute_path_to_target(
        &mut self,
        scene: &Scene,
        start: Vector,
        goal: Vector,
    ) -> SearchOutcome {
        if !self.options.avoid_obstacles {
            return SearchOutcome::Skipped;
        }
        let Some(body) = query::body(scene, self.body) else {
            return SearchOutcome::Skipped;
        };
        self.refresh_proxy(body);
        let obstacles = query::obstacle_shapes(scene, self.body);
        let outcome = search::find_path(&mut self.proxy, &obstacles, start, goal, &self.options);
        if outcome == SearchOutcome::Skipped {
            trace!("search for {} skipped", body.name());
        }
        outcome
    }

    /// Draws the route, remaining path and snapped goal when debugging is enabled.
    pub fn draw_debug(&self, scene: &Scene, drawer: &mut dyn ShapeDrawer) {
        if !self.debug {
            return;
        }
        let offset = query::offset(scene);

        for waypoint in &self.waypoints {
            drawer.draw_circle(waypoint.to_subtracted(offset), 3.0, DebugColor::WAYPOINT);
        }

        if let (Some(body), Some(position)) = (
            query::body(scene, self.body),
            query::scene_position(scene, self.body),
        ) {
            let mut from = position;
            for node in self.path.get(self.path_index..).unwrap_or_default() {
                drawer.draw_line(
                    from.to_subtracted(offset),
                    node.to_subtracted(offset),
                    DebugColor::PATH,
                );
                from = *node;
            }

            let shapes = query::placed_shapes(scene, self.body);
            let pivot = shapes
                .iter()
                .map(|shape| shape.bounds())
                .reduce(|acc, bounds| acc.union(&bounds))
                .map_or(position, |bounds| bounds.center());
            draw_rotated(drawer, pivot.to_subtracted(offset), body.rotation(), |drawer| {
                for shape in &shapes {
                    draw_shape(drawer, shape, offset);
                }
            });
        }

        if let Some(adjusted) = self.adjusted_waypoint {
            drawer.draw_circle(adjusted.to_subtracted(offset), 4.0, DebugColor::ADJUSTED);
        }
    }

    fn recalculation_due(
        &mut self,
        scene: &Scene,
        body: &Body,
        position: Vector,
        waypoint: Vector,
    ) -> bool {
        if self.recalculate_requested
            || self.tick_count % u64::from(self.options.recalculate_every_ticks) == 0
        {
            return true;
        }
        let Some(mut hook) = self.should_recalculate_path.take() else {
            return false;
        };
        let due = hook(&RecalculateContext {
            walker: &*self,
            body,
            scene,
            start: position,
            goal: waypoint,
        });
        self.should_recalculate_path = Some(hook);
        due
    }

    fn recalculate(
        &mut self,
        scene: &Scene,
        body: &Body,
        position: Vector,
        waypoint: Vector,
        out: &mut Vec<Command>,
    ) -> Result<(), WalkerError> {
        self.recalculate_requested = false;
        self.adjusted_waypoint = None;
        self.clear_path();

        match self.compute_path_to_target(scene, position, waypoint) {
            SearchOutcome::Found(path) => {
                trace!("{} follows {} path nodes", body.name(), path.len());
                self.path = path;
                Ok(())
            }
            SearchOutcome::Skipped => Ok(()),
            SearchOutcome::NoPath { obstacles } => {
                self.resolve_path_not_found(scene, body, position, waypoint, &obstacles, out)
            }
        }
    }

    fn resolve_path_not_found(
        &mut self,
        scene: &Scene,
        body: &Body,
        start: Vector,
        goal: Vector,
        obstacles: &[Obstacle],
        out: &mut Vec<Command>,
    ) -> Result<(), WalkerError> {
        let behavior = match self.on_path_not_found.take() {
            Some(mut hook) => {
                let chosen = hook(&PathNotFoundContext {
                    walker: &*self,
                    body,
                    scene,
                    start,
                    goal,
                    obstacles,
                });
                self.on_path_not_found = Some(hook);
                chosen
            }
            None => None,
        }
        .unwrap_or(self.options.not_found_behavior);

        debug!("no path for {} towards {goal}, applying {behavior:?}", body.name());
        match behavior {
            NotFoundBehavior::Throw => Err(WalkerError::Unreachable {
                body: body.name().to_owned(),
                destination: goal,
            }),
            NotFoundBehavior::Stop => {
                self.stop(out);
                Ok(())
            }
            NotFoundBehavior::Continue => {
                self.clear_path();
                Ok(())
            }
            NotFoundBehavior::Snap => {
                if !self.snap_to_edge(start, goal, obstacles) {
                    self.stop(out);
                }
                Ok(())
            }
        }
    }

    fn snap_to_edge(&mut self, start: Vector, goal: Vector, obstacles: &[Obstacle]) -> bool {
        let Some(edge) =
            snap::nearest_edge(obstacles, goal, self.options.snap_target_to_edge_distance)
        else {
            debug!("no obstacle edge within reach of {goal}");
            return false;
        };

        let target = edge.nudged(self.proxy.reach_against(edge.normal) + SNAP_MARGIN);
        if !self.proxy.is_free_at(target, obstacles) {
            debug!("snapped goal {target} is blocked");
            return false;
        }

        match search::find_path(&mut self.proxy, obstacles, start, target, &self.options) {
            SearchOutcome::Found(path) => {
                debug!("snapped goal {goal} to {target}");
                self.path = path;
                self.path_index = 0;
                self.adjusted_waypoint = Some(target);
                true
            }
            _ => false,
        }
    }

    fn stop(&mut self, out: &mut Vec<Command>) {
        self.clear_path();
        self.status = WalkerStatus::Stuck;
        out.push(Command::SetSpeed {
            body: self.body,
            speed: Vector::ZERO,
        });
    }

    fn refresh_proxy(&mut self, body: &Body) {
        if proxy::signature_of(body.hitboxes()) != self.proxy.signature() {
            self.proxy = PathfindingProxy::from_hitboxes(body.hitboxes());
        }
        self.proxy.set_rotation(body.rotation());
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
    }

    fn drop_reached_nodes(&mut self, position: Vector) {
        while let Some(node) = self.path.get(self.path_index) {
            if node.distance_squared(position) > REACHED_DISTANCE_SQUARED {
                break;
            }
            self.path_index += 1;
        }
    }

    fn compact_path(&mut self) {
        if self.path_index > COMPACT_THRESHOLD && self.path_index > self.path.len() / 2 {
            let _ = self.path.drain(..self.path_index);
            self.path_index = 0;
        }
    }

    fn advance(&mut self, position: Vector, waypoint: Vector, out: &mut Vec<Command>) {
        let target = self
            .path
            .get(self.path_index)
            .copied()
            .or(self.adjusted_waypoint)
            .unwrap_or(waypoint);
        let movement = target.to_subtracted(position);
        let intended = movement.to_normalized().to_scaled(self.speed);

        if intended.length_squared() < movement.length_squared() {
            out.push(Command::SetSpeed {
                body: self.body,
                speed: intended,
            });
            return;
        }

        if self.path_index < self.path.len() {
            self.path_index += 1;
            out.push(Command::SetSpeed {
                body: self.body,
                speed: movement,
            });
            return;
        }

        self.advance_waypoint(target, movement, out);
    }

    fn advance_waypoint(&mut self, target: Vector, movement: Vector, out: &mut Vec<Command>) {
        let last = self.waypoints.len().saturating_sub(1);
        if !self.cyclic && self.waypoint_index >= last {
            out.push(Command::SetPosition {
                body: self.body,
                position: target,
            });
            out.push(Command::SetSpeed {
                body: self.body,
                speed: Vector::ZERO,
            });
            self.clear_path();
            self.status = WalkerStatus::Completed;
            debug!("body {} completed its route", self.body.get());
            if let Some(hook) = self.on_complete.as_mut() {
                hook(self.body);
            }
            return;
        }

        out.push(Command::SetSpeed {
            body: self.body,
            speed: movement,
        });
        self.waypoint_index = (self.waypoint_index + 1) % self.waypoints.len().max(1);
        self.adjusted_waypoint = None;
        self.clear_path();
        self.recalculate_requested = true;
    }
}

impl fmt::Debug for Walker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("body", &self.body)
            .field("speed", &self.speed)
            .field("status", &self.status)
            .field("waypoints", &self.waypoints)
            .field("cyclic", &self.cyclic)
            .field("waypoint_index", &self.waypoint_index)
            .field("path", &self.current_path())
            .field("adjusted_waypoint", &self.adjusted_waypoint)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_drops_consumed_prefix() {
        let mut walker = Walker::new(BodyId::new(0), 1.0);
        walker.path = (0..40).map(|i| Vector::new(i as f32, 0.0)).collect();
        walker.path_index = 20;
        walker.compact_path();
        assert_eq!(walker.path.len(), 40);

        walker.path_index = 33;
        walker.compact_path();
        assert_eq!(walker.path_index, 0);
        assert_eq!(walker.path.len(), 7);
        assert_eq!(walker.current_path()[0], Vector::new(33.0, 0.0));
    }

    #[test]
    fn reached_nodes_are_dropped_before_steering() {
        let mut walker = Walker::new(BodyId::new(0), 1.0);
        walker.path = vec![
            Vector::new(0.5, 0.0),
            Vector::new(0.2, 0.6),
            Vector::new(10.0, 0.0),
        ];
        walker.drop_reached_nodes(Vector::ZERO);
        assert_eq!(walker.current_path(), vec![Vector::new(10.0, 0.0)]);
    }

    #[test]
    fn unreachable_error_names_body_and_destination() {
        let error = WalkerError::Unreachable {
            body: "waiter".to_owned(),
            destination: Vector::new(12.0, -3.5),
        };
        assert_eq!(error.to_string(), "waiter cannot reach (12.00, -3.50)");
    }

    #[test]
    fn options_are_normalised_on_assignment() {
        let mut walker = Walker::new(BodyId::new(0), 1.0);
        walker.set_pathfinding_options(PathfindingOptions {
            grid_cell_size: 0.0,
            ..PathfindingOptions::default()
        });
        assert_eq!(walker.pathfinding_options().grid_cell_size, 1.0);
    }
}
