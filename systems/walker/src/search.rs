//! Grid-quantised A* search against live obstacle shapes.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use stride_core::Vector;
use stride_world::query::Obstacle;

use crate::{heap::MinHeap, options::PathfindingOptions, proxy::PathfindingProxy};

/// Cross products below this magnitude count as collinear when simplifying.
const COLLINEAR_EPSILON: f32 = 1e-3;

/// Cell of the implicit search grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl Tile {
    /// Creates a tile from its grid coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing `point` for square cells of side `cell_size`.
    #[must_use]
    pub fn containing(point: Vector, cell_size: f32) -> Self {
        Self::new(
            (point.x / cell_size).floor() as i32,
            (point.y / cell_size).floor() as i32,
        )
    }

    /// World-space centre of the tile.
    #[must_use]
    pub fn center(self, cell_size: f32) -> Vector {
        Vector::new(
            (self.x as f32 + 0.5) * cell_size,
            (self.y as f32 + 0.5) * cell_size,
        )
    }

    /// Box distance between two tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .max(self.y.abs_diff(other.y))
    }

    /// Taxicab distance between two tiles.
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }

    /// Neighbours in +x, -x, +y, -y order; they saturate at the grid edge.
    fn neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x.saturating_add(1), self.y),
            Self::new(self.x.saturating_sub(1), self.y),
            Self::new(self.x, self.y.saturating_add(1)),
            Self::new(self.x, self.y.saturating_sub(1)),
        ]
    }
}

/// Result of a path query.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// Path nodes leading from the start to the goal, which is the last node.
    Found(Vec<Vector>),
    /// The query does not apply; the mover should head straight for the goal.
    Skipped,
    /// The search was exhausted without reaching the goal.
    NoPath {
        /// Obstacles the search was run against.
        obstacles: Vec<Obstacle>,
    },
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    tile: Tile,
    cost: u32,
    estimate: f32,
}

/// Memoised walkability of the tiles around one query.
struct Walkability {
    start: Vector,
    goal: Vector,
    start_tile: Tile,
    goal_tile: Tile,
    cell_size: f32,
    radius: u32,
    known: HashMap<Tile, bool>,
}

impl Walkability {
    fn point(&self, tile: Tile) -> Vector {
        if tile == self.goal_tile {
            self.goal
        } else if tile == self.start_tile {
            self.start
        } else {
            tile.center(self.cell_size)
        }
    }

    fn is_walkable(
        &mut self,
        tile: Tile,
        proxy: &mut PathfindingProxy,
        obstacles: &[Obstacle],
    ) -> bool {
        if tile == self.start_tile || tile == self.goal_tile {
            return true;
        }
        if tile.chebyshev_distance(self.start_tile) > self.radius {
            return false;
        }
        if let Some(&walkable) = self.known.get(&tile) {
            return walkable;
        }
        let walkable = proxy.is_free_at(tile.center(self.cell_size), obstacles);
        let _ = self.known.insert(tile, walkable);
        walkable
    }
}

/// Searches a 4-connected grid for a route from `start` to `goal` that keeps
/// the proxy clear of every obstacle.
///
/// The goal tile is represented by the exact goal position, which must itself
/// be free; every other tile is probed at its centre. Edges are accepted only
/// when both the destination point and the midpoint of the step are free.
pub fn find_path(
    proxy: &mut PathfindingProxy,
    obstacles: &[Obstacle],
    start: Vector,
    goal: Vector,
    options: &PathfindingOptions,
) -> SearchOutcome {
    if !proxy.has_shapes() || obstacles.is_empty() {
        return SearchOutcome::Skipped;
    }

    let options = options.normalized();
    let cell_size = options.grid_cell_size;
    let start_tile = Tile::containing(start, cell_size);
    let goal_tile = Tile::containing(goal, cell_size);
    let no_path = || SearchOutcome::NoPath {
        obstacles: obstacles.to_vec(),
    };

    if !proxy.is_free_at(goal, obstacles) {
        debug!("goal {goal} overlaps an obstacle");
        return no_path();
    }
    if start_tile == goal_tile {
        return SearchOutcome::Found(vec![goal]);
    }

    let mut grid = Walkability {
        start,
        goal,
        start_tile,
        goal_tile,
        cell_size,
        radius: options.max_search_radius_tiles,
        known: HashMap::new(),
    };
    let mut open = MinHeap::new(|node: &OpenNode| node.estimate);
    let mut closed: HashSet<Tile> = HashSet::new();
    let mut came_from: HashMap<Tile, Tile> = HashMap::new();
    let mut costs: HashMap<Tile, u32> = HashMap::new();

    let _ = costs.insert(start_tile, 0);
    open.push(OpenNode {
        tile: start_tile,
        cost: 0,
        estimate: start_tile.manhattan_distance(goal_tile) as f32,
    });

    let mut expanded = 0u32;
    while let Some(current) = open.pop() {
        if current.tile == goal_tile {
            trace!("reached {goal} after expanding {expanded} tiles");
            return SearchOutcome::Found(reconstruct(&grid, &came_from));
        }
        if !closed.insert(current.tile) {
            continue;
        }

        expanded += 1;
        if expanded > options.max_expanded_nodes {
            debug!(
                "search towards {goal} hit the expansion cap of {}",
                options.max_expanded_nodes
            );
            return no_path();
        }

        let from = grid.point(current.tile);
        for neighbor in current.tile.neighbors() {
            if closed.contains(&neighbor) || !grid.is_walkable(neighbor, proxy, obstacles) {
                continue;
            }
            let to = grid.point(neighbor);
            if !proxy.is_free_at(to, obstacles) || !proxy.is_free_at(from.midpoint(to), obstacles)
            {
                continue;
            }

            let cost = current.cost + 1;
            if costs.get(&neighbor).map_or(true, |&known| cost < known) {
                let _ = costs.insert(neighbor, cost);
                let _ = came_from.insert(neighbor, current.tile);
                open.push(OpenNode {
                    tile: neighbor,
                    cost,
                    estimate: cost as f32 + neighbor.manhattan_distance(goal_tile) as f32,
                });
            }
        }
    }

    debug!("search towards {goal} exhausted after expanding {expanded} tiles");
    no_path()
}

fn reconstruct(grid: &Walkability, came_from: &HashMap<Tile, Tile>) -> Vec<Vector> {
    let mut tiles = vec![grid.goal_tile];
    let mut cursor = grid.goal_tile;
    while let Some(&previous) = came_from.get(&cursor) {
        tiles.push(previous);
        cursor = previous;
    }
    tiles.reverse();

    let points: Vec<Vector> = tiles.iter().map(|&tile| grid.point(tile)).collect();
    let mut path = simplify_path(&points);
    // the first node is the start position itself
    let _ = path.remove(0);
    path
}

/// Drops every intermediate point lying on a straight, same-direction segment
/// between its neighbours.
#[must_use]
pub fn simplify_path(points: &[Vector]) -> Vec<Vector> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut simplified = vec![first];
    for window in points.windows(2).skip(1) {
        let (current, next) = (window[0], window[1]);
        let previous = simplified.last().copied().unwrap_or(first);
        let incoming = Vector::new(current.x - previous.x, current.y - previous.y);
        let outgoing = Vector::new(next.x - current.x, next.y - current.y);
        if incoming.cross(outgoing).abs() <= COLLINEAR_EPSILON && incoming.dot(outgoing) >= 0.0 {
            continue;
        }
        simplified.push(current);
    }
    simplified.push(last);
    simplified
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::{BodyId, Hitbox};

    fn obstacle(x: f32, y: f32, w: f32, h: f32) -> Obstacle {
        Obstacle {
            body: BodyId::new(99),
            shape: Hitbox::square(Vector::ZERO, Vector::new(w, h)).placed(Vector::new(x, y)),
        }
    }

    fn mover() -> PathfindingProxy {
        PathfindingProxy::from_hitboxes(&[Hitbox::circle(Vector::ZERO, 4.0)])
    }

    fn options() -> PathfindingOptions {
        PathfindingOptions {
            avoid_obstacles: true,
            ..PathfindingOptions::default()
        }
    }

    #[test]
    fn tiles_quantise_negative_coordinates_downwards() {
        assert_eq!(Tile::containing(Vector::new(-0.5, 15.9), 16.0), Tile::new(-1, 0));
        assert_eq!(Tile::new(-1, 0).center(16.0), Vector::new(-8.0, 8.0));
        assert_eq!(Tile::new(0, 0).chebyshev_distance(Tile::new(-3, 2)), 3);
        assert_eq!(Tile::new(0, 0).manhattan_distance(Tile::new(-3, 2)), 5);
    }

    #[test]
    fn collinear_points_collapse_to_endpoints() {
        let points: Vec<Vector> = (0..6).map(|i| Vector::new(i as f32 * 16.0, 8.0)).collect();
        assert_eq!(
            simplify_path(&points),
            vec![Vector::new(0.0, 8.0), Vector::new(80.0, 8.0)]
        );
    }

    #[test]
    fn reversals_and_corners_survive_simplification() {
        let points = [
            Vector::new(0.0, 0.0),
            Vector::new(10.0, 0.0),
            Vector::new(10.0, 10.0),
            Vector::new(5.0, 10.0),
            Vector::new(15.0, 10.0),
        ];
        assert_eq!(simplify_path(&points), points.to_vec());
    }

    #[test]
    fn skipped_without_obstacles_or_shapes() {
        let none: [Hitbox; 0] = [];
        let mut shapeless = PathfindingProxy::from_hitboxes(&none);
        let obstacles = [obstacle(80.0, -50.0, 40.0, 100.0)];
        assert_eq!(
            find_path(&mut shapeless, &obstacles, Vector::ZERO, Vector::new(200.0, 0.0), &options()),
            SearchOutcome::Skipped
        );
        assert_eq!(
            find_path(&mut mover(), &[], Vector::ZERO, Vector::new(200.0, 0.0), &options()),
            SearchOutcome::Skipped
        );
    }

    #[test]
    fn detours_around_a_wall() {
        let obstacles = [obstacle(80.0, -50.0, 40.0, 100.0)];
        let SearchOutcome::Found(path) = find_path(
            &mut mover(),
            &obstacles,
            Vector::ZERO,
            Vector::new(200.0, 0.0),
            &options(),
        ) else {
            panic!("expected a path");
        };

        assert_eq!(path.last(), Some(&Vector::new(200.0, 0.0)));
        assert!(path.iter().any(|node| node.y.abs() > 50.0), "{path:?}");
        let mut probe = mover();
        for node in &path {
            assert!(probe.is_free_at(*node, &obstacles), "node {node} is blocked");
        }
    }

    #[test]
    fn repeated_searches_agree() {
        let obstacles = [
            obstacle(80.0, -50.0, 40.0, 100.0),
            obstacle(150.0, 20.0, 20.0, 60.0),
        ];
        let first = find_path(&mut mover(), &obstacles, Vector::ZERO, Vector::new(200.0, 0.0), &options());
        let second = find_path(&mut mover(), &obstacles, Vector::ZERO, Vector::new(200.0, 0.0), &options());
        assert!(matches!(first, SearchOutcome::Found(_)));
        assert_eq!(first, second);
    }

    #[test]
    fn blocked_goal_has_no_path() {
        let obstacles = [obstacle(80.0, -50.0, 40.0, 100.0)];
        let outcome = find_path(&mut mover(), &obstacles, Vector::ZERO, Vector::new(100.0, 0.0), &options());
        assert_eq!(
            outcome,
            SearchOutcome::NoPath {
                obstacles: obstacles.to_vec()
            }
        );
    }

    #[test]
    fn expansion_cap_yields_no_path() {
        let obstacles = [obstacle(500.0, 500.0, 10.0, 10.0)];
        let capped = PathfindingOptions {
            max_expanded_nodes: 5,
            ..options()
        };
        let outcome = find_path(&mut mover(), &obstacles, Vector::ZERO, Vector::new(200.0, 0.0), &capped);
        assert!(matches!(outcome, SearchOutcome::NoPath { .. }));

        let outcome = find_path(&mut mover(), &obstacles, Vector::ZERO, Vector::new(200.0, 0.0), &options());
        assert_eq!(
            outcome,
            SearchOutcome::Found(vec![
                Vector::new(24.0, 8.0),
                Vector::new(184.0, 8.0),
                Vector::new(200.0, 0.0),
            ])
        );
    }

    #[test]
    fn search_stays_inside_radius() {
        let obstacles = [obstacle(80.0, -50.0, 40.0, 100.0)];
        let narrow = PathfindingOptions {
            max_search_radius_tiles: 3,
            ..options()
        };
        let outcome = find_path(&mut mover(), &obstacles, Vector::ZERO, Vector::new(200.0, 0.0), &narrow);
        assert!(matches!(outcome, SearchOutcome::NoPath { .. }));
    }

    #[test]
    fn goal_tile_is_reachable_just_outside_radius() {
        let obstacles = [obstacle(500.0, 500.0, 10.0, 10.0)];
        let narrow = PathfindingOptions {
            max_search_radius_tiles: 3,
            ..options()
        };
        let start = Vector::new(8.0, 8.0);

        let outcome = find_path(&mut mover(), &obstacles, start, Vector::new(72.0, 8.0), &narrow);
        assert_eq!(outcome, SearchOutcome::Found(vec![Vector::new(72.0, 8.0)]));

        let outcome = find_path(&mut mover(), &obstacles, start, Vector::new(88.0, 8.0), &narrow);
        assert!(matches!(outcome, SearchOutcome::NoPath { .. }));
    }

    #[test]
    fn neighbors_saturate_at_grid_edge() {
        let corner = Tile::new(i32::MAX, i32::MIN);
        assert_eq!(
            corner.neighbors(),
            [
                Tile::new(i32::MAX, i32::MIN),
                Tile::new(i32::MAX - 1, i32::MIN),
                Tile::new(i32::MAX, i32::MIN + 1),
                Tile::new(i32::MAX, i32::MIN),
            ]
        );
        assert_eq!(corner.manhattan_distance(Tile::new(i32::MIN, i32::MAX)), u32::MAX);
    }

    #[test]
    fn search_at_saturated_tiles_does_not_overflow() {
        let obstacles = [obstacle(0.0, 0.0, 10.0, 10.0)];
        let start = Vector::new(3.5e10, 8.0);
        let goal = Vector::new(3.5e10, 40.0);
        assert_eq!(Tile::containing(start, 16.0).x, i32::MAX);

        let outcome = find_path(&mut mover(), &obstacles, start, goal, &options());
        assert!(
            matches!(outcome, SearchOutcome::Found(ref path) if path.last() == Some(&goal)),
            "{outcome:?}"
        );
    }
}
