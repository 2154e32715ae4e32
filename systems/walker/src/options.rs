//! Pathfinding configuration.

use serde::{Deserialize, Serialize};

/// Policy applied when the search cannot reach the current waypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundBehavior {
    /// Fail the tick with [`crate::WalkerError::Unreachable`].
    Throw,
    /// Clear the path, stop the body and mark the walker stuck.
    Stop,
    /// Clear the path and keep heading straight for the waypoint.
    Continue,
    /// Retarget the closest reachable point on a nearby obstacle edge.
    #[default]
    Snap,
}

/// Tunables for obstacle-aware movement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingOptions {
    /// Enables grid search; without it walkers move in straight lines.
    pub avoid_obstacles: bool,
    /// Side length of a search tile in world units.
    pub grid_cell_size: f32,
    /// Maximum number of tiles expanded by a single search.
    pub max_expanded_nodes: u32,
    /// Chebyshev radius around the start tile that the search may enter.
    pub max_search_radius_tiles: u32,
    /// Number of ticks between periodic path recalculations.
    pub recalculate_every_ticks: u32,
    /// Policy applied when no path exists.
    pub not_found_behavior: NotFoundBehavior,
    /// Maximum distance between an unreachable goal and its snapped replacement.
    pub snap_target_to_edge_distance: f32,
}

impl PathfindingOptions {
    /// Returns a copy whose values are clamped into their usable ranges.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            grid_cell_size: if self.grid_cell_size.is_finite() {
                self.grid_cell_size.max(1.0)
            } else {
                Self::default().grid_cell_size
            },
            max_expanded_nodes: self.max_expanded_nodes.max(1),
            recalculate_every_ticks: self.recalculate_every_ticks.max(1),
            snap_target_to_edge_distance: if self.snap_target_to_edge_distance.is_finite() {
                self.snap_target_to_edge_distance.max(0.0)
            } else {
                0.0
            },
            ..self
        }
    }
}

impl Default for PathfindingOptions {
    fn default() -> Self {
        Self {
            avoid_obstacles: false,
            grid_cell_size: 16.0,
            max_expanded_nodes: 4000,
            max_search_radius_tiles: 64,
            recalculate_every_ticks: 30,
            not_found_behavior: NotFoundBehavior::Snap,
            snap_target_to_edge_distance: 64.0,
        }
    }
}
