use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

use crate::models::{Path, TilePosition};
use crate::transport::TransportCatalog;

pub mod astar;
pub mod service;

pub use astar::AStarPathfinder;
pub use service::{PathHandle, PathfindingService};

/// Shortest-path contract used by the path worker.
///
/// Implementations return a path from `start` to any tile of `goals` (or the closest they got when
/// they support partial results), and an empty path when nothing was found or `cancel` was raised.
pub trait Pathfinder: Send + Sync {
    fn find_path(
        &self,
        start: TilePosition,
        goals: &HashSet<TilePosition>,
        catalog: &TransportCatalog,
        cancel: &AtomicBool,
    ) -> Path;
}
