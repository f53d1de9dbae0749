use std::collections::{HashMap, VecDeque};

use crate::models::TilePosition;

pub mod grid;
pub mod movement;
pub mod reach_cache;

pub use grid::{GridGraph, GridSpec};

/// Walkable-tile adjacency oracle. Collision data is owned by the implementor.
pub trait TileGraph: Send + Sync {
    fn is_walkable(&self, tile: TilePosition) -> bool;

    /// Tiles one legal step away from `tile`, in a stable order.
    fn neighbors(&self, tile: TilePosition) -> Vec<TilePosition>;

    /// Tiles reachable from `from` in at most `radius` steps, with their step distance.
    /// `from` itself is always present at distance 0.
    fn reachable_tiles(&self, from: TilePosition, radius: i32) -> HashMap<TilePosition, i32> {
        bfs_reachable(|t| self.neighbors(t), from, radius)
    }

    /// Risk tier of the tile (wilderness level). Transports with a lower cap are not used from here.
    fn hazard_level(&self, _tile: TilePosition) -> i32 {
        0
    }

    /// Enclosed zones where teleports are unsafe; the path service runs a transport-free search too.
    fn is_restricted_zone(&self, _tile: TilePosition) -> bool {
        false
    }
}

pub fn bfs_reachable<F>(neighbors: F, from: TilePosition, radius: i32) -> HashMap<TilePosition, i32>
where
    F: Fn(TilePosition) -> Vec<TilePosition>,
{
    let mut seen: HashMap<TilePosition, i32> = HashMap::new();
    seen.insert(from, 0);
    if radius <= 0 {
        return seen;
    }
    let mut queue = VecDeque::new();
    queue.push_back(from);
    while let Some(cur) = queue.pop_front() {
        let d = seen.get(&cur).copied().unwrap_or(0);
        if d >= radius {
            continue;
        }
        for n in neighbors(cur) {
            if seen.contains_key(&n) {
                continue;
            }
            seen.insert(n, d + 1);
            queue.push_back(n);
        }
    }
    seen
}
