//! Where the agent stands relative to its path.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::movement::{EAST, NORTH, SOUTH, WEST};
use crate::graph::TileGraph;
use crate::models::{Path, TilePosition};

/// 2-D distance under which a path point counts as "where the agent is" for the near-end check.
const NEAR_END_DISTANCE: i32 = 3;

/// Index of the path point the agent can walk to soonest: minimum step distance among points reachable
/// within `radius`, falling back to minimum straight-line distance. Ties go to the earlier index.
pub fn closest_index(graph: &dyn TileGraph, path: &Path, agent: TilePosition, radius: i32) -> Option<usize> {
    let reach = graph.reachable_tiles(agent, radius);
    path.iter()
        .enumerate()
        .filter_map(|(i, p)| reach.get(p).map(|d| (*d, i)))
        .min()
        .map(|(_, i)| i)
        .or_else(|| path.iter().enumerate().min_by_key(|(i, p)| (p.distance_to(agent), *i)).map(|(i, _)| i))
}

/// True when the first path point near the agent lies inside the last `window` points.
pub fn is_near_end(path: &Path, agent: TilePosition, window: usize) -> bool {
    match path.iter().position(|p| p.distance_to_2d(agent) < NEAR_END_DISTANCE) {
        Some(i) => i + window >= path.len(),
        None => false,
    }
}

/// Off-path test. `unchanged` means the agent has not moved since the previous check, which is
/// treated as on-path so a slow step does not trigger a recalculation.
pub fn is_near_path(
    graph: &dyn TileGraph,
    path: &Path,
    agent: TilePosition,
    recalculate_distance: i32,
    unchanged: bool,
) -> bool {
    if path.is_empty() || recalculate_distance < 0 || unchanged {
        return true;
    }
    let reach = graph.reachable_tiles(agent, (recalculate_distance - 1).max(0));
    path.iter().any(|p| reach.contains_key(p))
}

fn has_wall_edge(graph: &dyn TileGraph, tile: TilePosition) -> bool {
    let neighbors = graph.neighbors(tile);
    [WEST, NORTH, EAST, SOUTH].iter().any(|m| {
        let n = m.apply(tile);
        graph.is_walkable(n) && !neighbors.contains(&n)
    })
}

/// `tile`, or the first adjacent reachable tile without a wall edge when `tile` has one, so a move
/// order does not land against a wall.
pub fn point_with_wall_clearance(graph: &dyn TileGraph, tile: TilePosition) -> TilePosition {
    if !has_wall_edge(graph, tile) {
        return tile;
    }
    let mut candidates: Vec<TilePosition> = graph
        .reachable_tiles(tile, 1)
        .into_keys()
        .filter(|c| *c != tile && !has_wall_edge(graph, *c))
        .collect();
    candidates.sort();
    candidates.first().copied().unwrap_or(tile)
}

/// Uniformly chosen tile reachable within `radius` of `center`.
pub fn random_reachable<R: Rng + ?Sized>(
    graph: &dyn TileGraph,
    center: TilePosition,
    radius: i32,
    rng: &mut R,
) -> Option<TilePosition> {
    let mut tiles: Vec<TilePosition> = graph.reachable_tiles(center, radius.max(0)).into_keys().collect();
    tiles.sort();
    tiles.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::grid::{GridSpec, WallSpec};
    use crate::graph::GridGraph;

    fn t(x: i32, y: i32) -> TilePosition {
        TilePosition::new(x, y, 0)
    }

    fn line(n: i32) -> Path {
        Path::new((0..n).map(|x| t(x, 0)).collect())
    }

    #[test]
    fn closest_prefers_reachable_points() {
        let g = GridGraph::open(0, 0, 30, 30).unwrap();
        assert_eq!(closest_index(&g, &line(20), t(5, 0), 20), Some(5));
        // (4,0), (5,0) and (6,0) are all one step away; the earliest wins
        assert_eq!(closest_index(&g, &line(20), t(5, 1), 20), Some(4));
        // nothing reachable within 0 except the agent itself, so raw distance decides
        assert_eq!(closest_index(&g, &line(20), t(7, 3), 0), Some(4));
        assert_eq!(closest_index(&g, &Path::empty(), t(0, 0), 20), None);
    }

    #[test]
    fn near_end_window() {
        let path = line(20);
        assert!(is_near_end(&path, t(12, 0), 10));
        assert!(!is_near_end(&path, t(5, 0), 10));
        assert!(!is_near_end(&path, t(5, 9), 10));
    }

    #[test]
    fn near_path_rules() {
        let g = GridGraph::open(0, 0, 30, 30).unwrap();
        let path = line(10);
        assert!(is_near_path(&g, &path, t(0, 20), 10, true), "unchanged position is on path");
        assert!(is_near_path(&g, &path, t(0, 20), -1, false), "disabled");
        assert!(is_near_path(&g, &path, t(3, 5), 10, false));
        assert!(!is_near_path(&g, &path, t(3, 15), 10, false));
    }

    #[test]
    fn wall_clearance_moves_off_walled_tile() {
        let spec = GridSpec { walls: vec![WallSpec { tile: t(2, 2), mask: 2 }], ..GridSpec::rect(0, 0, 5, 5) };
        let g = GridGraph::new(spec).unwrap();
        let moved = point_with_wall_clearance(&g, t(2, 2));
        assert_ne!(moved, t(2, 2));
        assert_eq!(moved.distance_to(t(2, 2)), 1);
        assert_eq!(point_with_wall_clearance(&g, t(0, 0)), t(0, 0));
    }
}
