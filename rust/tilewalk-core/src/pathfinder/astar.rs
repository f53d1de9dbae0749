use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::cost::CostModel;
use crate::graph::TileGraph;
use crate::models::{Path, TilePosition};
use crate::pathfinder::Pathfinder;
use crate::transport::{Transport, TransportCatalog};

#[derive(Clone, Copy, Debug)]
struct QueueNode {
    tile: TilePosition,
    f: i64,
    g: i64,
    h: i64,
    seq: u64,
}

impl PartialEq for QueueNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}
impl Eq for QueueNode {}
impl PartialOrd for QueueNode {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueNode {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap is a max-heap; reversed for min-f, then min-h, then FIFO
        (other.f, other.h, other.seq, other.tile).cmp(&(self.f, self.h, self.seq, self.tile))
    }
}

/// A* over adjacent-tile steps plus catalog edges.
pub struct AStarPathfinder {
    graph: Arc<dyn TileGraph>,
    cost_model: CostModel,
}

impl AStarPathfinder {
    pub fn new(graph: Arc<dyn TileGraph>, cost_model: CostModel) -> Self {
        Self { graph, cost_model }
    }

    fn usable_here(&self, t: &Transport, at: TilePosition) -> bool {
        t.max_hazard_level >= self.graph.hazard_level(at)
    }

    fn closest_distance(goals: &HashSet<TilePosition>, tile: TilePosition) -> i32 {
        goals.iter().map(|g| tile.distance_to(*g)).min().unwrap_or(i32::MAX)
    }
}

impl Pathfinder for AStarPathfinder {
    fn find_path(
        &self,
        start: TilePosition,
        goals: &HashSet<TilePosition>,
        catalog: &TransportCatalog,
        cancel: &AtomicBool,
    ) -> Path {
        if goals.is_empty() {
            return Path::empty();
        }
        if goals.contains(&start) {
            return Path::new(vec![start]);
        }
        let opts = &self.cost_model.options;
        let transports_in_play = opts.use_transports && !catalog.is_empty();
        let deadline = Instant::now() + Duration::from_millis(opts.timeout_ms);

        let mut open = BinaryHeap::new();
        let mut g_score: FxHashMap<TilePosition, i64> = FxHashMap::default();
        let mut came_from: FxHashMap<TilePosition, TilePosition> = FxHashMap::default();
        let mut expanded: u64 = 0;
        let mut seq: u64 = 0;
        let mut best = (Self::closest_distance(goals, start), 0i64, start);

        let h0 = self.cost_model.heuristic(start, goals, transports_in_play);
        open.push(QueueNode { tile: start, f: h0, g: 0, h: h0, seq });
        g_score.insert(start, 0);

        let mut reached: Option<TilePosition> = None;
        while let Some(qn) = open.pop() {
            if cancel.load(Ordering::Acquire) {
                debug!(expanded, "search cancelled");
                return Path::empty();
            }
            if g_score.get(&qn.tile).map(|bg| qn.g > *bg).unwrap_or(false) {
                continue;
            }
            expanded += 1;
            if expanded > opts.max_expansions || (expanded % 1024 == 0 && Instant::now() >= deadline) {
                debug!(expanded, "search budget exhausted");
                break;
            }
            if goals.contains(&qn.tile) {
                reached = Some(qn.tile);
                break;
            }
            let d = Self::closest_distance(goals, qn.tile);
            if (d, qn.g) < (best.0, best.1) {
                best = (d, qn.g, qn.tile);
            }

            let mut edges: Vec<(TilePosition, i64)> = self
                .graph
                .neighbors(qn.tile)
                .into_iter()
                .map(|n| (n, self.cost_model.movement_cost(qn.tile, n)))
                .collect();
            if opts.use_transports {
                let local = catalog.at(qn.tile).iter();
                // origin-less edges cost the same from any tile, so only the start offers them
                let global = if qn.tile == start { catalog.anywhere() } else { &[] };
                for t in local.chain(global.iter()) {
                    if self.usable_here(t, qn.tile) && t.destination != qn.tile {
                        edges.push((t.destination, self.cost_model.transport_cost(t)));
                    }
                }
            }

            for (to, step) in edges {
                let tentative = qn.g + step;
                if g_score.get(&to).map(|bg| tentative < *bg).unwrap_or(true) {
                    g_score.insert(to, tentative);
                    came_from.insert(to, qn.tile);
                    let h = self.cost_model.heuristic(to, goals, transports_in_play);
                    seq += 1;
                    open.push(QueueNode { tile: to, f: tentative + h, g: tentative, h, seq });
                }
            }
        }

        let end = match reached {
            Some(t) => t,
            None if opts.partial_results && best.2 != start => best.2,
            None => return Path::empty(),
        };
        let path = reconstruct(&came_from, start, end);
        debug!(expanded, len = path.len(), complete = reached.is_some(), "search finished");
        path
    }
}

fn reconstruct(came_from: &FxHashMap<TilePosition, TilePosition>, start: TilePosition, mut current: TilePosition) -> Path {
    let mut tiles = vec![current];
    while current != start {
        match came_from.get(&current) {
            Some(prev) => {
                current = *prev;
                tiles.push(current);
            }
            None => return Path::empty(),
        }
    }
    tiles.reverse();
    Path::new(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GridGraph;
    use crate::graph::grid::HazardZone;
    use crate::models::Area;
    use crate::options::SearchOptions;
    use crate::transport::TransportKind;

    fn t(x: i32, y: i32) -> TilePosition {
        TilePosition::new(x, y, 0)
    }

    fn finder(g: GridGraph) -> AStarPathfinder {
        AStarPathfinder::new(Arc::new(g), CostModel::default())
    }

    #[test]
    fn straight_line_on_open_grid() {
        let pf = finder(GridGraph::open(0, 0, 20, 5).unwrap());
        let p = pf.find_path(t(0, 2), &HashSet::from([t(10, 2)]), &TransportCatalog::empty(), &AtomicBool::new(false));
        assert_eq!(p.len(), 11);
        assert_eq!(p.first(), Some(t(0, 2)));
        assert_eq!(p.last(), Some(t(10, 2)));
    }

    #[test]
    fn deterministic_between_runs() {
        let pf = finder(GridGraph::open(0, 0, 10, 10).unwrap());
        let goals = HashSet::from([t(6, 3)]);
        let a = pf.find_path(t(0, 0), &goals, &TransportCatalog::empty(), &AtomicBool::new(false));
        let b = pf.find_path(t(0, 0), &goals, &TransportCatalog::empty(), &AtomicBool::new(false));
        assert_eq!(a, b);
    }

    #[test]
    fn uses_cheaper_transport_edge() {
        let pf = finder(GridGraph::open(0, 0, 100, 3).unwrap());
        let boat = Transport::new(Some(t(1, 1)), t(90, 1), TransportKind::Boat).with_duration(3);
        let cat = TransportCatalog::new([boat]).unwrap();
        let p = pf.find_path(t(0, 1), &HashSet::from([t(92, 1)]), &cat, &AtomicBool::new(false));
        assert_eq!(p.as_slice()[..3], [t(0, 1), t(1, 1), t(90, 1)]);
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn hazard_cap_excludes_teleport() {
        let mut spec = GridGraph::open(0, 0, 60, 3).unwrap().spec().clone();
        spec.hazard_zones.push(HazardZone { area: Area::new(0, 0, 5, 3, 0), level: 30 });
        let pf = finder(GridGraph::new(spec).unwrap());
        let tele = Transport::new(None, t(50, 1), TransportKind::TeleportSpell).with_max_hazard_level(20);
        let cat = TransportCatalog::new([tele]).unwrap();
        let p = pf.find_path(t(0, 1), &HashSet::from([t(50, 1)]), &cat, &AtomicBool::new(false));
        assert_eq!(p.len(), 51, "walked instead of teleporting from level 30");
    }

    #[test]
    fn partial_path_when_goal_walled_off() {
        let mut spec = GridGraph::open(0, 0, 10, 10).unwrap().spec().clone();
        spec.blocked.extend((0..10).map(|y| t(5, y)));
        let pf = finder(GridGraph::new(spec.clone()).unwrap());
        let p = pf.find_path(t(0, 0), &HashSet::from([t(8, 0)]), &TransportCatalog::empty(), &AtomicBool::new(false));
        assert_eq!(p.last().map(|l| l.x), Some(4));

        let strict = AStarPathfinder::new(
            Arc::new(GridGraph::new(spec).unwrap()),
            CostModel::new(SearchOptions { partial_results: false, ..Default::default() }),
        );
        let p = strict.find_path(t(0, 0), &HashSet::from([t(8, 0)]), &TransportCatalog::empty(), &AtomicBool::new(false));
        assert!(p.is_empty());
    }

    #[test]
    fn cancelled_search_is_empty() {
        let pf = finder(GridGraph::open(0, 0, 50, 50).unwrap());
        let p = pf.find_path(t(0, 0), &HashSet::from([t(40, 40)]), &TransportCatalog::empty(), &AtomicBool::new(true));
        assert!(p.is_empty());
    }
}
