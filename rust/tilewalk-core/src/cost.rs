use std::collections::HashSet;

use crate::models::TilePosition;
use crate::options::SearchOptions;
use crate::transport::Transport;

#[derive(Clone, Debug, Default)]
pub struct CostModel {
    pub options: SearchOptions,
}

impl CostModel {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn movement_cost(&self, _from: TilePosition, _to: TilePosition) -> i64 {
        self.options.walk_cost.max(1)
    }

    /// Catalog edges cost their duration in ticks, one walk step per tick.
    pub fn transport_cost(&self, t: &Transport) -> i64 {
        i64::from(t.duration.max(1)) * self.options.walk_cost.max(1)
    }

    /// Admissible estimate. Any transport edge in play can beat straight-line walking,
    /// so the heuristic collapses to zero then.
    pub fn heuristic(&self, current: TilePosition, goals: &HashSet<TilePosition>, transports_in_play: bool) -> i64 {
        if transports_in_play {
            return 0;
        }
        goals
            .iter()
            .filter(|g| g.plane == current.plane)
            .map(|g| i64::from(current.distance_to(*g)) * self.options.walk_cost.max(1))
            .min()
            .unwrap_or(0)
    }
}
