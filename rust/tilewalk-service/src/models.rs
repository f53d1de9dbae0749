use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tilewalk_core::models::ItemId;
use tilewalk_core::{AgentProfile, Path, RouteComparison, TilePosition, Transport};

#[derive(Debug, Clone, Deserialize)]
pub struct FindPathRequest {
    pub start: TilePosition,
    /// Single goal; merged with `goals`.
    #[serde(default)]
    pub goal: Option<TilePosition>,
    #[serde(default)]
    pub goals: Vec<TilePosition>,
    /// When present the catalog is narrowed to what this profile can use.
    #[serde(default)]
    pub profile: Option<AgentProfile>,
}

impl FindPathRequest {
    pub fn all_goals(&self) -> Vec<TilePosition> {
        let mut out: Vec<TilePosition> = self.goal.into_iter().chain(self.goals.iter().copied()).collect();
        out.sort();
        out.dedup();
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindPathQuery {
    #[serde(default, alias = "transports_only")]
    pub only_transports: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindPathResponse {
    pub found: bool,
    pub length: usize,
    pub path: Path,
    pub transports: Vec<Transport>,
    pub missing_items: BTreeSet<ItemId>,
}

fn default_size() -> i32 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanReachRequest {
    pub start: TilePosition,
    pub target: TilePosition,
    #[serde(default = "default_size")]
    pub size_x: i32,
    #[serde(default = "default_size")]
    pub size_y: i32,
    #[serde(default)]
    pub profile: Option<AgentProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanReachResponse {
    pub reachable: bool,
    /// `None` when the path does not end at the target.
    pub total_tiles: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRoutesRequest {
    pub start: TilePosition,
    pub target: TilePosition,
    #[serde(default)]
    pub carried: AgentProfile,
    #[serde(default)]
    pub banked: AgentProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareRoutesResponse {
    pub direct_distance: i32,
    pub banking_distance: i32,
    pub tile_savings: i32,
    pub is_direct_faster: bool,
    #[serde(flatten)]
    pub report: RouteComparison,
}

impl From<RouteComparison> for CompareRoutesResponse {
    fn from(report: RouteComparison) -> Self {
        Self {
            direct_distance: report.direct_distance(),
            banking_distance: report.banking_distance(),
            tile_savings: report.tile_savings(),
            is_direct_faster: report.is_direct_faster(),
            report,
        }
    }
}
