pub mod config;
pub mod cost;
pub mod db;
pub mod errors;
pub mod executors;
pub mod graph;
pub mod models;
pub mod obstacles;
pub mod options;
pub mod pathfinder;
pub mod route_analysis;
pub mod transport;
pub mod walker;
pub mod world;

pub use config::WalkerConfig;
pub use errors::{Result, WalkError};
pub use graph::{GridGraph, GridSpec, TileGraph};
pub use models::{Area, Path, TilePosition, WalkerState};
pub use options::SearchOptions;
pub use pathfinder::{AStarPathfinder, PathHandle, Pathfinder, PathfindingService};
pub use route_analysis::RouteComparison;
pub use transport::{AgentProfile, Transport, TransportCatalog, TransportKind};
pub use walker::{Phase, Walker};
pub use world::{Environment, SystemClock};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
