use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use arc_swap::ArcSwap;
use tilewalk_core::cost::CostModel;
use tilewalk_core::{
    AStarPathfinder, GridGraph, PathfindingService, SearchOptions, TileGraph, TilePosition, TransportCatalog,
};
use tracing::info;

/// Where a snapshot is loaded from; kept so `/admin/reload` can re-read the same files.
#[derive(Clone, Debug, Default)]
pub struct Sources {
    pub world_path: Option<PathBuf>,
    pub transports_path: Option<PathBuf>,
    pub search: SearchOptions,
}

/// One loaded world plus its catalog. Swapped as a whole on reload.
pub struct WorldSnapshot {
    pub paths: Option<Arc<PathfindingService>>,
    pub catalog: Arc<TransportCatalog>,
    pub banks: Arc<Vec<TilePosition>>,
    pub loaded_at_unix: u64,
}

impl WorldSnapshot {
    /// Placeholder used until a world is configured; `/readyz` reports not ready.
    pub fn empty() -> Self {
        Self {
            paths: None,
            catalog: Arc::new(TransportCatalog::empty()),
            banks: Arc::new(Vec::new()),
            loaded_at_unix: now_unix(),
        }
    }

    pub fn load(sources: &Sources) -> anyhow::Result<Self> {
        let Some(world_path) = sources.world_path.as_ref() else {
            return Ok(Self::empty());
        };
        let graph = GridGraph::from_json_file(world_path)
            .with_context(|| format!("loading world {}", world_path.display()))?;
        let catalog = match sources.transports_path.as_ref() {
            Some(p) => TransportCatalog::load(p).with_context(|| format!("loading transports {}", p.display()))?,
            None => TransportCatalog::empty(),
        };
        let snapshot = Self::from_parts(graph, catalog, sources.search.clone())?;
        info!(
            world = %world_path.display(),
            transports = snapshot.catalog.len(),
            banks = snapshot.banks.len(),
            "world loaded"
        );
        Ok(snapshot)
    }

    pub fn from_parts(graph: GridGraph, catalog: TransportCatalog, search: SearchOptions) -> anyhow::Result<Self> {
        let banks = graph.banks().to_vec();
        let graph: Arc<dyn TileGraph> = Arc::new(graph);
        let pathfinder = Arc::new(AStarPathfinder::new(Arc::clone(&graph), CostModel::new(search)));
        let paths = PathfindingService::new(pathfinder, graph, catalog.clone())?;
        Ok(Self {
            paths: Some(Arc::new(paths)),
            catalog: Arc::new(catalog),
            banks: Arc::new(banks),
            loaded_at_unix: now_unix(),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sources: Arc<Sources>,
    pub current: Arc<ArcSwap<WorldSnapshot>>,
}

impl AppState {
    pub fn new(sources: Sources, snapshot: WorldSnapshot) -> Self {
        Self { sources: Arc::new(sources), current: Arc::new(ArcSwap::from_pointee(snapshot)) }
    }

    /// Re-reads the configured files and swaps the snapshot in. In-flight requests keep the old one.
    pub fn reload(&self) -> anyhow::Result<Arc<WorldSnapshot>> {
        let fresh = Arc::new(WorldSnapshot::load(&self.sources)?);
        self.current.store(Arc::clone(&fresh));
        Ok(fresh)
    }
}

pub fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
