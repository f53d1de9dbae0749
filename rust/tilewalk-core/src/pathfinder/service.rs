//! Single-worker asynchronous path computation.
//!
//! Requests are queued on a channel and served by one named thread. Each request gets a
//! generation-tagged [`PathHandle`]; issuing a new request cancels the previous handle, and a
//! cancelled handle never receives a result.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use arc_swap::ArcSwap;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::errors::{Result, WalkError};
use crate::graph::TileGraph;
use crate::models::{Path, TilePosition};
use crate::pathfinder::Pathfinder;
use crate::transport::TransportCatalog;

pub const WORKER_THREAD_NAME: &str = "tilewalk-path-worker";

struct HandleState {
    generation: u64,
    start: TilePosition,
    goals: HashSet<TilePosition>,
    done: AtomicBool,
    cancelled: AtomicBool,
    result: Mutex<Option<Path>>,
}

/// Shared view of one in-flight or finished computation.
#[derive(Clone)]
pub struct PathHandle {
    state: Arc<HandleState>,
}

impl std::fmt::Debug for PathHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathHandle")
            .field("generation", &self.state.generation)
            .field("start", &self.state.start)
            .field("done", &self.is_done())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl PathHandle {
    fn new(generation: u64, start: TilePosition, goals: HashSet<TilePosition>) -> Self {
        Self {
            state: Arc::new(HandleState {
                generation,
                start,
                goals,
                done: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                result: Mutex::new(None),
            }),
        }
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn start(&self) -> TilePosition {
        self.state.start
    }

    pub fn goals(&self) -> &HashSet<TilePosition> {
        &self.state.goals
    }

    pub fn is_done(&self) -> bool {
        self.state.done.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Marks the handle cancelled and done. The running search sees the flag and stops early.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        self.state.done.store(true, Ordering::Release);
    }

    /// Computed path; empty while pending, after cancellation, or when nothing was found.
    pub fn result(&self) -> Path {
        if self.is_cancelled() {
            return Path::empty();
        }
        self.state.result.lock().clone().unwrap_or_default()
    }

    fn cancel_flag(&self) -> &AtomicBool {
        &self.state.cancelled
    }

    fn complete(&self, path: Path) {
        let mut slot = self.state.result.lock();
        if self.is_cancelled() {
            return;
        }
        *slot = Some(path);
        self.state.done.store(true, Ordering::Release);
    }
}

/// Picks between the regular and the transport-free search result. Empty counts as infinitely long,
/// and the transport-free path wins ties.
pub fn prefer_safe(with_transports: Path, without_transports: Path) -> Path {
    let len = |p: &Path| if p.is_empty() { usize::MAX } else { p.len() };
    if len(&with_transports) >= len(&without_transports) {
        without_transports
    } else {
        with_transports
    }
}

pub struct PathfindingService {
    pathfinder: Arc<dyn Pathfinder>,
    graph: Arc<dyn TileGraph>,
    catalog: Arc<ArcSwap<TransportCatalog>>,
    sender: Option<Sender<PathHandle>>,
    worker: Option<JoinHandle<()>>,
    latest: Mutex<Option<PathHandle>>,
    generation: AtomicU64,
}

impl PathfindingService {
    pub fn new(pathfinder: Arc<dyn Pathfinder>, graph: Arc<dyn TileGraph>, catalog: TransportCatalog) -> Result<Self> {
        let catalog = Arc::new(ArcSwap::from_pointee(catalog));
        let (tx, rx) = unbounded::<PathHandle>();
        let worker = {
            let pathfinder = Arc::clone(&pathfinder);
            let graph = Arc::clone(&graph);
            let catalog = Arc::clone(&catalog);
            thread::Builder::new()
                .name(WORKER_THREAD_NAME.to_string())
                .spawn(move || run_worker(rx, pathfinder, graph, catalog))?
        };
        info!(thread = WORKER_THREAD_NAME, "path worker started");
        Ok(Self {
            pathfinder,
            graph,
            catalog,
            sender: Some(tx),
            worker: Some(worker),
            latest: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    /// Queues a search; the previously requested handle is cancelled first.
    pub fn request_path(&self, start: TilePosition, goals: HashSet<TilePosition>) -> Result<PathHandle> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let handle = PathHandle::new(generation, start, goals);
        {
            let mut latest = self.latest.lock();
            if let Some(prev) = latest.replace(handle.clone()) {
                prev.cancel();
            }
        }
        let sender = self.sender.as_ref().ok_or(WalkError::WorkerGone)?;
        sender.send(handle.clone()).map_err(|_| WalkError::WorkerGone)?;
        debug!(generation, %start, "path requested");
        Ok(handle)
    }

    /// Runs the search on the calling thread without touching the queued request.
    pub fn compute_now(&self, start: TilePosition, goals: &HashSet<TilePosition>) -> Path {
        let catalog = self.catalog.load_full();
        self.compute_with(start, goals, &catalog)
    }

    /// Like `compute_now` but against an explicit catalog, e.g. one filtered for a different profile.
    pub fn compute_with(&self, start: TilePosition, goals: &HashSet<TilePosition>, catalog: &TransportCatalog) -> Path {
        search(self.pathfinder.as_ref(), self.graph.as_ref(), catalog, start, goals, &AtomicBool::new(false))
    }

    pub fn set_catalog(&self, catalog: TransportCatalog) {
        info!(transports = catalog.len(), "transport catalog swapped");
        self.catalog.store(Arc::new(catalog));
    }

    pub fn catalog(&self) -> Arc<TransportCatalog> {
        self.catalog.load_full()
    }

    pub fn graph(&self) -> &Arc<dyn TileGraph> {
        &self.graph
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl Drop for PathfindingService {
    fn drop(&mut self) {
        if let Some(prev) = self.latest.lock().take() {
            prev.cancel();
        }
        // closing the channel ends the worker loop
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("path worker panicked");
            }
        }
    }
}

fn search(
    pathfinder: &dyn Pathfinder,
    graph: &dyn TileGraph,
    catalog: &TransportCatalog,
    start: TilePosition,
    goals: &HashSet<TilePosition>,
    cancel: &AtomicBool,
) -> Path {
    let path = pathfinder.find_path(start, goals, catalog, cancel);
    if !graph.is_restricted_zone(start) || cancel.load(Ordering::Acquire) {
        return path;
    }
    let safe = pathfinder.find_path(start, goals, &catalog.without_teleports(), cancel);
    debug!(with = path.len(), without = safe.len(), "restricted zone, compared transport-free route");
    prefer_safe(path, safe)
}

fn run_worker(
    rx: Receiver<PathHandle>,
    pathfinder: Arc<dyn Pathfinder>,
    graph: Arc<dyn TileGraph>,
    catalog: Arc<ArcSwap<TransportCatalog>>,
) {
    for handle in rx.iter() {
        if handle.is_cancelled() {
            debug!(generation = handle.generation(), "skipping cancelled request");
            continue;
        }
        let snapshot = catalog.load_full();
        let path = search(
            pathfinder.as_ref(),
            graph.as_ref(),
            &snapshot,
            handle.start(),
            handle.goals(),
            handle.cancel_flag(),
        );
        debug!(generation = handle.generation(), len = path.len(), "path computed");
        handle.complete(path);
    }
    debug!("path worker exiting");
}
