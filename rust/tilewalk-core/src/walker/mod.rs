//! The navigation state machine.
//!
//! [`Walker::navigate_to`] blocks the calling thread until the agent arrives, the target turns out to be
//! unreachable, or the walk is abandoned. Each pass of the loop reuses the session's path (requesting a
//! new one only when the target changes or the agent strays), handles obstacles and catalog edges at
//! the current step, and otherwise issues short move orders along the path. Every wait is bounded.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::WalkerConfig;
use crate::executors::{self, ExecContext};
use crate::models::{ItemId, Path, TilePosition, WalkerState};
use crate::obstacles::{doors, rockfall, ObstacleOutcome, RiddleBook};
use crate::pathfinder::{PathHandle, PathfindingService};
use crate::route_analysis::{self, RouteAdvisor, RouteComparison};
use crate::transport::{AgentProfile, Transport, TransportCatalog, TransportKind};
use crate::world::Environment;

pub mod progress;
pub mod session;

pub use session::{NavigationSession, Phase};

const LEVER_WARNING: &str = "Warning! The lever will teleport you deep into the Wilderness.";
const LEVER_CONFIRM: &str = "Yes, I'm brave.";
const FINAL_APPROACH_RADIUS: i32 = 3;
const NUDGE_SLEEP_MS: (u64, u64) = (800, 1_200);

/// Outcome of one pass of the loop.
enum Pass {
    Done(WalkerState),
    /// Go round again with the same target.
    Again,
}

pub struct Walker {
    env: Environment,
    paths: Arc<PathfindingService>,
    full_catalog: ArcSwap<TransportCatalog>,
    config: WalkerConfig,
    riddles: RiddleBook,
    banks: Vec<TilePosition>,
    bank_profile: Mutex<AgentProfile>,
    session: Mutex<NavigationSession>,
    event_thread: Mutex<Option<ThreadId>>,
}

impl Walker {
    /// `full_catalog` is every known edge; the walker narrows it to what the agent can use whenever a
    /// new target is set.
    pub fn new(env: Environment, paths: Arc<PathfindingService>, full_catalog: TransportCatalog, config: WalkerConfig) -> Self {
        Self {
            env,
            paths,
            full_catalog: ArcSwap::from_pointee(full_catalog),
            config: config.normalized(),
            riddles: RiddleBook::default(),
            banks: Vec::new(),
            bank_profile: Mutex::new(AgentProfile::default()),
            session: Mutex::new(NavigationSession::default()),
            event_thread: Mutex::new(None),
        }
    }

    pub fn with_riddles(mut self, riddles: RiddleBook) -> Self {
        self.riddles = riddles;
        self
    }

    pub fn with_banks(mut self, banks: Vec<TilePosition>) -> Self {
        self.banks = banks;
        self
    }

    /// Thread that must never block in [`navigate_to`](Self::navigate_to), e.g. the client's event loop.
    pub fn register_event_thread(&self, id: ThreadId) {
        *self.event_thread.lock() = Some(id);
    }

    /// Items the agent could withdraw, used by [`compare_routes`](Self::compare_routes).
    pub fn set_bank_profile(&self, profile: AgentProfile) {
        *self.bank_profile.lock() = profile;
    }

    pub fn set_full_catalog(&self, catalog: TransportCatalog) {
        self.full_catalog.store(Arc::new(catalog));
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    pub fn paths(&self) -> &Arc<PathfindingService> {
        &self.paths
    }

    pub fn phase(&self) -> Phase {
        self.session.lock().phase
    }

    pub fn current_target(&self) -> Option<TilePosition> {
        self.session.lock().current_target
    }

    pub fn navigate_to(&self, target: TilePosition, distance: i32) -> WalkerState {
        if self.on_event_thread() {
            error!(%target, "navigate_to called from the event thread");
            return WalkerState::Exit;
        }
        let state = self.walk(target, distance.max(0));
        info!(%target, state = ?state, "navigation finished");
        state
    }

    /// `None` clears the target. `Some` replaces it and starts a fresh search.
    pub fn set_target(&self, target: Option<TilePosition>) {
        match target {
            None => self.clear_target(),
            Some(t) => {
                let mut s = self.session.lock();
                let distance = s.reached_distance;
                self.start_locked(&mut s, t, distance);
            }
        }
    }

    /// The only cancellation primitive: cancels the in-flight search and forgets the target.
    pub fn clear_target(&self) {
        let mut s = self.session.lock();
        if let Some(target) = s.current_target {
            debug!(%target, "target cleared");
        }
        s.clear();
        s.phase = Phase::Idle;
    }

    /// Dry run: whether a path from the agent ends next to `target`.
    pub fn can_reach(&self, target: TilePosition) -> bool {
        self.can_reach_area(target, 2, 2, 2, 2)
    }

    /// Dry run for an object of `size_x` by `size_y` at `target`.
    pub fn can_reach_area(&self, target: TilePosition, size_x: i32, size_y: i32, path_size_x: i32, path_size_y: i32) -> bool {
        let start = self.env.agent.position();
        if start == target {
            return true;
        }
        let path = self.paths.compute_now(start, &HashSet::from([target]));
        route_analysis::path_reaches_area(&path, target, size_x, size_y, path_size_x, path_size_y)
    }

    /// Path length from `start` to `target`, or `i32::MAX` when the path does not end there.
    pub fn total_tiles(&self, start: TilePosition, target: TilePosition) -> i32 {
        let path = self.paths.compute_now(start, &HashSet::from([target]));
        route_analysis::total_tiles(&path, target)
    }

    /// One multi-goal search; returns the first listed target the path actually ends near.
    pub fn nearest_accessible_target(&self, targets: &[TilePosition], tolerance: i32) -> Option<TilePosition> {
        if targets.is_empty() {
            return None;
        }
        let goals: HashSet<TilePosition> = targets.iter().copied().collect();
        let path = self.paths.compute_now(self.env.agent.position(), &goals);
        route_analysis::nearest_accessible_index(&path, targets, tolerance).map(|i| targets[i])
    }

    pub fn transports_for_path(&self, path: &Path, start_index: usize, preferred: Option<TransportKind>) -> Vec<Transport> {
        route_analysis::transports_for_path(&self.full_catalog.load(), path, start_index, preferred)
    }

    /// Items the agent would need for the edges on `path` but is not carrying.
    pub fn missing_transport_items(&self, path: &Path) -> BTreeSet<ItemId> {
        let used = self.transports_for_path(path, 0, None);
        route_analysis::missing_items(&used, &self.env.agent.profile())
    }

    pub fn compare_routes(&self, target: TilePosition) -> RouteComparison {
        let full = self.full_catalog.load_full();
        let advisor = RouteAdvisor::new(&self.paths, &full, &self.banks);
        let banked = self.bank_profile.lock().clone();
        advisor.compare(self.env.agent.position(), target, &self.env.agent.profile(), &banked)
    }

    fn on_event_thread(&self) -> bool {
        *self.event_thread.lock() == Some(thread::current().id())
    }

    /// Target reached: within `distance` steps, or close enough to an unwalkable target.
    fn has_arrived(&self, target: TilePosition, distance: i32) -> bool {
        let position = self.env.agent.position();
        let graph = &self.env.graph;
        graph.reachable_tiles(position, distance).contains_key(&target)
            || (!graph.is_walkable(target) && position.distance_to(target) <= distance)
    }

    /// Replaces the target and requests a path. Caller holds the session lock.
    fn start_locked(&self, s: &mut NavigationSession, target: TilePosition, distance: i32) {
        s.retarget(target, distance);
        s.phase = Phase::Pathfinding;
        let profile = self.env.agent.profile();
        self.paths.set_catalog(self.full_catalog.load().usable_by(&profile));
        let start = self.env.agent.position();
        match self.paths.request_path(start, HashSet::from([target])) {
            Ok(handle) => {
                debug!(%target, %start, generation = handle.generation(), "path requested");
                s.in_flight = Some(handle);
            }
            Err(e) => error!(%target, error = %e, "path request failed"),
        }
    }

    fn recalculate(&self, target: TilePosition, distance: i32) {
        let mut s = self.session.lock();
        if s.current_target != Some(target) {
            return;
        }
        info!(%target, "recalculating path");
        s.clear();
        self.start_locked(&mut s, target, distance);
    }

    fn target_is(&self, target: TilePosition) -> bool {
        self.session.lock().current_target == Some(target)
    }

    /// Ends the walk for `target`: clears the session and records `outcome`, but only while the session
    /// still holds `target`. A walk whose target was replaced leaves the newer one alone.
    fn release(&self, target: TilePosition, outcome: WalkerState) {
        let mut s = self.session.lock();
        if s.current_target != Some(target) {
            debug!(%target, current = ?s.current_target, "target replaced, leaving session alone");
            return;
        }
        s.clear();
        s.phase = outcome.into();
    }

    fn walk(&self, target: TilePosition, distance: i32) -> WalkerState {
        if self.has_arrived(target, distance) {
            let mut s = self.session.lock();
            if s.current_target.map_or(true, |current| current == target) {
                s.clear();
                s.phase = Phase::Arrived;
            }
            return WalkerState::Arrived;
        }
        let me = thread::current().id();
        {
            let mut s = self.session.lock();
            if s.current_target == Some(target) {
                let computing = s.in_flight.as_ref().map_or(false, |h| !h.is_done());
                let other_walker = s.walking.map_or(false, |t| t != me);
                if computing || other_walker {
                    return WalkerState::Moving;
                }
            }
            s.walking = Some(me);
            self.start_locked(&mut s, target, distance);
        }

        let state = self.run(target, distance);

        let mut s = self.session.lock();
        if s.walking == Some(me) {
            s.walking = None;
        }
        state
    }

    /// Trampoline: every pass either finishes or asks to go round again.
    fn run(&self, target: TilePosition, distance: i32) -> WalkerState {
        for pass in 0..self.config.max_iterations {
            if pass > 0 {
                if self.has_arrived(target, distance) {
                    self.release(target, WalkerState::Arrived);
                    return WalkerState::Arrived;
                }
                if !self.target_is(target) {
                    return WalkerState::Exit;
                }
            }
            match self.pass(target, distance) {
                Pass::Done(state) => return state,
                Pass::Again => {}
            }
        }
        warn!(%target, max_iterations = self.config.max_iterations, "iteration cap reached");
        self.release(target, WalkerState::Exit);
        WalkerState::Exit
    }

    /// Waits for the session's current search. `None` means give up with `Exit`.
    fn await_path(&self, target: TilePosition) -> Option<(PathHandle, Path)> {
        let clock = &self.env.clock;
        let poll = self.config.poll_interval_ms;
        let mut handle = None;
        clock.wait_until_every(
            &mut || {
                let s = self.session.lock();
                if s.current_target == Some(target) {
                    handle = s.in_flight.clone();
                }
                handle.is_some()
            },
            poll,
            self.config.path_init_timeout_ms,
        );
        let Some(handle) = handle else {
            warn!(%target, "path computation never started");
            self.release(target, WalkerState::Exit);
            return None;
        };
        if !clock.wait_until_every(&mut || handle.is_done(), poll, self.config.path_done_timeout_ms) {
            warn!(%target, timeout_ms = self.config.path_done_timeout_ms, "path computation timed out");
            self.release(target, WalkerState::Exit);
            return None;
        }
        let path = handle.result();
        Some((handle, path))
    }

    fn pass(&self, target: TilePosition, distance: i32) -> Pass {
        let Some((handle, path)) = self.await_path(target) else {
            return Pass::Done(WalkerState::Exit);
        };
        if handle.is_cancelled() {
            // a newer request for the same target supersedes this one
            let replaced = {
                let s = self.session.lock();
                s.current_target == Some(target)
                    && s.in_flight.as_ref().map_or(false, |h| h.generation() != handle.generation())
            };
            return if replaced { Pass::Again } else { Pass::Done(WalkerState::Exit) };
        }

        let reaches = path.last().map_or(false, |last| last.distance_to(target) <= distance);
        if !reaches {
            info!(%target, path_len = path.len(), "target unreachable");
            self.release(target, WalkerState::Unreachable);
            return Pass::Done(WalkerState::Unreachable);
        }

        let agent = &self.env.agent;
        let graph = self.env.graph.as_ref();
        {
            let mut s = self.session.lock();
            if s.current_target != Some(target) {
                return Pass::Done(WalkerState::Exit);
            }
            s.phase = Phase::Moving;
        }
        self.check_stuck();

        let position = agent.position();
        let Some(closest) = progress::closest_index(graph, &path, position, self.config.closest_tile_radius) else {
            self.release(target, WalkerState::Exit);
            return Pass::Done(WalkerState::Exit);
        };
        if position == target || path.len() <= 1 {
            self.release(target, WalkerState::Arrived);
            return Pass::Done(WalkerState::Arrived);
        }

        self.lever_preamble();

        if !progress::is_near_end(&path, position, self.config.near_end_window) {
            if let Some(pass) = self.step_along(&path, closest, target, distance) {
                return pass;
            }
        }
        self.final_approach(&path, distance);
        Pass::Again
    }

    /// Walks the path from `closest`. `Some` when a step was consumed or the walk must be re-evaluated.
    fn step_along(&self, path: &Path, closest: usize, target: TilePosition, distance: i32) -> Option<Pass> {
        let agent = &self.env.agent;
        let graph = self.env.graph.as_ref();
        let ctx = ExecContext::new(&self.env, &self.config);
        let mut rng = rand::thread_rng();

        for i in closest..path.len() {
            if !self.target_is(target) {
                return Some(Pass::Again);
            }
            let position = agent.position();
            if !self.check_near_path(path, position) {
                if self.config.cancel_instead {
                    info!(%target, %position, "off path, dropping target");
                    self.release(target, WalkerState::Exit);
                } else {
                    self.recalculate(target, distance);
                }
                return Some(Pass::Again);
            }

            if doors::handle(&ctx, &self.riddles, path, i).consumed_step() {
                return Some(Pass::Again);
            }
            match rockfall::handle(&ctx, path, i, target) {
                ObstacleOutcome::NotHandled => {}
                ObstacleOutcome::Handled => return Some(Pass::Again),
                ObstacleOutcome::AbandonTarget => {
                    self.release(target, WalkerState::Exit);
                    return Some(Pass::Again);
                }
            }
            if !agent.in_instance() && self.handle_transports(&ctx, path, i) {
                return Some(Pass::Again);
            }

            let Some(tile) = path.get(i) else { break };
            if !graph.reachable_tiles(agent.position(), self.config.closest_tile_radius).contains_key(&tile) {
                continue;
            }
            let hop = rng.gen_range(self.config.hop_min..=self.config.hop_max);
            if agent.position().distance_to_2d(tile) > hop {
                agent.move_toward(progress::point_with_wall_clearance(graph, tile));
                self.env.clock.wait_until_every(
                    &mut || agent.position().distance_to_2d(tile) < hop,
                    self.config.poll_interval_ms,
                    self.config.hop_wait_ms,
                );
            }
        }
        None
    }

    /// Move onto a random tile near the end of the path.
    fn final_approach(&self, path: &Path, distance: i32) {
        let Some(last) = path.last() else { return };
        let agent = &self.env.agent;
        let mut rng = rand::thread_rng();
        let aim = progress::random_reachable(self.env.graph.as_ref(), last, distance.min(FINAL_APPROACH_RADIUS), &mut rng)
            .unwrap_or(last);
        agent.move_precise(aim);
        self.env.clock.wait_until_every(
            &mut || agent.position().distance_to(aim) < 2,
            self.config.poll_interval_ms,
            self.config.final_hop_wait_ms,
        );
    }

    fn check_stuck(&self) {
        let position = self.env.agent.position();
        let count = self.session.lock().observe_position(position);
        if count <= self.config.stuck_threshold {
            return;
        }
        warn!(%position, count, "stuck, nudging");
        let mut rng = rand::thread_rng();
        if let Some(nudge) =
            progress::random_reachable(self.env.graph.as_ref(), position, self.config.nudge_radius, &mut rng)
        {
            self.env.agent.move_toward(nudge);
        }
        self.env.clock.sleep(NUDGE_SLEEP_MS.0, NUDGE_SLEEP_MS.1);
        self.session.lock().stuck_counter = 0;
    }

    fn check_near_path(&self, path: &Path, position: TilePosition) -> bool {
        let unchanged = self.session.lock().unchanged_since_last_check(position);
        progress::is_near_path(self.env.graph.as_ref(), path, position, self.config.recalculate_distance, unchanged)
    }

    fn lever_preamble(&self) {
        let dialogue = &self.env.dialogue;
        if !dialogue.is_open() || !dialogue.text().eq_ignore_ascii_case(LEVER_WARNING) {
            return;
        }
        info!("confirming wilderness lever");
        dialogue.click_continue();
        let mut confirm = || dialogue.has_option(LEVER_CONFIRM);
        if self.env.clock.wait_until_every(&mut confirm, self.config.poll_interval_ms, executors::DEFAULT_WAIT_MS) {
            dialogue.click_option(LEVER_CONFIRM);
        }
    }

    /// Tries every usable edge leaving `path[index]` plus the teleports. Steps onto an edge's origin first
    /// when it is reachable.
    fn handle_transports(&self, ctx: &ExecContext<'_>, path: &Path, index: usize) -> bool {
        let Some(tile) = path.get(index) else {
            return false;
        };
        let catalog = self.paths.catalog();
        let agent = &self.env.agent;
        for t in catalog.at(tile).iter().chain(catalog.anywhere().iter()) {
            if !executors::route_allows(t, path, index) {
                continue;
            }
            let position = agent.position();
            if let Some(origin) = t.origin {
                if origin.plane != position.plane {
                    continue;
                }
                if origin != position {
                    let reach = self.env.graph.reachable_tiles(position, self.config.closest_tile_radius);
                    if !reach.contains_key(&origin) {
                        continue;
                    }
                    agent.move_precise(origin);
                    self.env.clock.wait_until_every(
                        &mut || agent.position() == origin,
                        self.config.poll_interval_ms,
                        self.config.final_hop_wait_ms,
                    );
                }
            }
            if executors::attempt(ctx, t, path, index) {
                return true;
            }
        }
        false
    }
}

impl Drop for Walker {
    fn drop(&mut self) {
        self.session.get_mut().clear();
    }
}
