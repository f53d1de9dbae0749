//! Per-kind protocols for crossing a catalog edge.
//!
//! [`attempt`] runs the shared pre-check and then dispatches on [`TransportKind`]. Every protocol
//! is a sequence of bounded waits on the world; a missing NPC, object or surface makes it return
//! `false` so the walker can fall back to plain movement.

use tracing::{debug, info};

use crate::config::WalkerConfig;
use crate::models::{Path, TilePosition};
use crate::transport::{Transport, TransportKind};
use crate::world::{Environment, ObjectKind, WorldObject};

pub mod canoe;
pub mod fairy_ring;
pub mod object;
pub mod teleport_item;
pub mod teleport_spell;
pub mod travel;

pub const TICK_MS: u64 = 600;
pub const DEFAULT_WAIT_MS: u64 = 5_000;
/// Radius searched for the NPC or object behind an edge.
pub const INTERACT_RADIUS: i32 = 20;
/// Teleports are pointless this close to their destination.
pub const TELEPORT_SKIP_DISTANCE: i32 = 3;

/// Borrowed view of the world plus tunables, shared by every executor.
pub struct ExecContext<'a> {
    pub env: &'a Environment,
    pub cfg: &'a WalkerConfig,
}

impl<'a> ExecContext<'a> {
    pub fn new(env: &'a Environment, cfg: &'a WalkerConfig) -> Self {
        Self { env, cfg }
    }

    pub fn offset(&self) -> i32 {
        self.cfg.transport_offset
    }

    pub fn position(&self) -> TilePosition {
        self.env.agent.position()
    }

    pub fn wait(&self, mut predicate: impl FnMut() -> bool, timeout_ms: u64) -> bool {
        self.env.clock.wait_until_every(&mut predicate, self.cfg.poll_interval_ms, timeout_ms)
    }

    pub fn wait_every(&self, mut predicate: impl FnMut() -> bool, interval_ms: u64, timeout_ms: u64) -> bool {
        self.env.clock.wait_until_every(&mut predicate, interval_ms, timeout_ms)
    }

    pub fn sleep_ticks(&self, ticks: u64) {
        let ms = ticks * TICK_MS;
        self.env.clock.sleep(ms, ms + ms / 4);
    }

    /// Waits until the agent is strictly closer than `range` to `dest`.
    pub fn wait_within(&self, dest: TilePosition, range: i32, timeout_ms: u64) -> bool {
        let agent = &self.env.agent;
        self.wait(|| agent.position().distance_to(dest) < range, timeout_ms)
    }

    pub fn wait_within_2d(&self, dest: TilePosition, range: i32, timeout_ms: u64) -> bool {
        let agent = &self.env.agent;
        self.wait(|| agent.position().distance_to_2d(dest) < range, timeout_ms)
    }

    pub fn wait_not_animating(&self, timeout_ms: u64) -> bool {
        let agent = &self.env.agent;
        self.wait(|| !agent.is_animating(), timeout_ms)
    }

    pub fn wait_not_moving(&self, timeout_ms: u64) -> bool {
        let agent = &self.env.agent;
        self.wait(|| !agent.is_moving(), timeout_ms)
    }

    /// Idle, then closer than `range` to the destination.
    pub fn wait_arrival(&self, dest: TilePosition, range: i32) -> bool {
        self.wait_not_animating(DEFAULT_WAIT_MS);
        self.wait_within(dest, range, DEFAULT_WAIT_MS * 2)
    }

    pub fn wait_dialogue(&self, timeout_ms: u64) -> bool {
        let dialogue = &self.env.dialogue;
        self.wait(|| dialogue.is_open(), timeout_ms)
    }

    pub fn wait_option(&self, fragment: &str, timeout_ms: u64) -> bool {
        let dialogue = &self.env.dialogue;
        self.wait(|| dialogue.has_option(fragment), timeout_ms)
    }

    pub fn wait_any_option(&self, timeout_ms: u64) -> bool {
        let dialogue = &self.env.dialogue;
        self.wait(|| !dialogue.options().is_empty(), timeout_ms)
    }

    pub fn find_npc_named(&self, name: &str, near: TilePosition) -> Option<WorldObject> {
        self.env.objects.find(
            &|o| o.kind == ObjectKind::Npc && o.name.eq_ignore_ascii_case(name),
            near,
            INTERACT_RADIUS,
        )
    }

    pub fn find_npc_id(&self, id: i32, near: TilePosition) -> Option<WorldObject> {
        self.env.objects.find(&|o| o.kind == ObjectKind::Npc && o.id == id, near, INTERACT_RADIUS)
    }

    /// Nearest non-NPC object with this id.
    pub fn find_object(&self, id: i32, near: TilePosition, radius: i32) -> Option<WorldObject> {
        self.env.objects.find(&|o| o.kind != ObjectKind::Npc && o.id == id, near, radius)
    }

    /// Continues a plain message box or closes a question left open by a protocol.
    pub fn settle_dialogue(&self) {
        let dialogue = &self.env.dialogue;
        if !dialogue.is_open() {
            return;
        }
        if dialogue.options().is_empty() {
            dialogue.click_continue();
        } else {
            dialogue.close();
        }
    }
}

/// Checks that only look at the path: destination ahead of `index`, and for
/// non-teleports an origin that comes before it.
pub fn route_allows(t: &Transport, path: &Path, index: usize) -> bool {
    let Some(dest_idx) = path.iter().skip(index + 1).position(|p| *p == t.destination).map(|k| k + index + 1) else {
        return false;
    };
    if t.kind.is_teleport() {
        return true;
    }
    match t.origin.and_then(|o| path.index_of(o)) {
        Some(origin_idx) => origin_idx < dest_idx,
        None => false,
    }
}

/// Checks that look at the agent: plane, teleport usefulness and hazard cap, and standing on the origin.
pub fn agent_allows(t: &Transport, position: TilePosition, hazard_level: i32) -> bool {
    if let Some(origin) = t.origin {
        if origin.plane != position.plane || origin != position {
            return false;
        }
    }
    if t.kind.is_teleport() {
        if position.distance_to(t.destination) < TELEPORT_SKIP_DISTANCE {
            return false;
        }
        if hazard_level > t.max_hazard_level {
            return false;
        }
    }
    true
}

pub fn precheck(t: &Transport, path: &Path, index: usize, position: TilePosition, hazard_level: i32) -> bool {
    route_allows(t, path, index) && agent_allows(t, position, hazard_level)
}

/// Runs the protocol for `t` if the pre-check holds at `path[index]`. True means the edge was crossed
/// (or a multi-step protocol made progress) and the walker should re-plan from its new position.
pub fn attempt(ctx: &ExecContext<'_>, t: &Transport, path: &Path, index: usize) -> bool {
    let position = ctx.position();
    let hazard = ctx.env.graph.hazard_level(position);
    if !precheck(t, path, index, position, hazard) {
        return false;
    }
    info!(kind = t.kind.label(), destination = %t.destination, selector = %t.display_selector, "attempting transport");
    let crossed = match t.kind {
        TransportKind::TeleportItem => teleport_item::run(ctx, t),
        TransportKind::TeleportSpell => teleport_spell::run(ctx, t),
        TransportKind::TeleportMinigame => travel::minigame(ctx, t),
        TransportKind::Ship | TransportKind::Boat | TransportKind::Npc => travel::npc_passage(ctx, t),
        TransportKind::CharterShip => travel::charter(ctx, t),
        TransportKind::Canoe => canoe::run(ctx, t),
        TransportKind::SpiritTree => travel::spirit_tree(ctx, t),
        TransportKind::Quetzal => travel::quetzal(ctx, t),
        TransportKind::MagicCarpet => travel::magic_carpet(ctx, t),
        TransportKind::WildernessObelisk => travel::obelisk(ctx, t),
        TransportKind::GnomeGlider => travel::glider(ctx, t),
        TransportKind::FairyRing => fairy_ring::run(ctx, t),
        TransportKind::Trapdoor => object::trapdoor(ctx, t),
        TransportKind::Door
        | TransportKind::AgilityShortcut
        | TransportKind::Minecart
        | TransportKind::TeleportPortal => object::run(ctx, t),
    };
    ctx.settle_dialogue();
    debug!(kind = t.kind.label(), crossed, position = %ctx.position(), "transport attempt finished");
    crossed
}
