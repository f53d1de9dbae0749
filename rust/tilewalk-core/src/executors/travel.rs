//! NPC and surface driven travel: boats, charters, spirit trees, quetzals, carpets, obelisks, gliders
//! and minigame teleports.

use tracing::{debug, warn};

use super::{ExecContext, DEFAULT_WAIT_MS, TICK_MS};
use crate::models::TilePosition;
use crate::transport::Transport;
use crate::world::{Surface, WorldObject};

pub const MAGIC_CARPET_POSE: i32 = 6936;
pub const PASSAGE_RANGE: i32 = 10;

pub const GLIDER_DESTINATIONS: &[&str] = &[
    "Kar-Hewo",
    "Ta Quir Priw",
    "Sindarpos",
    "Lemanto Andra",
    "Gandius",
    "Ookookolly Undri",
    "Lemantolly Undri",
];

const SURFACE_WAIT_MS: u64 = 10_000;
const CARPET_RIDE_MS: u64 = 60_000;
const OBELISK_POLL_MS: u64 = 100;
const OBELISK_WAIT_MS: u64 = 10_000;

fn near(t: &Transport, ctx: &ExecContext<'_>) -> TilePosition {
    t.origin.unwrap_or_else(|| ctx.position())
}

/// NPC behind the edge: by id when the row has one, else by name.
fn find_npc(ctx: &ExecContext<'_>, t: &Transport) -> Option<WorldObject> {
    let at = near(t, ctx);
    let by_id = t.object_or_npc_id.and_then(|id| ctx.find_npc_id(id, at));
    by_id.or_else(|| t.name.as_deref().and_then(|name| ctx.find_npc_named(name, at)))
}

fn verb<'a>(t: &'a Transport, fallback: &'a str) -> &'a str {
    if t.action_verb.trim().is_empty() {
        fallback
    } else {
        t.action_verb.as_str()
    }
}

pub(super) fn npc_passage(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let Some(npc) = find_npc(ctx, t) else {
        debug!(name = ?t.name, "passage npc not found");
        return false;
    };
    if !ctx.env.agent.interact(&npc, verb(t, "Travel")) {
        return false;
    }
    let dialogue = &ctx.env.dialogue;
    ctx.wait_not_moving(DEFAULT_WAIT_MS);
    if ctx.wait_dialogue(2 * TICK_MS) {
        if dialogue.text().to_ascii_lowercase().contains("will cost you") {
            dialogue.click_continue();
            if ctx.wait_option("Yes please.", 3 * TICK_MS) {
                dialogue.click_option("Yes please.");
                ctx.wait_dialogue(2 * TICK_MS);
                dialogue.click_continue();
            }
        } else if dialogue.has_option("Pirates' cove") {
            dialogue.click_option("Pirates' cove");
            ctx.sleep_ticks(2);
            dialogue.click_continue();
        } else if npc.name.eq_ignore_ascii_case("Mountain Guide") {
            let sub = t.sub_destination();
            dialogue.click_option(sub.option.as_deref().unwrap_or(&sub.label));
        }
    }
    ctx.wait_arrival(t.destination, PASSAGE_RANGE)
}

pub(super) fn charter(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let Some(npc) = find_npc(ctx, t) else {
        return false;
    };
    let dialogue = &ctx.env.dialogue;
    if !ctx.env.agent.interact(&npc, verb(t, "Charter")) {
        return false;
    }
    if !ctx.wait(|| dialogue.is_surface_open(Surface::CharterMenu), SURFACE_WAIT_MS) {
        return false;
    }
    let sub = t.sub_destination();
    if !dialogue.select_destination(Surface::CharterMenu, &sub.label) {
        warn!(label = %sub.label, "charter destination not offered");
        return false;
    }
    ctx.wait_arrival(t.destination, PASSAGE_RANGE)
}

pub(super) fn spirit_tree(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let dialogue = &ctx.env.dialogue;
    let surface_open =
        || dialogue.is_surface_open(Surface::SpiritTreeMenu) || dialogue.is_surface_open(Surface::AdventureLog);
    if !surface_open() {
        let Some(tree) = t.object_or_npc_id.and_then(|id| ctx.find_object(id, near(t, ctx), PASSAGE_RANGE)) else {
            return false;
        };
        if !ctx.env.agent.interact(&tree, verb(t, "Travel")) {
            return false;
        }
        if !ctx.wait(surface_open, SURFACE_WAIT_MS) {
            return false;
        }
    }
    let surface =
        if dialogue.is_surface_open(Surface::AdventureLog) { Surface::AdventureLog } else { Surface::SpiritTreeMenu };
    // the parser already stripped any "N:" log prefix
    let sub = t.sub_destination();
    if !dialogue.select_destination(surface, &sub.label) {
        return false;
    }
    ctx.wait_within_2d(t.destination, ctx.offset(), DEFAULT_WAIT_MS);
    ctx.wait_arrival(t.destination, PASSAGE_RANGE)
}

pub(super) fn quetzal(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let dialogue = &ctx.env.dialogue;
    if !dialogue.is_surface_open(Surface::QuetzalMap) {
        let Some(npc) = find_npc(ctx, t) else {
            return false;
        };
        if !ctx.env.agent.interact(&npc, "Travel") {
            return false;
        }
        if !ctx.wait(|| dialogue.is_surface_open(Surface::QuetzalMap), SURFACE_WAIT_MS) {
            return false;
        }
    }
    let sub = t.sub_destination();
    if !dialogue.select_destination(Surface::QuetzalMap, &sub.label) {
        return false;
    }
    ctx.wait_arrival(t.destination, PASSAGE_RANGE)
}

pub(super) fn magic_carpet(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let Some(npc) = find_npc(ctx, t) else {
        return false;
    };
    let agent = &ctx.env.agent;
    let dialogue = &ctx.env.dialogue;
    if !agent.interact(&npc, verb(t, "Travel")) {
        return false;
    }
    if ctx.wait_any_option(DEFAULT_WAIT_MS) {
        dialogue.click_option(&t.display_selector);
    }
    if !ctx.wait(|| agent.pose_animation() == MAGIC_CARPET_POSE, SURFACE_WAIT_MS) {
        return false;
    }
    ctx.wait_every(|| agent.pose_animation() != MAGIC_CARPET_POSE, TICK_MS, CARPET_RIDE_MS)
}

pub(super) fn obelisk(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let Some(origin) = t.origin else {
        return false;
    };
    let Some(obelisk) = t.object_or_npc_id.and_then(|id| ctx.find_object(id, origin, PASSAGE_RANGE)) else {
        return false;
    };
    let agent = &ctx.env.agent;
    if !agent.interact(&obelisk, verb(t, "Activate")) {
        return false;
    }
    // the obelisk only takes whoever stands inside its square
    agent.move_precise(origin);
    let offset = ctx.offset();
    ctx.wait_every(|| agent.position().distance_to_2d(t.destination) < offset, OBELISK_POLL_MS, OBELISK_WAIT_MS)
}

pub fn is_glider_destination(label: &str) -> bool {
    GLIDER_DESTINATIONS.iter().any(|d| d.eq_ignore_ascii_case(label.trim()))
}

pub(super) fn glider(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let sub = t.sub_destination();
    if sub.label.is_empty() || !is_glider_destination(&sub.label) {
        warn!(label = %sub.label, "unknown glider destination");
        return false;
    }
    let dialogue = &ctx.env.dialogue;
    if !dialogue.is_surface_open(Surface::GliderMap) {
        let Some(npc) = find_npc(ctx, t) else {
            return false;
        };
        if !ctx.env.agent.interact(&npc, verb(t, "Glider")) {
            return false;
        }
        if !ctx.wait(|| dialogue.is_surface_open(Surface::GliderMap), SURFACE_WAIT_MS) {
            return false;
        }
    }
    if !dialogue.select_destination(Surface::GliderMap, &sub.label) {
        return false;
    }
    ctx.wait_arrival(t.destination, PASSAGE_RANGE)
}

pub(super) fn minigame(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let agent = &ctx.env.agent;
    let dialogue = &ctx.env.dialogue;
    if dialogue.is_open() {
        // a stray click on our own tile dismisses it
        agent.move_precise(agent.position());
    }
    if !dialogue.is_surface_open(Surface::Minigame) && !dialogue.open_surface(Surface::Minigame) {
        return false;
    }
    let sub = t.sub_destination();
    if !dialogue.select_destination(Surface::Minigame, &sub.label.to_ascii_lowercase()) {
        return false;
    }
    if sub.label.eq_ignore_ascii_case("rat pits") {
        if let Some(option) = sub.option.as_deref() {
            if ctx.wait_any_option(DEFAULT_WAIT_MS) {
                dialogue.click_option(option);
            }
        }
    }
    ctx.wait(|| agent.is_animating(), 2 * TICK_MS);
    ctx.wait_not_animating(4 * DEFAULT_WAIT_MS);
    ctx.wait_within(t.destination, 2 * ctx.offset(), 2 * DEFAULT_WAIT_MS)
}
