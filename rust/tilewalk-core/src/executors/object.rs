//! Scenery edges: doors, agility shortcuts, minecarts, portals and trapdoors.

use tracing::debug;

use super::{ExecContext, DEFAULT_WAIT_MS, TICK_MS};
use crate::transport::{Transport, TransportKind};
use crate::world::{ObjectKind, Surface, WorldObject};

/// Closed id to open id.
pub const TRAPDOOR_PAIRS: [(i32, i32); 2] = [(1579, 1581), (881, 882)];
pub const MINECART_POSE: i32 = 2148;
pub const OBJECT_RADIUS: i32 = 10;

const SHORTCUT_WAIT_MS: u64 = 10_000;
const MINECART_START_MS: u64 = 5_000;
const MINECART_RIDE_MS: u64 = 10_000;

/// Object behind the edge: nearest with the row's id within range of the origin. A ground object on the
/// agent's own tile is skipped in favour of the next one.
fn edge_object(ctx: &ExecContext<'_>, t: &Transport) -> Option<WorldObject> {
    let id = t.object_or_npc_id?;
    let origin = t.origin?;
    let nearest = ctx.find_object(id, origin, OBJECT_RADIUS)?;
    if nearest.kind != ObjectKind::Ground || nearest.position != ctx.position() {
        return Some(nearest);
    }
    let here = ctx.position();
    ctx.env.objects.find(
        &|o| o.kind != ObjectKind::Npc && o.id == id && o.position != here,
        origin,
        OBJECT_RADIUS,
    )
}

pub(super) fn run(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let Some(object) = edge_object(ctx, t) else {
        debug!(id = ?t.object_or_npc_id, origin = ?t.origin, "edge object not found");
        return false;
    };
    let agent = &ctx.env.agent;
    let dialogue = &ctx.env.dialogue;
    if !agent.interact(&object, &t.action_verb) {
        return false;
    }

    let plane = agent.position().plane;
    if t.destination.plane == plane {
        match t.kind {
            TransportKind::AgilityShortcut => {
                ctx.wait(|| agent.is_animating(), 2 * TICK_MS);
                ctx.wait(|| agent.position().distance_to(t.destination) <= 2, SHORTCUT_WAIT_MS);
            }
            TransportKind::Minecart => {
                if ctx.wait(|| dialogue.is_surface_open(Surface::AdventureLog), 2 * TICK_MS) {
                    dialogue.select_destination(Surface::AdventureLog, &t.sub_destination().label);
                    ctx.sleep_ticks(2);
                } else {
                    ctx.wait(|| agent.pose_animation() == MINECART_POSE, MINECART_START_MS);
                    ctx.wait(|| agent.pose_animation() != MINECART_POSE, MINECART_RIDE_MS);
                }
            }
            TransportKind::TeleportPortal => ctx.sleep_ticks(2),
            _ => {
                ctx.wait_not_moving(DEFAULT_WAIT_MS);
                if dialogue.has_option("Yes please") {
                    dialogue.click_option("Yes please");
                }
            }
        }
    } else {
        ctx.wait(|| agent.position().plane != plane, DEFAULT_WAIT_MS);
        ctx.env.clock.sleep(700, 1_300);
    }
    ctx.wait_not_animating(DEFAULT_WAIT_MS);
    ctx.wait_within(t.destination, ctx.offset(), DEFAULT_WAIT_MS)
}

/// Closed id of a trapdoor whose open id is `open`.
pub fn closed_counterpart(open: i32) -> Option<i32> {
    TRAPDOOR_PAIRS.iter().find(|(_, o)| *o == open).map(|(c, _)| *c)
}

pub(super) fn trapdoor(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let (Some(open_id), Some(origin)) = (t.object_or_npc_id, t.origin) else {
        return false;
    };
    let Some(closed_id) = closed_counterpart(open_id) else {
        return run(ctx, t);
    };
    let agent = &ctx.env.agent;
    if let Some(closed) = ctx.find_object(closed_id, origin, OBJECT_RADIUS) {
        if agent.interact(&closed, "Open") {
            ctx.wait(|| ctx.find_object(open_id, origin, OBJECT_RADIUS).is_some(), DEFAULT_WAIT_MS);
        }
    }
    let Some(open) = ctx.find_object(open_id, origin, OBJECT_RADIUS) else {
        return false;
    };
    if !agent.interact(&open, &t.action_verb) {
        return false;
    }
    ctx.wait_not_animating(DEFAULT_WAIT_MS);
    ctx.wait_within(t.destination, ctx.offset(), DEFAULT_WAIT_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapdoor_pairs() {
        assert_eq!(closed_counterpart(1581), Some(1579));
        assert_eq!(closed_counterpart(882), Some(881));
        assert_eq!(closed_counterpart(1579), None);
    }
}
