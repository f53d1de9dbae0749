//! Canoe stations advance one stage per attempt; the walker re-plans between stages.

use tracing::{debug, warn};

use super::{ExecContext, TICK_MS};
use crate::models::TilePosition;
use crate::transport::Transport;
use crate::world::{Surface, WorldObject};

pub const STATION_ACTIONS: [&str; 4] = ["chop-down", "shape-canoe", "float canoe", "paddle canoe"];

const STAGE_POLL_MS: u64 = 300;
const STAGE_WAIT_MS: u64 = 10_000;
const SURFACE_WAIT_MS: u64 = 10_000;
const PADDLE_WAIT_MS: u64 = 20_000;
const STATION_RADIUS: i32 = 10;

/// Best canoe the woodcutting level allows, as named on the shaping surface.
pub fn canoe_tier(woodcutting: i32) -> Option<&'static str> {
    match woodcutting {
        l if l >= 57 => Some("Waka canoe"),
        l if l >= 42 => Some("Stable dugout canoe"),
        l if l >= 27 => Some("Dugout canoe"),
        l if l >= 12 => Some("Log canoe"),
        _ => None,
    }
}

/// Current stage of a station: the first offered action that is a canoe action.
pub fn station_stage(station: &WorldObject) -> Option<&'static str> {
    station
        .actions
        .iter()
        .find_map(|a| STATION_ACTIONS.iter().copied().find(|s| a.eq_ignore_ascii_case(s)))
}

pub(super) fn run(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let sub = t.sub_destination();
    if sub.label.is_empty() {
        return false;
    }
    let (Some(id), Some(origin)) = (t.object_or_npc_id, t.origin) else {
        return false;
    };
    let Some(station) = ctx.find_object(id, origin, STATION_RADIUS) else {
        return false;
    };
    let Some(stage) = station_stage(&station) else {
        warn!(id, "canoe station offers no canoe action");
        return false;
    };
    let agent = &ctx.env.agent;
    let dialogue = &ctx.env.dialogue;
    debug!(stage, "canoe stage");
    match stage {
        "chop-down" | "float canoe" => {
            if !agent.interact(&station, stage) {
                return false;
            }
            wait_stage_done(ctx, id, origin, stage)
        }
        "shape-canoe" => {
            if !agent.interact(&station, stage) {
                return false;
            }
            if !ctx.wait(|| dialogue.is_surface_open(Surface::CanoeShaping), SURFACE_WAIT_MS) {
                return false;
            }
            let Some(tier) = canoe_tier(agent.skill_level("woodcutting")) else {
                return false;
            };
            if !dialogue.select_destination(Surface::CanoeShaping, &format!("Make {tier}")) {
                return false;
            }
            wait_stage_done(ctx, id, origin, stage)
        }
        _ => {
            if !agent.interact(&station, stage) {
                return false;
            }
            if !ctx.wait(|| dialogue.is_surface_open(Surface::CanoeDestinations), SURFACE_WAIT_MS) {
                return false;
            }
            if !dialogue.select_destination(Surface::CanoeDestinations, &format!("Travel to {}", sub.label)) {
                return false;
            }
            ctx.wait_within_2d(t.destination, 2 * ctx.offset(), PADDLE_WAIT_MS)
        }
    }
}

fn wait_stage_done(ctx: &ExecContext<'_>, id: i32, origin: TilePosition, stage: &str) -> bool {
    let agent = &ctx.env.agent;
    ctx.wait(|| agent.is_animating(), 2 * TICK_MS);
    ctx.wait_every(
        || {
            let still_offered = ctx
                .find_object(id, origin, STATION_RADIUS)
                .map_or(false, |s| s.actions.iter().any(|a| a.eq_ignore_ascii_case(stage)));
            !still_offered && !agent.is_animating()
        },
        STAGE_POLL_MS,
        STAGE_WAIT_MS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ObjectKind;

    #[test]
    fn tiers_follow_woodcutting_level() {
        assert_eq!(canoe_tier(99), Some("Waka canoe"));
        assert_eq!(canoe_tier(42), Some("Stable dugout canoe"));
        assert_eq!(canoe_tier(27), Some("Dugout canoe"));
        assert_eq!(canoe_tier(12), Some("Log canoe"));
        assert_eq!(canoe_tier(11), None);
    }

    #[test]
    fn stage_is_first_canoe_action() {
        let station = WorldObject::new(12144, "Canoe Station", TilePosition::new(0, 0, 0), ObjectKind::Game)
            .with_actions(["Examine", "Shape-Canoe"]);
        assert_eq!(station_stage(&station), Some("shape-canoe"));
    }
}
