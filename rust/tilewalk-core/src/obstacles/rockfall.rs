use tracing::{debug, warn};

use super::ObstacleOutcome;
use crate::executors::{ExecContext, DEFAULT_WAIT_MS};
use crate::models::{Path, TilePosition};
use crate::world::{ObjectKind, WorldObject};

/// The only region with mineable rockfalls on walking routes.
pub const MOTHERLODE_REGION: i32 = 14936;
pub const ROCKFALL_IDS: [i32; 2] = [26679, 26680];

pub fn handle(ctx: &ExecContext<'_>, path: &Path, index: usize, target: TilePosition) -> ObstacleOutcome {
    if index + 1 >= path.len() {
        return ObstacleOutcome::NotHandled;
    }
    let agent = &ctx.env.agent;
    if agent.in_instance() {
        return ObstacleOutcome::NotHandled;
    }
    if agent.position().region_id() != MOTHERLODE_REGION || target.region_id() != MOTHERLODE_REGION {
        return ObstacleOutcome::NotHandled;
    }
    if !agent.has_item_named("pickaxe") {
        warn!(%target, "no pickaxe to clear rockfalls, dropping target");
        return ObstacleOutcome::AbandonTarget;
    }
    let objects = &ctx.env.objects;
    for rock_idx in index..index + 2 {
        let Some(point) = path.get(rock_idx) else { continue };
        let at_point = |o: &WorldObject| o.kind == ObjectKind::Game && o.position == point;
        let Some(rock) = objects.find(&at_point, point, 1) else { continue };
        if !ROCKFALL_IDS.contains(&rock.id) {
            continue;
        }
        debug!(%point, "mining rockfall");
        agent.interact(&rock, "Mine");
        let cleared = ctx.wait(
            || objects.find(&|o| ROCKFALL_IDS.contains(&o.id) && o.position == point, point, 1).is_none(),
            DEFAULT_WAIT_MS,
        );
        return if cleared { ObstacleOutcome::Handled } else { ObstacleOutcome::NotHandled };
    }
    ObstacleOutcome::NotHandled
}
