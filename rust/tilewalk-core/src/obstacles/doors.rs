use tracing::{debug, info};

use super::{ObstacleOutcome, RiddleBook};
use crate::executors::{ExecContext, DEFAULT_WAIT_MS};
use crate::graph::movement;
use crate::models::{Path, TilePosition};
use crate::world::{ObjectKind, WorldObject};

/// Door verbs in priority order; an action matches when it starts with one of them.
pub const DOOR_ACTIONS: [&str; 5] = ["pay-toll", "pick-lock", "walk-through", "go-through", "open"];

/// Map regions whose doors ask security riddles.
pub const RIDDLE_REGIONS: [i32; 13] = [7505, 7504, 7760, 7503, 7759, 7758, 7757, 8013, 7756, 8012, 8017, 8530, 9297];

const MAX_RIDDLE_ATTEMPTS: usize = 5;
const PROBE_RADIUS: i32 = 3;

/// Highest-priority door verb among an object's actions.
pub fn door_action(object: &WorldObject) -> Option<&str> {
    object
        .actions
        .iter()
        .filter_map(|a| {
            let lower = a.to_ascii_lowercase();
            DOOR_ACTIONS.iter().position(|d| lower.starts_with(d)).map(|rank| (rank, a.as_str()))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, a)| a)
}

/// Tiles that may hold a door between `path[index]` and `path[index + 1]`.
pub fn probes(path: &Path, index: usize) -> Vec<TilePosition> {
    let (Some(from), Some(to)) = (path.get(index), path.get(index + 1)) else {
        return Vec::new();
    };
    let diagonal = from.x != to.x && from.y != to.y;
    let mut out = Vec::new();
    for door_idx in index..=index + 1 {
        let Some(door) = path.get(door_idx) else { continue };
        out.push(door);
        if diagonal {
            out.push(TilePosition::new(to.x, from.y, door.plane));
            out.push(TilePosition::new(from.x, to.y, door.plane));
        }
    }
    out
}

/// Whether `object` at `probe` is a door between `from` and `to`.
pub fn is_door_between(object: &WorldObject, probe: TilePosition, from: TilePosition, to: TilePosition) -> bool {
    match object.kind {
        ObjectKind::Wall { orientation } => {
            movement::faces_neighbor(orientation, probe, from) || movement::faces_neighbor(orientation, probe, to)
        }
        _ => object.name.to_ascii_lowercase().contains("door"),
    }
}

pub fn in_riddle_region(tile: TilePosition) -> bool {
    RIDDLE_REGIONS.contains(&tile.region_id())
}

pub fn handle(ctx: &ExecContext<'_>, riddles: &RiddleBook, path: &Path, index: usize) -> ObstacleOutcome {
    if index + 1 >= path.len() {
        return ObstacleOutcome::NotHandled;
    }
    let (Some(from), Some(to)) = (path.get(index), path.get(index + 1)) else {
        return ObstacleOutcome::NotHandled;
    };
    let plane = ctx.position().plane;
    for probe in probes(path, index) {
        if probe.plane != plane || (probe.distance_to(from) > 1 && probe.distance_to(to) > 1) {
            continue;
        }
        let objects = &ctx.env.objects;
        let found = objects
            .find(&|o| o.is_wall() && o.position == probe, probe, PROBE_RADIUS)
            .or_else(|| objects.find(&|o| o.kind == ObjectKind::Game && o.position == probe, probe, PROBE_RADIUS));
        let Some(object) = found else { continue };
        // imposter objects carry the literal name "null"
        if object.name == "null" {
            continue;
        }
        let Some(action) = door_action(&object).map(str::to_string) else { continue };
        if !is_door_between(&object, probe, from, to) {
            continue;
        }
        info!(id = object.id, %probe, action = %action, "opening door");
        if in_riddle_region(ctx.position()) {
            answer_riddle_door(ctx, riddles, &object, &action);
        } else {
            ctx.env.agent.interact(&object, &action);
            ctx.wait_not_moving(DEFAULT_WAIT_MS);
        }
        return ObstacleOutcome::Handled;
    }
    ObstacleOutcome::NotHandled
}

fn answer_riddle_door(ctx: &ExecContext<'_>, riddles: &RiddleBook, door: &WorldObject, action: &str) {
    let dialogue = &ctx.env.dialogue;
    ctx.env.agent.interact(door, action);
    // not every door asks
    if !ctx.wait_dialogue(DEFAULT_WAIT_MS) {
        return;
    }
    let mut answer = None;
    for _ in 0..MAX_RIDDLE_ATTEMPTS {
        answer = riddles.answer_for(&dialogue.text()).map(str::to_string);
        if answer.is_some() || !dialogue.is_open() {
            break;
        }
        dialogue.click_continue();
        ctx.env.clock.sleep(700, 900);
    }
    let Some(answer) = answer else {
        debug!(text = %dialogue.text(), "no riddle answer found");
        return;
    };
    dialogue.click_continue();
    if ctx.wait_any_option(DEFAULT_WAIT_MS) {
        dialogue.click_option(&answer);
    }
    ctx.wait_every(
        || {
            if dialogue.is_open() && dialogue.options().is_empty() {
                dialogue.click_continue();
            }
            !dialogue.is_open()
        },
        700,
        DEFAULT_WAIT_MS,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(x: i32, y: i32) -> TilePosition {
        TilePosition::new(x, y, 0)
    }

    #[test]
    fn action_priority() {
        let door = WorldObject::new(1, "Gate", t(0, 0), ObjectKind::Game).with_actions(["Open", "Pay-toll(10gp)"]);
        assert_eq!(door_action(&door), Some("Pay-toll(10gp)"));
        let plain = WorldObject::new(1, "Door", t(0, 0), ObjectKind::Game).with_actions(["Close"]);
        assert_eq!(door_action(&plain), None);
    }

    #[test]
    fn diagonal_step_probes_flanks() {
        let path = Path::new(vec![t(0, 0), t(1, 1), t(2, 2)]);
        let p = probes(&path, 0);
        assert!(p.contains(&t(1, 0)));
        assert!(p.contains(&t(0, 1)));
        assert_eq!(probes(&Path::new(vec![t(0, 0), t(1, 0)]), 0), vec![t(0, 0), t(1, 0)]);
    }

    #[test]
    fn wall_must_face_the_step() {
        // east wall on (0,0) blocks the step to (1,0)
        let wall = WorldObject::new(1530, "Door", t(0, 0), ObjectKind::Wall { orientation: 4 });
        assert!(is_door_between(&wall, t(0, 0), t(0, 0), t(1, 0)));
        let north = WorldObject::new(1530, "Door", t(0, 0), ObjectKind::Wall { orientation: 2 });
        assert!(!is_door_between(&north, t(0, 0), t(0, 0), t(1, 0)));
    }

    #[test]
    fn riddle_regions() {
        // region 7505 = (29 << 8) | 81
        assert!(in_riddle_region(TilePosition::new(29 * 64, 81 * 64, 0)));
        assert!(!in_riddle_region(t(3200, 3200)));
    }
}
