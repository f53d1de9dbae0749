//! Three-letter fairy ring codes dialled on a rotating widget.

use tracing::{debug, info, warn};

use super::{ExecContext, DEFAULT_WAIT_MS};
use crate::models::ItemId;
use crate::transport::Transport;
use crate::world::{ObjectKind, Surface};

pub const DRAMEN_STAFF: ItemId = 772;
pub const LUNAR_STAFF: ItemId = 9084;
pub const FAIRY_RING_GRAPHIC: i32 = 569;
/// Unlock that lets the agent use rings without a staff.
pub const STAFFLESS_UNLOCK: &str = "lumbridge_elite_diary";

const FULL_TURN: i32 = 2048;
const NOTCH: i32 = 512;
const SLOTS: usize = 3;
const TURN_WAIT_MS: u64 = 2_000;
const SETTLE_WAIT_MS: u64 = 3_000;
const TRAVEL_WAIT_MS: u64 = 10_000;

/// Letters on each dial, in rotation order.
const SLOT_LETTERS: [[char; 4]; SLOTS] = [['A', 'B', 'C', 'D'], ['I', 'J', 'K', 'L'], ['P', 'Q', 'R', 'S']];

/// Dial rotation that shows `letter` on `slot`, if that dial carries it.
pub fn letter_rotation(slot: usize, letter: char) -> Option<i32> {
    let upper = letter.to_ascii_uppercase();
    let notch = SLOT_LETTERS.get(slot)?.iter().position(|&c| c == upper)?;
    Some(notch as i32 * NOTCH)
}

/// Rotations for a three-letter code, or `None` when any letter is wrong for its slot.
pub fn code_rotations(code: &str) -> Option<Vec<i32>> {
    let letters: Vec<char> = code.trim().chars().collect();
    if letters.len() != SLOTS {
        return None;
    }
    letters.iter().enumerate().map(|(slot, &c)| letter_rotation(slot, c)).collect()
}

/// Number of notches and direction (clockwise when true) of the shorter way round.
pub fn dial_turns(current: i32, desired: i32) -> (u32, bool) {
    let anticlockwise = (desired - current).rem_euclid(FULL_TURN);
    let clockwise = (current - desired).rem_euclid(FULL_TURN);
    let turns = (clockwise.min(anticlockwise) / NOTCH) as u32;
    (turns, clockwise <= anticlockwise)
}

pub(super) fn run(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let agent = &ctx.env.agent;
    let dialogue = &ctx.env.dialogue;
    if agent.position() == t.destination {
        return false;
    }
    let Some(origin) = t.origin else {
        return false;
    };
    let Some(ring) = ctx.env.objects.find(&|o| o.kind != ObjectKind::Npc && o.position == origin, origin, 1) else {
        debug!(%origin, "no fairy ring at origin");
        return false;
    };

    let Some(rotations) = code_rotations(&t.display_selector) else {
        warn!(code = %t.display_selector, "malformed fairy ring code");
        return false;
    };

    let mut starting_weapon = None;
    if !agent.has_unlock(STAFFLESS_UNLOCK) {
        starting_weapon = agent.equipped_weapon();
        if !agent.is_equipped(DRAMEN_STAFF) && !agent.is_equipped(LUNAR_STAFF) {
            let Some(staff) = [DRAMEN_STAFF, LUNAR_STAFF].into_iter().find(|&s| agent.has_item(s)) else {
                return false;
            };
            agent.equip(staff);
            ctx.wait(|| agent.is_equipped(staff), DEFAULT_WAIT_MS);
        }
    }

    info!(code = %t.display_selector, %origin, "configuring fairy ring");
    if !agent.interact(&ring, "Configure") {
        return false;
    }
    if !ctx.wait(|| !agent.is_moving() && dialogue.is_surface_open(Surface::FairyRingDial), TRAVEL_WAIT_MS) {
        return false;
    }
    for (slot, desired) in rotations.into_iter().enumerate() {
        rotate_slot(ctx, slot, desired);
    }
    dialogue.confirm_dial();

    ctx.wait(|| agent.has_graphic(FAIRY_RING_GRAPHIC), DEFAULT_WAIT_MS);
    let arrived = ctx.wait(
        || agent.position() == t.destination && !agent.has_graphic(FAIRY_RING_GRAPHIC),
        TRAVEL_WAIT_MS,
    );

    if let Some(weapon) = starting_weapon {
        if !agent.is_equipped(weapon) {
            agent.equip(weapon);
            ctx.wait(|| agent.is_equipped(weapon), DEFAULT_WAIT_MS);
        }
    }
    arrived
}

fn rotate_slot(ctx: &ExecContext<'_>, slot: usize, desired: i32) {
    let dialogue = &ctx.env.dialogue;
    let Some(mut current) = dialogue.dial_rotation(slot) else {
        return;
    };
    let (turns, clockwise) = dial_turns(current, desired);
    for _ in 0..turns {
        let previous = current;
        dialogue.rotate_dial(slot, clockwise);
        ctx.wait(|| dialogue.dial_rotation(slot).map_or(false, |r| r != previous), TURN_WAIT_MS);
        match dialogue.dial_rotation(slot) {
            Some(r) => current = r,
            None => break,
        }
    }
    ctx.wait(|| dialogue.dial_rotation(slot) == Some(desired), SETTLE_WAIT_MS);
}
