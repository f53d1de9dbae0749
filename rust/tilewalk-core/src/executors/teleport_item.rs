//! Jewellery, tablets, capes and other teleport items.

use tracing::debug;

use super::{ExecContext, DEFAULT_WAIT_MS};
use crate::models::ItemId;
use crate::transport::{SubDestination, Transport};
use crate::world::Surface;

/// Place names that show up verbatim in item menu actions ("Edgeville", "Castle Wars", ...).
const LOCATION_KEYWORDS: &[&str] = &[
    "farm", "monastery", "lletya", "prifddinas", "rellekka", "waterbirth", "neitiznot", "jatiszo", "ver sinhaza",
    "darkmeyer", "slepe", "troll stronghold", "weiss", "ecto", "burgh", "duradel", "gem mine", "nardah",
    "kalphite cave", "kourend woodland", "mount karuulm", "outside", "fishing guild", "otto", "stronghold slayer",
    "slayer tower", "fremennik", "tarn's lair", "dark beasts", "chasm of fire", "kraken cove", "edgeville",
    "karamja", "draynor", "al kharid", "castle wars", "duel arena", "ferox enclave", "clan wars", "warriors guild",
    "champions guild", "ranging guild", "barbarian", "corporeal", "camelot", "ardougne", "yanille",
    "varrock", "lumbridge", "falador", "seers", "catherby", "grand exchange", "cooking guild", "crafting guild",
    "wintertodt", "tithe farm", "zul-andra", "feldip hills", "miscellania", "grand tree", "gnome stronghold",
];

/// Verbs tried, in order, when no keyword matches.
const GENERIC_VERBS: &[&str] =
    &["invoke", "empty", "consume", "teleport", "rub", "break", "reminisce", "signal", "play", "commune", "squash"];

const FOLLOW_UP_WAIT_MS: u64 = 2_000;
const ARRIVAL_WAIT_MS: u64 = 8_000;

pub(super) fn run(ctx: &ExecContext<'_>, t: &Transport) -> bool {
    let sub = t.sub_destination();
    let agent = &ctx.env.agent;
    for set in &t.item_requirements {
        if !set.iter().all(|&item| agent.has_item(item)) {
            continue;
        }
        for &item in set {
            let used = if agent.is_equipped(item) {
                worn_teleport(ctx, t, item, &sub)
            } else {
                carried_teleport(ctx, t, item, &sub)
            };
            if used {
                ctx.wait_not_animating(DEFAULT_WAIT_MS);
                return ctx.wait_within_2d(t.destination, ctx.offset(), ARRIVAL_WAIT_MS);
            }
        }
    }
    debug!(selector = %t.display_selector, "no usable teleport item");
    false
}

/// Chooses the menu action of a carried item for this sub-destination.
pub fn choose_action(actions: &[String], sub: &SubDestination) -> Option<String> {
    let lowered: Vec<String> = actions.iter().map(|a| a.to_ascii_lowercase()).collect();
    if sub.menu_index.is_some() {
        // numbered rows ("2. Edgeville") are invoked by their full text
        return Some(sub.label.clone());
    }
    let destination = sub.option.as_deref().unwrap_or(&sub.label).to_ascii_lowercase();
    let keyword_hit = lowered.iter().position(|action| {
        LOCATION_KEYWORDS.iter().any(|kw| action.contains(kw) && (!sub.has_option() || destination.contains(kw)))
    });
    if let Some(idx) = keyword_hit {
        return Some(actions[idx].clone());
    }
    GENERIC_VERBS
        .iter()
        .find_map(|verb| lowered.iter().position(|a| a.contains(verb)))
        .map(|idx| actions[idx].clone())
}

fn carried_teleport(ctx: &ExecContext<'_>, t: &Transport, item: ItemId, sub: &SubDestination) -> bool {
    let agent = &ctx.env.agent;
    let dialogue = &ctx.env.dialogue;
    let Some(action) = choose_action(&agent.item_actions(item), sub) else {
        return false;
    };
    if !agent.use_item(item, &action) {
        return false;
    }
    let verb = action.to_ascii_lowercase();
    let selector = t.display_selector.to_ascii_lowercase();
    let destination = sub.option.as_deref().unwrap_or(&sub.label);

    if verb == "rub" && (selector.contains("skills necklace") || selector.contains("xeric")) {
        if ctx.wait(|| dialogue.is_surface_open(Surface::AdventureLog), FOLLOW_UP_WAIT_MS) {
            return dialogue.select_destination(Surface::AdventureLog, destination);
        }
        return false;
    }
    if selector.contains("burning amulet") {
        if ctx.wait_option(destination, FOLLOW_UP_WAIT_MS) {
            dialogue.click_option(destination);
        }
        if ctx.wait_option("Okay, teleport to level", FOLLOW_UP_WAIT_MS) {
            dialogue.click_option("Okay, teleport to level");
        }
        return true;
    }
    if verb == "teleport" && selector.contains("revenant") {
        if ctx.wait_option("Yes, teleport me now", FOLLOW_UP_WAIT_MS) {
            dialogue.click_option("Yes, teleport me now");
        }
        return true;
    }
    if (verb == "teleport" && selector.contains("slayer ring")) || verb == "rub" || verb == "reminisce" {
        if ctx.wait_any_option(FOLLOW_UP_WAIT_MS) {
            return dialogue.click_option(destination);
        }
        return false;
    }
    true
}

fn worn_teleport(ctx: &ExecContext<'_>, t: &Transport, item: ItemId, sub: &SubDestination) -> bool {
    let agent = &ctx.env.agent;
    let dialogue = &ctx.env.dialogue;
    let Some(destination) = sub.option.as_deref() else {
        return false;
    };
    let selector = t.display_selector.to_ascii_lowercase();
    if selector.contains("slayer ring") {
        if !agent.use_item(item, "teleport") {
            return false;
        }
        return ctx.wait_any_option(FOLLOW_UP_WAIT_MS) && dialogue.click_option(destination);
    }
    if !agent.use_item(item, destination) {
        return false;
    }
    if selector.contains("burning amulet") && ctx.wait_option("Okay, teleport to level", FOLLOW_UP_WAIT_MS) {
        dialogue.click_option("Okay, teleport to level");
    }
    true
}
