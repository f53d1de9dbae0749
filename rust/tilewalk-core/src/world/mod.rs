//! Interfaces to the live game client. The walker only ever talks to the world through these.

use std::sync::Arc;

use crate::graph::TileGraph;
use crate::models::{ItemId, TilePosition};
use crate::transport::AgentProfile;

pub mod clock;

pub use clock::{Clock, SystemClock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Wall-attached object; `orientation` uses the `graph::movement` direction codes.
    Wall { orientation: i32 },
    Game,
    Ground,
    Npc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldObject {
    pub id: i32,
    pub name: String,
    pub actions: Vec<String>,
    pub position: TilePosition,
    pub kind: ObjectKind,
    pub size_x: i32,
    pub size_y: i32,
}

impl WorldObject {
    pub fn new(id: i32, name: &str, position: TilePosition, kind: ObjectKind) -> Self {
        Self { id, name: name.to_string(), actions: Vec::new(), position, kind, size_x: 1, size_y: 1 }
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a.eq_ignore_ascii_case(action))
    }

    /// First offered action starting with `prefix`, case-insensitive.
    pub fn action_starting_with(&self, prefix: &str) -> Option<&str> {
        let prefix = prefix.to_ascii_lowercase();
        self.actions
            .iter()
            .find(|a| a.to_ascii_lowercase().starts_with(&prefix))
            .map(String::as_str)
    }

    pub fn is_wall(&self) -> bool {
        matches!(self.kind, ObjectKind::Wall { .. })
    }
}

pub trait WorldObjectLookup: Send + Sync {
    /// Nearest object within `radius` of `near` accepted by `predicate`.
    fn find(&self, predicate: &dyn Fn(&WorldObject) -> bool, near: TilePosition, radius: i32) -> Option<WorldObject>;
}

pub trait AgentActions: Send + Sync {
    fn position(&self) -> TilePosition;
    fn is_animating(&self) -> bool;
    fn is_moving(&self) -> bool;
    fn pose_animation(&self) -> i32;
    fn has_graphic(&self, graphic_id: i32) -> bool;

    /// Coarse move order (minimap click).
    fn move_toward(&self, tile: TilePosition);
    /// Exact move order (scene click) for short hops onto a specific tile.
    fn move_precise(&self, tile: TilePosition);

    fn interact(&self, target: &WorldObject, action: &str) -> bool;
    fn use_item(&self, item: ItemId, action: &str) -> bool;
    fn cast_spell(&self, spell: &str, option: &str) -> bool;

    fn item_actions(&self, item: ItemId) -> Vec<String>;
    /// Carried or worn.
    fn has_item(&self, item: ItemId) -> bool;
    /// Any carried or worn item whose name contains `fragment`, case-insensitive.
    fn has_item_named(&self, fragment: &str) -> bool;
    fn is_equipped(&self, item: ItemId) -> bool;
    fn equipped_weapon(&self) -> Option<ItemId>;
    fn equip(&self, item: ItemId) -> bool;

    fn skill_level(&self, skill: &str) -> i32;
    fn has_unlock(&self, key: &str) -> bool;
    fn in_instance(&self) -> bool;

    /// Snapshot used to filter the catalog.
    fn profile(&self) -> AgentProfile;
}

/// Travel interfaces the executors drive besides plain dialogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    CharterMenu,
    QuetzalMap,
    GliderMap,
    SpiritTreeMenu,
    FairyRingDial,
    Minigame,
    CanoeShaping,
    CanoeDestinations,
    AdventureLog,
}

pub trait DialogueSurface: Send + Sync {
    fn is_open(&self) -> bool;
    fn text(&self) -> String;
    fn options(&self) -> Vec<String>;
    fn click_option(&self, fragment: &str) -> bool;
    fn click_continue(&self) -> bool;
    fn close(&self) -> bool;

    fn has_option(&self, fragment: &str) -> bool {
        let needle = fragment.to_ascii_lowercase();
        self.options().iter().any(|o| o.to_ascii_lowercase().contains(&needle))
    }

    fn is_surface_open(&self, surface: Surface) -> bool;
    fn open_surface(&self, surface: Surface) -> bool;
    fn select_destination(&self, surface: Surface, label: &str) -> bool;

    /// Current rotation of a fairy-ring dial slot (0..2048), if the dial is open.
    fn dial_rotation(&self, slot: usize) -> Option<i32>;
    fn rotate_dial(&self, slot: usize, clockwise: bool) -> bool;
    fn confirm_dial(&self) -> bool;
}

/// Every collaborator the walker needs, shared.
#[derive(Clone)]
pub struct Environment {
    pub graph: Arc<dyn TileGraph>,
    pub objects: Arc<dyn WorldObjectLookup>,
    pub agent: Arc<dyn AgentActions>,
    pub dialogue: Arc<dyn DialogueSurface>,
    pub clock: Arc<dyn Clock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_lookup_ignores_case() {
        let door = WorldObject::new(1530, "Door", TilePosition::new(1, 1, 0), ObjectKind::Wall { orientation: 2 })
            .with_actions(["Open", "Pick-lock"]);
        assert!(door.has_action("open"));
        assert_eq!(door.action_starting_with("pick"), Some("Pick-lock"));
        assert!(door.is_wall());
        assert_eq!(door.action_starting_with("pay-toll"), None);
    }
}
