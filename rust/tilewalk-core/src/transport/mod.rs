use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, WalkError};
use crate::models::{ItemId, TilePosition};

pub mod catalog;
pub mod requirements;
pub mod selector;

pub use catalog::TransportCatalog;
pub use requirements::{AgentProfile, Requirement, RequirementEvaluator};
pub use selector::SubDestination;

/// Closed set of special edge kinds. Every executor matches on this exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportKind {
    #[serde(alias = "TELEPORTATION_ITEM")]
    TeleportItem,
    #[serde(alias = "TELEPORTATION_SPELL")]
    TeleportSpell,
    #[serde(alias = "TELEPORTATION_MINIGAME")]
    TeleportMinigame,
    Ship,
    Boat,
    Npc,
    CharterShip,
    Canoe,
    SpiritTree,
    Quetzal,
    MagicCarpet,
    WildernessObelisk,
    GnomeGlider,
    FairyRing,
    #[serde(alias = "TRANSPORT")]
    Door,
    AgilityShortcut,
    Trapdoor,
    Minecart,
    #[serde(alias = "TELEPORTATION_PORTAL")]
    TeleportPortal,
}

impl TransportKind {
    pub const ALL: [TransportKind; 19] = [
        TransportKind::TeleportItem,
        TransportKind::TeleportSpell,
        TransportKind::TeleportMinigame,
        TransportKind::Ship,
        TransportKind::Boat,
        TransportKind::Npc,
        TransportKind::CharterShip,
        TransportKind::Canoe,
        TransportKind::SpiritTree,
        TransportKind::Quetzal,
        TransportKind::MagicCarpet,
        TransportKind::WildernessObelisk,
        TransportKind::GnomeGlider,
        TransportKind::FairyRing,
        TransportKind::Door,
        TransportKind::AgilityShortcut,
        TransportKind::Trapdoor,
        TransportKind::Minecart,
        TransportKind::TeleportPortal,
    ];

    /// Instant edges that start wherever the agent stands.
    pub fn is_teleport(self) -> bool {
        matches!(self, TransportKind::TeleportItem | TransportKind::TeleportSpell | TransportKind::TeleportMinigame)
    }

    pub fn requires_items(self) -> bool {
        matches!(self, TransportKind::TeleportItem)
    }

    pub fn is_environment_bound(self) -> bool {
        matches!(self, TransportKind::Door | TransportKind::WildernessObelisk | TransportKind::Trapdoor)
    }

    pub fn label(self) -> &'static str {
        match self {
            TransportKind::TeleportItem => "teleport_item",
            TransportKind::TeleportSpell => "teleport_spell",
            TransportKind::TeleportMinigame => "teleport_minigame",
            TransportKind::Ship => "ship",
            TransportKind::Boat => "boat",
            TransportKind::Npc => "npc",
            TransportKind::CharterShip => "charter_ship",
            TransportKind::Canoe => "canoe",
            TransportKind::SpiritTree => "spirit_tree",
            TransportKind::Quetzal => "quetzal",
            TransportKind::MagicCarpet => "magic_carpet",
            TransportKind::WildernessObelisk => "wilderness_obelisk",
            TransportKind::GnomeGlider => "gnome_glider",
            TransportKind::FairyRing => "fairy_ring",
            TransportKind::Door => "door",
            TransportKind::AgilityShortcut => "agility_shortcut",
            TransportKind::Trapdoor => "trapdoor",
            TransportKind::Minecart => "minecart",
            TransportKind::TeleportPortal => "teleport_portal",
        }
    }
}

fn default_max_hazard_level() -> i32 {
    20
}

fn default_duration() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    #[serde(default)]
    pub origin: Option<TilePosition>,
    pub destination: TilePosition,
    pub kind: TransportKind,
    #[serde(default)]
    pub object_or_npc_id: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub action_verb: String,
    #[serde(default)]
    pub display_selector: String,
    #[serde(default)]
    pub item_requirements: Vec<BTreeSet<ItemId>>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default = "default_max_hazard_level")]
    pub max_hazard_level: i32,
    #[serde(default = "default_duration")]
    pub duration: u32,
}

impl Transport {
    pub fn new(origin: Option<TilePosition>, destination: TilePosition, kind: TransportKind) -> Self {
        Self {
            origin,
            destination,
            kind,
            object_or_npc_id: None,
            name: None,
            action_verb: String::new(),
            display_selector: String::new(),
            item_requirements: Vec::new(),
            requirements: Vec::new(),
            max_hazard_level: default_max_hazard_level(),
            duration: default_duration(),
        }
    }

    pub fn with_object(mut self, id: i32, action: &str) -> Self {
        self.object_or_npc_id = Some(id);
        self.action_verb = action.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.display_selector = selector.to_string();
        self
    }

    pub fn with_items<I: IntoIterator<Item = ItemId>>(mut self, set: I) -> Self {
        self.item_requirements.push(set.into_iter().collect());
        self
    }

    pub fn with_requirement(mut self, req: Requirement) -> Self {
        self.requirements.push(req);
        self
    }

    pub fn with_duration(mut self, ticks: u32) -> Self {
        self.duration = ticks;
        self
    }

    pub fn with_max_hazard_level(mut self, level: i32) -> Self {
        self.max_hazard_level = level;
        self
    }

    pub fn sub_destination(&self) -> SubDestination {
        SubDestination::parse(&self.display_selector)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind.requires_items() && self.item_requirements.iter().all(|s| s.is_empty()) {
            return Err(WalkError::MissingItemSets { kind: self.kind, destination: self.destination.to_string() });
        }
        Ok(())
    }

    /// Every item id mentioned by any alternative set, in ascending order.
    pub fn all_item_ids(&self) -> BTreeSet<ItemId> {
        self.item_requirements.iter().flat_map(|s| s.iter().copied()).collect()
    }
}
