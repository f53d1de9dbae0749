//! Scripted world for walker tests: an open grid, an agent that takes one step toward its last move
//! order every time the clock sleeps, and a virtual clock that also yields real time so the path worker
//! can run. Interactions, item uses, spells and travel surfaces do nothing unless a test scripts them.
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tilewalk_core::cost::CostModel;
use tilewalk_core::graph::{GridGraph, TileGraph};
use tilewalk_core::models::{ItemId, TilePosition};
use tilewalk_core::options::SearchOptions;
use tilewalk_core::world::{
    AgentActions, Clock, DialogueSurface, Environment, Surface, WorldObject, WorldObjectLookup,
};
use tilewalk_core::{
    AStarPathfinder, AgentProfile, GridSpec, PathfindingService, TransportCatalog, Walker, WalkerConfig,
};

pub fn t(x: i32, y: i32) -> TilePosition {
    TilePosition::new(x, y, 0)
}

/// What a scripted interaction or menu choice does to the world.
#[derive(Clone, Debug)]
pub enum Effect {
    MoveTo(TilePosition),
    Open(Surface),
    Remove(i32),
    Spawn(WorldObject),
    SetActions(i32, Vec<String>),
}

struct AgentState {
    position: TilePosition,
    goal: Option<TilePosition>,
    frozen: bool,
    items: BTreeSet<ItemId>,
    equipped: BTreeSet<ItemId>,
    item_names: Vec<String>,
    skills: HashMap<String, i32>,
    interactions: Vec<(i32, String)>,
    item_uses: Vec<(ItemId, String)>,
    casts: Vec<(String, String)>,
    move_orders: Vec<TilePosition>,
    nudges: usize,
}

impl AgentState {
    fn at(position: TilePosition) -> Self {
        Self {
            position,
            goal: None,
            frozen: false,
            items: BTreeSet::new(),
            equipped: BTreeSet::new(),
            item_names: Vec::new(),
            skills: HashMap::new(),
            interactions: Vec::new(),
            item_uses: Vec::new(),
            casts: Vec::new(),
            move_orders: Vec::new(),
            nudges: 0,
        }
    }
}

#[derive(Default)]
struct Surfaces {
    open: HashSet<Surface>,
    /// (surface, lowercased label) to what choosing it does.
    choices: HashMap<(Surface, String), Vec<Effect>>,
    selections: Vec<(Surface, String)>,
    dial: [i32; 3],
    /// Dial rotations to the tile the ring sends the agent to.
    rings: HashMap<[i32; 3], TilePosition>,
}

type StepHook = Box<dyn FnMut(TilePosition) + Send>;

pub struct FakeWorld {
    pub graph: Arc<GridGraph>,
    agent: Mutex<AgentState>,
    objects: Mutex<Vec<WorldObject>>,
    /// (object id, lowercased action) to its effects.
    interaction_effects: Mutex<HashMap<(i32, String), Vec<Effect>>>,
    item_actions: Mutex<HashMap<ItemId, Vec<String>>>,
    /// (item, lowercased action) to the landing tile.
    item_effects: Mutex<HashMap<(ItemId, String), TilePosition>>,
    /// (lowercased spell, lowercased option) to the landing tile.
    spells: Mutex<HashMap<(String, String), TilePosition>>,
    surfaces: Mutex<Surfaces>,
    on_step: Mutex<Option<StepHook>>,
    now: AtomicU64,
}

impl FakeWorld {
    pub fn new(graph: GridGraph, start: TilePosition) -> Arc<Self> {
        Arc::new(Self {
            graph: Arc::new(graph),
            agent: Mutex::new(AgentState::at(start)),
            objects: Mutex::new(Vec::new()),
            interaction_effects: Mutex::new(HashMap::new()),
            item_actions: Mutex::new(HashMap::new()),
            item_effects: Mutex::new(HashMap::new()),
            spells: Mutex::new(HashMap::new()),
            surfaces: Mutex::new(Surfaces::default()),
            on_step: Mutex::new(None),
            now: AtomicU64::new(0),
        })
    }

    pub fn open(width: i32, height: i32, start: TilePosition) -> Arc<Self> {
        Self::new(GridGraph::open(0, 0, width, height).expect("grid"), start)
    }

    /// Open grid cut by a fully blocked column at `wall_x`, so only a catalog edge crosses it.
    pub fn walled(width: i32, height: i32, wall_x: i32, start: TilePosition) -> Arc<Self> {
        let blocked = (0..height).map(|y| t(wall_x, y)).collect();
        let spec = GridSpec { blocked, ..GridSpec::rect(0, 0, width, height) };
        Self::new(GridGraph::new(spec).expect("grid"), start)
    }

    pub fn add_object(&self, object: WorldObject) {
        self.objects.lock().push(object);
    }

    /// Interacting with `id` using `action` moves the agent to `lands_on`.
    pub fn on_interact(&self, id: i32, action: &str, lands_on: TilePosition) {
        self.script_interact(id, action, vec![Effect::MoveTo(lands_on)]);
    }

    pub fn script_interact(&self, id: i32, action: &str, effects: Vec<Effect>) {
        self.interaction_effects.lock().insert((id, action.to_ascii_lowercase()), effects);
    }

    /// Choosing `label` on `surface` (while it is open) closes it and applies `effects`.
    pub fn script_choice(&self, surface: Surface, label: &str, effects: Vec<Effect>) {
        self.surfaces.lock().choices.insert((surface, label.to_ascii_lowercase()), effects);
    }

    /// A carried item offering `actions`; using it with `action` lands the agent on `lands_on`.
    pub fn script_item(&self, item: ItemId, actions: &[&str], action: &str, lands_on: TilePosition) {
        self.give_items([item]);
        self.item_actions.lock().insert(item, actions.iter().map(|a| a.to_string()).collect());
        self.item_effects.lock().insert((item, action.to_ascii_lowercase()), lands_on);
    }

    pub fn script_spell(&self, spell: &str, option: &str, lands_on: TilePosition) {
        self.spells.lock().insert((spell.to_ascii_lowercase(), option.to_ascii_lowercase()), lands_on);
    }

    /// Confirming the dial at these rotations sends the agent to `lands_on`.
    pub fn script_ring(&self, rotations: [i32; 3], lands_on: TilePosition) {
        self.surfaces.lock().rings.insert(rotations, lands_on);
    }

    /// Called with the agent's position after every step it takes.
    pub fn on_step<F: FnMut(TilePosition) + Send + 'static>(&self, hook: F) {
        *self.on_step.lock() = Some(Box::new(hook));
    }

    pub fn freeze(&self) {
        self.agent.lock().frozen = true;
    }

    pub fn give_items<I: IntoIterator<Item = ItemId>>(&self, items: I) {
        self.agent.lock().items.extend(items);
    }

    pub fn give_named_item(&self, name: &str) {
        self.agent.lock().item_names.push(name.to_string());
    }

    pub fn set_skill(&self, skill: &str, level: i32) {
        self.agent.lock().skills.insert(skill.to_ascii_lowercase(), level);
    }

    pub fn interactions(&self) -> Vec<(i32, String)> {
        self.agent.lock().interactions.clone()
    }

    pub fn item_uses(&self) -> Vec<(ItemId, String)> {
        self.agent.lock().item_uses.clone()
    }

    pub fn casts(&self) -> Vec<(String, String)> {
        self.agent.lock().casts.clone()
    }

    pub fn selections(&self) -> Vec<(Surface, String)> {
        self.surfaces.lock().selections.clone()
    }

    pub fn dial(&self) -> [i32; 3] {
        self.surfaces.lock().dial
    }

    pub fn equipped(&self, item: ItemId) -> bool {
        self.agent.lock().equipped.contains(&item)
    }

    pub fn agent_position(&self) -> TilePosition {
        self.agent.lock().position
    }

    pub fn move_orders(&self) -> usize {
        self.agent.lock().move_orders.len()
    }

    pub fn nudges(&self) -> usize {
        self.agent.lock().nudges
    }

    pub fn virtual_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn apply(&self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::MoveTo(dest) => {
                    let mut a = self.agent.lock();
                    a.position = *dest;
                    a.goal = None;
                }
                Effect::Open(surface) => {
                    self.surfaces.lock().open.insert(*surface);
                }
                Effect::Remove(id) => self.objects.lock().retain(|o| o.id != *id),
                Effect::Spawn(object) => self.objects.lock().push(object.clone()),
                Effect::SetActions(id, actions) => {
                    for o in self.objects.lock().iter_mut().filter(|o| o.id == *id) {
                        o.actions = actions.clone();
                    }
                }
            }
        }
    }

    fn step_agent(&self) {
        let stepped = {
            let mut a = self.agent.lock();
            let Some(goal) = a.goal else { return };
            if a.frozen || a.position == goal {
                return;
            }
            let here = a.position;
            let next = self
                .graph
                .neighbors(here)
                .into_iter()
                .min_by_key(|n| (n.distance_to(goal), n.x, n.y))
                .filter(|n| n.distance_to(goal) < here.distance_to(goal));
            match next {
                Some(n) => {
                    a.position = n;
                    Some(n)
                }
                None => {
                    a.goal = None;
                    None
                }
            }
        };
        if let Some(position) = stepped {
            if let Some(hook) = self.on_step.lock().as_mut() {
                hook(position);
            }
        }
    }

    pub fn environment(self: &Arc<Self>) -> Environment {
        Environment {
            graph: self.graph.clone(),
            objects: self.clone(),
            agent: self.clone(),
            dialogue: self.clone(),
            clock: self.clone(),
        }
    }
}

impl Clock for FakeWorld {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, min_ms: u64, _max_ms: u64) {
        self.now.fetch_add(min_ms.max(1), Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        self.step_agent();
    }
}

impl WorldObjectLookup for FakeWorld {
    fn find(&self, predicate: &dyn Fn(&WorldObject) -> bool, near: TilePosition, radius: i32) -> Option<WorldObject> {
        self.objects
            .lock()
            .iter()
            .filter(|o| o.position.distance_to(near) <= radius && predicate(o))
            .min_by_key(|o| o.position.distance_to(near))
            .cloned()
    }
}

impl AgentActions for FakeWorld {
    fn position(&self) -> TilePosition {
        self.agent.lock().position
    }

    fn is_animating(&self) -> bool {
        false
    }

    fn is_moving(&self) -> bool {
        let a = self.agent.lock();
        !a.frozen && a.goal.map_or(false, |g| g != a.position)
    }

    fn pose_animation(&self) -> i32 {
        808
    }

    fn has_graphic(&self, _graphic_id: i32) -> bool {
        false
    }

    fn move_toward(&self, tile: TilePosition) {
        let mut a = self.agent.lock();
        if a.position.distance_to(tile) <= 5 && a.goal.map_or(true, |g| g.distance_to(tile) > 0) {
            a.nudges += 1;
        }
        a.move_orders.push(tile);
        a.goal = Some(tile);
    }

    fn move_precise(&self, tile: TilePosition) {
        let mut a = self.agent.lock();
        a.move_orders.push(tile);
        a.goal = Some(tile);
    }

    fn interact(&self, target: &WorldObject, action: &str) -> bool {
        self.agent.lock().interactions.push((target.id, action.to_string()));
        let effects = self.interaction_effects.lock().get(&(target.id, action.to_ascii_lowercase())).cloned();
        if let Some(effects) = effects {
            self.apply(&effects);
        }
        true
    }

    fn use_item(&self, item: ItemId, action: &str) -> bool {
        {
            let mut a = self.agent.lock();
            if !a.items.contains(&item) && !a.equipped.contains(&item) {
                return false;
            }
            a.item_uses.push((item, action.to_string()));
        }
        let dest = self.item_effects.lock().get(&(item, action.to_ascii_lowercase())).copied();
        match dest {
            Some(dest) => {
                self.apply(&[Effect::MoveTo(dest)]);
                true
            }
            None => false,
        }
    }

    fn cast_spell(&self, spell: &str, option: &str) -> bool {
        self.agent.lock().casts.push((spell.to_string(), option.to_string()));
        let dest = self.spells.lock().get(&(spell.to_ascii_lowercase(), option.to_ascii_lowercase())).copied();
        match dest {
            Some(dest) => {
                self.apply(&[Effect::MoveTo(dest)]);
                true
            }
            None => false,
        }
    }

    fn item_actions(&self, item: ItemId) -> Vec<String> {
        self.item_actions.lock().get(&item).cloned().unwrap_or_default()
    }

    fn has_item(&self, item: ItemId) -> bool {
        let a = self.agent.lock();
        a.items.contains(&item) || a.equipped.contains(&item)
    }

    fn has_item_named(&self, fragment: &str) -> bool {
        let needle = fragment.to_ascii_lowercase();
        self.agent.lock().item_names.iter().any(|n| n.to_ascii_lowercase().contains(&needle))
    }

    fn is_equipped(&self, item: ItemId) -> bool {
        self.agent.lock().equipped.contains(&item)
    }

    fn equipped_weapon(&self) -> Option<ItemId> {
        self.agent.lock().equipped.iter().next().copied()
    }

    fn equip(&self, item: ItemId) -> bool {
        let mut a = self.agent.lock();
        if !a.items.remove(&item) {
            return false;
        }
        a.equipped.insert(item);
        true
    }

    fn skill_level(&self, skill: &str) -> i32 {
        self.agent.lock().skills.get(&skill.to_ascii_lowercase()).copied().unwrap_or(1)
    }

    fn has_unlock(&self, _key: &str) -> bool {
        false
    }

    fn in_instance(&self) -> bool {
        false
    }

    fn profile(&self) -> AgentProfile {
        let a = self.agent.lock();
        AgentProfile::with_items(a.items.iter().chain(a.equipped.iter()).copied())
    }
}

impl DialogueSurface for FakeWorld {
    fn is_open(&self) -> bool {
        false
    }

    fn text(&self) -> String {
        String::new()
    }

    fn options(&self) -> Vec<String> {
        Vec::new()
    }

    fn click_option(&self, _fragment: &str) -> bool {
        false
    }

    fn click_continue(&self) -> bool {
        false
    }

    fn close(&self) -> bool {
        true
    }

    fn is_surface_open(&self, surface: Surface) -> bool {
        self.surfaces.lock().open.contains(&surface)
    }

    fn open_surface(&self, surface: Surface) -> bool {
        self.surfaces.lock().open.insert(surface);
        true
    }

    fn select_destination(&self, surface: Surface, label: &str) -> bool {
        let effects = {
            let mut s = self.surfaces.lock();
            if !s.open.contains(&surface) {
                return false;
            }
            let Some(effects) = s.choices.get(&(surface, label.to_ascii_lowercase())).cloned() else {
                return false;
            };
            s.open.remove(&surface);
            s.selections.push((surface, label.to_string()));
            effects
        };
        self.apply(&effects);
        true
    }

    fn dial_rotation(&self, slot: usize) -> Option<i32> {
        let s = self.surfaces.lock();
        if !s.open.contains(&Surface::FairyRingDial) {
            return None;
        }
        s.dial.get(slot).copied()
    }

    fn rotate_dial(&self, slot: usize, clockwise: bool) -> bool {
        let mut s = self.surfaces.lock();
        let Some(r) = s.dial.get_mut(slot) else {
            return false;
        };
        *r = (*r + if clockwise { -512 } else { 512 }).rem_euclid(2048);
        true
    }

    fn confirm_dial(&self) -> bool {
        let dest = {
            let mut s = self.surfaces.lock();
            if !s.open.remove(&Surface::FairyRingDial) {
                return false;
            }
            s.rings.get(&s.dial).copied()
        };
        if let Some(dest) = dest {
            self.apply(&[Effect::MoveTo(dest)]);
        }
        true
    }
}

/// Short waits keep scenario tests fast; polling and hop sizes stay at their defaults.
pub fn fast_config() -> WalkerConfig {
    WalkerConfig { hop_wait_ms: 1_500, final_hop_wait_ms: 1_500, ..WalkerConfig::default() }
}

pub fn walker(world: &Arc<FakeWorld>, catalog: TransportCatalog, config: WalkerConfig) -> Walker {
    let env = world.environment();
    let pathfinder = Arc::new(AStarPathfinder::new(env.graph.clone(), CostModel::new(SearchOptions::default())));
    let paths = PathfindingService::new(pathfinder, env.graph.clone(), catalog.clone()).expect("path service");
    Walker::new(env, Arc::new(paths), catalog, config)
}
