use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, WalkError};
use crate::graph::movement::{Movement, MOVEMENT_ORDER};
use crate::graph::reach_cache::ReachCache;
use crate::graph::{bfs_reachable, TileGraph};
use crate::models::{Area, TilePosition};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallSpec {
    pub tile: TilePosition,
    /// Blocked exit directions, see `graph::movement` bit layout.
    pub mask: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardZone {
    pub area: Area,
    pub level: i32,
}

/// On-disk description of a rectangular world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub min_x: i32,
    pub min_y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_planes")]
    pub planes: i32,
    #[serde(default)]
    pub blocked: Vec<TilePosition>,
    #[serde(default)]
    pub walls: Vec<WallSpec>,
    #[serde(default)]
    pub hazard_zones: Vec<HazardZone>,
    #[serde(default)]
    pub restricted_zones: Vec<Area>,
    #[serde(default)]
    pub banks: Vec<TilePosition>,
}

fn default_planes() -> i32 {
    1
}

impl GridSpec {
    /// Open single-plane rectangle; fill in the other fields with struct update syntax.
    pub fn rect(min_x: i32, min_y: i32, width: i32, height: i32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
            planes: 1,
            blocked: Vec::new(),
            walls: Vec::new(),
            hazard_zones: Vec::new(),
            restricted_zones: Vec::new(),
            banks: Vec::new(),
        }
    }
}

/// In-memory 8-directional collision grid. Diagonal steps need both flanking cardinal steps.
pub struct GridGraph {
    spec: GridSpec,
    blocked: HashSet<TilePosition>,
    walls: HashMap<TilePosition, u32>,
    reach: ReachCache,
}

impl GridGraph {
    pub fn new(spec: GridSpec) -> Result<Self> {
        if spec.width <= 0 || spec.height <= 0 || spec.planes <= 0 {
            return Err(WalkError::InvalidGrid(format!(
                "dimensions must be positive, got {}x{}x{}",
                spec.width, spec.height, spec.planes
            )));
        }
        let blocked = spec.blocked.iter().copied().collect();
        let mut walls: HashMap<TilePosition, u32> = HashMap::new();
        for w in &spec.walls {
            *walls.entry(w.tile).or_default() |= w.mask;
        }
        Ok(Self { spec, blocked, walls, reach: ReachCache::default() })
    }

    /// Fully open single-plane grid.
    pub fn open(min_x: i32, min_y: i32, width: i32, height: i32) -> Result<Self> {
        Self::new(GridSpec::rect(min_x, min_y, width, height))
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let spec: GridSpec = serde_json::from_reader(reader)?;
        Self::new(spec)
    }

    pub fn from_json_file<P: AsRef<FsPath>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        let g = Self::from_json_reader(BufReader::new(f))?;
        info!(path=%path.as_ref().display(), width=g.spec.width, height=g.spec.height, blocked=g.blocked.len(), "loaded grid");
        Ok(g)
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn banks(&self) -> &[TilePosition] {
        &self.spec.banks
    }

    pub fn reach_cache(&self) -> &ReachCache {
        &self.reach
    }

    fn in_bounds(&self, t: TilePosition) -> bool {
        t.x >= self.spec.min_x
            && t.y >= self.spec.min_y
            && t.x < self.spec.min_x + self.spec.width
            && t.y < self.spec.min_y + self.spec.height
            && t.plane >= 0
            && t.plane < self.spec.planes
    }

    fn wall_blocks(&self, from: TilePosition, m: Movement) -> bool {
        let to = m.apply(from);
        let out = self.walls.get(&from).copied().unwrap_or(0);
        let inn = self.walls.get(&to).copied().unwrap_or(0);
        out & m.bit != 0 || inn & m.opposite().bit != 0
    }

    fn can_step(&self, from: TilePosition, m: Movement) -> bool {
        let to = m.apply(from);
        if !self.is_walkable(to) || self.wall_blocks(from, m) {
            return false;
        }
        if !m.is_diagonal() {
            return true;
        }
        let horiz = from.offset(m.dx, 0);
        let vert = from.offset(0, m.dy);
        self.is_walkable(horiz)
            && self.is_walkable(vert)
            && !self.wall_blocks_between(from, horiz)
            && !self.wall_blocks_between(from, vert)
            && !self.wall_blocks_between(horiz, to)
            && !self.wall_blocks_between(vert, to)
    }

    fn wall_blocks_between(&self, a: TilePosition, b: TilePosition) -> bool {
        match crate::graph::movement::between(a, b) {
            Some(m) => self.wall_blocks(a, m),
            None => true,
        }
    }
}

impl TileGraph for GridGraph {
    fn is_walkable(&self, tile: TilePosition) -> bool {
        self.in_bounds(tile) && !self.blocked.contains(&tile)
    }

    fn neighbors(&self, tile: TilePosition) -> Vec<TilePosition> {
        MOVEMENT_ORDER.iter().filter(|m| self.can_step(tile, **m)).map(|m| m.apply(tile)).collect()
    }

    fn reachable_tiles(&self, from: TilePosition, radius: i32) -> HashMap<TilePosition, i32> {
        let map = self.reach.get_or_compute(from, radius, || bfs_reachable(|t| self.neighbors(t), from, radius));
        (*map).clone()
    }

    fn hazard_level(&self, tile: TilePosition) -> i32 {
        self.spec
            .hazard_zones
            .iter()
            .filter(|z| z.area.contains(tile))
            .map(|z| z.level)
            .max()
            .unwrap_or(0)
    }

    fn is_restricted_zone(&self, tile: TilePosition) -> bool {
        self.spec.restricted_zones.iter().any(|a| a.contains(tile))
    }
}
