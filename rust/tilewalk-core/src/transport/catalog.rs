use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path as FsPath;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::db::open::DbOpenConfig;
use crate::errors::Result;
use crate::models::{ItemId, TilePosition};
use crate::transport::requirements::{AgentProfile, RequirementEvaluator};
use crate::transport::{Transport, TransportKind};

/// Known special edges, bucketed by origin tile. Origin-less edges live in the "anywhere" bucket.
#[derive(Clone, Debug, Default)]
pub struct TransportCatalog {
    by_origin: IndexMap<TilePosition, Vec<Transport>>,
    anywhere: Vec<Transport>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<Transport>),
    Wrapped { transports: Vec<Transport> },
}

impl TransportCatalog {
    pub fn new<I: IntoIterator<Item = Transport>>(transports: I) -> Result<Self> {
        let mut cat = TransportCatalog::default();
        for t in transports {
            t.validate()?;
            cat.insert(t);
        }
        Ok(cat)
    }

    pub fn empty() -> Self {
        TransportCatalog::default()
    }

    fn insert(&mut self, t: Transport) {
        match t.origin {
            Some(o) => self.by_origin.entry(o).or_default().push(t),
            None => self.anywhere.push(t),
        }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let parsed: CatalogFile = serde_json::from_reader(reader)?;
        let list = match parsed {
            CatalogFile::List(v) => v,
            CatalogFile::Wrapped { transports } => transports,
        };
        Self::new(list)
    }

    pub fn from_json_file<P: AsRef<FsPath>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        let cat = Self::from_json_reader(BufReader::new(f))?;
        info!(path=%path.as_ref().display(), transports=cat.len(), "loaded transport catalog (json)");
        Ok(cat)
    }

    pub fn load_sqlite<P: AsRef<FsPath>>(path: P, cfg: &DbOpenConfig) -> Result<Self> {
        let conn = crate::db::open::open_read_only_with_config(path.as_ref(), cfg)?;
        let rows = crate::db::load_transports(&conn)?;
        let cat = Self::new(rows)?;
        info!(path=%path.as_ref().display(), transports=cat.len(), "loaded transport catalog (sqlite)");
        Ok(cat)
    }

    /// Picks the loader by file extension: `.json` is JSON, anything else SQLite.
    pub fn load<P: AsRef<FsPath>>(path: P) -> Result<Self> {
        let is_json = path
            .as_ref()
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_file(path)
        } else {
            Self::load_sqlite(path, &DbOpenConfig::from_env())
        }
    }

    /// Edges leaving exactly this tile.
    pub fn at(&self, tile: TilePosition) -> &[Transport] {
        self.by_origin.get(&tile).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn anywhere(&self) -> &[Transport] {
        &self.anywhere
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transport> {
        self.by_origin.values().flatten().chain(self.anywhere.iter())
    }

    pub fn len(&self) -> usize {
        self.by_origin.values().map(|v| v.len()).sum::<usize>() + self.anywhere.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subset the given agent can use right now.
    pub fn usable_by(&self, profile: &AgentProfile) -> TransportCatalog {
        let ev = RequirementEvaluator::new(profile);
        let kept = self.filtered(|t| profile.has_any_item_set(&t.item_requirements) && ev.satisfies_all(&t.requirements));
        debug!(total = self.len(), usable = kept.len(), "filtered catalog by profile");
        kept
    }

    /// Drops teleports and item-bound edges; used for the safe search in restricted zones.
    pub fn without_teleports(&self) -> TransportCatalog {
        self.filtered(|t| !t.kind.is_teleport() && !t.kind.requires_items())
    }

    pub fn filtered<F: Fn(&Transport) -> bool>(&self, keep: F) -> TransportCatalog {
        let mut out = TransportCatalog::default();
        for t in self.iter().filter(|t| keep(t)) {
            out.insert(t.clone());
        }
        out
    }

    /// Item ids needed by the given transports that the profile does not carry.
    pub fn missing_items<'a, I>(transports: I, profile: &AgentProfile) -> BTreeSet<ItemId>
    where
        I: IntoIterator<Item = &'a Transport>,
    {
        let mut missing = BTreeSet::new();
        for t in transports {
            if t.item_requirements.is_empty() || profile.has_any_item_set(&t.item_requirements) {
                continue;
            }
            // first alternative set is the canonical one to fetch
            if let Some(set) = t.item_requirements.first() {
                missing.extend(set.iter().filter(|id| !profile.items.contains(id)).copied());
            }
        }
        missing
    }

    pub fn count_by_kind(&self, kind: TransportKind) -> usize {
        self.iter().filter(|t| t.kind == kind).count()
    }
}
