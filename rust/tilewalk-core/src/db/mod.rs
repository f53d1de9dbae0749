use std::collections::BTreeSet;

use rusqlite::{params, Connection, Row};

use crate::errors::{Result, WalkError};
use crate::models::{ItemId, TilePosition};
use crate::transport::{Requirement, Transport, TransportKind};

pub mod open;

pub const TRANSPORTS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transports (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    orig_x INTEGER,
    orig_y INTEGER,
    orig_plane INTEGER,
    dest_x INTEGER NOT NULL,
    dest_y INTEGER NOT NULL,
    dest_plane INTEGER NOT NULL,
    object_id INTEGER,
    name TEXT,
    action TEXT,
    display_info TEXT,
    item_requirements TEXT,
    requirements TEXT,
    max_hazard_level INTEGER,
    duration INTEGER
)";

/// Raw row as stored. JSON columns are decoded in `into_transport`.
#[derive(Clone, Debug)]
pub struct TransportRow {
    pub id: i64,
    pub kind: String,
    pub orig_x: Option<i32>,
    pub orig_y: Option<i32>,
    pub orig_plane: Option<i32>,
    pub dest_x: i32,
    pub dest_y: i32,
    pub dest_plane: i32,
    pub object_id: Option<i32>,
    pub name: Option<String>,
    pub action: Option<String>,
    pub display_info: Option<String>,
    pub item_requirements: Option<String>,
    pub requirements: Option<String>,
    pub max_hazard_level: Option<i32>,
    pub duration: Option<u32>,
}

fn is_no_such_table(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.contains("no such table"),
        _ => false,
    }
}

fn map_transport_row(r: &Row) -> rusqlite::Result<TransportRow> {
    Ok(TransportRow {
        id: r.get("id")?,
        kind: r.get("kind")?,
        orig_x: r.get("orig_x")?,
        orig_y: r.get("orig_y")?,
        orig_plane: r.get("orig_plane")?,
        dest_x: r.get("dest_x")?,
        dest_y: r.get("dest_y")?,
        dest_plane: r.get("dest_plane")?,
        object_id: r.get("object_id")?,
        name: r.get("name")?,
        action: r.get("action")?,
        display_info: r.get("display_info")?,
        item_requirements: r.get("item_requirements")?,
        requirements: r.get("requirements")?,
        max_hazard_level: r.get("max_hazard_level")?,
        duration: r.get("duration")?,
    })
}

impl TransportRow {
    pub fn into_transport(self) -> Result<Transport> {
        let kind: TransportKind = serde_json::from_value(serde_json::Value::String(self.kind.trim().to_ascii_uppercase()))
            .map_err(|_| WalkError::InvalidRow { row: self.id, reason: format!("unknown kind {:?}", self.kind) })?;
        let origin = match (self.orig_x, self.orig_y, self.orig_plane) {
            (Some(x), Some(y), Some(p)) => Some(TilePosition::new(x, y, p)),
            (None, None, None) => None,
            _ => return Err(WalkError::InvalidRow { row: self.id, reason: "partial origin".into() }),
        };
        let item_requirements: Vec<BTreeSet<ItemId>> = match self.item_requirements.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => serde_json::from_str(s)?,
            _ => Vec::new(),
        };
        let requirements: Vec<Requirement> = match self.requirements.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => serde_json::from_str(s)?,
            _ => Vec::new(),
        };
        let mut t = Transport::new(origin, TilePosition::new(self.dest_x, self.dest_y, self.dest_plane), kind);
        t.object_or_npc_id = self.object_id;
        t.name = self.name;
        t.action_verb = self.action.unwrap_or_default();
        t.display_selector = self.display_info.unwrap_or_default();
        t.item_requirements = item_requirements;
        t.requirements = requirements;
        if let Some(level) = self.max_hazard_level { t.max_hazard_level = level; }
        if let Some(d) = self.duration { t.duration = d; }
        Ok(t)
    }
}

/// Reads every row of `transports`. A database without the table yields an empty list.
pub fn load_transports(conn: &Connection) -> Result<Vec<Transport>> {
    let mut stmt = match conn.prepare("SELECT * FROM transports ORDER BY id") {
        Ok(s) => s,
        Err(e) if is_no_such_table(&e) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let rows = stmt.query_map([], map_transport_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_transport()?);
    }
    Ok(out)
}

pub fn write_transports(conn: &Connection, transports: &[Transport]) -> Result<()> {
    conn.execute_batch(TRANSPORTS_SCHEMA)?;
    let mut stmt = conn.prepare(
        "INSERT INTO transports (kind, orig_x, orig_y, orig_plane, dest_x, dest_y, dest_plane, object_id, name, action, display_info, item_requirements, requirements, max_hazard_level, duration)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )?;
    for t in transports {
        let kind = serde_json::to_value(t.kind)?;
        let kind = kind.as_str().unwrap_or_default().to_string();
        stmt.execute(params![
            kind,
            t.origin.map(|o| o.x),
            t.origin.map(|o| o.y),
            t.origin.map(|o| o.plane),
            t.destination.x,
            t.destination.y,
            t.destination.plane,
            t.object_or_npc_id,
            t.name,
            t.action_verb,
            t.display_selector,
            serde_json::to_string(&t.item_requirements)?,
            serde_json::to_string(&t.requirements)?,
            t.max_hazard_level,
            t.duration,
        ])?;
    }
    Ok(())
}
