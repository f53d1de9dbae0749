use std::env;
use std::fmt::{Display, Formatter};
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

/// PRAGMA toggles applied to catalog databases. Catalogs are read once, so the defaults are small.
#[derive(Clone, Debug)]
pub struct DbOpenConfig {
    /// PRAGMA query_only=ON when true.
    pub query_only: bool,
    /// PRAGMA cache_size = -kb when set.
    pub cache_size_kb: Option<i64>,
    pub temp_store: Option<TempStore>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TempStore { Memory, File }

impl Display for TempStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self { TempStore::Memory => write!(f, "MEMORY"), TempStore::File => write!(f, "FILE") }
    }
}

impl Default for DbOpenConfig {
    fn default() -> Self {
        Self { query_only: true, cache_size_kb: Some(8_192), temp_store: Some(TempStore::Memory) }
    }
}

impl DbOpenConfig {
    /// Variables:
    /// - TILEWALK_SQLITE_QUERY_ONLY: "1"/"0" (default 1)
    /// - TILEWALK_SQLITE_CACHE_SIZE_KB: integer KB; 0 disables
    /// - TILEWALK_SQLITE_TEMP_STORE: "MEMORY" or "FILE"; anything else disables
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("TILEWALK_SQLITE_QUERY_ONLY") { cfg.query_only = v.trim() != "0"; }
        if let Ok(v) = env::var("TILEWALK_SQLITE_CACHE_SIZE_KB") {
            cfg.cache_size_kb = match v.trim().parse::<i64>() { Ok(n) if n > 0 => Some(n), _ => None };
        }
        if let Ok(v) = env::var("TILEWALK_SQLITE_TEMP_STORE") {
            cfg.temp_store = match v.trim().to_ascii_uppercase().as_str() {
                "MEMORY" => Some(TempStore::Memory),
                "FILE" => Some(TempStore::File),
                _ => None,
            };
        }
        cfg
    }
}

/// Opens read-only when the platform allows it, then applies the PRAGMAs. PRAGMA failures are ignored.
pub fn open_read_only_with_config<P: AsRef<Path>>(path: P, cfg: &DbOpenConfig) -> rusqlite::Result<Connection> {
    let path_ref = path.as_ref();
    let conn = match Connection::open_with_flags(path_ref, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI) {
        Ok(c) => c,
        Err(e) => {
            debug!(error=%e, path=%path_ref.display(), "read-only open failed, retrying without URI");
            Connection::open_with_flags(path_ref, OpenFlags::SQLITE_OPEN_READ_ONLY)?
        }
    };
    apply_pragmas(&conn, cfg);
    Ok(conn)
}

fn apply_pragmas(conn: &Connection, cfg: &DbOpenConfig) {
    if cfg.query_only { let _ = conn.execute_batch("PRAGMA query_only = ON"); }
    if let Some(kb) = cfg.cache_size_kb { let _ = conn.execute_batch(&format!("PRAGMA cache_size = -{}", kb)); }
    if let Some(ts) = cfg.temp_store { let _ = conn.execute_batch(&format!("PRAGMA temp_store = {}", ts)); }
}
