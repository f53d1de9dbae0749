use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tilewalk_core::SearchOptions;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Grid world JSON.
    pub world_path: Option<PathBuf>,
    /// Transport catalog, `.json` or SQLite.
    pub transports_path: Option<PathBuf>,
    pub search: SearchOptions,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("TILEWALK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("TILEWALK_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        let world_path = env::var("TILEWALK_WORLD").ok().map(PathBuf::from);
        let transports_path = env::var("TILEWALK_TRANSPORTS").ok().map(PathBuf::from);

        let mut search = SearchOptions::default();
        if let Some(n) = env::var("TILEWALK_MAX_EXPANSIONS").ok().and_then(|s| s.parse::<u64>().ok()) {
            search.max_expansions = n;
        }
        if let Some(ms) = env::var("TILEWALK_SEARCH_TIMEOUT_MS").ok().and_then(|s| s.parse::<u64>().ok()) {
            search.timeout_ms = ms;
        }

        Ok(Self { host, port, world_path, transports_path, search })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_from_parts() {
        let cfg = Config {
            host: "0.0.0.0".into(),
            port: 9000,
            world_path: None,
            transports_path: None,
            search: SearchOptions::default(),
        };
        assert_eq!(cfg.addr().unwrap().port(), 9000);
        let bad = Config { host: "not a host".into(), ..cfg };
        assert!(bad.addr().is_err());
    }
}
