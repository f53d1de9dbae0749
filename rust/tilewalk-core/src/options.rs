use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_EXPANSIONS: u64 = 1_000_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_WALK_COST: i64 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub max_expansions: u64,
    pub timeout_ms: u64,
    /// Follow catalog edges in addition to adjacent-tile steps.
    pub use_transports: bool,
    /// On failure return the path to the node closest to a goal instead of nothing.
    pub partial_results: bool,
    pub walk_cost: i64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            use_transports: true,
            partial_results: true,
            walk_cost: DEFAULT_WALK_COST,
        }
    }
}

impl SearchOptions {
    pub fn movement_only(&self) -> bool {
        !self.use_transports
    }
}
