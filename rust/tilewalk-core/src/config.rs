use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tunables of the navigation loop. Every field can be overridden with a `TILEWALK_<FIELD>` variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Off-path window; negative disables the check.
    pub recalculate_distance: i32,
    /// Clear the target instead of recomputing when off-path.
    pub cancel_instead: bool,
    pub stuck_threshold: u32,
    pub path_init_timeout_ms: u64,
    pub path_done_timeout_ms: u64,
    pub hop_min: i32,
    pub hop_max: i32,
    pub hop_wait_ms: u64,
    pub final_hop_wait_ms: u64,
    pub closest_tile_radius: i32,
    pub near_end_window: usize,
    pub nudge_radius: i32,
    pub transport_offset: i32,
    pub poll_interval_ms: u64,
    pub max_iterations: u32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            recalculate_distance: 10,
            cancel_instead: false,
            stuck_threshold: 10,
            path_init_timeout_ms: 2_000,
            path_done_timeout_ms: 10_000,
            hop_min: 7,
            hop_max: 11,
            hop_wait_ms: 2_000,
            final_hop_wait_ms: 3_000,
            closest_tile_radius: 20,
            near_end_window: 10,
            nudge_radius: 5,
            transport_offset: 10,
            poll_interval_ms: 100,
            max_iterations: 1_000,
        }
    }
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok()).unwrap_or(fallback)
}

impl WalkerConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let cfg = Self {
            recalculate_distance: env_or("TILEWALK_RECALCULATE_DISTANCE", d.recalculate_distance),
            cancel_instead: env_or("TILEWALK_CANCEL_INSTEAD", d.cancel_instead),
            stuck_threshold: env_or("TILEWALK_STUCK_THRESHOLD", d.stuck_threshold),
            path_init_timeout_ms: env_or("TILEWALK_PATH_INIT_TIMEOUT_MS", d.path_init_timeout_ms),
            path_done_timeout_ms: env_or("TILEWALK_PATH_DONE_TIMEOUT_MS", d.path_done_timeout_ms),
            hop_min: env_or("TILEWALK_HOP_MIN", d.hop_min),
            hop_max: env_or("TILEWALK_HOP_MAX", d.hop_max),
            hop_wait_ms: env_or("TILEWALK_HOP_WAIT_MS", d.hop_wait_ms),
            final_hop_wait_ms: env_or("TILEWALK_FINAL_HOP_WAIT_MS", d.final_hop_wait_ms),
            closest_tile_radius: env_or("TILEWALK_CLOSEST_TILE_RADIUS", d.closest_tile_radius),
            near_end_window: env_or("TILEWALK_NEAR_END_WINDOW", d.near_end_window),
            nudge_radius: env_or("TILEWALK_NUDGE_RADIUS", d.nudge_radius),
            transport_offset: env_or("TILEWALK_TRANSPORT_OFFSET", d.transport_offset),
            poll_interval_ms: env_or("TILEWALK_POLL_INTERVAL_MS", d.poll_interval_ms),
            max_iterations: env_or("TILEWALK_MAX_ITERATIONS", d.max_iterations),
        };
        cfg.normalized()
    }

    /// Swaps an inverted hop range and floors it at one tile.
    pub fn normalized(mut self) -> Self {
        if self.hop_min > self.hop_max {
            std::mem::swap(&mut self.hop_min, &mut self.hop_max);
        }
        self.hop_min = self.hop_min.max(1);
        self.hop_max = self.hop_max.max(self.hop_min);
        self
    }
}
