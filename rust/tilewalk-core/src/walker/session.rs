use std::thread::ThreadId;

use serde::Serialize;

use crate::models::{TilePosition, WalkerState};
use crate::pathfinder::PathHandle;

/// Where the walker is in its loop, observable from other threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Pathfinding,
    Moving,
    Arrived,
    Unreachable,
    Exit,
}

impl From<WalkerState> for Phase {
    fn from(state: WalkerState) -> Self {
        match state {
            WalkerState::Arrived => Phase::Arrived,
            WalkerState::Moving => Phase::Moving,
            WalkerState::Unreachable => Phase::Unreachable,
            WalkerState::Exit => Phase::Exit,
        }
    }
}

/// Mutable navigation state. One per walker, always accessed under the walker's lock.
#[derive(Debug, Default)]
pub struct NavigationSession {
    pub current_target: Option<TilePosition>,
    pub reached_distance: i32,
    pub in_flight: Option<PathHandle>,
    /// Position seen by the last stuck check.
    pub last_position: Option<TilePosition>,
    pub stuck_counter: u32,
    /// Position seen by the last off-path check.
    pub last_checked_position: Option<TilePosition>,
    /// Bumped on every target change so a running loop can tell its target was replaced.
    pub generation: u64,
    /// Thread currently driving the loop, if any.
    pub walking: Option<ThreadId>,
    pub phase: Phase,
}

impl NavigationSession {
    /// Cancels the in-flight search and forgets the target.
    pub fn clear(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.cancel();
        }
        if self.current_target.take().is_some() {
            self.generation += 1;
        }
        self.stuck_counter = 0;
        self.last_position = None;
        self.last_checked_position = None;
    }

    /// Installs a new target; the caller starts the search.
    pub fn retarget(&mut self, target: TilePosition, distance: i32) {
        if let Some(handle) = self.in_flight.take() {
            handle.cancel();
        }
        self.current_target = Some(target);
        self.reached_distance = distance;
        self.generation += 1;
        self.stuck_counter = 0;
        self.last_checked_position = None;
    }

    /// Stuck bookkeeping: counts consecutive checks with an unchanged position.
    pub fn observe_position(&mut self, position: TilePosition) -> u32 {
        if self.last_position == Some(position) {
            self.stuck_counter += 1;
        } else {
            self.stuck_counter = 0;
            self.last_position = Some(position);
        }
        self.stuck_counter
    }

    /// True when the position has not changed since the previous off-path check, and records it.
    pub fn unchanged_since_last_check(&mut self, position: TilePosition) -> bool {
        let unchanged = self.last_checked_position == Some(position);
        self.last_checked_position = Some(position);
        unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stuck_counter_resets_on_movement() {
        let mut s = NavigationSession::default();
        let a = TilePosition::new(1, 1, 0);
        assert_eq!(s.observe_position(a), 0);
        assert_eq!(s.observe_position(a), 1);
        assert_eq!(s.observe_position(a), 2);
        assert_eq!(s.observe_position(a.offset(1, 0)), 0);
    }

    #[test]
    fn clear_bumps_generation_only_with_a_target() {
        let mut s = NavigationSession::default();
        s.clear();
        assert_eq!(s.generation, 0);
        s.retarget(TilePosition::new(5, 5, 0), 0);
        assert_eq!(s.generation, 1);
        s.clear();
        assert_eq!(s.generation, 2);
        assert!(s.current_target.is_none());
    }
}
