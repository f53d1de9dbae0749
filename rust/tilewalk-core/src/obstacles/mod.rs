//! Scenery that blocks a path step without being a catalog edge: doors and rockfalls.

pub mod doors;
pub mod riddles;
pub mod rockfall;

pub use riddles::RiddleBook;

/// What an obstacle check did to the current step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObstacleOutcome {
    /// Nothing here; keep walking.
    NotHandled,
    /// The obstacle was interacted with; re-plan from the new position.
    Handled,
    /// The route cannot continue at all and the target should be dropped.
    AbandonTarget,
}

impl ObstacleOutcome {
    pub fn consumed_step(self) -> bool {
        !matches!(self, ObstacleOutcome::NotHandled)
    }
}
