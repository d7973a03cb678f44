//! Combat lookout
//!
//! Every lookout pass scans around mission fleets and free warships,
//! turns what it sees into a situation and lets the behavior manager pick
//! a response. The manager only decides whether and whom to engage; the
//! fighting itself happens in the world.

pub mod manager;
pub mod policy;

pub use manager::{CombatManager, Sighting};
pub use policy::{EnemyClass, FactionPolicy};

use serde::{Deserialize, Serialize};

/// What a single (fleet-free) ship is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatState {
    #[default]
    Idle,
    Moving,
    /// Sailing after a prey
    Chasing,
    GoingHome,
    Fleeing,
}
