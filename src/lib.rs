//! Armada AI - decision core for computer-controlled naval factions
//!
//! Each faction runs a [`FactionAi`]: fleets move groups of ships together,
//! a lookout reacts to ships in sight, missions carry multi-tick plans and a
//! strategy layer picks which mission to start next. Every choice goes
//! through the behavior manager's weighted random selection, seeded per
//! faction so runs are reproducible.

pub mod behavior;
pub mod combat;
pub mod core;
pub mod faction;
pub mod fleet;
pub mod geometry;
pub mod mission;
pub mod sandbox;
pub mod schedule;
pub mod strategy;
pub mod world;

pub use crate::core::config::AiConfig;
pub use crate::core::error::{AiError, MoveError, Result};
pub use crate::core::types::{FactionId, FleetId, MissionId, Point, Tick, UnitId};
pub use faction::{FactionAi, FinishedMission};
pub use world::{CommandSink, TickContext, WorldEvent, WorldView};
