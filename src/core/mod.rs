pub mod config;
pub mod error;
pub mod types;

pub use config::AiConfig;
pub use error::{AiError, MoveError, Result};
pub use types::{FactionId, FleetId, MissionId, Point, Tick, UnitId};
